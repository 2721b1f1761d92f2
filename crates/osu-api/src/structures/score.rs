use super::{Beatmap, User};
use crate::api::enums::Gamemode;
use crate::api::types::{ScorePayload, ScoreStatistics, Weight};
use crate::client::Client;
use crate::lazy::LazyRef;
use chrono::{DateTime, Utc};

/// A submitted play
#[derive(Debug, Clone)]
pub struct Score {
    pub id: u64,
    pub user_id: u64,
    /// Between 0 and 1
    pub accuracy: f64,
    pub created_at: DateTime<Utc>,
    pub max_combo: u32,
    pub mode: Gamemode,
    /// Mod acronyms
    pub mods: Vec<String>,
    pub passed: bool,
    pub perfect: bool,
    pub pp: Option<f64>,
    /// Letter grade
    pub rank: String,
    pub score: u64,
    pub statistics: ScoreStatistics,
    pub weight: Option<Weight>,
    pub user: LazyRef<User>,
    pub beatmap: Option<LazyRef<Beatmap>>,
}

impl Score {
    pub fn new(client: &Client, mut payload: ScorePayload) -> Self {
        let user = LazyRef::new(client.clone(), payload.user_id);
        if let Some(inline) = payload.user.take() {
            user.set(Some(User::new(client, inline)));
        }

        // Scores send the set next to the beatmap rather than inside it.
        let beatmapset = payload.beatmapset.take();
        let beatmap = payload.beatmap.take().map(|mut inline| {
            if inline.beatmapset.is_none() {
                inline.beatmapset = beatmapset.map(Box::new);
            }
            let lazy = LazyRef::new(client.clone(), inline.id);
            lazy.set(Some(Beatmap::new(client, inline)));
            lazy
        });

        Self {
            id: payload.id,
            user_id: payload.user_id,
            accuracy: payload.accuracy,
            created_at: payload.created_at,
            max_combo: payload.max_combo,
            mode: payload.mode,
            mods: payload.mods,
            passed: payload.passed,
            perfect: payload.perfect,
            pp: payload.pp,
            rank: payload.rank,
            score: payload.score,
            statistics: payload.statistics,
            weight: payload.weight,
            user,
            beatmap,
        }
    }
}

/// A user's position on a beatmap leaderboard
#[derive(Debug, Clone)]
pub struct BeatmapUserScore {
    pub position: u64,
    pub score: Score,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::enums::ScoreType;
    use crate::testing::{app_client, FakeTransport};
    use futures::StreamExt;
    use serde_json::json;

    fn score(id: u64) -> serde_json::Value {
        json!({
            "id": id, "user_id": 2, "accuracy": 0.98, "created_at": "2023-01-02T03:04:05Z",
            "max_combo": 500, "mode": "osu", "mods": ["HD"], "passed": true, "rank": "S",
            "score": 1_000_000, "statistics": { "count_300": 400, "count_miss": 0 },
            "beatmap": {
                "id": 75, "beatmapset_id": 1, "difficulty_rating": 2.5, "mode": "osu",
                "status": "ranked", "total_length": 142, "version": "Normal"
            },
            "beatmapset": {
                "id": 1, "artist": "Kenji Ninuma", "creator": "peppy",
                "status": "ranked", "title": "DISCO PRINCE", "user_id": 2
            },
            "user": { "id": 2, "username": "peppy" },
            "weight": { "percentage": 100.0, "pp": 120.5 }
        })
    }

    #[tokio::test]
    async fn test_inline_resources_are_seeded() {
        let transport = FakeTransport::new(|_| Ok(Some(json!([score(1)]).to_string())));
        let client = app_client(transport.clone());
        let mut cursor = client.get_user_scores(2, ScoreType::Best, None);

        let page = cursor.next(5).await.unwrap();
        assert!(page.done);
        let first = &page.values[0];
        assert_eq!(first.mods, vec!["HD"]);
        assert_eq!(first.weight.as_ref().map(|w| w.pp), Some(120.5));

        let user = first.user.eval().await.unwrap().unwrap();
        assert_eq!(user.username, "peppy");

        let beatmap = first.beatmap.as_ref().unwrap().eval().await.unwrap().unwrap();
        let set = beatmap.beatmapset.as_ref().unwrap().eval().await.unwrap().unwrap();
        assert_eq!(set.title, "DISCO PRINCE");

        assert_eq!(transport.request_count(), 1);
        let request = &transport.requests()[0];
        assert_eq!(request.resolve_path().unwrap(), "/api/v2/users/2/scores/best");
    }

    #[tokio::test]
    async fn test_user_scores_stream() {
        let transport = FakeTransport::new(|request| {
            let offset: u64 = request.query_value("offset").unwrap().parse().unwrap();
            let scores: Vec<_> = if offset == 0 {
                (1..=10).map(score).collect()
            } else {
                (11..=13).map(score).collect()
            };
            Ok(Some(json!(scores).to_string()))
        });
        let client = app_client(transport.clone());
        let mut cursor = client.get_user_scores(2, ScoreType::Recent, None);

        let ids: Vec<u64> = cursor.stream().map(|s| s.unwrap().id).collect().await;
        assert_eq!(ids, (1..=13).collect::<Vec<_>>());
        assert_eq!(transport.request_count(), 2);
    }
}
