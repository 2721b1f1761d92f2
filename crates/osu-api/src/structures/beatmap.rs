use super::Beatmapset;
use crate::api::enums::Gamemode;
use crate::api::types::{BeatmapExtendedPayload, BeatmapPayload};
use crate::client::Client;
use crate::error::{not_found_as_none, Result};
use crate::lazy::{LazyConstructor, LazyRef};
use async_trait::async_trait;
use std::sync::{Arc, Weak};

/// One difficulty of a beatmapset
#[derive(Debug)]
pub struct Beatmap {
    pub id: u64,
    pub mode: Gamemode,
    /// Ranked status, e.g. `ranked` or `loved`
    pub status: String,
    pub star_rating: f64,
    /// Difficulty name
    pub version: String,
    /// Length in seconds
    pub length: u64,
    pub checksum: Option<String>,
    pub max_combo: Option<u32>,
    /// Owning beatmapset, unless the payload had no set id
    pub beatmapset: Option<LazyRef<Beatmapset>>,
    client: Client,
    raw: BeatmapPayload,
}

impl Beatmap {
    /// Build a beatmap, seeding its beatmapset when the payload inlines it
    pub fn new(client: &Client, mut payload: BeatmapPayload) -> Arc<Self> {
        let inline = payload.beatmapset.take();
        let set_id = payload
            .beatmapset_id
            .or_else(|| inline.as_ref().map(|set| set.id));

        let beatmapset = set_id.map(|id| {
            let lazy = LazyRef::new(client.clone(), id);
            if let Some(set) = inline {
                lazy.set(Some(Beatmapset::new(client, *set)));
            }
            lazy
        });

        Arc::new(Self::build(client, payload, beatmapset))
    }

    /// Build a beatmap owned by a beatmapset under construction
    pub(crate) fn with_parent(
        client: &Client,
        mut payload: BeatmapPayload,
        parent: &Weak<Beatmapset>,
        parent_id: u64,
    ) -> Self {
        payload.beatmapset = None;
        let lazy = LazyRef::new(client.clone(), parent_id);
        lazy.set_parent(parent);
        Self::build(client, payload, Some(lazy))
    }

    fn build(
        client: &Client,
        payload: BeatmapPayload,
        beatmapset: Option<LazyRef<Beatmapset>>,
    ) -> Self {
        Self {
            id: payload.id,
            mode: payload.mode,
            status: payload.status.clone(),
            star_rating: payload.difficulty_rating,
            version: payload.version.clone(),
            length: payload.total_length,
            checksum: payload.checksum.clone(),
            max_combo: payload.max_combo,
            beatmapset,
            client: client.clone(),
            raw: payload,
        }
    }

    /// Difficulty settings and counts, only present on a full beatmap
    pub fn extended(&self) -> Option<&BeatmapExtendedPayload> {
        self.raw.extended.as_ref()
    }

    pub fn is_populated(&self) -> bool {
        self.raw.extended.is_some()
    }

    pub fn raw(&self) -> &BeatmapPayload {
        &self.raw
    }

    /// Fetch this beatmap again
    pub async fn update(&self) -> Result<Arc<Self>> {
        self.client.get_beatmap(self.id).await
    }
}

#[async_trait]
impl LazyConstructor for Beatmap {
    async fn eval(client: &Client, id: u64) -> Result<Option<Arc<Self>>> {
        not_found_as_none(client.get_beatmap(id).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{app_client, FakeTransport};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_inline_beatmapset_is_seeded() {
        let transport = FakeTransport::new(|_| {
            Ok(Some(
                json!({
                    "id": 75, "beatmapset_id": 1, "difficulty_rating": 2.5,
                    "mode": "osu", "status": "ranked", "total_length": 142,
                    "version": "Normal", "checksum": "a5b99395a42bd55bc5eb1d2411cbdf8b",
                    "beatmapset": {
                        "id": 1, "artist": "Kenji Ninuma", "creator": "peppy",
                        "status": "ranked", "title": "DISCO PRINCE", "user_id": 2
                    }
                })
                .to_string(),
            ))
        });
        let client = app_client(transport.clone());

        let beatmap = client.get_beatmap(75).await.unwrap();
        assert_eq!(beatmap.star_rating, 2.5);
        assert!(!beatmap.is_populated());

        let set = beatmap.beatmapset.as_ref().unwrap().eval().await.unwrap().unwrap();
        assert_eq!(set.title, "DISCO PRINCE");
        assert_eq!(transport.request_count(), 1);
        assert_eq!(transport.requests()[0].query_value("id"), Some("75"));
    }

    #[tokio::test]
    async fn test_unseeded_beatmapset_fetches_on_eval() {
        let transport = FakeTransport::new(|request| {
            let body = match request.resolve_path().unwrap().as_str() {
                "/api/v2/beatmaps/lookup" => json!({
                    "id": 75, "beatmapset_id": 1, "difficulty_rating": 2.5,
                    "mode": "osu", "status": "ranked", "total_length": 142,
                    "version": "Normal"
                }),
                "/api/v2/beatmapsets/1" => json!({
                    "id": 1, "artist": "Kenji Ninuma", "creator": "peppy",
                    "status": "ranked", "title": "DISCO PRINCE", "user_id": 2
                }),
                other => panic!("unexpected path {}", other),
            };
            Ok(Some(body.to_string()))
        });
        let client = app_client(transport.clone());

        let beatmap = client.get_beatmap(75).await.unwrap();
        let lazy = beatmap.beatmapset.as_ref().unwrap();
        assert!(!lazy.is_evaluated());

        let set = lazy.eval().await.unwrap().unwrap();
        assert_eq!(set.id, 1);
        assert_eq!(transport.request_count(), 2);
    }

    #[tokio::test]
    async fn test_update_returns_fresh_beatmap() {
        let calls = AtomicUsize::new(0);
        let transport = FakeTransport::new(move |_| {
            let mut body = json!({
                "id": 75, "beatmapset_id": 1, "difficulty_rating": 2.5,
                "mode": "osu", "status": "pending", "total_length": 142,
                "version": "Normal"
            });
            if calls.fetch_add(1, Ordering::SeqCst) > 0 {
                let full = json!({
                    "status": "ranked", "accuracy": 6.0, "ar": 7.0, "bpm": 120.0,
                    "convert": false, "count_circles": 160, "count_sliders": 30,
                    "count_spinners": 1, "cs": 4.0, "drain": 5.0, "hit_length": 109,
                    "is_scoreable": true, "last_updated": "2014-05-18T17:22:13Z",
                    "passcount": 10, "playcount": 20, "ranked": 1,
                    "url": "https://osu.ppy.sh/beatmaps/75"
                });
                for (key, value) in full.as_object().unwrap() {
                    body[key] = value.clone();
                }
            }
            Ok(Some(body.to_string()))
        });
        let client = app_client(transport.clone());

        let stale = client.get_beatmap(75).await.unwrap();
        let fresh = stale.update().await.unwrap();

        assert!(!Arc::ptr_eq(&stale, &fresh));
        assert_eq!(stale.status, "pending");
        assert_eq!(fresh.status, "ranked");
        assert!(fresh.is_populated());
        assert_eq!(fresh.extended().unwrap().count_circles, 160);

        let requests = transport.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].query_value("id"), Some("75"));
    }
}
