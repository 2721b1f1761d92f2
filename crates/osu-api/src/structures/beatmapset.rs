use super::{Beatmap, User};
use crate::api::types::{BeatmapsetExtendedPayload, BeatmapsetPayload};
use crate::client::Client;
use crate::error::{not_found_as_none, Result};
use crate::lazy::{LazyConstructor, LazyRef};
use async_trait::async_trait;
use std::sync::Arc;

/// A mapset and, when fetched in full, its difficulties
#[derive(Debug)]
pub struct Beatmapset {
    pub id: u64,
    pub artist: String,
    pub title: String,
    /// Mapper's username at upload time
    pub creator: String,
    pub status: String,
    pub mapper: LazyRef<User>,
    /// Difficulties; each points back at this set without owning it
    pub beatmaps: Option<Vec<Arc<Beatmap>>>,
    client: Client,
    raw: BeatmapsetPayload,
}

impl Beatmapset {
    pub fn new(client: &Client, mut payload: BeatmapsetPayload) -> Arc<Self> {
        let beatmaps = payload.beatmaps.take();

        let mapper = LazyRef::new(client.clone(), payload.user_id);
        if let Some(user) = payload.user.take() {
            mapper.set(Some(User::new(client, user)));
        }

        Arc::new_cyclic(|weak| {
            let id = payload.id;
            let beatmaps = beatmaps.map(|beatmaps| {
                beatmaps
                    .into_iter()
                    .map(|beatmap| Arc::new(Beatmap::with_parent(client, beatmap, weak, id)))
                    .collect()
            });

            Self {
                id,
                artist: payload.artist.clone(),
                title: payload.title.clone(),
                creator: payload.creator.clone(),
                status: payload.status.clone(),
                mapper,
                beatmaps,
                client: client.clone(),
                raw: payload,
            }
        })
    }

    pub fn extended(&self) -> Option<&BeatmapsetExtendedPayload> {
        self.raw.extended.as_ref()
    }

    pub fn is_populated(&self) -> bool {
        self.raw.extended.is_some()
    }

    pub fn raw(&self) -> &BeatmapsetPayload {
        &self.raw
    }

    /// Fetch this set again, difficulties included
    pub async fn update(&self) -> Result<Arc<Self>> {
        self.client.get_beatmapset(self.id).await
    }
}

#[async_trait]
impl LazyConstructor for Beatmapset {
    async fn eval(client: &Client, id: u64) -> Result<Option<Arc<Self>>> {
        not_found_as_none(client.get_beatmapset(id).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{app_client, FakeTransport};
    use serde_json::json;

    fn difficulty(id: u64, version: &str) -> serde_json::Value {
        json!({
            "id": id, "beatmapset_id": 1, "difficulty_rating": 3.1, "mode": "osu",
            "status": "ranked", "total_length": 142, "version": version
        })
    }

    #[tokio::test]
    async fn test_difficulties_point_back_at_their_set() {
        let transport = FakeTransport::new(|_| {
            Ok(Some(
                json!({
                    "id": 1, "artist": "Kenji Ninuma", "creator": "peppy",
                    "status": "ranked", "title": "DISCO PRINCE", "user_id": 2,
                    "beatmaps": [difficulty(75, "Normal"), difficulty(76, "Hard")],
                    "user": { "id": 2, "username": "peppy" }
                })
                .to_string(),
            ))
        });
        let client = app_client(transport.clone());

        let set = client.get_beatmapset(1).await.unwrap();
        let beatmaps = set.beatmaps.as_ref().unwrap();
        assert_eq!(beatmaps.len(), 2);

        for beatmap in beatmaps {
            let lazy = beatmap.beatmapset.as_ref().unwrap();
            assert!(lazy.is_evaluated());
            let parent = lazy.eval().await.unwrap().unwrap();
            assert!(Arc::ptr_eq(&parent, &set));
        }

        let mapper = set.mapper.eval().await.unwrap().unwrap();
        assert_eq!(mapper.username, "peppy");
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn test_set_is_freed_while_difficulties_live() {
        let transport = FakeTransport::new(|_| {
            Ok(Some(
                json!({
                    "id": 1, "artist": "a", "creator": "m", "status": "ranked",
                    "title": "t", "user_id": 2, "beatmaps": [difficulty(75, "Normal")]
                })
                .to_string(),
            ))
        });
        let client = app_client(transport);

        let set = client.get_beatmapset(1).await.unwrap();
        let beatmap = Arc::clone(&set.beatmaps.as_ref().unwrap()[0]);
        let weak = Arc::downgrade(&set);
        drop(set);

        assert!(weak.upgrade().is_none());
        assert!(!beatmap.beatmapset.as_ref().unwrap().is_evaluated());
    }

    #[tokio::test]
    async fn test_update_rebuilds_difficulties() {
        let transport = FakeTransport::new(|_| {
            Ok(Some(
                json!({
                    "id": 1, "artist": "a", "creator": "m", "status": "ranked",
                    "title": "t", "user_id": 2, "beatmaps": [difficulty(75, "Normal")]
                })
                .to_string(),
            ))
        });
        let client = app_client(transport.clone());

        let stale = client.get_beatmapset(1).await.unwrap();
        let fresh = stale.update().await.unwrap();
        assert!(!Arc::ptr_eq(&stale, &fresh));

        let beatmap = &fresh.beatmaps.as_ref().unwrap()[0];
        let parent = beatmap.beatmapset.as_ref().unwrap().eval().await.unwrap().unwrap();
        assert!(Arc::ptr_eq(&parent, &fresh));

        let requests = transport.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].resolve_path().unwrap(), "/api/v2/beatmapsets/1");
    }
}
