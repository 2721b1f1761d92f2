use super::User;
use crate::api::types::{MatchEventPayload, MatchExtendedPayload, MatchInfoPayload, MatchPayload};
use crate::client::Client;
use crate::error::{not_found_as_none, Result};
use crate::lazy::{LazyConstructor, LazyRefCollection};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Multiplayer match
///
/// Listings only carry the header; [`Client::get_match`] returns the event
/// log as well.
#[derive(Debug)]
pub struct Match {
    pub id: u64,
    pub name: String,
    pub start_time: DateTime<Utc>,
    /// `None` while the match is still open
    pub end_time: Option<DateTime<Utc>>,
    /// Everyone who appears in the event log, in order of appearance
    pub participants: LazyRefCollection<User>,
    client: Client,
    extended: Option<MatchExtendedPayload>,
}

impl Match {
    pub fn new(client: &Client, payload: MatchPayload) -> Arc<Self> {
        let MatchPayload { info, extended } = payload;

        let participants = match &extended {
            Some(full) => {
                let ids = full
                    .events
                    .iter()
                    .filter_map(|event| event.user_id)
                    .chain(full.users.iter().map(|user| user.id));
                let participants = LazyRefCollection::new(client.clone(), ids);
                for user in &full.users {
                    if let Some(lazy) = participants.get(user.id) {
                        lazy.set(Some(User::new(client, user.clone())));
                    }
                }
                participants
            }
            None => LazyRefCollection::new(client.clone(), std::iter::empty()),
        };

        Arc::new(Self {
            id: info.id,
            name: info.name,
            start_time: info.start_time,
            end_time: info.end_time,
            participants,
            client: client.clone(),
            extended,
        })
    }

    /// Build a match from a listing entry
    pub fn from_info(client: &Client, info: MatchInfoPayload) -> Arc<Self> {
        Self::new(
            client,
            MatchPayload {
                info,
                extended: None,
            },
        )
    }

    /// Event log, empty for a match built from a listing
    pub fn events(&self) -> &[MatchEventPayload] {
        self.extended
            .as_ref()
            .map(|full| full.events.as_slice())
            .unwrap_or_default()
    }

    pub fn extended(&self) -> Option<&MatchExtendedPayload> {
        self.extended.as_ref()
    }

    pub fn is_populated(&self) -> bool {
        self.extended.is_some()
    }

    /// Fetch this match again with its latest events
    ///
    /// A match built from a listing comes back populated.
    pub async fn update(&self) -> Result<Arc<Self>> {
        self.client.get_match(self.id).await
    }
}

#[async_trait]
impl LazyConstructor for Match {
    async fn eval(client: &Client, id: u64) -> Result<Option<Arc<Self>>> {
        not_found_as_none(client.get_match(id).await)
    }
}
