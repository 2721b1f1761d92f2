use crate::api::enums::Gamemode;
use crate::api::types::{UserExtendedPayload, UserPayload, UserStatisticsPayload};
use crate::client::Client;
use crate::error::{not_found_as_none, Result};
use crate::lazy::LazyConstructor;
use async_trait::async_trait;
use std::sync::Arc;

/// osu! user
#[derive(Debug, Clone)]
pub struct User {
    pub id: u64,
    pub username: String,
    pub country_code: String,
    pub avatar_url: String,
    /// Statistics for the requested (or default) mode
    pub statistics: Option<UserStatisticsPayload>,
    client: Client,
    raw: UserPayload,
}

impl User {
    pub fn new(client: &Client, payload: UserPayload) -> Arc<Self> {
        Arc::new(Self {
            client: client.clone(),
            id: payload.id,
            username: payload.username.clone(),
            country_code: payload.country_code.clone(),
            avatar_url: payload.avatar_url.clone(),
            statistics: payload.statistics.clone(),
            raw: payload,
        })
    }

    /// Profile fields, only present when fetched as a full user
    pub fn extended(&self) -> Option<&UserExtendedPayload> {
        self.raw.extended.as_ref()
    }

    pub fn is_populated(&self) -> bool {
        self.raw.extended.is_some()
    }

    pub fn raw(&self) -> &UserPayload {
        &self.raw
    }

    /// Fetch this user again as a full profile
    ///
    /// `mode` selects which mode's statistics are returned.
    pub async fn update(&self, mode: Option<Gamemode>) -> Result<Arc<Self>> {
        self.client.get_user(self.id, mode).await
    }
}

#[async_trait]
impl LazyConstructor for User {
    async fn eval(client: &Client, id: u64) -> Result<Option<Arc<Self>>> {
        not_found_as_none(client.get_user(id, None).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::lazy::LazyRef;
    use crate::testing::{app_client, FakeTransport};
    use serde_json::json;

    #[tokio::test]
    async fn test_missing_user_resolves_to_none() {
        let transport = FakeTransport::new(|_| Err(Error::network(404, "Not Found", "")));
        let lazy: LazyRef<User> = LazyRef::new(app_client(transport.clone()), 3);

        assert!(lazy.eval().await.unwrap().is_none());
        assert!(lazy.eval().await.unwrap().is_none());
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn test_full_profile_is_populated() {
        let transport = FakeTransport::new(|_| {
            Ok(Some(
                json!({
                    "id": 2, "username": "peppy", "country_code": "AU",
                    "user_achievements": [],
                    "join_date": "2007-08-28T03:09:12+00:00", "playmode": "osu",
                    "country": { "code": "AU", "name": "Australia" },
                    "kudosu": { "available": 0, "total": 0 },
                    "statistics": { "pp": 0, "global_rank": null }
                })
                .to_string(),
            ))
        });
        let user = app_client(transport).get_user(2, None).await.unwrap();

        assert!(user.is_populated());
        assert_eq!(user.country_code, "AU");
        assert_eq!(user.extended().unwrap().country.name, "Australia");
        assert!(user.statistics.is_some());
    }

    #[tokio::test]
    async fn test_update_refetches_with_mode() {
        let transport = FakeTransport::new(|request| {
            let body = match request.resolve_path().unwrap().as_str() {
                "/api/v2/users/2" => json!({ "id": 2, "username": "peppy" }),
                "/api/v2/users/2/mania" => json!({
                    "id": 2, "username": "peppy",
                    "statistics": { "pp": 1234.5 },
                    "user_achievements": [],
                    "join_date": "2007-08-28T03:09:12+00:00", "playmode": "osu",
                    "country": { "code": "AU", "name": "Australia" },
                    "kudosu": { "available": 0, "total": 0 }
                }),
                other => panic!("unexpected path {}", other),
            };
            Ok(Some(body.to_string()))
        });
        let client = app_client(transport.clone());

        let compact = client.get_user(2, None).await.unwrap();
        assert!(!compact.is_populated());

        let full = compact.update(Some(Gamemode::Mania)).await.unwrap();
        assert!(full.is_populated());
        assert_eq!(full.statistics.as_ref().map(|s| s.pp), Some(1234.5));
        assert!(!compact.is_populated());

        let request = &transport.requests()[1];
        assert_eq!(request.query_value("key"), Some("id"));
    }
}
