//! Continuation-paginated multiplayer match listing.

use super::{Cursor, Page, PageSource};
use crate::api::endpoints::{self, MAX_PAGE_SIZE};
use crate::api::request::Request;
use crate::api::types::{query_value, MatchesPayload};
use crate::client::Client;
use crate::error::Result;
use crate::structures::Match;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Cursor over `/matches`, newest first
pub type MatchCursor = Cursor<MatchSource>;

/// Page source following the server's `cursor[match_id]` continuation
pub struct MatchSource {
    client: Client,
    /// Parameters echoed by the server with the previous page
    params: Vec<(String, String)>,
    /// Continuation from the previous page
    last_match: Option<u64>,
}

impl MatchSource {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            params: Vec::new(),
            last_match: None,
        }
    }
}

#[async_trait]
impl PageSource for MatchSource {
    type Item = Arc<Match>;

    async fn fetch_page(&mut self, count: usize) -> Result<Page<Arc<Match>>> {
        let limit = count.min(MAX_PAGE_SIZE);

        let mut request = Request::get(endpoints::MATCHES);
        for (key, value) in &self.params {
            request.set_query(key.as_str(), value);
        }
        request.set_query("limit", limit);
        if let Some(match_id) = self.last_match {
            request.set_query("cursor[match_id]", match_id);
        }

        let payload: MatchesPayload = self.client.request(request).await?;

        self.params = payload
            .params
            .iter()
            .filter(|(_, value)| !value.is_null() && !matches!(value, Value::Object(_)))
            .map(|(key, value)| (key.clone(), query_value(value)))
            .collect();
        self.last_match = payload.cursor.as_ref().map(|cursor| cursor.match_id);

        let done = payload.matches.len() < limit || self.last_match.is_none();
        debug!(
            fetched = payload.matches.len(),
            next_match = ?self.last_match,
            done,
            "Fetched match page"
        );

        let matches = payload
            .matches
            .into_iter()
            .map(|info| Match::from_info(&self.client, info))
            .collect();
        Ok(Page {
            values: matches,
            done,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{app_client, FakeTransport};
    use serde_json::json;

    fn match_info(id: u64) -> serde_json::Value {
        json!({ "id": id, "name": format!("match {}", id), "start_time": "2023-05-01T10:00:00Z", "end_time": null })
    }

    #[tokio::test]
    async fn test_continuation_and_params_are_echoed() {
        let transport = FakeTransport::new(|request| {
            let body = match request.query_value("cursor[match_id]") {
                None => json!({
                    "matches": [match_info(30), match_info(29)],
                    "cursor": { "match_id": 29 },
                    "params": { "limit": 2, "sort": "id_desc" }
                }),
                Some("29") => json!({
                    "matches": [match_info(28)],
                    "cursor": null,
                    "params": { "limit": 2, "sort": "id_desc" }
                }),
                other => panic!("unexpected continuation {:?}", other),
            };
            Ok(Some(body.to_string()))
        });
        let mut cursor = app_client(transport.clone()).get_matches();

        let first = cursor.next(2).await.unwrap();
        assert_eq!(
            first.values.iter().map(|m| m.id).collect::<Vec<_>>(),
            vec![30, 29]
        );
        assert!(!first.done);
        assert!(!first.values[0].is_populated());

        let second = cursor.next(2).await.unwrap();
        assert_eq!(second.values[0].id, 28);
        assert!(second.done);
        assert!(cursor.is_exhausted());

        let requests = transport.requests();
        assert_eq!(requests[0].query_value("cursor[match_id]"), None);
        assert_eq!(requests[0].query_value("limit"), Some("2"));
        assert_eq!(requests[1].query_value("sort"), Some("id_desc"));
        assert_eq!(requests[1].query_value("limit"), Some("2"));
        assert_eq!(requests[1].query_value("cursor[match_id]"), Some("29"));
    }

    #[tokio::test]
    async fn test_limit_capped_at_page_maximum() {
        let transport = FakeTransport::new(|_| {
            Ok(Some(json!({ "matches": [], "cursor": null, "params": {} }).to_string()))
        });
        let mut cursor = app_client(transport.clone()).get_matches();

        let page = cursor.next(250).await.unwrap();
        assert!(page.done);
        assert_eq!(transport.requests()[0].query_value("limit"), Some("100"));
    }
}
