//! Page-numbered ranking tables.

use super::{Cursor, Page, PageSource};
use crate::api::endpoints::{self, RANKING_PAGE_SIZE};
use crate::api::enums::{Gamemode, RankingFilter, RankingType};
use crate::api::request::Request;
use crate::api::types::{RankingsPayload, SpotlightPayload, UserStatisticsPayload};
use crate::client::Client;
use crate::error::Result;
use crate::structures::Beatmapset;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Cursor over `/rankings/{mode}/{type}`
pub type RankingCursor = Cursor<RankingSource>;

/// Optional ranking filters, re-sent with every page
#[derive(Debug, Clone, Default)]
pub struct RankingOptions {
    /// Two letter country code, performance rankings only
    pub country: Option<String>,
    pub filter: Option<RankingFilter>,
    /// Spotlight id, charts only; the latest spotlight by default
    pub spotlight: Option<u64>,
    /// Mania key variant (`4k`, `7k`), performance rankings only
    pub variant: Option<String>,
}

impl RankingOptions {
    fn query(&self) -> Vec<(String, String)> {
        let mut query = Vec::new();
        if let Some(country) = &self.country {
            query.push(("country".to_string(), country.clone()));
        }
        if let Some(filter) = self.filter {
            query.push(("filter".to_string(), filter.to_string()));
        }
        if let Some(spotlight) = self.spotlight {
            query.push(("spotlight".to_string(), spotlight.to_string()));
        }
        if let Some(variant) = &self.variant {
            query.push(("variant".to_string(), variant.clone()));
        }
        query
    }
}

/// Spotlight chart data sent alongside charts rankings
#[derive(Debug, Clone)]
pub struct SpotlightInfo {
    pub beatmapsets: Vec<Arc<Beatmapset>>,
    pub spotlight: SpotlightPayload,
}

/// Page source following the server's `cursor[page]` continuation
pub struct RankingSource {
    client: Client,
    mode: Gamemode,
    kind: RankingType,
    query: Vec<(String, String)>,
    next_page: u32,
    spotlight: Option<SpotlightInfo>,
    total: Option<u64>,
}

impl RankingSource {
    pub fn new(client: Client, mode: Gamemode, kind: RankingType, options: RankingOptions) -> Self {
        Self {
            client,
            mode,
            kind,
            query: options.query(),
            next_page: 1,
            spotlight: None,
            total: None,
        }
    }
}

#[async_trait]
impl PageSource for RankingSource {
    type Item = UserStatisticsPayload;

    /// The API has a fixed page size, so `count` is ignored
    async fn fetch_page(&mut self, _count: usize) -> Result<Page<UserStatisticsPayload>> {
        let mut request = Request::get(endpoints::RANKINGS)
            .argument("mode", self.mode)
            .argument("type", self.kind);
        for (key, value) in &self.query {
            request.set_query(key.as_str(), value);
        }
        request.set_query("cursor[page]", self.next_page);

        let payload: RankingsPayload = self.client.request(request).await?;

        self.total = Some(payload.total);
        if let (Some(beatmapsets), Some(spotlight)) = (payload.beatmapsets, payload.spotlight) {
            self.spotlight = Some(SpotlightInfo {
                beatmapsets: beatmapsets
                    .into_iter()
                    .map(|set| Beatmapset::new(&self.client, set))
                    .collect(),
                spotlight,
            });
        }

        let next = payload.cursor.as_ref().map(|cursor| cursor.page);
        let done = payload.ranking.len() < RANKING_PAGE_SIZE || next.is_none();
        if let Some(page) = next {
            self.next_page = page;
        }

        debug!(
            mode = self.mode.as_str(),
            kind = self.kind.as_str(),
            fetched = payload.ranking.len(),
            next_page = ?next,
            done,
            "Fetched ranking page"
        );

        Ok(Page {
            values: payload.ranking,
            done,
        })
    }
}

impl Cursor<RankingSource> {
    /// Chart beatmapsets and spotlight details
    ///
    /// Only charts rankings carry them, and only once a page was fetched.
    pub fn spotlight_info(&self) -> Option<&SpotlightInfo> {
        self.source().spotlight.as_ref()
    }

    /// Approximate number of ranked entries, once a page was fetched
    pub fn total(&self) -> Option<u64> {
        self.source().total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{app_client, FakeTransport};
    use serde_json::json;

    fn entries(from: u64, count: u64) -> Vec<serde_json::Value> {
        (from..from + count)
            .map(|id| json!({ "pp": 1000.0, "user": { "id": id, "username": format!("u{}", id) } }))
            .collect()
    }

    #[tokio::test]
    async fn test_pages_follow_cursor_and_resend_options() {
        let transport = FakeTransport::new(|request| {
            let body = match request.query_value("cursor[page]") {
                Some("1") => json!({ "ranking": entries(0, 50), "cursor": { "page": 2 }, "total": 70 }),
                Some("2") => json!({ "ranking": entries(50, 20), "cursor": null, "total": 70 }),
                other => panic!("unexpected page {:?}", other),
            };
            Ok(Some(body.to_string()))
        });
        let options = RankingOptions {
            country: Some("FI".into()),
            ..Default::default()
        };
        let mut cursor = app_client(transport.clone()).get_rankings(
            Gamemode::Osu,
            RankingType::Performance,
            options,
        );
        assert_eq!(cursor.total(), None);

        let first = cursor.next(10).await.unwrap();
        assert_eq!(first.values.len(), 50);
        assert!(!first.done);
        assert_eq!(cursor.total(), Some(70));

        let second = cursor.next(10).await.unwrap();
        assert!(second.done);
        assert_eq!(
            second.values[0].user.as_ref().map(|user| user.id),
            Some(50)
        );

        let requests = transport.requests();
        assert_eq!(
            requests[0].resolve_path().unwrap(),
            "/api/v2/rankings/osu/performance"
        );
        for request in &requests {
            assert_eq!(request.query_value("country"), Some("FI"));
        }
        assert!(cursor.spotlight_info().is_none());
    }

    #[tokio::test]
    async fn test_charts_expose_spotlight_info() {
        let transport = FakeTransport::new(|_| {
            Ok(Some(
                json!({
                    "ranking": entries(0, 3),
                    "cursor": null,
                    "total": 3,
                    "beatmapsets": [{
                        "id": 10, "artist": "a", "creator": "m", "status": "ranked",
                        "title": "t", "user_id": 4
                    }],
                    "spotlight": {
                        "id": 7, "name": "Summer 2023", "type": "seasonal",
                        "start_date": "2023-06-01T00:00:00Z", "end_date": "2023-09-01T00:00:00Z",
                        "mode_specific": true
                    }
                })
                .to_string(),
            ))
        });
        let mut cursor = app_client(transport.clone()).get_rankings(
            Gamemode::Mania,
            RankingType::Charts,
            RankingOptions {
                spotlight: Some(7),
                ..Default::default()
            },
        );

        assert!(cursor.spotlight_info().is_none());
        let page = cursor.next(50).await.unwrap();
        assert!(page.done);

        let info = cursor.spotlight_info().expect("spotlight after first page");
        assert_eq!(info.spotlight.name, "Summer 2023");
        assert_eq!(info.beatmapsets[0].id, 10);
        assert_eq!(info.beatmapsets[0].mapper.id(), 4);
        assert_eq!(transport.requests()[0].query_value("spotlight"), Some("7"));
    }
}
