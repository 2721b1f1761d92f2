//! Offset-paginated resources.

use super::{Cursor, Page, PageSource};
use crate::api::endpoints::MAX_PAGE_SIZE;
use crate::api::request::Request;
use crate::client::Client;
use crate::error::Result;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::debug;

/// Turns a raw page into cursor values
///
/// Offsets advance by the raw page length, so a processor is expected to
/// keep one value per raw element.
pub type Processor<T, U> = Arc<dyn Fn(Vec<U>) -> Vec<T> + Send + Sync>;

/// Cursor over a resource paginated with `limit` and `offset`
pub type IndexedCursor<T, U> = Cursor<IndexedSource<T, U>>;

/// Page source sending `limit` and `offset` query parameters
pub struct IndexedSource<T, U> {
    client: Client,
    /// Template every page request starts from
    request: Request,
    processor: Processor<T, U>,
    /// Offset of the next page
    index: usize,
}

impl<T, U> IndexedSource<T, U> {
    pub fn new(
        client: Client,
        request: Request,
        processor: impl Fn(Vec<U>) -> Vec<T> + Send + Sync + 'static,
    ) -> Self {
        Self {
            client,
            request,
            processor: Arc::new(processor),
            index: 0,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

#[async_trait]
impl<T, U> PageSource for IndexedSource<T, U>
where
    T: Clone + Send + Sync + 'static,
    U: DeserializeOwned + Send + 'static,
{
    type Item = T;

    async fn fetch_page(&mut self, count: usize) -> Result<Page<T>> {
        let mut request = self.request.clone();
        request.set_query("limit", count);
        request.set_query("offset", self.index);

        let raw: Vec<U> = self.client.request(request).await?;
        let fetched = raw.len();
        self.index += fetched;
        let done = fetched < count.min(MAX_PAGE_SIZE);

        debug!(
            endpoint = %self.request.endpoint,
            fetched,
            next_offset = self.index,
            done,
            "Fetched indexed page"
        );

        Ok(Page {
            values: (self.processor)(raw),
            done,
        })
    }
}

impl<T, U> Cursor<IndexedSource<T, U>>
where
    T: Clone + Send + Sync + 'static,
    U: DeserializeOwned + Send + 'static,
{
    /// A fresh cursor over the same resource starting at `offset`
    ///
    /// The new cursor shares nothing mutable with this one.
    pub fn with_index(&self, offset: usize) -> Self {
        let source = self.source();
        Cursor::new(IndexedSource {
            client: source.client.clone(),
            request: source.request.clone(),
            processor: Arc::clone(&source.processor),
            index: offset,
        })
    }

    /// Offset of the next page
    pub fn index(&self) -> usize {
        self.source().index
    }
}
