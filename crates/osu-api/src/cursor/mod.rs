//! Pull-based pagination.
//!
//! A [`Cursor`] buffers every value it has fetched and asks its
//! [`PageSource`] for more on demand. Sources keep their own position: a
//! numeric offset ([`IndexedSource`]) or an opaque continuation returned by
//! the server ([`MatchSource`], [`RankingSource`]).

mod indexed;
mod matches;
mod rankings;

pub use indexed::{IndexedCursor, IndexedSource, Processor};
pub use matches::{MatchCursor, MatchSource};
pub use rankings::{RankingCursor, RankingOptions, RankingSource, SpotlightInfo};

use crate::error::{Error, Result};
use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::Stream;
use std::future::Future;
use std::mem;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Page size and prefetch threshold used when the caller has no preference
pub const DEFAULT_COUNT: usize = 10;

/// One fetched page
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub values: Vec<T>,
    /// No further pages exist
    pub done: bool,
}

impl<T> Page<T> {
    fn finished() -> Self {
        Self {
            values: Vec::new(),
            done: true,
        }
    }
}

/// Where a cursor's pages come from
#[async_trait]
pub trait PageSource: Send {
    type Item: Clone + Send + Sync + 'static;

    /// Fetch the page after the last one, asking for about `count` values
    async fn fetch_page(&mut self, count: usize) -> Result<Page<Self::Item>>;
}

/// Observable cursor state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    /// Nothing fetched yet
    Idle,
    /// A page request is in flight
    Fetching,
    /// Values buffered, more pages may follow
    Buffered,
    /// The last page has been fetched
    Exhausted,
}

/// Buffered pagination over a [`PageSource`]
pub struct Cursor<S: PageSource> {
    source: S,
    values: Vec<S::Item>,
    exhausted: bool,
}

impl<S: PageSource> Cursor<S> {
    pub fn new(source: S) -> Self {
        Self::with_initial(source, Vec::new())
    }

    /// Create a cursor whose buffer already holds `values`
    pub fn with_initial(source: S, values: Vec<S::Item>) -> Self {
        Self {
            source,
            values,
            exhausted: false,
        }
    }

    /// Fetch the next page and append it to the buffer
    ///
    /// Once exhausted this returns an empty, done page without fetching.
    pub async fn next(&mut self, count: usize) -> Result<Page<S::Item>> {
        if self.exhausted {
            return Ok(Page::finished());
        }

        let page = pull(&mut self.source, count).await?;
        self.values.extend(page.values.iter().cloned());
        if page.done {
            self.exhausted = true;
        }
        Ok(page)
    }

    /// Stream every value from the start of the buffer
    ///
    /// A new page of `buffer_length` values is requested whenever that many or
    /// fewer unread values remain. Buffered values keep flowing while the
    /// request is in flight. A failed fetch is yielded once the buffered
    /// values are drained and ends the stream; the cursor itself stays usable.
    pub fn iterate(&mut self, buffer_length: usize) -> Iter<'_, S> {
        Iter {
            values: &mut self.values,
            exhausted: &mut self.exhausted,
            fetch: Fetch::Idle(&mut self.source),
            index: 0,
            buffer_length: buffer_length.max(1),
            error: None,
            failed: false,
        }
    }

    /// [`Cursor::iterate`] with the default buffer length
    pub fn stream(&mut self) -> Iter<'_, S> {
        self.iterate(DEFAULT_COUNT)
    }

    /// Every value fetched so far
    pub fn buffered(&self) -> &[S::Item] {
        &self.values
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    pub fn state(&self) -> CursorState {
        if self.exhausted {
            CursorState::Exhausted
        } else if self.values.is_empty() {
            CursorState::Idle
        } else {
            CursorState::Buffered
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}

/// Fetch a page; an empty page always ends pagination
async fn pull<S: PageSource>(source: &mut S, count: usize) -> Result<Page<S::Item>> {
    let mut page = source.fetch_page(count.max(1)).await?;
    if page.values.is_empty() {
        page.done = true;
    }
    Ok(page)
}

type PendingPage<'a, S> = BoxFuture<'a, (&'a mut S, Result<Page<<S as PageSource>::Item>>)>;

enum Fetch<'a, S: PageSource> {
    Idle(&'a mut S),
    Pending(PendingPage<'a, S>),
    /// Only observable while a transition is in progress
    Empty,
}

/// Stream returned by [`Cursor::iterate`]
pub struct Iter<'a, S: PageSource> {
    values: &'a mut Vec<S::Item>,
    exhausted: &'a mut bool,
    fetch: Fetch<'a, S>,
    index: usize,
    buffer_length: usize,
    /// Fetch failure waiting for the buffer to drain
    error: Option<Error>,
    failed: bool,
}

impl<'a, S: PageSource> Iter<'a, S> {
    pub fn state(&self) -> CursorState {
        match self.fetch {
            Fetch::Pending(_) => CursorState::Fetching,
            _ if *self.exhausted => CursorState::Exhausted,
            _ if self.values.is_empty() => CursorState::Idle,
            _ => CursorState::Buffered,
        }
    }

    fn start_fetch(&mut self) {
        match mem::replace(&mut self.fetch, Fetch::Empty) {
            Fetch::Idle(source) => {
                let count = self.buffer_length;
                self.fetch = Fetch::Pending(Box::pin(async move {
                    let result = pull(&mut *source, count).await;
                    (source, result)
                }));
            }
            other => self.fetch = other,
        }
    }
}

impl<'a, S: PageSource> Stream for Iter<'a, S> {
    type Item = Result<S::Item>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.failed {
            return Poll::Ready(None);
        }

        loop {
            if let Fetch::Pending(pending) = &mut this.fetch {
                if let Poll::Ready((source, result)) = pending.as_mut().poll(cx) {
                    this.fetch = Fetch::Idle(source);
                    match result {
                        Ok(page) => {
                            this.values.extend(page.values);
                            if page.done {
                                *this.exhausted = true;
                            }
                        }
                        Err(e) => this.error = Some(e),
                    }
                }
            }

            let remaining = this.values.len() - this.index;
            if remaining <= this.buffer_length
                && !*this.exhausted
                && this.error.is_none()
                && matches!(this.fetch, Fetch::Idle(_))
            {
                this.start_fetch();
                continue;
            }

            if let Some(value) = this.values.get(this.index) {
                this.index += 1;
                return Poll::Ready(Some(Ok(value.clone())));
            }

            if let Some(e) = this.error.take() {
                this.failed = true;
                return Poll::Ready(Some(Err(e)));
            }

            return match this.fetch {
                Fetch::Pending(_) => Poll::Pending,
                _ => Poll::Ready(None),
            };
        }
    }
}
