//! Client library for the osu! v2 API.
//!
//! Requests go through a rate-limited [`RequestDispatcher`] under an OAuth
//! session held by a [`Client`]. Related resources are returned as lazy
//! references and paginated listings as cursors.

pub mod api;
pub mod auth;
pub mod client;
pub mod cursor;
pub mod error;
pub mod lazy;
pub mod structures;

#[cfg(test)]
mod testing;

pub use api::{
    BeatmapLookupType, DispatcherOptions, Gamemode, GrantType, LeaderboardScope, RankingFilter,
    RankingType, RateLimiter, Request, RequestDispatcher, ScoreType, Transport,
};
pub use auth::{Credentials, Token, TokenUpdate, UserGrant};
pub use client::{BeatmapScoreOptions, Client};
pub use cursor::{
    Cursor, CursorState, IndexedCursor, MatchCursor, Page, PageSource, RankingCursor,
    RankingOptions,
};
pub use error::{Error, ErrorKind, Result};
pub use lazy::{AbsentPolicy, LazyConstructor, LazyRef, LazyRefCollection};
pub use structures::{Beatmap, BeatmapUserScore, Beatmapset, Match, Score, User};

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock a mutex, recovering the data if a holder panicked
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
