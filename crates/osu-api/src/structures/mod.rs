//! Entities built from API payloads.
//!
//! Entities link to each other through [`LazyRef`](crate::lazy::LazyRef)s,
//! pre-seeded with whatever the payload already inlined.

mod beatmap;
mod beatmapset;
mod multiplayer;
mod score;
mod user;

pub use beatmap::Beatmap;
pub use beatmapset::Beatmapset;
pub use multiplayer::Match;
pub use score::{BeatmapUserScore, Score};
pub use user::User;
