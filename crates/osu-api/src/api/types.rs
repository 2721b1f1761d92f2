//! osu! v2 API response types.
//!
//! These types mirror the snake_case JSON payloads. Resources that come in a
//! compact and an extended shape carry the extra fields in an optional
//! `extended` part. Which shape was sent is decided by a marker key; once the
//! marker is present a malformed extended field fails the whole payload.

use super::enums::Gamemode;
use chrono::{DateTime, Utc};
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Key whose presence marks a full beatmap
pub const BEATMAP_EXTENDED_MARKER: &str = "accuracy";
/// Key whose presence marks a full beatmapset
pub const BEATMAPSET_EXTENDED_MARKER: &str = "availability";
/// Key whose presence marks a full user profile
pub const USER_EXTENDED_MARKER: &str = "user_achievements";
/// Key whose presence marks a match with its event log
pub const MATCH_EXTENDED_MARKER: &str = "current_game_id";

/// Parse the fields left over after the compact ones as the extended part,
/// but only when `marker` is among them
fn extended_by_marker<'de, D, T>(deserializer: D, marker: &str) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let rest = Map::<String, Value>::deserialize(deserializer)?;
    if !rest.contains_key(marker) {
        return Ok(None);
    }
    T::deserialize(Value::Object(rest))
        .map(Some)
        .map_err(|e| D::Error::custom(format!("extended payload (has `{}`): {}", marker, e)))
}

fn beatmap_extended<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<BeatmapExtendedPayload>, D::Error> {
    extended_by_marker(deserializer, BEATMAP_EXTENDED_MARKER)
}

fn beatmapset_extended<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<BeatmapsetExtendedPayload>, D::Error> {
    extended_by_marker(deserializer, BEATMAPSET_EXTENDED_MARKER)
}

fn user_extended<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<UserExtendedPayload>, D::Error> {
    extended_by_marker(deserializer, USER_EXTENDED_MARKER)
}

fn match_extended<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<MatchExtendedPayload>, D::Error> {
    extended_by_marker(deserializer, MATCH_EXTENDED_MARKER)
}

/// Beatmap (one difficulty)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BeatmapPayload {
    pub id: u64,
    #[serde(default)]
    pub beatmapset_id: Option<u64>,
    pub difficulty_rating: f64,
    pub mode: Gamemode,
    pub status: String,
    pub total_length: u64,
    pub version: String,
    #[serde(default)]
    pub checksum: Option<String>,
    #[serde(default)]
    pub max_combo: Option<u32>,
    #[serde(default)]
    pub failtimes: Option<Failtimes>,
    /// Set the beatmap belongs to, when inlined
    #[serde(default)]
    pub beatmapset: Option<Box<BeatmapsetPayload>>,
    #[serde(flatten, deserialize_with = "beatmap_extended")]
    pub extended: Option<BeatmapExtendedPayload>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Failtimes {
    #[serde(default)]
    pub exit: Option<Vec<u32>>,
    #[serde(default)]
    pub fail: Option<Vec<u32>>,
}

/// Fields only present on a full beatmap
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BeatmapExtendedPayload {
    pub accuracy: f64,
    pub ar: f64,
    pub bpm: f64,
    pub convert: bool,
    pub count_circles: u32,
    pub count_sliders: u32,
    pub count_spinners: u32,
    pub cs: f64,
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
    pub drain: f64,
    pub hit_length: u64,
    pub is_scoreable: bool,
    pub last_updated: DateTime<Utc>,
    pub passcount: u64,
    pub playcount: u64,
    pub ranked: i32,
    pub url: String,
}

/// Beatmapset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BeatmapsetPayload {
    pub id: u64,
    pub artist: String,
    #[serde(default)]
    pub artist_unicode: String,
    pub creator: String,
    #[serde(default)]
    pub favourite_count: u64,
    #[serde(default)]
    pub nsfw: bool,
    #[serde(default)]
    pub play_count: u64,
    #[serde(default)]
    pub preview_url: String,
    #[serde(default)]
    pub source: String,
    pub status: String,
    pub title: String,
    #[serde(default)]
    pub title_unicode: String,
    /// Mapper
    pub user_id: u64,
    #[serde(default)]
    pub video: bool,
    /// Difficulties, when inlined
    #[serde(default)]
    pub beatmaps: Option<Vec<BeatmapPayload>>,
    /// Mapper, when inlined
    #[serde(default)]
    pub user: Option<UserPayload>,
    #[serde(flatten, deserialize_with = "beatmapset_extended")]
    pub extended: Option<BeatmapsetExtendedPayload>,
}

/// Fields only present on a full beatmapset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BeatmapsetExtendedPayload {
    pub availability: Availability,
    pub bpm: f64,
    pub can_be_hyped: bool,
    pub discussion_enabled: bool,
    pub discussion_locked: bool,
    /// `None` for sets that cannot be hyped
    #[serde(default)]
    pub hype: Option<Progress>,
    pub is_scoreable: bool,
    pub last_updated: DateTime<Utc>,
    #[serde(default)]
    pub legacy_thread_url: Option<String>,
    #[serde(default)]
    pub nominations: Option<Progress>,
    pub ranked: i32,
    #[serde(default)]
    pub ranked_date: Option<DateTime<Utc>>,
    pub storyboard: bool,
    #[serde(default)]
    pub submitted_date: Option<DateTime<Utc>>,
    pub tags: String,
    /// Difficulties converted to other modes
    #[serde(default)]
    pub converts: Option<Vec<BeatmapPayload>>,
    #[serde(default)]
    pub description: Option<Description>,
    #[serde(default)]
    pub genre: Option<NamedId>,
    #[serde(default)]
    pub language: Option<NamedId>,
    /// Vote counts for ratings 0 through 10
    #[serde(default)]
    pub ratings: Option<Vec<u32>>,
    #[serde(default)]
    pub recent_favourites: Option<Vec<UserPayload>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Availability {
    pub download_disabled: bool,
    #[serde(default)]
    pub more_information: Option<String>,
}

/// Hype or nomination count against the requirement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub current: u32,
    pub required: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Description {
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedId {
    pub id: u64,
    pub name: String,
}

/// User
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserPayload {
    pub id: u64,
    pub username: String,
    #[serde(default)]
    pub avatar_url: String,
    #[serde(default)]
    pub country_code: String,
    #[serde(default)]
    pub default_group: Option<String>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(default)]
    pub is_deleted: bool,
    #[serde(default)]
    pub is_online: bool,
    #[serde(default)]
    pub is_supporter: bool,
    #[serde(default)]
    pub last_visit: Option<DateTime<Utc>>,
    #[serde(default)]
    pub profile_colour: Option<String>,
    #[serde(default)]
    pub statistics: Option<UserStatisticsPayload>,
    #[serde(flatten, deserialize_with = "user_extended")]
    pub extended: Option<UserExtendedPayload>,
}

/// Fields only present on a full user profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserExtendedPayload {
    pub user_achievements: Vec<UserAchievement>,
    pub join_date: DateTime<Utc>,
    pub playmode: Gamemode,
    pub country: Country,
    pub kudosu: Kudosu,
    #[serde(default)]
    pub discord: Option<String>,
    #[serde(default)]
    pub interests: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub occupation: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub twitter: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub playstyle: Option<Vec<String>>,
    #[serde(default)]
    pub post_count: u64,
    #[serde(default)]
    pub has_supported: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAchievement {
    pub achievement_id: u64,
    pub achieved_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Country {
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Kudosu {
    pub available: i64,
    pub total: i64,
}

/// Per-mode statistics; rankings attach the user they belong to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserStatisticsPayload {
    #[serde(default)]
    pub global_rank: Option<u64>,
    #[serde(default)]
    pub country_rank: Option<u64>,
    #[serde(default)]
    pub pp: f64,
    #[serde(default)]
    pub hit_accuracy: f64,
    #[serde(default)]
    pub play_count: u64,
    #[serde(default)]
    pub play_time: Option<u64>,
    #[serde(default)]
    pub ranked_score: u64,
    #[serde(default)]
    pub total_score: u64,
    #[serde(default)]
    pub maximum_combo: u32,
    #[serde(default)]
    pub is_ranked: bool,
    #[serde(default)]
    pub level: Level,
    #[serde(default)]
    pub grade_counts: GradeCounts,
    #[serde(default)]
    pub user: Option<Box<UserPayload>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Level {
    pub current: u32,
    pub progress: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GradeCounts {
    pub ss: u32,
    pub ssh: u32,
    pub s: u32,
    pub sh: u32,
    pub a: u32,
}

/// Score
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScorePayload {
    pub id: u64,
    #[serde(default)]
    pub best_id: Option<u64>,
    pub user_id: u64,
    pub accuracy: f64,
    pub created_at: DateTime<Utc>,
    pub max_combo: u32,
    pub mode: Gamemode,
    #[serde(default)]
    pub mods: Vec<String>,
    pub passed: bool,
    #[serde(default)]
    pub perfect: bool,
    #[serde(default)]
    pub pp: Option<f64>,
    pub rank: String,
    #[serde(default)]
    pub replay: bool,
    pub score: u64,
    #[serde(default)]
    pub statistics: ScoreStatistics,
    #[serde(default)]
    pub beatmap: Option<BeatmapPayload>,
    #[serde(default)]
    pub beatmapset: Option<BeatmapsetPayload>,
    #[serde(default)]
    pub rank_country: Option<u64>,
    #[serde(default)]
    pub rank_global: Option<u64>,
    #[serde(default)]
    pub user: Option<UserPayload>,
    /// Only sent for a user's best scores
    #[serde(default)]
    pub weight: Option<Weight>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoreStatistics {
    #[serde(default)]
    pub count_50: u32,
    #[serde(default)]
    pub count_100: u32,
    #[serde(default)]
    pub count_300: u32,
    #[serde(default)]
    pub count_geki: u32,
    #[serde(default)]
    pub count_katu: u32,
    #[serde(default)]
    pub count_miss: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Weight {
    pub percentage: f64,
    pub pp: f64,
}

/// Beatmap leaderboard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BeatmapScoresPayload {
    pub scores: Vec<ScorePayload>,
    #[serde(default, rename = "userScore")]
    pub user_score: Option<BeatmapUserScorePayload>,
}

/// A user's position on a beatmap leaderboard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BeatmapUserScorePayload {
    pub position: u64,
    pub score: ScorePayload,
}

/// Multiplayer match header
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchInfoPayload {
    pub id: u64,
    pub name: String,
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
}

/// Multiplayer match
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchPayload {
    #[serde(rename = "match")]
    pub info: MatchInfoPayload,
    #[serde(flatten, deserialize_with = "match_extended")]
    pub extended: Option<MatchExtendedPayload>,
}

/// Event log and participants of a match
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchExtendedPayload {
    pub events: Vec<MatchEventPayload>,
    pub users: Vec<UserPayload>,
    pub first_event_id: u64,
    pub latest_event_id: u64,
    #[serde(default)]
    pub current_game_id: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchEventPayload {
    pub id: u64,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub user_id: Option<u64>,
    #[serde(default)]
    pub detail: Value,
}

/// One page of `/matches`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchesPayload {
    pub matches: Vec<MatchInfoPayload>,
    #[serde(default)]
    pub cursor: Option<MatchesCursorPayload>,
    /// Parameters the server used; sent back with the next page
    #[serde(default)]
    pub params: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchesCursorPayload {
    pub match_id: u64,
}

/// One page of `/rankings`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingsPayload {
    pub ranking: Vec<UserStatisticsPayload>,
    #[serde(default)]
    pub cursor: Option<RankingsCursorPayload>,
    /// Approximate size of the table
    #[serde(default)]
    pub total: u64,
    /// Chart beatmapsets, for spotlight rankings only
    #[serde(default)]
    pub beatmapsets: Option<Vec<BeatmapsetPayload>>,
    #[serde(default)]
    pub spotlight: Option<SpotlightPayload>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingsCursorPayload {
    pub page: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotlightPayload {
    pub id: u64,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[serde(default)]
    pub mode_specific: bool,
    #[serde(default)]
    pub participant_count: Option<u64>,
}

/// Render a JSON value the way it appears in a query string
pub(crate) fn query_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
