//! Endpoint templates of the osu! v2 API.

/// Prefix of every API resource
pub const API_PREFIX: &str = "/api/v2";

/// OAuth token exchange
pub const TOKEN: &str = "/oauth/token";

pub const BEATMAP_LOOKUP: &str = "/api/v2/beatmaps/lookup";
pub const BEATMAP_SCORES: &str = "/api/v2/beatmaps/{beatmap}/scores";
pub const BEATMAP_USER_SCORE: &str = "/api/v2/beatmaps/{beatmap}/scores/users/{user}";

pub const BEATMAPSET_SINGLE: &str = "/api/v2/beatmapsets/{beatmapset}";

pub const MATCHES: &str = "/api/v2/matches";
pub const MATCH_SINGLE: &str = "/api/v2/matches/{match}";

pub const RANKINGS: &str = "/api/v2/rankings/{mode}/{type}";

pub const USER_SINGLE: &str = "/api/v2/users/{user}";
pub const USER_SINGLE_MODE: &str = "/api/v2/users/{user}/{mode}";
pub const USER_SCORES: &str = "/api/v2/users/{user}/scores/{type}";

/// Largest page the API returns for offset-paginated resources
pub const MAX_PAGE_SIZE: usize = 100;

/// Fixed page size of the rankings resource
pub const RANKING_PAGE_SIZE: usize = 50;
