//! Application-level configuration constants.

// Durable storage slots
pub const CACHE_STORAGE_KEY: &str = "flagboard-cache";
pub const HIDE_SOLVED_KEY: &str = "hide-solved";
pub const HIDE_WEEK_IN_TITLE_KEY: &str = "hide-week-in-title";
pub const CHALLENGE_SEARCH_KEY: &str = "challenge-search-pattern";
pub const CHALLENGE_MARKS_KEY: &str = "challenge-marks";
pub const SCOREBOARD_SEARCH_KEY: &str = "scoreboard-search-pattern";

// Polling
pub const POLL_INTERVAL_MS: u32 = 10_000;

// Remote snapshot endpoints, `{}` is replaced by the game id
pub const TEAM_INFO_ENDPOINT: &str = "/api/game/{}/details";
pub const SCOREBOARD_ENDPOINT: &str = "/api/game/{}/scoreboard";

// Scoreboard
pub const ALL_ORGANIZATIONS: &str = "all";

// Display
pub const BLOOD_TIME_FORMAT: &str = "%y/%m/%d %H:%M:%S";
