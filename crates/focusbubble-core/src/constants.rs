//! Constants and default values for FocusBubble

use std::path::PathBuf;

/// Default FocusBubble home directory name
pub const FOCUSBUBBLE_DIR: &str = ".focusbubble";

/// Default database file name
pub const DB_FILE: &str = "focusbubble.db";

/// Default HTTP bind address
pub const DEFAULT_BIND: &str = "127.0.0.1:8000";

/// Default config file names to search for (in priority order)
pub const CONFIG_FILES: &[&str] = &[
    "focusbubble.toml",
    "focusbubble.yaml",
    "focusbubble.yml",
    "focusbubble.json",
];

/// Default expiry sweep period in seconds
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 30;

/// Duration of a directly created block window when no end time is given
pub const DEFAULT_BLOCK_MINUTES: i64 = 25;

/// Default session length when neither the request nor a schedule names one
pub const DEFAULT_SESSION_MINUTES: i64 = 25;

/// Longest session, schedule or block window accepted, in minutes (366 days)
pub const MAX_DURATION_MINUTES: i64 = 366 * 24 * 60;

/// Default schedule label
pub const DEFAULT_SCHEDULE_LABEL: &str = "Focus";

/// Google token-info endpoint used to verify identity tokens
pub const DEFAULT_IDENTITY_ENDPOINT: &str = "https://oauth2.googleapis.com/tokeninfo";

/// Get the FocusBubble home directory
pub fn focusbubble_home() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(FOCUSBUBBLE_DIR))
        .unwrap_or_else(|| PathBuf::from(FOCUSBUBBLE_DIR))
}

/// Get the database path
pub fn db_path() -> PathBuf {
    focusbubble_home().join(DB_FILE)
}
