//! Error types for FocusBubble

use std::path::PathBuf;

/// FocusBubble error type
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("User not found: {0}")]
    UserNotFound(i64),

    #[error("Schedule not found: {0}")]
    ScheduleNotFound(i64),

    #[error("Session not found: {0}")]
    SessionNotFound(i64),

    #[error("Invalid identity token: {0}")]
    InvalidToken(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid session status: {0}")]
    InvalidStatus(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Config file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("Database error: {0}")]
    DbError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("YAML parse error: {0}")]
    YamlError(#[from] serde_yaml::Error),
}

/// Result type alias for FocusBubble
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::ConfigError(msg.into())
    }

    pub fn db<S: Into<String>>(msg: S) -> Self {
        Error::DbError(msg.into())
    }

    pub fn validation<S: Into<String>>(msg: S) -> Self {
        Error::Validation(msg.into())
    }

    pub fn invalid_token<S: Into<String>>(msg: S) -> Self {
        Error::InvalidToken(msg.into())
    }

    /// True for any of the "referenced entity is absent" variants
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::UserNotFound(_) | Error::ScheduleNotFound(_) | Error::SessionNotFound(_)
        )
    }
}
