//! Core types for FocusBubble

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::constants::*;
use crate::error::{Error, Result};
use crate::limits::{duration_from_minutes, ensure_storable};

fn default_label() -> String {
    DEFAULT_SCHEDULE_LABEL.to_string()
}

fn default_duration_minutes() -> i64 {
    DEFAULT_SESSION_MINUTES
}

/// An account, keyed by verified email
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: Option<String>,
    pub picture: Option<String>,
}

/// Profile fields used to find or create a user
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewUser {
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
}

/// A reusable template: a set of apps and a default duration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub id: i64,
    pub user_id: i64,
    pub label: String,
    pub duration_minutes: i64,
    /// Package identifiers, in the order they were given
    pub apps: Vec<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Schedule creation request
#[derive(Debug, Clone, Deserialize)]
pub struct NewSchedule {
    #[serde(default = "default_label")]
    pub label: String,
    #[serde(default = "default_duration_minutes")]
    pub duration_minutes: i64,
    #[serde(default)]
    pub apps: Vec<String>,
    #[serde(default)]
    pub is_active: bool,
}

impl Default for NewSchedule {
    fn default() -> Self {
        Self {
            label: default_label(),
            duration_minutes: default_duration_minutes(),
            apps: Vec::new(),
            is_active: false,
        }
    }
}

impl NewSchedule {
    pub fn validate(&self) -> Result<()> {
        duration_from_minutes(self.duration_minutes)?;
        if self.apps.iter().any(|a| a.trim().is_empty()) {
            return Err(Error::validation("app package names must not be empty"));
        }
        Ok(())
    }
}

/// One interval during which one app is blocked
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockWindow {
    pub id: i64,
    pub user_id: i64,
    /// Session that opened this window, if any
    pub session_id: Option<i64>,
    pub package_name: String,
    pub app_name: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub is_active: bool,
}

impl BlockWindow {
    /// Active flag set and end still ahead. The flag alone lags behind the
    /// sweeper, so both must hold.
    pub fn is_in_effect(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.end_time > now
    }
}

/// Direct window creation request
#[derive(Debug, Clone, Deserialize)]
pub struct NewBlock {
    pub package_name: String,
    #[serde(default)]
    pub app_name: Option<String>,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
}

impl NewBlock {
    pub fn validate(&self) -> Result<()> {
        if self.package_name.trim().is_empty() {
            return Err(Error::validation("package_name must not be empty"));
        }
        if let Some(start) = self.start_time {
            ensure_storable(start)?;
        }
        if let Some(end) = self.end_time {
            ensure_storable(end)?;
        }
        if let (Some(start), Some(end)) = (self.start_time, self.end_time) {
            if end < start {
                return Err(Error::validation("end_time must not precede start_time"));
            }
        }
        Ok(())
    }
}

/// Which windows a session stop closes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopScope {
    /// Only windows opened by the stopped session
    #[default]
    Session,
    /// Every active window of the session's owner
    Owner,
}

impl StopScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            StopScope::Session => "session",
            StopScope::Owner => "owner",
        }
    }
}

impl std::fmt::Display for StopScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for StopScope {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "session" => Ok(StopScope::Session),
            "owner" => Ok(StopScope::Owner),
            _ => Err(Error::config(format!(
                "Invalid stop scope '{}'. Expected 'session' or 'owner'",
                s
            ))),
        }
    }
}
