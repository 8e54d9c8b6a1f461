//! Focus session lifecycle
//!
//! A session is `running` with a live deadline, `paused` with a frozen
//! countdown, or terminal (`finished` / `stopped`). The state is a tagged
//! variant so a live deadline and a frozen countdown can never both be
//! authoritative. Transitions are pure: they take `now` and mutate in place,
//! returning whether anything changed. Persistence lives elsewhere.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{Error, Result};

/// Flat status label, as persisted and reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Running,
    Paused,
    Finished,
    Stopped,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Running => "running",
            SessionStatus::Paused => "paused",
            SessionStatus::Finished => "finished",
            SessionStatus::Stopped => "stopped",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Finished | SessionStatus::Stopped)
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SessionStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "running" => Ok(SessionStatus::Running),
            "paused" => Ok(SessionStatus::Paused),
            "finished" => Ok(SessionStatus::Finished),
            "stopped" => Ok(SessionStatus::Stopped),
            _ => Err(Error::InvalidStatus(s.to_string())),
        }
    }
}

/// Session state with exactly the data that is meaningful in that state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Running {
        end_time: DateTime<Utc>,
    },
    /// `remaining_secs` may be zero or negative when paused past the deadline
    Paused {
        paused_at: DateTime<Utc>,
        remaining_secs: i64,
    },
    Finished {
        end_time: DateTime<Utc>,
    },
    Stopped {
        end_time: DateTime<Utc>,
    },
}

impl SessionState {
    pub fn status(&self) -> SessionStatus {
        match self {
            SessionState::Running { .. } => SessionStatus::Running,
            SessionState::Paused { .. } => SessionStatus::Paused,
            SessionState::Finished { .. } => SessionStatus::Finished,
            SessionState::Stopped { .. } => SessionStatus::Stopped,
        }
    }

    /// Deadline as reported to clients. For a paused session this is the
    /// deadline it had when it was paused.
    pub fn end_time(&self) -> DateTime<Utc> {
        match self {
            SessionState::Running { end_time }
            | SessionState::Finished { end_time }
            | SessionState::Stopped { end_time } => *end_time,
            SessionState::Paused {
                paused_at,
                remaining_secs,
            } => *paused_at + Duration::seconds(*remaining_secs),
        }
    }

    pub fn is_paused(&self) -> bool {
        matches!(self, SessionState::Paused { .. })
    }

    pub fn paused_at(&self) -> Option<DateTime<Utc>> {
        match self {
            SessionState::Paused { paused_at, .. } => Some(*paused_at),
            _ => None,
        }
    }

    pub fn remaining_secs(&self) -> Option<i64> {
        match self {
            SessionState::Paused { remaining_secs, .. } => Some(*remaining_secs),
            _ => None,
        }
    }

    /// Rebuild a state from its persisted columns.
    ///
    /// A `paused` row must carry both `paused_at` and `remaining_seconds`;
    /// the pause columns of any other row are ignored.
    pub fn from_columns(
        status: SessionStatus,
        end_time: DateTime<Utc>,
        paused_at: Option<DateTime<Utc>>,
        remaining_secs: Option<i64>,
    ) -> Result<Self> {
        match status {
            SessionStatus::Running => Ok(SessionState::Running { end_time }),
            SessionStatus::Finished => Ok(SessionState::Finished { end_time }),
            SessionStatus::Stopped => Ok(SessionState::Stopped { end_time }),
            SessionStatus::Paused => match (paused_at, remaining_secs) {
                (Some(paused_at), Some(remaining_secs)) => Ok(SessionState::Paused {
                    paused_at,
                    remaining_secs,
                }),
                _ => Err(Error::InvalidStatus(
                    "paused session without a frozen countdown".to_string(),
                )),
            },
        }
    }
}

/// A focus session owned by one user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: i64,
    pub user_id: i64,
    pub schedule_id: Option<i64>,
    pub start_time: DateTime<Utc>,
    pub state: SessionState,
}

impl Session {
    /// A fresh running session; `id` is assigned on insert
    pub fn start(
        user_id: i64,
        schedule_id: Option<i64>,
        now: DateTime<Utc>,
        duration: Duration,
    ) -> Self {
        Self {
            id: 0,
            user_id,
            schedule_id,
            start_time: now,
            state: SessionState::Running {
                end_time: now + duration,
            },
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.state.status()
    }

    pub fn end_time(&self) -> DateTime<Utc> {
        self.state.end_time()
    }

    pub fn is_terminal(&self) -> bool {
        self.status().is_terminal()
    }

    /// Running with a deadline still in the future
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        matches!(self.state, SessionState::Running { end_time } if end_time > now)
    }

    /// Freeze the countdown. No-op unless running.
    pub fn pause(&mut self, now: DateTime<Utc>) -> bool {
        let SessionState::Running { end_time } = self.state else {
            return false;
        };
        self.state = SessionState::Paused {
            paused_at: now,
            remaining_secs: (end_time - now).num_seconds(),
        };
        true
    }

    /// Restart the countdown from `now`. No-op unless paused.
    pub fn resume(&mut self, now: DateTime<Utc>) -> bool {
        let SessionState::Paused { remaining_secs, .. } = self.state else {
            return false;
        };
        self.state = SessionState::Running {
            end_time: now + Duration::seconds(remaining_secs),
        };
        true
    }

    /// Stop from any non-terminal state. Terminal sessions are left untouched.
    pub fn stop(&mut self) -> bool {
        if self.is_terminal() {
            return false;
        }
        self.state = SessionState::Stopped {
            end_time: self.end_time(),
        };
        true
    }

    /// Finish a running session whose deadline has passed. Paused sessions
    /// never expire.
    pub fn expire(&mut self, now: DateTime<Utc>) -> bool {
        match self.state {
            SessionState::Running { end_time } if end_time <= now => {
                self.state = SessionState::Finished { end_time };
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap()
    }

    fn started(minutes: i64) -> Session {
        Session::start(1, None, t0(), Duration::minutes(minutes))
    }

    #[test]
    fn test_start_sets_deadline() {
        let session = started(25);
        assert_eq!(session.status(), SessionStatus::Running);
        assert_eq!(session.end_time(), t0() + Duration::minutes(25));
        assert!(session.is_live(t0()));
    }

    #[test]
    fn test_pause_freezes_remaining() {
        let mut session = started(25);
        assert!(session.pause(t0() + Duration::minutes(5)));
        assert_eq!(session.status(), SessionStatus::Paused);
        assert_eq!(session.state.remaining_secs(), Some(1200));
        assert_eq!(session.state.paused_at(), Some(t0() + Duration::minutes(5)));
        // reported deadline is unchanged while paused
        assert_eq!(session.end_time(), t0() + Duration::minutes(25));
    }

    #[test]
    fn test_pause_twice_is_noop() {
        let mut session = started(25);
        assert!(session.pause(t0() + Duration::minutes(5)));
        let after_first = session.clone();

        assert!(!session.pause(t0() + Duration::minutes(10)));
        assert_eq!(session, after_first);
    }

    #[test]
    fn test_pause_past_deadline_goes_negative() {
        let mut session = started(1);
        session.pause(t0() + Duration::seconds(90));
        assert_eq!(session.state.remaining_secs(), Some(-30));
    }

    #[test]
    fn test_remaining_truncates_toward_zero() {
        let mut session = started(1);
        session.pause(t0() + Duration::milliseconds(500));
        assert_eq!(session.state.remaining_secs(), Some(59));

        let mut late = started(1);
        late.pause(t0() + Duration::milliseconds(60_500));
        assert_eq!(late.state.remaining_secs(), Some(0));
    }

    #[test]
    fn test_resume_preserves_remaining() {
        let mut session = started(25);
        let t1 = t0() + Duration::minutes(5);
        let t2 = t0() + Duration::minutes(65);
        session.pause(t1);
        assert!(session.resume(t2));

        let original_deadline = t0() + Duration::minutes(25);
        assert_eq!(session.status(), SessionStatus::Running);
        assert_eq!(session.end_time(), t2 + (original_deadline - t1));
        assert_eq!(session.end_time(), t0() + Duration::minutes(85));
        assert!(session.state.paused_at().is_none());
        assert!(session.state.remaining_secs().is_none());
    }

    #[test]
    fn test_resume_with_negative_remaining_lands_in_past() {
        let mut session = started(1);
        session.pause(t0() + Duration::seconds(90));
        let resumed_at = t0() + Duration::minutes(10);
        session.resume(resumed_at);
        assert_eq!(session.end_time(), resumed_at - Duration::seconds(30));
        assert!(!session.is_live(resumed_at));
        assert!(session.expire(resumed_at));
    }

    #[test]
    fn test_resume_when_running_is_noop() {
        let mut session = started(25);
        let before = session.clone();
        assert!(!session.resume(t0() + Duration::minutes(1)));
        assert_eq!(session, before);
    }

    #[test]
    fn test_stop_from_running_and_paused() {
        let mut running = started(25);
        assert!(running.stop());
        assert_eq!(running.status(), SessionStatus::Stopped);

        let mut paused = started(25);
        paused.pause(t0() + Duration::minutes(5));
        assert!(paused.stop());
        assert_eq!(paused.status(), SessionStatus::Stopped);
        assert!(paused.state.remaining_secs().is_none());
        assert!(!paused.state.is_paused());
    }

    #[test]
    fn test_terminal_sessions_never_change() {
        let mut session = started(25);
        session.stop();
        let stopped = session.clone();

        let later = t0() + Duration::hours(2);
        assert!(!session.stop());
        assert!(!session.pause(later));
        assert!(!session.resume(later));
        assert!(!session.expire(later));
        assert_eq!(session, stopped);
    }

    #[test]
    fn test_expire_only_running_past_deadline() {
        let mut session = started(25);
        assert!(!session.expire(t0() + Duration::minutes(24)));
        assert!(session.expire(t0() + Duration::minutes(25)));
        assert_eq!(session.status(), SessionStatus::Finished);

        let mut paused = started(25);
        paused.pause(t0() + Duration::minutes(5));
        assert!(!paused.expire(t0() + Duration::hours(3)));
        assert_eq!(paused.status(), SessionStatus::Paused);
    }

    #[test]
    fn test_state_from_columns() {
        let end = t0() + Duration::minutes(25);
        let state = SessionState::from_columns(SessionStatus::Running, end, None, None).unwrap();
        assert_eq!(state, SessionState::Running { end_time: end });

        let paused = SessionState::from_columns(
            SessionStatus::Paused,
            end,
            Some(t0() + Duration::minutes(5)),
            Some(1200),
        )
        .unwrap();
        assert_eq!(paused.remaining_secs(), Some(1200));

        let broken = SessionState::from_columns(SessionStatus::Paused, end, None, Some(10));
        assert!(matches!(broken, Err(Error::InvalidStatus(_))));
    }

    #[test]
    fn test_status_parse() {
        assert_eq!("running".parse::<SessionStatus>().unwrap(), SessionStatus::Running);
        assert_eq!("Paused".parse::<SessionStatus>().unwrap(), SessionStatus::Paused);
        assert!("sleeping".parse::<SessionStatus>().is_err());
        assert!(SessionStatus::Finished.is_terminal());
        assert!(!SessionStatus::Paused.is_terminal());
    }
}
