//! Focus session lifecycle

use crate::Engine;
use focusbubble_core::{
    checked_end, duration_from_minutes, Error, Result, Session, DEFAULT_SESSION_MINUTES,
};
use tracing::{debug, info};

/// Parameters for starting a session
#[derive(Debug, Clone, Default)]
pub struct StartSession {
    pub user_id: i64,
    pub schedule_id: Option<i64>,
    pub duration_minutes: Option<i64>,
}

impl Engine {
    /// Start a running session. When it references one of the user's
    /// schedules, a block window is opened for each of the schedule's apps
    /// for the session's duration.
    pub async fn start_session(&self, req: &StartSession) -> Result<Session> {
        self.ensure_user(req.user_id).await?;

        let schedule = match req.schedule_id {
            Some(id) => {
                let found = self.db.schedules().get_for_owner(req.user_id, id).await?;
                if found.is_none() {
                    debug!("Schedule {} not found for user {}, ignoring", id, req.user_id);
                }
                found
            }
            None => None,
        };

        let minutes = req
            .duration_minutes
            .or_else(|| schedule.as_ref().map(|s| s.duration_minutes))
            .unwrap_or(DEFAULT_SESSION_MINUTES);
        let duration = duration_from_minutes(minutes)?;
        let started = self.now();
        checked_end(started, duration)?;

        let mut session = Session::start(
            req.user_id,
            schedule.as_ref().map(|s| s.id),
            started,
            duration,
        );
        session.id = self.db.sessions().insert(&session).await?;
        info!(
            "Started session {} for user {} ({} min)",
            session.id, session.user_id, minutes
        );

        if let Some(schedule) = schedule.filter(|s| !s.apps.is_empty()) {
            self.blocks
                .open_for_session(
                    session.user_id,
                    Some(session.id),
                    &schedule.apps,
                    minutes,
                    &[],
                )
                .await?;
        }

        Ok(session)
    }

    pub async fn get_session(&self, session_id: i64) -> Result<Session> {
        self.db
            .sessions()
            .get_by_id(session_id)
            .await?
            .ok_or(Error::SessionNotFound(session_id))
    }

    /// Freeze a running session's countdown. Any other state is returned
    /// unchanged.
    pub async fn pause_session(&self, session_id: i64) -> Result<Session> {
        let mut session = self.get_session(session_id).await?;
        if session.pause(self.now()) {
            if !self.db.sessions().update_state(&session).await? {
                return self.reload_terminal(session_id, "pause").await;
            }
            info!(
                "Paused session {} with {}s remaining",
                session.id,
                session.state.remaining_secs().unwrap_or_default()
            );
        } else {
            debug!("Session {} is {}, pause ignored", session.id, session.status());
        }
        Ok(session)
    }

    /// Restart a paused session's countdown from now. Any other state is
    /// returned unchanged.
    pub async fn resume_session(&self, session_id: i64) -> Result<Session> {
        let mut session = self.get_session(session_id).await?;
        if session.resume(self.now()) {
            if !self.db.sessions().update_state(&session).await? {
                return self.reload_terminal(session_id, "resume").await;
            }
            info!("Resumed session {} until {}", session.id, session.end_time());
        } else {
            debug!("Session {} is {}, resume ignored", session.id, session.status());
        }
        Ok(session)
    }

    /// Stop a session and close its block windows in one transaction. A
    /// session that already finished or was stopped is returned unchanged.
    pub async fn stop_session(&self, session_id: i64) -> Result<Session> {
        let mut session = self.get_session(session_id).await?;
        if !session.stop() {
            debug!("Session {} is {}, stop ignored", session.id, session.status());
            return Ok(session);
        }

        let Some(closed) = self
            .db
            .sessions()
            .stop(&session, self.settings.stop_scope, self.now())
            .await?
        else {
            return self.reload_terminal(session_id, "stop").await;
        };
        info!(
            "Stopped session {} ({} block windows closed, scope {})",
            session.id, closed, self.settings.stop_scope
        );
        Ok(session)
    }

    /// The stored row reached a terminal state after it was read
    async fn reload_terminal(&self, session_id: i64, action: &str) -> Result<Session> {
        let stored = self.get_session(session_id).await?;
        debug!(
            "Session {} became {} concurrently, {} ignored",
            session_id,
            stored.status(),
            action
        );
        Ok(stored)
    }

    /// Running sessions of a user whose deadline has not passed
    pub async fn list_active_sessions(&self, user_id: i64) -> Result<Vec<Session>> {
        self.db.sessions().list_live(user_id, self.now()).await
    }
}
