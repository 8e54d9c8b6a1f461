//! Sessions repository - focus session persistence
//!
//! The tagged [`SessionState`] is flattened into the `status`, `end_time`,
//! `paused`, `paused_at` and `remaining_seconds` columns on write and
//! rebuilt (and validated) on read.

use chrono::{DateTime, Utc};
use focusbubble_core::{Error, Result, Session, SessionState, SessionStatus, StopScope};
use sqlx::sqlite::SqlitePool;
use sqlx::{Row, SqliteExecutor};

use crate::blocks::{close_owner_windows, close_session_windows};
use crate::{decode_ts, encode_ts};

const SESSION_COLUMNS: &str =
    "id, user_id, schedule_id, start_time, end_time, status, paused, paused_at, remaining_seconds";

/// Repository for session operations
pub struct SessionsRepository {
    pool: SqlitePool,
}

impl SessionsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new session, returning its id
    pub async fn insert(&self, session: &Session) -> Result<i64> {
        let cols = StateColumns::from(&session.state);

        let result = sqlx::query(
            r#"
            INSERT INTO sessions (
                user_id, schedule_id, start_time, end_time, status, paused, paused_at, remaining_seconds
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(session.user_id)
        .bind(session.schedule_id)
        .bind(encode_ts(session.start_time))
        .bind(&cols.end_time)
        .bind(cols.status.as_str())
        .bind(cols.paused)
        .bind(&cols.paused_at)
        .bind(cols.remaining_seconds)
        .execute(&self.pool)
        .await
        .map_err(|e| Error::DbError(e.to_string()))?;

        Ok(result.last_insert_rowid())
    }

    /// Get session by ID
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Session>> {
        let row = sqlx::query(&format!("SELECT {} FROM sessions WHERE id = ?", SESSION_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| Error::DbError(e.to_string()))?;

        match row {
            Some(row) => Ok(Some(row_to_session(&row)?)),
            None => Ok(None),
        }
    }

    /// Persist a session's current state. A row already finished or stopped
    /// is left alone and `false` is returned.
    pub async fn update_state(&self, session: &Session) -> Result<bool> {
        write_state(&self.pool, session).await
    }

    /// Persist a stopped session and close its windows in one transaction.
    /// Returns the number of windows closed, or `None` when the stored row
    /// was already finished or stopped and nothing changed.
    pub async fn stop(
        &self,
        session: &Session,
        scope: StopScope,
        now: DateTime<Utc>,
    ) -> Result<Option<u64>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| Error::DbError(e.to_string()))?;

        if !write_state(&mut *tx, session).await? {
            return Ok(None);
        }
        let closed = match scope {
            StopScope::Session => close_session_windows(&mut *tx, session.id, now).await?,
            StopScope::Owner => close_owner_windows(&mut *tx, session.user_id, now).await?,
        };

        tx.commit()
            .await
            .map_err(|e| Error::DbError(e.to_string()))?;

        Ok(Some(closed))
    }

    /// Running sessions of a user whose deadline is still ahead
    pub async fn list_live(&self, user_id: i64, now: DateTime<Utc>) -> Result<Vec<Session>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {} FROM sessions
            WHERE user_id = ? AND status = 'running' AND end_time > ?
            ORDER BY id
            "#,
            SESSION_COLUMNS
        ))
        .bind(user_id)
        .bind(encode_ts(now))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| Error::DbError(e.to_string()))?;

        rows.iter().map(row_to_session).collect()
    }

    /// Mark every running session whose deadline has passed as finished,
    /// across all users. Paused sessions are never touched.
    pub async fn finish_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE sessions SET status = 'finished' WHERE status = 'running' AND end_time <= ?",
        )
        .bind(encode_ts(now))
        .execute(&self.pool)
        .await
        .map_err(|e| Error::DbError(e.to_string()))?;

        Ok(result.rows_affected())
    }
}

/// Column image of a [`SessionState`]
struct StateColumns {
    status: SessionStatus,
    end_time: String,
    paused: bool,
    paused_at: Option<String>,
    remaining_seconds: Option<i64>,
}

impl From<&SessionState> for StateColumns {
    fn from(state: &SessionState) -> Self {
        Self {
            status: state.status(),
            end_time: encode_ts(state.end_time()),
            paused: state.is_paused(),
            paused_at: state.paused_at().map(encode_ts),
            remaining_seconds: state.remaining_secs(),
        }
    }
}

/// Terminal rows are never rewritten, so a pause or resume racing the
/// sweeper cannot revive a finished session.
async fn write_state<'e, E>(exec: E, session: &Session) -> Result<bool>
where
    E: SqliteExecutor<'e>,
{
    let cols = StateColumns::from(&session.state);

    let result = sqlx::query(
        r#"
        UPDATE sessions
        SET status = ?, end_time = ?, paused = ?, paused_at = ?, remaining_seconds = ?
        WHERE id = ? AND status NOT IN ('finished', 'stopped')
        "#,
    )
    .bind(cols.status.as_str())
    .bind(&cols.end_time)
    .bind(cols.paused)
    .bind(&cols.paused_at)
    .bind(cols.remaining_seconds)
    .bind(session.id)
    .execute(exec)
    .await
    .map_err(|e| Error::DbError(e.to_string()))?;

    Ok(result.rows_affected() > 0)
}

fn row_to_session(row: &sqlx::sqlite::SqliteRow) -> Result<Session> {
    let status_str: String = row.get("status");
    let start_time: String = row.get("start_time");
    let end_time: String = row.get("end_time");
    let paused_at: Option<String> = row.get("paused_at");
    let remaining_seconds: Option<i64> = row.get("remaining_seconds");

    let status: SessionStatus = status_str.parse()?;
    let paused_at = paused_at.as_deref().map(decode_ts).transpose()?;
    let state = SessionState::from_columns(status, decode_ts(&end_time)?, paused_at, remaining_seconds)?;

    Ok(Session {
        id: row.get("id"),
        user_id: row.get("user_id"),
        schedule_id: row.get("schedule_id"),
        start_time: decode_ts(&start_time)?,
        state,
    })
}
