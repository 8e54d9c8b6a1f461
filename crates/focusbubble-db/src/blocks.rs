//! Blocked-app windows repository

use chrono::{DateTime, Utc};
use focusbubble_core::{BlockWindow, Error, Result};
use sqlx::sqlite::SqlitePool;
use sqlx::{Row, SqliteExecutor};

use crate::{decode_ts, encode_ts};

const WINDOW_COLUMNS: &str =
    "id, user_id, session_id, package_name, app_name, start_time, end_time, is_active";

/// Repository for blocking windows
pub struct BlocksRepository {
    pool: SqlitePool,
}

impl BlocksRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert windows in one transaction. Returned windows carry their new ids.
    ///
    /// Always additive: existing windows for the same package are left alone.
    pub async fn insert_all(&self, windows: &[BlockWindow]) -> Result<Vec<BlockWindow>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| Error::DbError(e.to_string()))?;

        let mut created = Vec::with_capacity(windows.len());
        for window in windows {
            let result = sqlx::query(
                r#"
                INSERT INTO blocked_apps (
                    user_id, session_id, package_name, app_name, start_time, end_time, is_active
                ) VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(window.user_id)
            .bind(window.session_id)
            .bind(&window.package_name)
            .bind(&window.app_name)
            .bind(encode_ts(window.start_time))
            .bind(encode_ts(window.end_time))
            .bind(window.is_active)
            .execute(&mut *tx)
            .await
            .map_err(|e| Error::DbError(e.to_string()))?;

            created.push(BlockWindow {
                id: result.last_insert_rowid(),
                ..window.clone()
            });
        }

        tx.commit()
            .await
            .map_err(|e| Error::DbError(e.to_string()))?;

        Ok(created)
    }

    /// Get window by ID
    pub async fn get_by_id(&self, id: i64) -> Result<Option<BlockWindow>> {
        let row = sqlx::query(&format!("SELECT {} FROM blocked_apps WHERE id = ?", WINDOW_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| Error::DbError(e.to_string()))?;

        match row {
            Some(row) => Ok(Some(row_to_window(&row)?)),
            None => Ok(None),
        }
    }

    /// Windows currently in effect for a user: flagged active AND ending after `now`.
    /// Rows the sweeper has not reached yet are filtered out by the time check.
    pub async fn list_in_effect(&self, user_id: i64, now: DateTime<Utc>) -> Result<Vec<BlockWindow>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {} FROM blocked_apps
            WHERE user_id = ? AND is_active = 1 AND end_time > ?
            ORDER BY id
            "#,
            WINDOW_COLUMNS
        ))
        .bind(user_id)
        .bind(encode_ts(now))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| Error::DbError(e.to_string()))?;

        rows.iter().map(row_to_window).collect()
    }

    /// All windows opened by a session, regardless of state
    pub async fn list_by_session(&self, session_id: i64) -> Result<Vec<BlockWindow>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM blocked_apps WHERE session_id = ? ORDER BY id",
            WINDOW_COLUMNS
        ))
        .bind(session_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| Error::DbError(e.to_string()))?;

        rows.iter().map(row_to_window).collect()
    }

    /// Number of windows still flagged active for a user, stale or not
    pub async fn count_flagged_active(&self, user_id: i64) -> Result<u64> {
        let row: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM blocked_apps WHERE user_id = ? AND is_active = 1")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| Error::DbError(e.to_string()))?;

        Ok(row.0 as u64)
    }

    /// Close every active window of a user, snapping its end to `now`
    pub async fn close_for_owner(&self, user_id: i64, now: DateTime<Utc>) -> Result<u64> {
        close_owner_windows(&self.pool, user_id, now).await
    }

    /// Deactivate every active window whose end has passed, across all users.
    /// Re-running is a no-op that reports zero.
    pub async fn deactivate_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE blocked_apps SET is_active = 0 WHERE is_active = 1 AND end_time <= ?",
        )
        .bind(encode_ts(now))
        .execute(&self.pool)
        .await
        .map_err(|e| Error::DbError(e.to_string()))?;

        Ok(result.rows_affected())
    }
}

pub(crate) async fn close_owner_windows<'e, E>(exec: E, user_id: i64, now: DateTime<Utc>) -> Result<u64>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query(
        "UPDATE blocked_apps SET is_active = 0, end_time = ? WHERE user_id = ? AND is_active = 1",
    )
    .bind(encode_ts(now))
    .bind(user_id)
    .execute(exec)
    .await
    .map_err(|e| Error::DbError(e.to_string()))?;

    Ok(result.rows_affected())
}

/// Close every active window opened by a session, snapping its end to `now`
pub(crate) async fn close_session_windows<'e, E>(
    exec: E,
    session_id: i64,
    now: DateTime<Utc>,
) -> Result<u64>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query(
        "UPDATE blocked_apps SET is_active = 0, end_time = ? WHERE session_id = ? AND is_active = 1",
    )
    .bind(encode_ts(now))
    .bind(session_id)
    .execute(exec)
    .await
    .map_err(|e| Error::DbError(e.to_string()))?;

    Ok(result.rows_affected())
}

fn row_to_window(row: &sqlx::sqlite::SqliteRow) -> Result<BlockWindow> {
    let start_time: String = row.get("start_time");
    let end_time: String = row.get("end_time");

    Ok(BlockWindow {
        id: row.get("id"),
        user_id: row.get("user_id"),
        session_id: row.get("session_id"),
        package_name: row.get("package_name"),
        app_name: row.get("app_name"),
        start_time: decode_ts(&start_time)?,
        end_time: decode_ts(&end_time)?,
        is_active: row.get("is_active"),
    })
}

#[cfg(test)]
mod tests {
    use super::close_session_windows;
    use crate::test_support::setup_db_with_user;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use focusbubble_core::BlockWindow;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 4, 10, 0, 0).unwrap()
    }

    fn window(user_id: i64, package: &str, minutes: i64) -> BlockWindow {
        BlockWindow {
            id: 0,
            user_id,
            session_id: None,
            package_name: package.to_string(),
            app_name: None,
            start_time: t0(),
            end_time: t0() + Duration::minutes(minutes),
            is_active: true,
        }
    }

    #[tokio::test]
    async fn test_insert_all_is_additive() {
        let (db, user_id, _dir) = setup_db_with_user("ada@example.com").await;
        let blocks = db.blocks();

        let first = blocks.insert_all(&[window(user_id, "com.example.feed", 25)]).await.unwrap();
        let second = blocks.insert_all(&[window(user_id, "com.example.feed", 50)]).await.unwrap();
        assert_ne!(first[0].id, second[0].id);

        // overlapping windows for one package both stay visible
        let active = blocks.list_in_effect(user_id, t0()).await.unwrap();
        assert_eq!(active.len(), 2);
        assert!(active.iter().all(|w| w.package_name == "com.example.feed"));

        let stored = blocks.get_by_id(second[0].id).await.unwrap().unwrap();
        assert_eq!(stored, second[0]);
    }

    #[tokio::test]
    async fn test_list_in_effect_hides_unswept_expired_rows() {
        let (db, user_id, _dir) = setup_db_with_user("ada@example.com").await;
        let blocks = db.blocks();
        blocks
            .insert_all(&[window(user_id, "com.example.short", 5), window(user_id, "com.example.long", 60)])
            .await
            .unwrap();

        let later = t0() + Duration::minutes(10);
        let active = blocks.list_in_effect(user_id, later).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].package_name, "com.example.long");

        // still flagged active in storage until swept
        assert_eq!(blocks.count_flagged_active(user_id).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_deactivate_expired_is_idempotent() {
        let (db, user_id, _dir) = setup_db_with_user("ada@example.com").await;
        let blocks = db.blocks();
        blocks
            .insert_all(&[
                window(user_id, "a", 5),
                window(user_id, "b", 5),
                window(user_id, "c", 60),
            ])
            .await
            .unwrap();

        let later = t0() + Duration::minutes(5);
        assert_eq!(blocks.deactivate_expired(later).await.unwrap(), 2);
        assert_eq!(blocks.deactivate_expired(later).await.unwrap(), 0);
        assert_eq!(blocks.count_flagged_active(user_id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_close_for_owner_snaps_end() {
        let (db, user_id, _dir) = setup_db_with_user("ada@example.com").await;
        let blocks = db.blocks();
        let created = blocks
            .insert_all(&[window(user_id, "a", 30), window(user_id, "b", 30)])
            .await
            .unwrap();

        let now = t0() + Duration::minutes(3);
        assert_eq!(blocks.close_for_owner(user_id, now).await.unwrap(), 2);
        assert!(blocks.list_in_effect(user_id, t0()).await.unwrap().is_empty());

        let closed = blocks.get_by_id(created[0].id).await.unwrap().unwrap();
        assert!(!closed.is_active);
        assert_eq!(closed.end_time, now);

        // other owners untouched
        assert_eq!(blocks.close_for_owner(user_id + 1, now).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_close_for_session_leaves_other_windows() {
        let (db, user_id, _dir) = setup_db_with_user("ada@example.com").await;
        let blocks = db.blocks();

        let session = db
            .sessions()
            .insert(&focusbubble_core::Session::start(user_id, None, t0(), Duration::minutes(30)))
            .await
            .unwrap();

        let mut owned = window(user_id, "from-session", 30);
        owned.session_id = Some(session);
        blocks
            .insert_all(&[owned, window(user_id, "direct", 30)])
            .await
            .unwrap();

        assert_eq!(close_session_windows(&db.pool, session, t0()).await.unwrap(), 1);
        let remaining = blocks.list_in_effect(user_id, t0()).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].package_name, "direct");
        assert_eq!(blocks.list_by_session(session).await.unwrap().len(), 1);
    }
}
