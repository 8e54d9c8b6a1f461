//! Schedules repository - reusable app-set templates

use chrono::{DateTime, Utc};
use focusbubble_core::{Error, NewSchedule, Result, Schedule};
use sqlx::sqlite::SqlitePool;
use sqlx::Row;

use crate::{decode_ts, encode_ts, storage_precision};

/// Repository for schedule operations
pub struct SchedulesRepository {
    pool: SqlitePool,
}

impl SchedulesRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new schedule for `user_id`
    pub async fn insert(
        &self,
        user_id: i64,
        new: &NewSchedule,
        now: DateTime<Utc>,
    ) -> Result<Schedule> {
        let apps_json = serde_json::to_string(&new.apps)?;

        let result = sqlx::query(
            r#"
            INSERT INTO schedules (user_id, label, duration_minutes, apps, is_active, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(user_id)
        .bind(&new.label)
        .bind(new.duration_minutes)
        .bind(&apps_json)
        .bind(new.is_active)
        .bind(encode_ts(now))
        .execute(&self.pool)
        .await
        .map_err(|e| Error::DbError(e.to_string()))?;

        Ok(Schedule {
            id: result.last_insert_rowid(),
            user_id,
            label: new.label.clone(),
            duration_minutes: new.duration_minutes,
            apps: new.apps.clone(),
            is_active: new.is_active,
            created_at: storage_precision(now),
        })
    }

    /// Get a schedule belonging to `user_id`
    pub async fn get_for_owner(&self, user_id: i64, id: i64) -> Result<Option<Schedule>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, label, duration_minutes, apps, is_active, created_at
            FROM schedules WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Error::DbError(e.to_string()))?;

        match row {
            Some(row) => Ok(Some(row_to_schedule(&row)?)),
            None => Ok(None),
        }
    }

    /// All schedules of a user, oldest first
    pub async fn list_by_owner(&self, user_id: i64) -> Result<Vec<Schedule>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, label, duration_minutes, apps, is_active, created_at
            FROM schedules WHERE user_id = ? ORDER BY id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| Error::DbError(e.to_string()))?;

        rows.iter().map(row_to_schedule).collect()
    }

    /// Delete a schedule belonging to `user_id`
    pub async fn delete(&self, user_id: i64, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM schedules WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| Error::DbError(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }
}

fn row_to_schedule(row: &sqlx::sqlite::SqliteRow) -> Result<Schedule> {
    let apps_json: String = row.get("apps");
    let created_at: String = row.get("created_at");

    Ok(Schedule {
        id: row.get("id"),
        user_id: row.get("user_id"),
        label: row.get("label"),
        duration_minutes: row.get("duration_minutes"),
        apps: serde_json::from_str(&apps_json)?,
        is_active: row.get("is_active"),
        created_at: decode_ts(&created_at)?,
    })
}
