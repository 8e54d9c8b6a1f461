//! Users repository - accounts keyed by email

use focusbubble_core::{Error, NewUser, Result, User};
use sqlx::sqlite::SqlitePool;
use sqlx::Row;
use tracing::debug;

/// Repository for user operations
pub struct UsersRepository {
    pool: SqlitePool,
}

impl UsersRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Return the user with this email, creating it if needed.
    ///
    /// Name and picture of an existing user are refreshed when the new value
    /// is present, non-empty and different.
    pub async fn get_or_create(&self, new: &NewUser) -> Result<User> {
        if let Some(mut user) = self.get_by_email(&new.email).await? {
            let name = changed(user.name.as_deref(), new.name.as_deref());
            let picture = changed(user.picture.as_deref(), new.picture.as_deref());

            if name.is_some() || picture.is_some() {
                if let Some(name) = name {
                    user.name = Some(name.to_string());
                }
                if let Some(picture) = picture {
                    user.picture = Some(picture.to_string());
                }
                sqlx::query("UPDATE users SET name = ?, picture = ? WHERE id = ?")
                    .bind(&user.name)
                    .bind(&user.picture)
                    .bind(user.id)
                    .execute(&self.pool)
                    .await
                    .map_err(|e| Error::DbError(e.to_string()))?;
                debug!("Updated profile for user {}", user.id);
            }
            return Ok(user);
        }

        // A concurrent sign-in may insert the same email first
        sqlx::query(
            r#"
            INSERT INTO users (email, name, picture) VALUES (?, ?, ?)
            ON CONFLICT(email) DO NOTHING
            "#,
        )
        .bind(&new.email)
        .bind(&new.name)
        .bind(&new.picture)
        .execute(&self.pool)
        .await
        .map_err(|e| Error::DbError(e.to_string()))?;

        self.get_by_email(&new.email)
            .await?
            .ok_or_else(|| Error::db(format!("user {} vanished after insert", new.email)))
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        let row = sqlx::query("SELECT id, email, name, picture FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| Error::DbError(e.to_string()))?;

        Ok(row.as_ref().map(row_to_user))
    }

    /// Get user by email
    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query("SELECT id, email, name, picture FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| Error::DbError(e.to_string()))?;

        Ok(row.as_ref().map(row_to_user))
    }

    /// Check if a user exists
    pub async fn exists(&self, id: i64) -> Result<bool> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE id = ?")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| Error::DbError(e.to_string()))?;

        Ok(row.0 > 0)
    }
}

fn changed<'a>(current: Option<&str>, incoming: Option<&'a str>) -> Option<&'a str> {
    match incoming {
        Some(value) if !value.is_empty() && current != Some(value) => Some(value),
        _ => None,
    }
}

fn row_to_user(row: &sqlx::sqlite::SqliteRow) -> User {
    User {
        id: row.get("id"),
        email: row.get("email"),
        name: row.get("name"),
        picture: row.get("picture"),
    }
}
