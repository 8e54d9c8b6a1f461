//! FocusBubble Database - SQLite persistence layer

pub mod blocks;
pub mod schedules;
pub mod schema;
pub mod sessions;
pub mod users;

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use focusbubble_core::{Error, Result};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::path::Path;
use tracing::info;

pub use blocks::BlocksRepository;
pub use schedules::SchedulesRepository;
pub use sessions::SessionsRepository;
pub use users::UsersRepository;

/// Database connection and operations
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Create a new database connection
    pub async fn new(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| Error::DbError(e.to_string()))?;
        }

        let url = format!("sqlite:{}?mode=rwc", path.display());
        info!("Connecting to database: {}", url);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await
            .map_err(|e| Error::DbError(e.to_string()))?;

        // Set database file permissions to owner-only (0600)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Err(e) = std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)) {
                tracing::warn!("Failed to set database file permissions: {}", e);
            }
        }

        // Initialize schema
        sqlx::query(schema::SCHEMA)
            .execute(&pool)
            .await
            .map_err(|e| Error::DbError(e.to_string()))?;

        info!("Database initialized");
        Ok(Self { pool })
    }

    /// Get users repository
    pub fn users(&self) -> UsersRepository {
        UsersRepository::new(self.pool.clone())
    }

    /// Get schedules repository
    pub fn schedules(&self) -> SchedulesRepository {
        SchedulesRepository::new(self.pool.clone())
    }

    /// Get sessions repository
    pub fn sessions(&self) -> SessionsRepository {
        SessionsRepository::new(self.pool.clone())
    }

    /// Get blocked-app windows repository
    pub fn blocks(&self) -> BlocksRepository {
        BlocksRepository::new(self.pool.clone())
    }

    /// Close the database connection
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Encode a timestamp for storage
pub(crate) fn encode_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Drop precision the storage format cannot hold, so values handed back
/// from an insert compare equal to values read later
pub(crate) fn storage_precision(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.trunc_subsecs(6)
}

/// Decode a stored timestamp
pub(crate) fn decode_ts(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::db(format!("Invalid timestamp '{}': {}", raw, e)))
}
