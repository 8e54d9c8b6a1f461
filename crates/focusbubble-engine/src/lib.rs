//! FocusBubble Engine
//!
//! Owns the focus session lifecycle, the block window manager and the
//! expiry sweeper. Every operation reads "now" from an injected [`Clock`]
//! so lifecycle behaviour can be driven deterministically in tests.

mod accounts;
pub mod blocks;
mod sessions;
pub mod sweeper;

pub use blocks::BlockManager;
pub use sessions::StartSession;
pub use sweeper::{ExpirySweeper, SweepReport};

use chrono::{DateTime, SubsecRound, Utc};
use focusbubble_core::{Clock, Result, ServerConfig, StopScope, DEFAULT_BLOCK_MINUTES};
use focusbubble_db::Database;
use focusbubble_identity::IdentityVerifier;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Engine tunables lifted from the server config
#[derive(Debug, Clone, Copy)]
pub struct EngineSettings {
    /// Window length for direct blocks created without an end time
    pub default_block_minutes: i64,
    /// Which windows a session stop closes
    pub stop_scope: StopScope,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            default_block_minutes: DEFAULT_BLOCK_MINUTES,
            stop_scope: StopScope::default(),
        }
    }
}

impl From<&ServerConfig> for EngineSettings {
    fn from(config: &ServerConfig) -> Self {
        Self {
            default_block_minutes: config.default_block_minutes,
            stop_scope: config.stop_scope,
        }
    }
}

/// Entry point for every user-facing operation
#[derive(Clone)]
pub struct Engine {
    db: Database,
    clock: Arc<dyn Clock>,
    verifier: Arc<dyn IdentityVerifier>,
    blocks: BlockManager,
    settings: EngineSettings,
}

impl Engine {
    pub fn new(
        db: Database,
        clock: Arc<dyn Clock>,
        verifier: Arc<dyn IdentityVerifier>,
        settings: EngineSettings,
    ) -> Self {
        let blocks = BlockManager::new(db.clone(), clock.clone(), settings.default_block_minutes);
        Self {
            db,
            clock,
            verifier,
            blocks,
            settings,
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn blocks(&self) -> &BlockManager {
        &self.blocks
    }

    /// Current time as the engine sees it
    pub fn now(&self) -> DateTime<Utc> {
        now(self.clock.as_ref())
    }

    /// Build a sweeper sharing this engine's store and clock
    pub fn sweeper(&self, interval: Duration) -> ExpirySweeper {
        ExpirySweeper::new(self.db.clone(), self.clock.clone(), interval)
    }

    /// One on-demand sweep over block windows only; sessions are left to
    /// the periodic sweeper.
    pub async fn refresh_blocks(&self) -> Result<u64> {
        let expired = self.sweeper(Duration::ZERO).sweep_windows().await?;
        info!("Manual refresh deactivated {} block windows", expired);
        Ok(expired)
    }
}

/// Clock reading truncated to the precision timestamps are stored at, so
/// values handed back to callers match what a later read returns.
pub(crate) fn now(clock: &dyn Clock) -> DateTime<Utc> {
    clock.now().trunc_subsecs(6)
}
