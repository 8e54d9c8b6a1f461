//! Block window manager
//!
//! Opens, lists and closes the time windows during which an app is blocked.
//! A window is in effect while its active flag is set and its end lies in
//! the future; listing filters on both so a window the sweeper has not yet
//! reached is never reported.

use crate::now;
use chrono::{DateTime, SubsecRound, Utc};
use focusbubble_core::{
    checked_end, duration_from_minutes, BlockWindow, Clock, Error, NewBlock, Result,
};
use focusbubble_db::Database;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Clone)]
pub struct BlockManager {
    db: Database,
    clock: Arc<dyn Clock>,
    default_block_minutes: i64,
}

impl BlockManager {
    pub fn new(db: Database, clock: Arc<dyn Clock>, default_block_minutes: i64) -> Self {
        Self {
            db,
            clock,
            default_block_minutes,
        }
    }

    /// Open one window per package, all starting now and ending after
    /// `duration_minutes`. Display names pair with packages by position;
    /// missing names are left empty.
    pub async fn open_for_session(
        &self,
        user_id: i64,
        session_id: Option<i64>,
        packages: &[String],
        duration_minutes: i64,
        app_names: &[String],
    ) -> Result<Vec<BlockWindow>> {
        if packages.is_empty() {
            return Ok(Vec::new());
        }

        let start = now(self.clock.as_ref());
        let end = checked_end(start, duration_from_minutes(duration_minutes)?)?;
        let windows: Vec<BlockWindow> = packages
            .iter()
            .enumerate()
            .map(|(i, package)| BlockWindow {
                id: 0,
                user_id,
                session_id,
                package_name: package.clone(),
                app_name: app_names.get(i).cloned(),
                start_time: start,
                end_time: end,
                is_active: true,
            })
            .collect();

        let created = self.db.blocks().insert_all(&windows).await?;
        info!(
            "Opened {} block windows for user {} until {}",
            created.len(),
            user_id,
            end
        );
        Ok(created)
    }

    /// Windows of a user currently in effect
    pub async fn list_active(&self, user_id: i64) -> Result<Vec<BlockWindow>> {
        let current = now(self.clock.as_ref());
        let windows = self.db.blocks().list_in_effect(user_id, current).await?;
        Ok(windows
            .into_iter()
            .filter(|w| w.is_in_effect(current))
            .collect())
    }

    /// Close every active window of a user, returning how many were closed
    pub async fn close_for_owner(&self, user_id: i64) -> Result<u64> {
        let closed = self
            .db
            .blocks()
            .close_for_owner(user_id, now(self.clock.as_ref()))
            .await?;
        debug!("Closed {} block windows for user {}", closed, user_id);
        Ok(closed)
    }

    /// Create windows independent of any session. Each request defaults its
    /// start to now and its end to start plus the default block length.
    pub async fn create_direct(
        &self,
        user_id: i64,
        requests: &[NewBlock],
    ) -> Result<Vec<BlockWindow>> {
        if !self.db.users().exists(user_id).await? {
            return Err(Error::UserNotFound(user_id));
        }

        let current = now(self.clock.as_ref());
        let windows = requests
            .iter()
            .map(|req| self.direct_window(user_id, req, current))
            .collect::<Result<Vec<_>>>()?;

        let created = self.db.blocks().insert_all(&windows).await?;
        debug!("Created {} direct block windows for user {}", created.len(), user_id);
        Ok(created)
    }

    fn direct_window(
        &self,
        user_id: i64,
        req: &NewBlock,
        current: DateTime<Utc>,
    ) -> Result<BlockWindow> {
        req.validate()?;
        let start_time = req.start_time.map(storage_precision).unwrap_or(current);
        let end_time = match req.end_time {
            Some(end) => storage_precision(end),
            None => checked_end(start_time, duration_from_minutes(self.default_block_minutes)?)?,
        };
        if end_time < start_time {
            return Err(Error::validation("end_time must not precede start_time"));
        }

        Ok(BlockWindow {
            id: 0,
            user_id,
            session_id: None,
            package_name: req.package_name.clone(),
            app_name: req.app_name.clone(),
            start_time,
            end_time,
            is_active: true,
        })
    }
}

fn storage_precision(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.trunc_subsecs(6)
}
