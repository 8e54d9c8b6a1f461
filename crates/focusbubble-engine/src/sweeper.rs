//! Expiry sweeper
//!
//! Periodically deactivates block windows whose end has passed and finishes
//! running sessions whose deadline has passed. Paused sessions are never
//! touched. Each tick is idempotent; storage errors are logged and the loop
//! carries on with the next tick.

use crate::now;
use focusbubble_core::{Clock, Result};
use focusbubble_db::Database;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// What a single tick changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub windows_deactivated: u64,
    pub sessions_finished: u64,
}

impl SweepReport {
    pub fn is_empty(&self) -> bool {
        self.windows_deactivated == 0 && self.sessions_finished == 0
    }
}

pub struct ExpirySweeper {
    db: Database,
    clock: Arc<dyn Clock>,
    interval: Duration,
}

impl ExpirySweeper {
    pub fn new(db: Database, clock: Arc<dyn Clock>, interval: Duration) -> Self {
        Self {
            db,
            clock,
            interval,
        }
    }

    /// Deactivate every active window whose end is at or before now
    pub async fn sweep_windows(&self) -> Result<u64> {
        self.db
            .blocks()
            .deactivate_expired(now(self.clock.as_ref()))
            .await
    }

    /// Finish every running session whose deadline is at or before now
    pub async fn sweep_sessions(&self) -> Result<u64> {
        self.db
            .sessions()
            .finish_expired(now(self.clock.as_ref()))
            .await
    }

    /// Windows first, then sessions. The steps share no transaction.
    pub async fn tick(&self) -> Result<SweepReport> {
        let windows_deactivated = self.sweep_windows().await?;
        let sessions_finished = self.sweep_sessions().await?;
        Ok(SweepReport {
            windows_deactivated,
            sessions_finished,
        })
    }

    /// Tick immediately, then once per interval until shutdown is signalled
    /// or the sender is dropped.
    pub async fn run(self, mut shutdown_rx: broadcast::Receiver<()>) {
        info!("Expiry sweeper running every {:?}", self.interval);

        loop {
            match self.tick().await {
                Ok(report) if report.is_empty() => debug!("Sweep found nothing to expire"),
                Ok(report) => info!(
                    "Sweep deactivated {} block windows and finished {} sessions",
                    report.windows_deactivated, report.sessions_finished
                ),
                Err(e) => error!("Sweep failed: {}", e),
            }

            tokio::select! {
                _ = shutdown_rx.recv() => {
                    break;
                }
                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        info!("Expiry sweeper stopped");
    }

    pub fn spawn(self, shutdown_rx: broadcast::Receiver<()>) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown_rx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{harness, t0};
    use crate::StartSession;
    use chrono::Duration as ChronoDuration;
    use focusbubble_core::{NewSchedule, SessionStatus};

    #[tokio::test]
    async fn test_tick_expires_windows_and_sessions() {
        let h = harness().await;
        let schedule = h
            .engine
            .create_schedule(
                h.user_id,
                &NewSchedule {
                    apps: vec!["com.a".into(), "com.b".into()],
                    duration_minutes: 20,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let session = h
            .engine
            .start_session(&StartSession {
                user_id: h.user_id,
                schedule_id: Some(schedule.id),
                duration_minutes: None,
            })
            .await
            .unwrap();

        let sweeper = h.engine.sweeper(Duration::from_secs(30));
        assert!(sweeper.tick().await.unwrap().is_empty());

        h.clock.advance(ChronoDuration::minutes(20));
        let report = sweeper.tick().await.unwrap();
        assert_eq!(
            report,
            SweepReport {
                windows_deactivated: 2,
                sessions_finished: 1,
            }
        );

        let finished = h.engine.get_session(session.id).await.unwrap();
        assert_eq!(finished.status(), SessionStatus::Finished);
        assert_eq!(finished.end_time(), t0() + ChronoDuration::minutes(20));

        // Idempotent
        assert!(sweeper.tick().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_tick_never_touches_paused_sessions() {
        let h = harness().await;
        let session = h
            .engine
            .start_session(&StartSession {
                user_id: h.user_id,
                schedule_id: None,
                duration_minutes: Some(10),
            })
            .await
            .unwrap();
        h.engine.pause_session(session.id).await.unwrap();

        h.clock.advance(ChronoDuration::hours(3));
        let sweeper = h.engine.sweeper(Duration::from_secs(30));
        assert_eq!(sweeper.sweep_sessions().await.unwrap(), 0);

        let still = h.engine.get_session(session.id).await.unwrap();
        assert_eq!(still.status(), SessionStatus::Paused);
    }

    #[tokio::test]
    async fn test_full_focus_day() {
        let h = harness().await;
        let schedule = h
            .engine
            .create_schedule(
                h.user_id,
                &NewSchedule {
                    apps: vec!["com.social".into(), "com.video".into(), "com.news".into()],
                    duration_minutes: 30,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let session = h
            .engine
            .start_session(&StartSession {
                user_id: h.user_id,
                schedule_id: Some(schedule.id),
                duration_minutes: None,
            })
            .await
            .unwrap();
        let sweeper = h.engine.sweeper(Duration::from_secs(30));

        h.clock.advance(ChronoDuration::minutes(10));
        let paused = h.engine.pause_session(session.id).await.unwrap();
        assert_eq!(paused.state.remaining_secs(), Some(1200));

        // Windows keep their original end while the session is paused
        h.clock.advance(ChronoDuration::minutes(55));
        sweeper.tick().await.unwrap();
        assert!(h.engine.blocks().list_active(h.user_id).await.unwrap().is_empty());
        assert_eq!(
            h.engine.get_session(session.id).await.unwrap().status(),
            SessionStatus::Paused
        );

        let resumed = h.engine.resume_session(session.id).await.unwrap();
        assert_eq!(resumed.end_time(), t0() + ChronoDuration::minutes(85));

        h.clock.advance(ChronoDuration::minutes(20));
        let report = sweeper.tick().await.unwrap();
        assert_eq!(report.sessions_finished, 1);
        assert!(h.engine.list_active_sessions(h.user_id).await.unwrap().is_empty());

        // Stopping a finished session is a no-op
        let stopped = h.engine.stop_session(session.id).await.unwrap();
        assert_eq!(stopped.status(), SessionStatus::Finished);
    }

    #[tokio::test]
    async fn test_run_loop_stops_on_shutdown() {
        let h = harness().await;
        h.engine
            .blocks()
            .open_for_session(h.user_id, None, &["com.a".to_string()], 1, &[])
            .await
            .unwrap();
        h.clock.advance(ChronoDuration::minutes(2));

        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let handle = h.engine.sweeper(Duration::from_millis(20)).spawn(shutdown_rx);

        tokio::time::sleep(Duration::from_millis(100)).await;
        shutdown_tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();

        let flagged = h
            .engine
            .database()
            .blocks()
            .count_flagged_active(h.user_id)
            .await
            .unwrap();
        assert_eq!(flagged, 0);
    }

    #[tokio::test]
    async fn test_run_loop_survives_storage_errors() {
        let h = harness().await;
        h.engine.database().close().await;

        let sweeper = h.engine.sweeper(Duration::from_millis(10));
        assert!(sweeper.tick().await.is_err());

        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let handle = sweeper.spawn(shutdown_rx);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!handle.is_finished());

        drop(shutdown_tx);
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
