//! Daemon wiring: store, identity verifier, engine, sweeper and HTTP server

use focusbubble_core::{Result, ServerConfig, SystemClock};
use focusbubble_db::Database;
use focusbubble_engine::{Engine, EngineSettings};
use focusbubble_identity::GoogleVerifier;
use focusbubble_web::AppState;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{error, info};

/// Main daemon struct
pub struct Daemon {
    config: ServerConfig,
    engine: Engine,
    shutdown_tx: broadcast::Sender<()>,
}

impl Daemon {
    /// Open the database and build the engine from a resolved config
    pub async fn new(config: ServerConfig) -> Result<Self> {
        let db_path = config.database_path();
        let db = Database::new(&db_path).await?;
        info!("Database initialized at {}", db_path.display());

        let verifier = GoogleVerifier::new(
            config.identity_endpoint.clone(),
            config.identity_audience.clone(),
        );
        let engine = Engine::new(
            db,
            Arc::new(SystemClock),
            Arc::new(verifier),
            EngineSettings::from(&config),
        );

        let (shutdown_tx, _) = broadcast::channel(16);

        Ok(Self {
            config,
            engine,
            shutdown_tx,
        })
    }

    /// Sender that stops the server and the sweeper
    pub fn shutdown_sender(&self) -> broadcast::Sender<()> {
        self.shutdown_tx.clone()
    }

    /// Serve until shutdown. The sweeper runs alongside and is stopped with
    /// the server.
    pub async fn run(&self) -> Result<()> {
        let sweeper = self
            .engine
            .sweeper(self.config.sweep_interval())
            .spawn(self.shutdown_tx.subscribe());

        let served = focusbubble_web::serve(
            &self.config.bind,
            AppState::new(self.engine.clone()),
            self.config.cors_origin.as_deref(),
            self.shutdown_tx.subscribe(),
        )
        .await;

        // The server may have exited on its own
        let _ = self.shutdown_tx.send(());
        if let Err(e) = sweeper.await {
            error!("Sweeper task failed: {}", e);
        }

        served?;
        Ok(())
    }

    pub async fn close(&self) {
        self.engine.database().close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let dir = tempdir().unwrap();
        let config = ServerConfig {
            bind: "127.0.0.1:0".into(),
            database_path: Some(dir.path().join("focusbubble.db")),
            ..Default::default()
        };

        let daemon = Daemon::new(config).await.unwrap();
        let shutdown = daemon.shutdown_sender();

        let run = daemon.run();
        tokio::pin!(run);

        // Let the server bind and the sweeper take its first tick
        let early = tokio::time::timeout(Duration::from_millis(100), &mut run).await;
        assert!(early.is_err(), "daemon exited before shutdown");

        shutdown.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(5), run)
            .await
            .unwrap()
            .unwrap();

        daemon.close().await;
    }

    #[tokio::test]
    async fn test_run_fails_on_bad_bind() {
        let dir = tempdir().unwrap();
        let config = ServerConfig {
            bind: "not-an-address".into(),
            database_path: Some(dir.path().join("focusbubble.db")),
            ..Default::default()
        };

        let daemon = Daemon::new(config).await.unwrap();
        assert!(daemon.run().await.is_err());
    }
}
