//! FocusBubble Daemon - HTTP API and expiry sweeper

use anyhow::{Context, Result};
use clap::Parser;
use focusbubble_core::ServerConfig;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod daemon;

use daemon::Daemon;

#[derive(Parser, Debug)]
#[command(name = "focusbubbled")]
#[command(version, about = "FocusBubble focus session and app blocking server")]
struct Args {
    /// Config file (TOML, YAML or JSON). Defaults to focusbubble.* in the working directory.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on
    #[arg(long)]
    bind: Option<String>,

    /// SQLite database file
    #[arg(long)]
    database: Option<PathBuf>,

    /// Seconds between expiry sweeps
    #[arg(long)]
    sweep_interval: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // .env may carry RUST_LOG, so load it before the subscriber
    let dotenv = dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "focusbubbled=info,focusbubble_engine=info,focusbubble_db=info,focusbubble_web=info"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("FocusBubble daemon starting...");
    if let Some(path) = dotenv {
        info!("Loaded environment from {}", path.display());
    }

    let config = resolve_config(&args, |key| std::env::var(key).ok())?;
    let daemon = Daemon::new(config).await?;
    let shutdown = daemon.shutdown_sender();

    // Set up signal handlers
    let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;
    let mut sigint = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::interrupt())?;

    let run = daemon.run();
    tokio::pin!(run);

    let finished = tokio::select! {
        result = &mut run => Some(result),
        _ = sigterm.recv() => {
            info!("Received SIGTERM, shutting down...");
            None
        }
        _ = sigint.recv() => {
            info!("Received SIGINT, shutting down...");
            None
        }
    };

    let result = match finished {
        Some(result) => result,
        None => {
            let _ = shutdown.send(());
            run.await
        }
    };

    daemon.close().await;

    if let Err(e) = result {
        error!("Daemon error: {}", e);
        return Err(e.into());
    }

    info!("Daemon shutdown complete");
    Ok(())
}

/// Defaults, then the config file, then environment, then flags
fn resolve_config<F>(args: &Args, env: F) -> Result<ServerConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match &args.config {
        Some(path) => ServerConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => {
            let cwd = std::env::current_dir()?;
            let (config, path) = ServerConfig::find_and_load(&cwd)?;
            if let Some(path) = path {
                info!("Loaded config from {}", path.display());
            }
            config
        }
    };

    config.apply_env_with(env)?;

    if let Some(bind) = &args.bind {
        config.bind = bind.clone();
    }
    if let Some(database) = &args.database {
        config.database_path = Some(database.clone());
    }
    if let Some(secs) = args.sweep_interval {
        config.sweep_interval_secs = secs;
    }
    config.validate()?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use focusbubble_core::StopScope;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_args_parse() {
        let args = Args::parse_from([
            "focusbubbled",
            "--bind",
            "0.0.0.0:9000",
            "--sweep-interval",
            "5",
        ]);
        assert_eq!(args.bind.as_deref(), Some("0.0.0.0:9000"));
        assert_eq!(args.sweep_interval, Some(5));
        assert!(args.config.is_none());
    }

    #[test]
    fn test_flags_override_file_and_env() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("focusbubble.toml");
        std::fs::write(
            &path,
            "bind = \"127.0.0.1:7000\"\nsweep_interval_secs = 60\nstop_scope = \"owner\"\n",
        )
        .unwrap();

        let args = Args::parse_from([
            "focusbubbled",
            "--config",
            path.to_str().unwrap(),
            "--sweep-interval",
            "10",
        ]);
        let env = env_from(&[
            ("FOCUSBUBBLE_BIND", "127.0.0.1:7100"),
            ("FOCUSBUBBLE_SWEEP_INTERVAL_SECS", "45"),
        ]);

        let config = resolve_config(&args, env).unwrap();
        assert_eq!(config.bind, "127.0.0.1:7100");
        assert_eq!(config.sweep_interval_secs, 10);
        assert_eq!(config.stop_scope, StopScope::Owner);
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let args = Args::parse_from(["focusbubbled", "--config", "/nonexistent/focusbubble.toml"]);
        assert!(resolve_config(&args, env_from(&[])).is_err());
    }

    #[test]
    fn test_zero_sweep_interval_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("focusbubble.json");
        std::fs::write(&path, "{}").unwrap();

        let args = Args::parse_from([
            "focusbubbled",
            "--config",
            path.to_str().unwrap(),
            "--sweep-interval",
            "0",
        ]);
        assert!(resolve_config(&args, env_from(&[])).is_err());
    }
}
