//! Server configuration
//!
//! Supports multiple configuration file formats:
//! - TOML (.toml)
//! - YAML (.yaml, .yml)
//! - JSON (.json)
//!
//! Environment variables override file values; see [`ServerConfig::apply_env_with`].

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants::*;
use crate::error::{Error, Result};
use crate::types::StopScope;

/// Supported configuration file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Yaml,
    Json,
}

impl ConfigFormat {
    /// Detect format from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(ConfigFormat::Toml),
            "yaml" | "yml" => Some(ConfigFormat::Yaml),
            "json" => Some(ConfigFormat::Json),
            _ => None,
        }
    }

    /// Detect format from file path
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}

fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

fn default_sweep_interval_secs() -> u64 {
    DEFAULT_SWEEP_INTERVAL_SECS
}

fn default_block_minutes() -> i64 {
    DEFAULT_BLOCK_MINUTES
}

fn default_identity_endpoint() -> String {
    DEFAULT_IDENTITY_ENDPOINT.to_string()
}

/// Configuration file structure (focusbubble.toml/yaml/json)
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address the HTTP API listens on
    #[serde(default = "default_bind")]
    pub bind: String,
    /// SQLite database file (default: ~/.focusbubble/focusbubble.db)
    #[serde(default)]
    pub database_path: Option<PathBuf>,
    /// Seconds between expiry sweeps
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
    /// Length of a directly created window when no end time is given
    #[serde(default = "default_block_minutes")]
    pub default_block_minutes: i64,
    /// Expected audience of identity tokens; unchecked when absent
    #[serde(default)]
    pub identity_audience: Option<String>,
    /// Token-info endpoint of the identity provider
    #[serde(default = "default_identity_endpoint")]
    pub identity_endpoint: String,
    /// Allowed CORS origin; any origin when absent
    #[serde(default)]
    pub cors_origin: Option<String>,
    /// Which windows a session stop closes
    #[serde(default)]
    pub stop_scope: StopScope,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            database_path: None,
            sweep_interval_secs: default_sweep_interval_secs(),
            default_block_minutes: default_block_minutes(),
            identity_audience: None,
            identity_endpoint: default_identity_endpoint(),
            cors_origin: None,
            stop_scope: StopScope::default(),
        }
    }
}

impl ServerConfig {
    /// Load config from file, automatically detecting format from extension
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::ConfigNotFound(path.to_path_buf()));
        }

        let format = ConfigFormat::from_path(path).ok_or_else(|| {
            Error::ConfigError(format!(
                "Unsupported config file extension: {}. Expected .toml, .yaml, .yml, or .json",
                path.display()
            ))
        })?;

        let content = std::fs::read_to_string(path)?;
        let config = Self::parse(&content, format)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse config content with specified format
    pub fn parse(content: &str, format: ConfigFormat) -> Result<Self> {
        let config: ServerConfig = match format {
            ConfigFormat::Toml => toml::from_str(content)?,
            ConfigFormat::Yaml => serde_yaml::from_str(content)?,
            ConfigFormat::Json => serde_json::from_str(content)?,
        };
        Ok(config)
    }

    /// Load the first known config file in `dir`, or defaults when there is none
    pub fn find_and_load(dir: &Path) -> Result<(Self, Option<PathBuf>)> {
        for name in CONFIG_FILES {
            let path = dir.join(name);
            if path.exists() {
                let config = Self::load(&path)?;
                return Ok((config, Some(path)));
            }
        }
        Ok((Self::default(), None))
    }

    /// Override fields from the process environment
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_with(|key| std::env::var(key).ok())
    }

    /// Override fields from an arbitrary variable lookup
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(bind) = lookup("FOCUSBUBBLE_BIND") {
            self.bind = bind;
        }
        if let Some(path) = lookup("FOCUSBUBBLE_DATABASE") {
            self.database_path = Some(PathBuf::from(path));
        }
        if let Some(secs) = lookup("FOCUSBUBBLE_SWEEP_INTERVAL_SECS") {
            self.sweep_interval_secs = secs.parse().map_err(|_| {
                Error::config(format!("FOCUSBUBBLE_SWEEP_INTERVAL_SECS is not a number: {}", secs))
            })?;
        }
        if let Some(audience) = lookup("FOCUSBUBBLE_IDENTITY_AUDIENCE").or_else(|| lookup("GOOGLE_CLIENT_ID")) {
            if !audience.is_empty() {
                self.identity_audience = Some(audience);
            }
        }
        if let Some(origin) = lookup("FOCUSBUBBLE_CORS_ORIGIN") {
            self.cors_origin = Some(origin);
        }
        if let Some(scope) = lookup("FOCUSBUBBLE_STOP_SCOPE") {
            self.stop_scope = scope.parse()?;
        }
        self.validate()
    }

    pub fn validate(&self) -> Result<()> {
        if self.sweep_interval_secs == 0 {
            return Err(Error::config("sweep_interval_secs must be at least 1"));
        }
        if !(1..=MAX_DURATION_MINUTES).contains(&self.default_block_minutes) {
            return Err(Error::config(format!(
                "default_block_minutes must be between 1 and {}",
                MAX_DURATION_MINUTES
            )));
        }
        Ok(())
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn database_path(&self) -> PathBuf {
        self.database_path.clone().unwrap_or_else(db_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::{tempdir, NamedTempFile};

    #[test]
    fn test_config_format_detection() {
        assert_eq!(ConfigFormat::from_extension("toml"), Some(ConfigFormat::Toml));
        assert_eq!(ConfigFormat::from_extension("yml"), Some(ConfigFormat::Yaml));
        assert_eq!(ConfigFormat::from_extension("JSON"), Some(ConfigFormat::Json));
        assert_eq!(ConfigFormat::from_extension("ini"), None);
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.bind, "127.0.0.1:8000");
        assert_eq!(config.sweep_interval(), Duration::from_secs(30));
        assert_eq!(config.default_block_minutes, 25);
        assert_eq!(config.stop_scope, StopScope::Session);
        assert!(config.identity_audience.is_none());
    }

    #[test]
    fn test_config_parse_toml() {
        let content = r#"
bind = "0.0.0.0:9000"
sweep_interval_secs = 10
identity_audience = "client-123.apps.example"
stop_scope = "owner"
"#;
        let mut file = NamedTempFile::with_suffix(".toml").unwrap();
        file.write_all(content.as_bytes()).unwrap();

        let config = ServerConfig::load(file.path()).unwrap();
        assert_eq!(config.bind, "0.0.0.0:9000");
        assert_eq!(config.sweep_interval_secs, 10);
        assert_eq!(config.identity_audience.as_deref(), Some("client-123.apps.example"));
        assert_eq!(config.stop_scope, StopScope::Owner);
        // untouched fields keep defaults
        assert_eq!(config.default_block_minutes, 25);
    }

    #[test]
    fn test_config_parse_yaml_and_json() {
        let yaml = "bind: \"127.0.0.1:7000\"\ndefault_block_minutes: 15\n";
        let config = ServerConfig::parse(yaml, ConfigFormat::Yaml).unwrap();
        assert_eq!(config.bind, "127.0.0.1:7000");
        assert_eq!(config.default_block_minutes, 15);

        let json = r#"{ "cors_origin": "http://localhost:5173" }"#;
        let config = ServerConfig::parse(json, ConfigFormat::Json).unwrap();
        assert_eq!(config.cors_origin.as_deref(), Some("http://localhost:5173"));
    }

    #[test]
    fn test_config_not_found() {
        let result = ServerConfig::load(Path::new("/nonexistent/focusbubble.toml"));
        assert!(matches!(result, Err(Error::ConfigNotFound(_))));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let mut file = NamedTempFile::with_suffix(".toml").unwrap();
        file.write_all(b"sweep_interval_secs = 0\n").unwrap();
        assert!(matches!(
            ServerConfig::load(file.path()),
            Err(Error::ConfigError(_))
        ));
    }

    #[test]
    fn test_block_minutes_bounds() {
        let mut config = ServerConfig::default();
        config.default_block_minutes = 0;
        assert!(matches!(config.validate(), Err(Error::ConfigError(_))));

        config.default_block_minutes = MAX_DURATION_MINUTES + 1;
        assert!(matches!(config.validate(), Err(Error::ConfigError(_))));

        config.default_block_minutes = MAX_DURATION_MINUTES;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_find_and_load_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let (config, path) = ServerConfig::find_and_load(dir.path()).unwrap();
        assert!(path.is_none());
        assert_eq!(config.bind, DEFAULT_BIND);

        std::fs::write(dir.path().join("focusbubble.yaml"), "sweep_interval_secs: 5\n").unwrap();
        let (config, path) = ServerConfig::find_and_load(dir.path()).unwrap();
        assert!(path.is_some());
        assert_eq!(config.sweep_interval_secs, 5);
    }

    #[test]
    fn test_env_overrides() {
        let vars = HashMap::from([
            ("FOCUSBUBBLE_BIND", "0.0.0.0:8080"),
            ("FOCUSBUBBLE_DATABASE", "/tmp/fb.db"),
            ("FOCUSBUBBLE_SWEEP_INTERVAL_SECS", "12"),
            ("GOOGLE_CLIENT_ID", "legacy-client"),
            ("FOCUSBUBBLE_STOP_SCOPE", "owner"),
        ]);
        let mut config = ServerConfig::default();
        config
            .apply_env_with(|k| vars.get(k).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.bind, "0.0.0.0:8080");
        assert_eq!(config.database_path(), PathBuf::from("/tmp/fb.db"));
        assert_eq!(config.sweep_interval_secs, 12);
        assert_eq!(config.identity_audience.as_deref(), Some("legacy-client"));
        assert_eq!(config.stop_scope, StopScope::Owner);
    }

    #[test]
    fn test_env_audience_prefers_focusbubble_variable() {
        let vars = HashMap::from([
            ("FOCUSBUBBLE_IDENTITY_AUDIENCE", "primary"),
            ("GOOGLE_CLIENT_ID", "legacy"),
        ]);
        let mut config = ServerConfig::default();
        config
            .apply_env_with(|k| vars.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.identity_audience.as_deref(), Some("primary"));
    }

    #[test]
    fn test_env_bad_interval() {
        let mut config = ServerConfig::default();
        let result = config.apply_env_with(|k| {
            (k == "FOCUSBUBBLE_SWEEP_INTERVAL_SECS").then(|| "soon".to_string())
        });
        assert!(matches!(result, Err(Error::ConfigError(_))));
    }
}
