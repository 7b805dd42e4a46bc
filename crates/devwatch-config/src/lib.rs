//! Shared configuration for the devwatch CLI and dashboard.
//!
//! One TOML file plus `DEVWATCH_*` environment overrides, translated into
//! the transport and driver settings `devwatch-core` needs. Both binaries
//! layer their command-line flags on top.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use devwatch_api::{ReconnectConfig, SnapshotClient, TlsMode, TransportConfig};
use devwatch_core::{DeviceCount, DriverOptions, HttpSnapshotSource, ResponseOrdering, SyncMode};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("transport setup failed: {0}")]
    Transport(#[from] devwatch_api::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration shared by CLI and TUI.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Snapshot endpoint (e.g. "http://127.0.0.1:8000/devices").
    pub endpoint: String,

    /// Push channel WebSocket URL.
    pub push_url: String,

    /// Inbound push event carrying device payloads.
    pub event_name: String,

    /// Requested device count. Clamped to 1..=500 on use.
    pub count: i64,

    /// Generator seed forwarded to the endpoint.
    pub seed: Option<i64>,

    pub mode: SyncMode,

    pub ordering: ResponseOrdering,

    /// Request timeout in seconds; 0 disables it.
    pub timeout: u64,

    /// Accept self-signed certificates.
    #[serde(default)]
    pub insecure: bool,

    /// Path to a custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    #[serde(default)]
    pub reconnect: Reconnect,

    #[serde(default)]
    pub defaults: Defaults,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8000/devices".into(),
            push_url: "ws://127.0.0.1:8000/ws".into(),
            event_name: devwatch_api::push::DEFAULT_EVENT_NAME.into(),
            count: i64::from(DeviceCount::DEFAULT),
            seed: None,
            mode: SyncMode::Pull,
            ordering: ResponseOrdering::Arrival,
            timeout: 0,
            insecure: false,
            ca_cert: None,
            reconnect: Reconnect::default(),
            defaults: Defaults::default(),
        }
    }
}

/// Push channel backoff tuning.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Reconnect {
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Give up after this many consecutive failures; unset retries forever.
    pub max_retries: Option<u32>,
}

impl Default for Reconnect {
    fn default() -> Self {
        Self {
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            max_retries: None,
        }
    }
}

fn default_initial_delay_ms() -> u64 {
    1_000
}
fn default_max_delay_ms() -> u64 {
    30_000
}

/// Output defaults for the CLI.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}

// ── Translation to runtime settings ─────────────────────────────────

impl Config {
    pub fn count(&self) -> DeviceCount {
        DeviceCount::clamped(self.count)
    }

    pub fn endpoint_url(&self) -> Result<Url, ConfigError> {
        parse_url("endpoint", &self.endpoint, &["http", "https"])
    }

    pub fn push_url(&self) -> Result<Url, ConfigError> {
        parse_url("push_url", &self.push_url, &["ws", "wss"])
    }

    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout > 0).then(|| Duration::from_secs(self.timeout))
    }

    pub fn transport(&self) -> TransportConfig {
        let tls = if self.insecure {
            TlsMode::DangerAcceptInvalid
        } else if let Some(ref ca) = self.ca_cert {
            TlsMode::CustomCa(ca.clone())
        } else {
            TlsMode::System
        };
        TransportConfig {
            tls,
            timeout: self.timeout(),
        }
    }

    pub fn reconnect(&self) -> ReconnectConfig {
        ReconnectConfig {
            initial_delay: Duration::from_millis(self.reconnect.initial_delay_ms),
            max_delay: Duration::from_millis(self.reconnect.max_delay_ms),
            max_retries: self.reconnect.max_retries,
        }
    }

    /// Snapshot client for the configured endpoint.
    pub fn snapshot_client(&self) -> Result<SnapshotClient, ConfigError> {
        Ok(SnapshotClient::new(self.endpoint_url()?, &self.transport())?)
    }

    pub fn snapshot_source(&self) -> Result<HttpSnapshotSource, ConfigError> {
        Ok(HttpSnapshotSource::new(self.snapshot_client()?).with_seed(self.seed))
    }

    pub fn driver_options(&self) -> Result<DriverOptions, ConfigError> {
        if self.event_name.trim().is_empty() {
            return Err(ConfigError::Validation {
                field: "event_name".into(),
                reason: "must not be empty".into(),
            });
        }
        Ok(DriverOptions {
            mode: self.mode,
            count: self.count(),
            ordering: self.ordering,
            push_url: self.push_url()?,
            event_name: self.event_name.clone(),
            reconnect: self.reconnect(),
        })
    }
}

fn parse_url(field: &str, raw: &str, schemes: &[&str]) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|e| ConfigError::Validation {
        field: field.into(),
        reason: format!("{raw:?} is not a URL: {e}"),
    })?;
    if !schemes.contains(&url.scheme()) {
        return Err(ConfigError::Validation {
            field: field.into(),
            reason: format!("scheme must be one of {}", schemes.join(", ")),
        });
    }
    Ok(url)
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("dev", "devwatch", "devwatch").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Directory for log files and other runtime state.
pub fn data_dir() -> PathBuf {
    ProjectDirs::from("dev", "devwatch", "devwatch")
        .map_or_else(dirs_fallback, |dirs| dirs.data_local_dir().to_path_buf())
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("devwatch");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load defaults, then `path` (if it exists), then `DEVWATCH_*` variables.
///
/// Nested keys use a double underscore: `DEVWATCH_RECONNECT__MAX_RETRIES`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("DEVWATCH_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.endpoint, "http://127.0.0.1:8000/devices");
        assert_eq!(cfg.count().get(), 10);
        assert_eq!(cfg.mode, SyncMode::Pull);
        assert!(cfg.timeout().is_none());
    }

    #[test]
    fn file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
endpoint = "http://lab.local:9000/devices"
count = 0
mode = "push"
ordering = "issue"
timeout = 5

[reconnect]
max_retries = 3
"#,
        )
        .unwrap();

        let cfg = load_config_from(&path).unwrap();
        assert_eq!(cfg.endpoint, "http://lab.local:9000/devices");
        assert_eq!(cfg.count().get(), 1);
        assert_eq!(cfg.mode, SyncMode::Push);
        assert_eq!(cfg.ordering, ResponseOrdering::Issue);
        assert_eq!(cfg.timeout(), Some(Duration::from_secs(5)));

        let reconnect = cfg.reconnect();
        assert_eq!(reconnect.max_retries, Some(3));
        assert_eq!(reconnect.initial_delay, Duration::from_secs(1));
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let cfg = Config {
            seed: Some(7),
            count: 42,
            ..Config::default()
        };
        save_config_to(&cfg, &path).unwrap();
        assert_eq!(load_config_from(&path).unwrap(), cfg);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "mode = \"sideways\"\n").unwrap();
        assert!(matches!(
            load_config_from(&path),
            Err(ConfigError::Figment(_))
        ));
    }

    #[test]
    fn url_scheme_is_validated() {
        let cfg = Config {
            push_url: "http://127.0.0.1:8000/ws".into(),
            ..Config::default()
        };
        let err = cfg.push_url().unwrap_err();
        assert!(err.to_string().contains("push_url"), "got {err}");

        let cfg = Config {
            endpoint: "not a url".into(),
            ..Config::default()
        };
        assert!(cfg.endpoint_url().is_err());
    }

    #[test]
    fn transport_prefers_insecure_over_ca() {
        let cfg = Config {
            insecure: true,
            ca_cert: Some(PathBuf::from("/tmp/ca.pem")),
            ..Config::default()
        };
        assert_eq!(cfg.transport().tls, TlsMode::DangerAcceptInvalid);
    }

    #[test]
    fn driver_options_carry_settings() {
        let cfg = Config {
            mode: SyncMode::Push,
            count: 900,
            ..Config::default()
        };
        let opts = cfg.driver_options().unwrap();
        assert_eq!(opts.mode, SyncMode::Push);
        assert_eq!(opts.count.get(), 500);
        assert_eq!(opts.push_url.as_str(), "ws://127.0.0.1:8000/ws");
        assert_eq!(opts.event_name, "device_status");
    }
}
