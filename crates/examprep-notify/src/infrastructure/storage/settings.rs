//! TOML-based settings persistence for the notification listener.
//!
//! Reads and writes [`Settings`] from the platform-appropriate file:
//! - Windows:  `%APPDATA%\ExamPrep\notify.toml`
//! - Linux:    `~/.config/examprep/notify.toml`
//! - macOS:    `~/Library/Application Support/ExamPrep/notify.toml`
//!
//! Example file:
//!
//! ```toml
//! [server]
//! host = "10.0.2.2"
//! port = 2528
//!
//! [reconnect]
//! max_retries = 5
//! base_delay_ms = 1000
//!
//! [logging]
//! level = "debug"
//! ```
//!
//! Every field is optional.  Missing fields (or a missing file) fall back to
//! the defaults shown by `Settings::default()`, which reproduce the
//! client's built-in behaviour.

use std::path::{Path, PathBuf};
use std::time::Duration;

use examprep_core::domain::endpoint::{DEFAULT_HOST, DEFAULT_PORT};
use examprep_core::protocol::backoff::{DEFAULT_BASE_DELAY, DEFAULT_MAX_DELAY, DEFAULT_MAX_RETRIES};
use examprep_core::{ReconnectPolicy, ServerEndpoint};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::infrastructure::network::DEFAULT_CONNECT_TIMEOUT;

/// Error type for settings file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    #[error("I/O error accessing settings at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),
}

// ── Schema ────────────────────────────────────────────────────────────────────

/// Top-level settings stored on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub reconnect: ReconnectSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Where the ExamPrep server lives.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Backoff and handshake limits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReconnectSettings {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoggingSettings {
    /// `tracing` filter directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}
fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}
fn default_base_delay_ms() -> u64 {
    duration_ms(DEFAULT_BASE_DELAY)
}
fn default_max_delay_ms() -> u64 {
    duration_ms(DEFAULT_MAX_DELAY)
}
fn default_connect_timeout_ms() -> u64 {
    duration_ms(DEFAULT_CONNECT_TIMEOUT)
}
fn default_log_level() -> String {
    "info".to_string()
}

fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for ReconnectSettings {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Settings {
    pub fn endpoint(&self) -> ServerEndpoint {
        ServerEndpoint::new(self.server.host.clone(), self.server.port)
    }

    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        ReconnectPolicy {
            max_retries: self.reconnect.max_retries,
            base_delay: Duration::from_millis(self.reconnect.base_delay_ms),
            max_delay: Duration::from_millis(self.reconnect.max_delay_ms),
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.reconnect.connect_timeout_ms)
    }
}

// ── Repository ────────────────────────────────────────────────────────────────

/// Platform directory holding `notify.toml`.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when the base directory cannot
/// be determined from the environment.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    platform_config_dir().ok_or(ConfigError::NoPlatformConfigDir)
}

pub fn settings_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("notify.toml"))
}

/// Loads settings from the platform path.  See [`load_settings_from`].
pub fn load_settings() -> Result<Settings, ConfigError> {
    load_settings_from(&settings_file_path()?)
}

/// Loads settings from `path`, returning defaults if the file does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_settings_from(path: &Path) -> Result<Settings, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Settings::default()),
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Writes `settings` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_settings_to(path: &Path, settings: &Settings) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(settings)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("ExamPrep"))
    }

    #[cfg(target_os = "linux")]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("examprep"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("ExamPrep")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn scratch_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("examprep-settings-{}", Uuid::new_v4()))
            .join("notify.toml")
    }

    #[test]
    fn test_defaults_match_built_in_client_behaviour() {
        let settings = Settings::default();

        assert_eq!(settings.endpoint().websocket_url(), "ws://127.0.0.1:2528");
        assert_eq!(settings.reconnect_policy(), ReconnectPolicy::default());
        assert_eq!(settings.connect_timeout(), Duration::from_secs(10));
        assert_eq!(settings.logging.level, "info");
    }

    #[test]
    fn test_empty_toml_yields_defaults() {
        let settings: Settings = toml::from_str("").expect("deserialize empty");
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_partial_section_overrides_only_given_fields() {
        // Arrange
        let toml_str = r#"
[server]
host = "10.0.2.2"

[reconnect]
max_retries = 8
"#;

        // Act
        let settings: Settings = toml::from_str(toml_str).expect("deserialize partial");

        // Assert
        assert_eq!(settings.server.host, "10.0.2.2");
        assert_eq!(settings.server.port, 2528);
        assert_eq!(settings.reconnect.max_retries, 8);
        assert_eq!(settings.reconnect.base_delay_ms, 1000);
        assert_eq!(settings.endpoint().rest_base_url(), "http://10.0.2.2:2528/");
    }

    #[test]
    fn test_reconnect_policy_converts_milliseconds() {
        let mut settings = Settings::default();
        settings.reconnect.base_delay_ms = 250;
        settings.reconnect.max_delay_ms = 750;

        let policy = settings.reconnect_policy();

        assert_eq!(policy.delay_for(1), Duration::from_millis(250));
        assert_eq!(policy.delay_for(4), Duration::from_millis(750));
    }

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let settings = load_settings_from(&scratch_path()).expect("missing file is fine");
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_save_then_load_preserves_settings() {
        // Arrange
        let path = scratch_path();
        let mut settings = Settings::default();
        settings.server.port = 9000;
        settings.logging.level = "debug".to_string();

        // Act
        save_settings_to(&path, &settings).expect("save");
        let restored = load_settings_from(&path).expect("load");

        // Assert
        assert_eq!(restored, settings);
        if let Some(dir) = path.parent() {
            let _ = std::fs::remove_dir_all(dir);
        }
    }

    #[test]
    fn test_load_malformed_file_returns_parse_error() {
        // Arrange
        let path = scratch_path();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "[[[ not valid toml").unwrap();

        // Act
        let result = load_settings_from(&path);

        // Assert
        assert!(matches!(result, Err(ConfigError::Parse(_))));
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }
}
