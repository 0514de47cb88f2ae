//! ExamPrep notification listener entry point.
//!
//! Connects to the ExamPrep server's push endpoint, logs every recipe or
//! course the server broadcasts, and disconnects cleanly on Ctrl+C.
//!
//! # Usage
//!
//! ```text
//! examprep-notify [OPTIONS]
//!
//! Options:
//!   --config <PATH>   Settings file [default: platform config dir]
//!   --url    <URL>    Full WebSocket URL; overrides --host/--port
//!   --host   <HOST>   Server host [default: from settings, 127.0.0.1]
//!   --port   <PORT>   Server port [default: from settings, 2528]
//!   --feed   <FEED>   recipes | courses [default: recipes]
//! ```
//!
//! # Environment variable overrides
//!
//! | Variable           | Equivalent flag |
//! |--------------------|-----------------|
//! | `EXAMPREP_CONFIG`  | `--config`      |
//! | `EXAMPREP_WS_URL`  | `--url`         |
//! | `EXAMPREP_HOST`    | `--host`        |
//! | `EXAMPREP_PORT`    | `--port`        |
//! | `EXAMPREP_FEED`    | `--feed`        |
//!
//! `RUST_LOG` takes precedence over the `[logging] level` setting.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Parser, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use examprep_core::{Course, LiveEvent, Recipe, ReconnectPolicy, ServerEndpoint};
use examprep_notify::application::main_context::main_queue;
use examprep_notify::application::notification_client::{ConnectionState, NotificationClient};
use examprep_notify::infrastructure::network::WsConnector;
use examprep_notify::infrastructure::storage::settings::{
    load_settings, load_settings_from, ConfigError, Settings,
};

/// How long to wait for the close frame to go out on shutdown.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Which broadcast to listen to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Feed {
    Recipes,
    Courses,
}

/// Listens for live recipe or course broadcasts from an ExamPrep server.
#[derive(Debug, Parser)]
#[command(
    name = "examprep-notify",
    about = "Live-update listener for the ExamPrep server",
    version
)]
struct Cli {
    /// Settings file to read instead of the platform default.
    #[arg(long, env = "EXAMPREP_CONFIG")]
    config: Option<PathBuf>,

    /// Full WebSocket URL, e.g. `ws://10.0.2.2:2528`.
    ///
    /// Takes precedence over `--host` and `--port`.
    #[arg(long, env = "EXAMPREP_WS_URL")]
    url: Option<String>,

    /// Server host name or IP address.
    #[arg(long, env = "EXAMPREP_HOST")]
    host: Option<String>,

    /// Server port.
    #[arg(long, env = "EXAMPREP_PORT")]
    port: Option<u16>,

    /// Entity feed to subscribe to.
    #[arg(long, value_enum, default_value_t = Feed::Recipes, env = "EXAMPREP_FEED")]
    feed: Feed,
}

/// Everything the listener needs after CLI and file settings are merged.
#[derive(Debug, Clone, PartialEq)]
struct ListenerConfig {
    url: String,
    feed: Feed,
    policy: ReconnectPolicy,
    connect_timeout: Duration,
}

impl Cli {
    /// Loads the settings file named by `--config`, or the platform default.
    ///
    /// A platform without a config directory runs on defaults.
    fn load_settings(&self) -> anyhow::Result<Settings> {
        let loaded = match &self.config {
            Some(path) => load_settings_from(path),
            None => load_settings(),
        };
        match loaded {
            Ok(settings) => Ok(settings),
            Err(ConfigError::NoPlatformConfigDir) => Ok(Settings::default()),
            Err(e) => Err(e).context("failed to load settings"),
        }
    }

    /// Merges CLI overrides on top of `settings`.
    ///
    /// # Errors
    ///
    /// Returns an error if `--url` is blank or is not a `ws://` URL.
    fn into_listener_config(self, settings: Settings) -> anyhow::Result<ListenerConfig> {
        let url = match self.url {
            Some(url) => {
                let url = url.trim().to_string();
                if url.is_empty() {
                    bail!("--url must not be empty");
                }
                if !url.starts_with("ws://") {
                    bail!("unsupported WebSocket URL '{url}': only ws:// is supported");
                }
                url
            }
            None => {
                let base = settings.endpoint();
                ServerEndpoint::new(
                    self.host.unwrap_or(base.host),
                    self.port.unwrap_or(base.port),
                )
                .websocket_url()
            }
        };

        Ok(ListenerConfig {
            url,
            feed: self.feed,
            policy: settings.reconnect_policy(),
            connect_timeout: settings.connect_timeout(),
        })
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = cli.load_settings()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&settings.logging.level)),
        )
        .init();

    let config = cli.into_listener_config(settings)?;
    info!(url = %config.url, feed = ?config.feed, "ExamPrep notification listener starting");

    match config.feed {
        Feed::Recipes => run_feed::<Recipe>(config).await,
        Feed::Courses => run_feed::<Course>(config).await,
    }
}

/// Runs one feed until Ctrl+C or until the client gives up.
async fn run_feed<E: LiveEvent>(config: ListenerConfig) -> anyhow::Result<()> {
    let (main, mut main_loop) = main_queue();
    let client = NotificationClient::new(
        Arc::new(WsConnector::new(config.connect_timeout)),
        main,
        |event: E| info!("New {} added: {}", E::KIND, event.headline()),
    )
    .with_policy(config.policy);

    client.connect(&config.url);
    let mut status = client.status_changes();

    let outcome = loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal.context("failed to listen for Ctrl+C")?;
                info!("received Ctrl+C; disconnecting");
                break Ok(());
            }
            more = main_loop.run_once() => {
                if !more {
                    break Ok(());
                }
            }
            changed = status.changed() => {
                if changed.is_err() {
                    break Ok(());
                }
                let current = *status.borrow();
                if current.state == ConnectionState::Exhausted {
                    warn!("server unreachable; live updates stopped");
                    break Err(anyhow::anyhow!(
                        "gave up after {} reconnect attempts",
                        config.policy.max_retries
                    ));
                }
            }
        }
    };

    client.disconnect();
    let settled = tokio::time::timeout(
        SHUTDOWN_GRACE,
        status.wait_for(|s| {
            matches!(
                s.state,
                ConnectionState::Closed | ConnectionState::Exhausted | ConnectionState::Idle
            )
        }),
    )
    .await;
    if settled.is_err() {
        warn!("socket did not close within {SHUTDOWN_GRACE:?}");
    }

    info!("ExamPrep notification listener stopped");
    outcome
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["examprep-notify"]);

        assert_eq!(cli.feed, Feed::Recipes);
        assert_eq!(cli.url, None);
        assert_eq!(cli.host, None);
        assert_eq!(cli.port, None);
    }

    #[test]
    fn test_cli_feed_override() {
        let cli = Cli::parse_from(["examprep-notify", "--feed", "courses"]);
        assert_eq!(cli.feed, Feed::Courses);
    }

    #[test]
    fn test_cli_rejects_unknown_feed() {
        let result = Cli::try_parse_from(["examprep-notify", "--feed", "students"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_default_config_targets_local_server() {
        // Arrange
        let cli = Cli::parse_from(["examprep-notify"]);

        // Act
        let config = cli.into_listener_config(Settings::default()).unwrap();

        // Assert
        assert_eq!(config.url, "ws://127.0.0.1:2528");
        assert_eq!(config.policy, ReconnectPolicy::default());
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_host_and_port_override_settings() {
        // Arrange
        let mut settings = Settings::default();
        settings.server.host = "192.168.1.20".to_string();
        settings.server.port = 9000;
        let cli = Cli::parse_from(["examprep-notify", "--port", "2600"]);

        // Act
        let config = cli.into_listener_config(settings).unwrap();

        // Assert: host from file, port from CLI
        assert_eq!(config.url, "ws://192.168.1.20:2600");
    }

    #[test]
    fn test_url_takes_precedence_over_host() {
        let cli = Cli::parse_from([
            "examprep-notify",
            "--host",
            "ignored.example",
            "--url",
            "ws://10.0.2.2:2528",
        ]);

        let config = cli.into_listener_config(Settings::default()).unwrap();

        assert_eq!(config.url, "ws://10.0.2.2:2528");
    }

    #[test]
    fn test_blank_url_is_an_error() {
        let cli = Cli::parse_from(["examprep-notify", "--url", "  "]);
        assert!(cli.into_listener_config(Settings::default()).is_err());
    }

    #[test]
    fn test_secure_url_is_rejected() {
        let cli = Cli::parse_from(["examprep-notify", "--url", "wss://example.com"]);
        assert!(cli.into_listener_config(Settings::default()).is_err());
    }

    #[test]
    fn test_missing_config_file_loads_defaults() {
        let path = std::env::temp_dir().join("examprep-notify-absent").join("none.toml");
        let cli = Cli::parse_from(["examprep-notify", "--config", path.to_str().unwrap()]);

        let settings = cli.load_settings().unwrap();

        assert_eq!(settings, Settings::default());
    }
}
