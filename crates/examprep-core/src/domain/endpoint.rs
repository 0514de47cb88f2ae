//! Server endpoint: the host/port pair both REST and push URLs derive from.
//!
//! The ExamPrep server serves its REST API and its WebSocket push channel on
//! the same port, so a single [`ServerEndpoint`] is enough to build both:
//!
//! | Use                 | URL                        |
//! |---------------------|----------------------------|
//! | REST base URL       | `http://<host>:<port>/`    |
//! | WebSocket push feed | `ws://<host>:<port>`       |
//!
//! When running the server inside an Android emulator's host machine the host
//! is usually `10.0.2.2`; on a physical device it is the host machine's LAN
//! address.

use std::fmt;

/// Default server port.
pub const DEFAULT_PORT: u16 = 2528;

/// Default server host.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Host and port of the ExamPrep server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerEndpoint {
    pub host: String,
    pub port: u16,
}

impl ServerEndpoint {
    /// Creates an endpoint from a host name (or IP literal) and a port.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Base URL of the REST API, always ending in `/`.
    pub fn rest_base_url(&self) -> String {
        format!("http://{}:{}/", self.host, self.port)
    }

    /// URL of the WebSocket push channel.
    pub fn websocket_url(&self) -> String {
        format!("ws://{}:{}", self.host, self.port)
    }
}

impl Default for ServerEndpoint {
    fn default() -> Self {
        Self::new(DEFAULT_HOST, DEFAULT_PORT)
    }
}

impl fmt::Display for ServerEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
