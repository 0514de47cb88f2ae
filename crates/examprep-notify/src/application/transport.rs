//! Transport seam between the notification client and the socket library.
//!
//! The client only needs two things from a transport: *open a connection to a
//! URL* ([`Connector`]) and *read frames from / close an open connection*
//! ([`FrameStream`]).  Keeping these behind traits lets the reconnect logic be
//! tested with scripted doubles and virtual time, while production code plugs
//! in the tokio-tungstenite adapter from `infrastructure::network`.

use async_trait::async_trait;
use thiserror::Error;

/// Normal-closure status code (RFC 6455 §7.4.1).
pub const CLOSE_NORMAL: u16 = 1000;

/// Transport-level failures.  None of these are fatal to the client; they all
/// feed the reconnect policy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The endpoint string could not be turned into a WebSocket request.
    #[error("invalid endpoint URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// TCP connect or WebSocket handshake failed (refused, DNS, HTTP error).
    #[error("connection failed: {0}")]
    Connect(String),

    /// The handshake did not complete in time.
    #[error("handshake timed out")]
    Timeout,

    /// An established connection broke (reset, protocol violation).
    #[error("connection error: {0}")]
    Io(String),
}

/// One inbound event from an open connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// A UTF-8 text frame.
    Text(String),
    /// The peer started the closing handshake.
    Close { code: u16, reason: String },
    /// Binary, ping, pong or raw frames; the client ignores them.
    Ignored,
}

/// An open connection.
#[async_trait]
pub trait FrameStream: Send {
    /// Waits for the next inbound event.
    ///
    /// Returns `None` once the connection has ended without a close frame.
    async fn next_frame(&mut self) -> Option<Result<Inbound, TransportError>>;

    /// Sends a close frame with `code` and `reason` and flushes it.
    async fn close(&mut self, code: u16, reason: &str) -> Result<(), TransportError>;
}

/// Opens connections.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    /// Opens a connection to `url` and completes the handshake.
    async fn open(&self, url: &str) -> Result<Box<dyn FrameStream>, TransportError>;
}
