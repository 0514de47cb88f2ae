//! WebSocket transport backed by `tokio-tungstenite`.
//!
//! [`WsConnector`] performs the HTTP upgrade handshake (bounded by a timeout)
//! and wraps the resulting socket in a [`WsFrameStream`], which maps
//! tungstenite messages onto the client's [`Inbound`] events.
//!
//! Ping frames are answered by tungstenite itself; the client never sees
//! them.  Only plain `ws://` endpoints are supported.

use std::borrow::Cow;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::{Error as WsError, Message as WsMessage};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::debug;

use crate::application::transport::{Connector, FrameStream, Inbound, TransportError};

/// Default bound on the TCP connect plus upgrade handshake.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Status reported when a close frame carries no code (RFC 6455 §7.1.5).
const CLOSE_NO_STATUS: u16 = 1005;

/// Opens WebSocket connections with `connect_async`.
#[derive(Debug, Clone)]
pub struct WsConnector {
    connect_timeout: Duration,
}

impl WsConnector {
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }
}

impl Default for WsConnector {
    fn default() -> Self {
        Self::new(DEFAULT_CONNECT_TIMEOUT)
    }
}

#[async_trait]
impl Connector for WsConnector {
    async fn open(&self, url: &str) -> Result<Box<dyn FrameStream>, TransportError> {
        let request = url
            .into_client_request()
            .map_err(|e| TransportError::InvalidUrl {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let (socket, response) = tokio::time::timeout(self.connect_timeout, connect_async(request))
            .await
            .map_err(|_| TransportError::Timeout)?
            .map_err(|e| TransportError::Connect(e.to_string()))?;

        debug!(status = %response.status(), "WebSocket upgrade accepted");
        Ok(Box::new(WsFrameStream { socket }))
    }
}

/// An open tungstenite socket.
pub struct WsFrameStream {
    socket: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl FrameStream for WsFrameStream {
    async fn next_frame(&mut self) -> Option<Result<Inbound, TransportError>> {
        let message = match self.socket.next().await? {
            Ok(message) => message,
            Err(WsError::ConnectionClosed | WsError::AlreadyClosed) => return None,
            Err(e) => return Some(Err(TransportError::Io(e.to_string()))),
        };

        let inbound = match message {
            WsMessage::Text(text) => Inbound::Text(text),
            WsMessage::Close(frame) => {
                let (code, reason) = frame
                    .map(|f| (u16::from(f.code), f.reason.into_owned()))
                    .unwrap_or((CLOSE_NO_STATUS, String::new()));
                Inbound::Close { code, reason }
            }
            WsMessage::Binary(_) | WsMessage::Ping(_) | WsMessage::Pong(_) | WsMessage::Frame(_) => {
                Inbound::Ignored
            }
        };
        Some(Ok(inbound))
    }

    async fn close(&mut self, code: u16, reason: &str) -> Result<(), TransportError> {
        let frame = CloseFrame {
            code: CloseCode::from(code),
            reason: Cow::Owned(reason.to_string()),
        };
        match self.socket.close(Some(frame)).await {
            // Already closed by the peer; nothing left to send.
            Ok(()) | Err(WsError::ConnectionClosed | WsError::AlreadyClosed) => Ok(()),
            Err(e) => Err(TransportError::Io(e.to_string())),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[test]
    fn test_default_connect_timeout_is_ten_seconds() {
        assert_eq!(WsConnector::default().connect_timeout(), Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_open_rejects_unparseable_url() {
        // Arrange
        let connector = WsConnector::default();

        // Act
        let result = connector.open("not a url").await;

        // Assert
        assert!(matches!(result, Err(TransportError::InvalidUrl { .. })));
    }

    #[tokio::test]
    async fn test_open_reports_refused_connection() {
        // Arrange: reserve a port, then release it so nothing listens there
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        // Act
        let result = WsConnector::default().open(&format!("ws://{addr}")).await;

        // Assert
        assert!(matches!(result, Err(TransportError::Connect(_))));
    }

    #[tokio::test]
    async fn test_open_times_out_when_server_never_answers_upgrade() {
        // Arrange: accept TCP but never speak HTTP
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let _server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
            drop(socket);
        });
        let connector = WsConnector::new(Duration::from_millis(100));

        // Act
        let result = connector.open(&format!("ws://{addr}")).await;

        // Assert
        assert!(matches!(result, Err(TransportError::Timeout)));
    }
}
