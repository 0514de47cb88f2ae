//! Infrastructure layer for the notification listener.
//!
//! Contains the adapters that touch the outside world: the tokio-tungstenite
//! WebSocket transport and settings-file storage.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `examprep_core`, but MUST NOT be imported by the `application` layer.

pub mod network;
pub mod storage;
