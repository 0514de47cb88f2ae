//! # examprep-core
//!
//! Shared library for the ExamPrep live-update client containing the domain
//! entities pushed by the server, the JSON frame decoder, and the reconnect
//! backoff policy.
//!
//! It has zero dependencies on sockets, async runtimes, or UI frameworks, so
//! everything here can be unit-tested without a network.
//!
//! # Architecture overview (for beginners)
//!
//! The ExamPrep server keeps a WebSocket open to every client.  Whenever a new
//! recipe or course is created through the REST API, the server pushes the
//! created entity as one JSON text frame to every connected client.  The
//! client parses the frame and hands the entity to the screen that is
//! currently showing the list.
//!
//! This crate (`examprep-core`) is the shared foundation.  It defines:
//!
//! - **`domain`** – The entities (`Recipe`, `Course`) and the server endpoint
//!   that REST and WebSocket URLs are derived from.
//!
//! - **`protocol`** – How a text frame becomes a typed entity
//!   ([`decode_frame`]) and how long to wait before reconnecting after the
//!   connection drops ([`ReconnectPolicy`], [`RetryState`]).

pub mod domain;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `examprep_core::Recipe` instead of `examprep_core::domain::entities::Recipe`.
pub use domain::endpoint::ServerEndpoint;
pub use domain::entities::{Course, CourseStatus, Recipe};
pub use protocol::backoff::{ReconnectPolicy, RetryState};
pub use protocol::frame::{decode_frame, FrameError, LiveEvent};
