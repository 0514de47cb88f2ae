//! examprep-notify library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does examprep-notify do? (for beginners)
//!
//! The ExamPrep server broadcasts every newly created recipe or course as a
//! JSON text frame over a WebSocket.  This crate keeps one such WebSocket
//! open for the application:
//!
//! 1. Connects to the server's push endpoint (`ws://host:2528`).
//! 2. Parses each text frame into a typed entity (`Recipe` or `Course`);
//!    malformed frames are logged and skipped.
//! 3. Hands each entity to a subscriber callback on the application's main
//!    context, so UI code never runs on a network thread.
//! 4. Reconnects after failures with a linear backoff, giving up after five
//!    consecutive failures.
//! 5. Closes cleanly (code 1000) when the application disconnects, and never
//!    delivers anything afterwards.

/// Application layer: the notification client and its seams.
pub mod application;

/// Infrastructure layer: WebSocket transport and settings storage.
pub mod infrastructure;
