//! Protocol module: JSON frame decoding and the reconnect backoff policy.

pub mod backoff;
pub mod frame;

pub use backoff::{ReconnectPolicy, RetryState};
pub use frame::{decode_frame, FrameError, LiveEvent};
