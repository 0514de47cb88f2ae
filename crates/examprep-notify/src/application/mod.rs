//! Application layer: the reconnecting notification client and the seams it
//! is built on.
//!
//! - [`transport`]: `Connector` / `FrameStream` traits the client talks to.
//! - [`main_context`]: where subscriber callbacks run.
//! - [`notification_client`]: connection lifecycle, retry policy, delivery.

pub mod main_context;
pub mod notification_client;
pub mod transport;

pub use main_context::{main_queue, MainContext, MainHandle, MainLoop, MainTask};
pub use notification_client::{ClientStatus, ConnectionState, NotificationClient};
pub use transport::{Connector, FrameStream, Inbound, TransportError};
