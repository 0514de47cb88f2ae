//! Domain entities for the ExamPrep live-update client.
//!
//! This module contains pure data types with no infrastructure dependencies.
//!
//! # What lives here?
//!
//! - [`entities`] – The records the server pushes when something is created:
//!   [`entities::Recipe`] and [`entities::Course`].
//! - [`endpoint`] – The server host/port pair and the URLs derived from it.
//!
//! Code in outer layers (network, settings, CLI) depends on the domain, but the
//! domain never depends on them.

pub mod endpoint;
pub mod entities;
