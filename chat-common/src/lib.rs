#![warn(clippy::pedantic, clippy::all, clippy::nursery)]
#![allow(clippy::must_use_candidate)]

//! Types, error taxonomy, and infrastructure shared by every crate in the chat
//! delivery service: message/user identifiers, the error kinds each component
//! raises, the shutdown [`Signal`], logging macros, and the small set of
//! generic traits (`FiniteStateMachine`, `Protocol`, `SessionHandler`) that the
//! session gateway is built around.

pub mod config;
pub mod error;
pub mod events;
pub mod ids;
pub mod logging;
pub mod traits;

pub use error::{ChatError, DatabaseError, Result};
pub use ids::{ClientMessageId, MessageId, UserId};
pub use tracing;

/// Broadcast to every running component to begin a coordinated shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Signal {
    /// Stop accepting new work and drain what is in flight.
    Shutdown,
    /// All listeners and consumers have finished draining.
    Finalised,
}
