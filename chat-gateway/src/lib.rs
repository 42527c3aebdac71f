#![warn(clippy::pedantic, clippy::all, clippy::nursery)]
#![allow(clippy::must_use_candidate)]

//! The session gateway (§4.7): one TCP listener, a newline-delimited-JSON
//! framing, a per-connection `Connecting -> Bound -> Draining -> Closed`
//! state chart, and the live-delivery sink the dispatcher calls into.

pub mod config;
pub mod connection;
pub mod handle;
pub mod listener;
pub mod protocol;
pub mod server;
pub mod sink;
pub mod state;
pub mod session;

pub use config::GatewayConfig;
pub use handle::SessionHandle;
pub use protocol::ChatProtocol;
pub use server::GatewayServer;
pub use session::{GatewayDeps, GatewaySession};
pub use sink::GatewaySink;
