//! Generic per-connection session wiring, shared by every listener.
//!
//! A [`Protocol`] knows how to turn an accepted [`tokio::net::TcpStream`] into
//! a runnable [`SessionHandler`]; a `Listener<Proto>` (see `chat-gateway`)
//! owns the accept loop and spawns one task per session.

use std::{fmt::Debug, future::Future, net::SocketAddr};

use serde::{de::DeserializeOwned, Serialize};
use tokio::net::TcpStream;

/// Runs a single accepted connection to completion.
pub trait SessionHandler {
    fn run(self) -> impl Future<Output = anyhow::Result<()>> + Send;
}

/// Produces a [`SessionHandler`] for each accepted connection.
pub trait Protocol: Default + Send + Sync {
    type Session: SessionHandler + Send + Sync + 'static;
    type Context: Default + Clone + Debug + Send + Sync + Serialize + DeserializeOwned;
    type ExtraArgs;

    fn handle(
        &self,
        stream: TcpStream,
        address: SocketAddr,
        context: Self::Context,
        args: Self::ExtraArgs,
    ) -> Self::Session;
}
