//! Composes however many listeners the binary wants behind one shutdown
//! broadcast; currently always exactly one (the spec names a single bind
//! port), kept as a `Vec` so a future multi-interface bind needs no redesign.

use std::{net::SocketAddr, sync::Arc};

use chat_common::Signal;
use chat_tracing::traced;
use futures_util::future::join_all;

use crate::{listener::Listener, protocol::ChatProtocol, session::GatewayDeps};

#[derive(Default)]
pub struct GatewayServer {
    listeners: Vec<Listener<ChatProtocol>>,
}

impl GatewayServer {
    #[must_use]
    pub fn new(socket: SocketAddr, deps: Arc<GatewayDeps>) -> Self {
        Self {
            listeners: vec![Listener::new(socket, deps)],
        }
    }

    #[traced(instrument(level = tracing::Level::TRACE, skip_all), timing(precision = "us"))]
    pub async fn serve(&self, shutdown: tokio::sync::broadcast::Receiver<Signal>) -> anyhow::Result<()> {
        join_all(self.listeners.iter().map(|l| l.serve(shutdown.resubscribe()))).await;
        Ok(())
    }
}
