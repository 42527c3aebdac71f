//! Turns an accepted connection into a runnable [`GatewaySession`].

use std::{net::SocketAddr, sync::Arc};

use chat_common::traits::protocol::Protocol;
use tokio::net::TcpStream;

use crate::session::{GatewayDeps, GatewaySession};

#[derive(Default)]
pub struct ChatProtocol;

impl Protocol for ChatProtocol {
    type Session = GatewaySession;
    type Context = ();
    type ExtraArgs = Arc<GatewayDeps>;

    fn handle(&self, stream: TcpStream, address: SocketAddr, _context: Self::Context, args: Self::ExtraArgs) -> Self::Session {
        GatewaySession::new(crate::connection::Connection::new(stream), address, args)
    }
}
