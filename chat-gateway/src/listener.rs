//! The accept loop: bind once, spawn one task per connection, drain
//! in-flight sessions on shutdown rather than cutting them off.

use std::net::SocketAddr;

use chat_common::{
    internal,
    traits::protocol::{Protocol, SessionHandler},
    Signal,
};
use chat_tracing::traced;
use futures_util::future::join_all;
use tokio::net::TcpListener;

pub struct Listener<Proto: Protocol> {
    handler: Proto,
    socket: SocketAddr,
    args: Proto::ExtraArgs,
    context: Proto::Context,
}

impl<Proto: Protocol> Listener<Proto>
where
    Proto::ExtraArgs: Clone,
{
    #[must_use]
    pub fn new(socket: SocketAddr, args: Proto::ExtraArgs) -> Self {
        Self {
            handler: Proto::default(),
            socket,
            args,
            context: Proto::Context::default(),
        }
    }

    #[traced(instrument(level = tracing::Level::TRACE, skip_all, err))]
    pub async fn serve(&self, mut shutdown: tokio::sync::broadcast::Receiver<Signal>) -> anyhow::Result<()> {
        internal!("Serving gateway on {:?}", self.socket);
        let mut sessions = Vec::default();

        let listener = TcpListener::bind(self.socket).await?;

        loop {
            tokio::select! {
                sig = shutdown.recv() => {
                    if matches!(sig, Ok(Signal::Shutdown)) {
                        internal!(level = INFO, "Gateway listener {} received shutdown signal, draining sessions ...", self.socket);
                        join_all(sessions).await;
                        break;
                    }
                }

                connection = listener.accept() => {
                    let (stream, address) = connection?;
                    let handler = self.handler.handle(stream, address, self.context.clone(), self.args.clone());
                    sessions.push(tokio::spawn(async move {
                        if let Err(err) = handler.run().await {
                            internal!(level = ERROR, "session error: {err}");
                        }
                    }));
                }
            }
        }

        Ok(())
    }
}
