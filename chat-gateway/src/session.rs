//! A single session's lifetime: handshake, inbox drain, then the transport
//! loop that services both directions until the socket closes.

use std::{net::SocketAddr, sync::Arc};

use chat_cache::InboxCache;
use chat_common::{
    events::{ErrorEvent, IncomingMessageEvent, MessageDeliveredRequest, MessageReceivedEvent, SendMessageRequest},
    traits::{fsm::FiniteStateMachine, protocol::SessionHandler},
    ChatError, UserId,
};
use chat_dispatch::{DeliveryAck, Ingress};
use chat_registry::{ConnectionRegistry, Handle};
use chat_store::MessageStore;
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::{
    connection::Connection,
    handle::SessionHandle,
    state::{SessionInput, SessionState},
};

/// Shared collaborators every session in this listener draws on.
pub struct GatewayDeps {
    pub registry: Arc<ConnectionRegistry<SessionHandle>>,
    pub cache: Arc<dyn InboxCache>,
    pub store: Arc<dyn MessageStore>,
    pub ingress: Arc<Ingress>,
    pub delivery_ack: Arc<DeliveryAck>,
    pub server_id: String,
}

#[derive(Deserialize)]
#[serde(tag = "event", content = "data")]
enum InboundFrame {
    #[serde(rename = "send_message")]
    SendMessage(SendMessageRequest),
    #[serde(rename = "message_delivered")]
    MessageDelivered(MessageDeliveredRequest),
}

#[derive(Deserialize)]
struct Handshake {
    user_id: String,
}

pub struct GatewaySession {
    connection: Connection,
    peer: SocketAddr,
    state: SessionState,
    deps: Arc<GatewayDeps>,
    handle: SessionHandle,
    outbound_rx: mpsc::UnboundedReceiver<serde_json::Value>,
}

impl GatewaySession {
    #[must_use]
    pub fn new(connection: Connection, peer: SocketAddr, deps: Arc<GatewayDeps>) -> Self {
        let (tx, outbound_rx) = mpsc::unbounded_channel();
        Self {
            connection,
            peer,
            state: SessionState::default(),
            deps,
            handle: SessionHandle::new(tx),
            outbound_rx,
        }
    }

    async fn handshake(&mut self) -> anyhow::Result<Option<UserId>> {
        let Some(handshake) = self.connection.recv_json::<Handshake>().await? else {
            return Ok(None);
        };
        if handshake.user_id.is_empty() {
            return Ok(None);
        }
        Ok(Some(UserId::new(handshake.user_id)))
    }

    async fn bind(&mut self, user_id: UserId) -> anyhow::Result<()> {
        self.state = std::mem::take(&mut self.state).transition(SessionInput::Identified(user_id.clone()), &mut ());

        if let Some(evicted) = self.deps.registry.add(user_id.clone(), self.handle.clone()) {
            warn!(user_id = %user_id, evicted_handle = evicted.id(), "new session evicted a stale one for the same user");
            evicted.cancel();
        }
        self.deps.cache.set_user_connection(&user_id, &self.deps.server_id).await?;

        if chat_metrics::is_enabled() {
            chat_metrics::metrics().sessions_active.add(1, &[]);
        }

        self.drain(&user_id).await;
        Ok(())
    }

    /// Replays every pending message in the user's inbox. Best-effort: a
    /// missing row (already swept by retention) is skipped, not fatal.
    async fn drain(&mut self, user_id: &UserId) {
        let pending = match self.deps.cache.get_inbox(user_id).await {
            Ok(ids) => ids,
            Err(err) => {
                warn!(user_id = %user_id, error = %err, "inbox drain lookup failed");
                return;
            }
        };

        for message_id in pending {
            match self.deps.store.find_by_id(message_id).await {
                Ok(message) => {
                    let event = IncomingMessageEvent::new(
                        message.message_id,
                        message.sender_id,
                        message.content,
                        message.timestamp,
                    );
                    if let Err(err) = self.connection.send_json(&event).await {
                        warn!(user_id = %user_id, error = %err, "drain replay failed, aborting session");
                        return;
                    }
                }
                Err(ChatError::MessageNotFound(_)) => {
                    debug!(message_id = %message_id, "drained id no longer in the store, skipping");
                }
                Err(err) => {
                    warn!(message_id = %message_id, error = %err, "drain lookup failed");
                }
            }
        }
    }

    async fn handle_frame(&mut self, user_id: &UserId, frame: InboundFrame) -> anyhow::Result<()> {
        match frame {
            InboundFrame::SendMessage(request) => {
                let result = self
                    .deps
                    .ingress
                    .send(user_id.clone(), request.receiver_id, request.content, request.timestamp)
                    .await;
                match result {
                    Ok(accepted) => {
                        let event = MessageReceivedEvent::new(
                            accepted.message_id,
                            request.message_id_by_client,
                            accepted.timestamp,
                        );
                        self.connection.send_json(&event).await?;
                    }
                    Err(err) => {
                        self.connection.send_json(&ErrorEvent::from(&err)).await?;
                    }
                }
            }
            InboundFrame::MessageDelivered(request) => {
                if let Err(err) = self.deps.delivery_ack.ack(user_id, request.message_id, request.timestamp).await {
                    self.connection.send_json(&ErrorEvent::from(&err)).await?;
                }
            }
        }
        Ok(())
    }

    async fn teardown(&mut self, user_id: &UserId) {
        self.state = std::mem::take(&mut self.state).transition(SessionInput::TransportClosed, &mut ());

        // A session evicted by a newer one for the same user_id reaches here too
        // (via the cancellation branch in `run`), but by then the registry and
        // presence key already belong to that newer session — clobbering them
        // would undo its bind.
        let still_bound = self.deps.registry.handle_of(user_id).is_some_and(|handle| handle.id() == self.handle.id());
        if still_bound {
            self.deps.registry.remove(user_id);
            if let Err(err) = self.deps.cache.remove_user_connection(user_id).await {
                warn!(user_id = %user_id, error = %err, "failed to clear presence on teardown");
            }
        }

        self.state = std::mem::take(&mut self.state).transition(SessionInput::DrainComplete, &mut ());

        if chat_metrics::is_enabled() {
            chat_metrics::metrics().sessions_active.add(-1, &[]);
        }

        info!(user_id = %user_id, peer = %self.peer, "session closed");
    }
}

impl SessionHandler for GatewaySession {
    async fn run(mut self) -> anyhow::Result<()> {
        let Some(user_id) = self.handshake().await? else {
            self.state = std::mem::take(&mut self.state).transition(SessionInput::HandshakeRejected, &mut ());
            debug!(peer = %self.peer, "handshake rejected");
            return Ok(());
        };

        self.bind(user_id.clone()).await?;
        info!(user_id = %user_id, peer = %self.peer, "session bound");

        loop {
            tokio::select! {
                () = self.handle.cancelled() => {
                    debug!(user_id = %user_id, peer = %self.peer, "session superseded by a newer connection for this user, closing");
                    break;
                }
                line = self.connection.recv_line() => {
                    let Some(line) = line? else {
                        break;
                    };
                    match serde_json::from_str::<InboundFrame>(&line) {
                        Ok(frame) => self.handle_frame(&user_id, frame).await?,
                        Err(err) => {
                            let event = ErrorEvent { message: format!("malformed frame: {err}") };
                            self.connection.send_json(&event).await?;
                        }
                    }
                }
                outbound = self.outbound_rx.recv() => {
                    let Some(value) = outbound else {
                        break;
                    };
                    self.connection.send_json(&value).await?;
                }
            }
        }

        self.teardown(&user_id).await;
        Ok(())
    }
}
