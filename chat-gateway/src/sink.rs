//! The dispatcher's attempt-a-live-emit hook, backed by the registry.

use std::sync::Arc;

use async_trait::async_trait;
use chat_common::{events::IncomingMessageEvent, UserId};
use chat_dispatch::SessionSink;
use chat_registry::ConnectionRegistry;

use crate::handle::SessionHandle;

pub struct GatewaySink {
    registry: Arc<ConnectionRegistry<SessionHandle>>,
}

impl GatewaySink {
    #[must_use]
    pub const fn new(registry: Arc<ConnectionRegistry<SessionHandle>>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl SessionSink for GatewaySink {
    async fn send_to_user(&self, user_id: &UserId, event: IncomingMessageEvent) -> bool {
        let Some(handle) = self.registry.handle_of(user_id) else {
            return false;
        };
        let Ok(value) = serde_json::to_value(&event) else {
            return false;
        };
        handle.push(value)
    }
}

#[cfg(test)]
mod tests {
    use chat_common::ids::MessageId;
    use tokio::sync::mpsc;

    use super::*;

    #[tokio::test]
    async fn no_handle_registered_returns_false() {
        let sink = GatewaySink::new(Arc::new(ConnectionRegistry::new()));
        let event = IncomingMessageEvent::new(MessageId::generate(), UserId::new("u_alice"), "hi".to_string(), 1);
        assert!(!sink.send_to_user(&UserId::new("u_bob"), event).await);
    }

    #[tokio::test]
    async fn registered_handle_receives_the_serialized_event() {
        let registry = Arc::new(ConnectionRegistry::new());
        let (tx, mut rx) = mpsc::unbounded_channel();
        registry.add(UserId::new("u_bob"), SessionHandle::new(tx));

        let sink = GatewaySink::new(registry);
        let event = IncomingMessageEvent::new(MessageId::generate(), UserId::new("u_alice"), "hi".to_string(), 1);
        assert!(sink.send_to_user(&UserId::new("u_bob"), event).await);

        let value = rx.recv().await.unwrap();
        assert_eq!(value["type"], "incoming_message");
        assert_eq!(value["content"], "hi");
    }
}
