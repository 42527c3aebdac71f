//! The client-facing event shapes named in the external interface: what a
//! session reads off the transport and what it writes back to it.

use serde::{Deserialize, Serialize};

use crate::ids::{ClientMessageId, MessageId, UserId};

/// Inbound: a client asking to send a directed message.
#[derive(Debug, Clone, Deserialize)]
pub struct SendMessageRequest {
    pub receiver_id: UserId,
    pub content: String,
    pub message_id_by_client: ClientMessageId,
    pub timestamp: i64,
}

/// Inbound: a client acknowledging receipt of a message.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageDeliveredRequest {
    pub message_id: MessageId,
    pub timestamp: i64,
}

/// Outbound: echoes the server-assigned id back to the sender.
#[derive(Debug, Clone, Serialize)]
pub struct MessageReceivedEvent {
    pub action: &'static str,
    pub message_id: MessageId,
    pub message_id_by_client: ClientMessageId,
    pub timestamp: i64,
}

impl MessageReceivedEvent {
    #[must_use]
    pub const fn new(message_id: MessageId, message_id_by_client: ClientMessageId, timestamp: i64) -> Self {
        Self {
            action: "message_received",
            message_id,
            message_id_by_client,
            timestamp,
        }
    }
}

/// Outbound: a message delivered to a live session or replayed on drain.
#[derive(Debug, Clone, Serialize)]
pub struct IncomingMessageEvent {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub message_id: MessageId,
    pub sender_id: UserId,
    pub content: String,
    pub timestamp: i64,
}

impl IncomingMessageEvent {
    #[must_use]
    pub const fn new(message_id: MessageId, sender_id: UserId, content: String, timestamp: i64) -> Self {
        Self {
            kind: "incoming_message",
            message_id,
            sender_id,
            content,
            timestamp,
        }
    }
}

/// Outbound: a client-visible failure.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorEvent {
    pub message: String,
}

impl From<&crate::ChatError> for ErrorEvent {
    fn from(err: &crate::ChatError) -> Self {
        Self {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_received_event_carries_the_client_echo() {
        let event = MessageReceivedEvent::new(MessageId::generate(), ClientMessageId::new(7), 1);
        assert_eq!(event.action, "message_received");
        assert_eq!(event.message_id_by_client.get(), 7);
    }
}
