//! The persisted [`Message`] row and its lifecycle invariants.

use chat_common::{MessageId, UserId};
use serde::{Deserialize, Serialize};

/// A durably stored chat message.
///
/// `undelivered = true` holds from creation until the receiver acknowledges
/// delivery; it is the sole field the dispatch pipeline mutates after
/// creation besides `deliveredAt`, and the two are kept in lockstep by every
/// mutator in this crate: `undelivered == deliveredAt.is_none()` always.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub message_id: MessageId,
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub content: String,
    /// Sender-supplied wall-clock instant (ms since epoch), retained verbatim.
    pub timestamp: i64,
    pub undelivered: bool,
    pub delivered_at: Option<i64>,
    /// Reserved for a future read-receipt feature; never set by the core.
    pub read_at: Option<i64>,
}

impl Message {
    pub(crate) fn new(sender_id: UserId, receiver_id: UserId, content: String, timestamp: i64) -> Self {
        Self {
            message_id: MessageId::generate(),
            sender_id,
            receiver_id,
            content,
            timestamp,
            undelivered: true,
            delivered_at: None,
            read_at: None,
        }
    }

    pub(crate) fn mark_delivered(&mut self, now: i64) {
        self.undelivered = false;
        self.delivered_at = Some(now);
    }

    pub(crate) fn mark_undelivered(&mut self) {
        self.undelivered = true;
        self.delivered_at = None;
    }
}
