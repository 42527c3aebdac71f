//! The on-wire payload crossing the durable queue.

use chat_common::{ids::MessageId, UserId};
use serde::{Deserialize, Serialize};

/// A queued send, addressed and timestamped, awaiting the dispatcher.
///
/// `timestamp` crosses the wire as ISO-8601 text rather than the
/// millisecond integer used internally by the store, matching the shape
/// the queue item is defined with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueItem {
    pub message_id: MessageId,
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub content: String,
    pub timestamp: String,
}

impl QueueItem {
    /// Builds a queue item from a store timestamp (ms since epoch),
    /// converting it to ISO-8601 for the wire.
    #[must_use]
    pub fn new(
        message_id: MessageId,
        sender_id: UserId,
        receiver_id: UserId,
        content: String,
        timestamp_ms: i64,
    ) -> Self {
        let timestamp = chrono::DateTime::from_timestamp_millis(timestamp_ms)
            .unwrap_or_default()
            .to_rfc3339();
        Self {
            message_id,
            sender_id,
            receiver_id,
            content,
            timestamp,
        }
    }

    /// Parses the wire timestamp back to milliseconds since epoch. Falls
    /// back to `0` on a malformed value rather than failing the whole
    /// dispatch (the stored row remains the source of truth for replay).
    #[must_use]
    pub fn timestamp_millis(&self) -> i64 {
        chrono::DateTime::parse_from_rfc3339(&self.timestamp)
            .map(|dt| dt.timestamp_millis())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_renders_the_timestamp_as_rfc3339() {
        let item = QueueItem::new(
            MessageId::generate(),
            UserId::new("u_alice"),
            UserId::new("u_bob"),
            "hi".to_string(),
            1_700_000_000_000,
        );
        assert_eq!(item.timestamp, "2023-11-14T22:13:20+00:00");
    }

    #[test]
    fn timestamp_millis_round_trips_through_new() {
        let item = QueueItem::new(
            MessageId::generate(),
            UserId::new("u_alice"),
            UserId::new("u_bob"),
            "hi".to_string(),
            1_700_000_000_000,
        );
        assert_eq!(item.timestamp_millis(), 1_700_000_000_000);
    }
}
