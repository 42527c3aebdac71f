//! The store's public operation contract (§4.2).

use async_trait::async_trait;
use chat_common::{ids::MessageId, UserId};

use crate::message::Message;

pub type Result<T> = chat_common::error::Result<T>;

/// A query against chat history between two participants.
#[derive(Debug, Clone, Copy)]
pub struct HistoryQuery<'a> {
    pub participant_a: &'a UserId,
    pub participant_b: &'a UserId,
    /// Only return rows strictly older than this timestamp, for pagination.
    pub before_timestamp: Option<i64>,
    /// Capped at 50 regardless of what is requested.
    pub limit: usize,
}

/// The durable record of every accepted message, indexed the way the
/// dispatch pipeline needs to query it: by id, by `(receiver, undelivered)`
/// for inbox fill, and by `(sender, receiver, timestamp)` for history.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Creates and persists a new message, server-assigning its id and
    /// setting `undelivered = true`. Either durable or failed: never partial.
    async fn create(
        &self,
        sender_id: UserId,
        receiver_id: UserId,
        content: String,
        timestamp: i64,
    ) -> Result<Message>;

    /// Fails with [`chat_common::ChatError::MessageNotFound`] when absent.
    async fn find_by_id(&self, message_id: MessageId) -> Result<Message>;

    /// Sets `undelivered = false`, `deliveredAt = now`.
    async fn mark_delivered(&self, message_id: MessageId, now: i64) -> Result<()>;

    /// Compensator: clears `deliveredAt`, sets `undelivered = true`.
    async fn mark_undelivered(&self, message_id: MessageId) -> Result<()>;

    /// Compensator: removes the row entirely. Used only by the ingress
    /// compensator when a queue publish fails after the row was created.
    async fn delete_by_id(&self, message_id: MessageId) -> Result<()>;

    /// All undelivered messages for `receiver_id`, ascending by timestamp.
    async fn find_undelivered(&self, receiver_id: &UserId) -> Result<Vec<Message>>;

    /// Chat history between two participants, descending by timestamp,
    /// capped at 50 rows regardless of the requested limit.
    async fn chat_history(&self, query: HistoryQuery<'_>) -> Result<Vec<Message>>;

    /// Retention sweep: deletes delivered messages whose `deliveredAt` is
    /// older than `retention_days`. Returns the number of rows removed.
    async fn delete_delivered_older_than(&self, retention_days: u32, now: i64) -> Result<usize>;
}

pub const MAX_HISTORY_LIMIT: usize = 50;
