//! The inbox cache's operation contract (§4.3).

use async_trait::async_trait;
use chat_common::{ids::MessageId, UserId};

pub type Result<T> = chat_common::error::Result<T>;

/// A short-horizon cached copy of a message body, for fast fetch without
/// hitting the store. Advisory only: the store row is authoritative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedMessage {
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub content: String,
    pub timestamp: i64,
}

/// Per-recipient pending-message lists and connection presence.
///
/// The cache is advisory for presence (a stale `true` is expected and
/// handled by falling through to an offline deposit) but authoritative for
/// the pending-list tail between persistence and delivery.
#[async_trait]
pub trait InboxCache: Send + Sync {
    /// Appends `message_id` to `user_id`'s inbox and refreshes its TTL.
    /// Idempotent: a `message_id` already present is not appended twice.
    async fn add_to_inbox(&self, user_id: &UserId, message_id: MessageId) -> Result<()>;

    /// All pending ids for `user_id`, in the order they were added.
    async fn get_inbox(&self, user_id: &UserId) -> Result<Vec<MessageId>>;

    /// Removes the first occurrence of `message_id` from `user_id`'s inbox.
    async fn remove_from_inbox(&self, user_id: &UserId, message_id: MessageId) -> Result<()>;

    async fn clear_inbox(&self, user_id: &UserId) -> Result<()>;

    /// Records that `user_id` has a live session on `server_id`, TTL'd so a
    /// silent crash self-heals rather than pinning the user online forever.
    async fn set_user_connection(&self, user_id: &UserId, server_id: &str) -> Result<()>;

    async fn is_user_online(&self, user_id: &UserId) -> Result<bool>;

    async fn remove_user_connection(&self, user_id: &UserId) -> Result<()>;

    async fn get_user_server_id(&self, user_id: &UserId) -> Result<Option<String>>;

    /// Optional fast-fetch cache of a message body, written alongside an
    /// offline deposit.
    async fn cache_message(&self, message_id: MessageId, message: &CachedMessage) -> Result<()>;
}
