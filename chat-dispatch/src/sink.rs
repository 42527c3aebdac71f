//! The dispatcher's view of the session gateway: just enough to attempt a
//! live emit without depending on the gateway's transport machinery.

use async_trait::async_trait;
use chat_common::{events::IncomingMessageEvent, UserId};

/// Attempts delivery to a user's live session, if one exists on this
/// instance.
#[async_trait]
pub trait SessionSink: Send + Sync {
    /// Returns `true` iff a local session handle exists and the emit was
    /// attempted; `false` otherwise (no local session, or stale presence).
    async fn send_to_user(&self, user_id: &UserId, event: IncomingMessageEvent) -> bool;
}
