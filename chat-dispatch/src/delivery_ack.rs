//! Delivery acknowledgment (§4.8): mark delivered, drop from the inbox,
//! compensate on partial failure.

use std::sync::Arc;

use chat_cache::InboxCache;
use chat_common::{error::Result, ids::MessageId, UserId};
use chat_store::MessageStore;
use tracing::error;

pub struct DeliveryAck {
    store: Arc<dyn MessageStore>,
    cache: Arc<dyn InboxCache>,
}

impl DeliveryAck {
    #[must_use]
    pub const fn new(store: Arc<dyn MessageStore>, cache: Arc<dyn InboxCache>) -> Self {
        Self { store, cache }
    }

    /// Processes a receiver's `message_delivered` event.
    ///
    /// # Errors
    /// Propagates a store error if `MarkDelivered` itself fails. A failure
    /// of `RemoveFromInbox` is compensated by reverting the store row to
    /// undelivered and is not propagated unless that compensation also
    /// fails, in which case the cache error is returned.
    pub async fn ack(&self, user_id: &UserId, message_id: MessageId, now: i64) -> Result<()> {
        self.store.mark_delivered(message_id, now).await?;

        if let Err(cache_err) = self.cache.remove_from_inbox(user_id, message_id).await {
            if let Err(compensation_err) = self.store.mark_undelivered(message_id).await {
                error!(
                    message_id = %message_id,
                    error = %compensation_err,
                    "delivery-ack compensation failed: row left marked delivered despite inbox residue"
                );
                return Err(compensation_err);
            }
            return Err(cache_err);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chat_cache::CachedMessage;
    use chat_common::ChatError;
    use chat_store::backends::memory::MemoryStore;

    use super::*;

    struct FailingCache;

    #[async_trait]
    impl InboxCache for FailingCache {
        async fn add_to_inbox(&self, _: &UserId, _: MessageId) -> Result<()> {
            Ok(())
        }
        async fn get_inbox(&self, _: &UserId) -> Result<Vec<MessageId>> {
            Ok(Vec::new())
        }
        async fn remove_from_inbox(&self, _: &UserId, _: MessageId) -> Result<()> {
            Err(ChatError::CacheOperationFailed {
                operation: "lrem",
                key: "inbox:u_bob".to_string(),
            })
        }
        async fn clear_inbox(&self, _: &UserId) -> Result<()> {
            Ok(())
        }
        async fn set_user_connection(&self, _: &UserId, _: &str) -> Result<()> {
            Ok(())
        }
        async fn is_user_online(&self, _: &UserId) -> Result<bool> {
            Ok(false)
        }
        async fn remove_user_connection(&self, _: &UserId) -> Result<()> {
            Ok(())
        }
        async fn get_user_server_id(&self, _: &UserId) -> Result<Option<String>> {
            Ok(None)
        }
        async fn cache_message(&self, _: MessageId, _: &CachedMessage) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn ack_failure_in_cache_reverts_the_store_row() {
        let store = Arc::new(MemoryStore::new());
        let message = store
            .create(UserId::new("u_alice"), UserId::new("u_bob"), "hi".to_string(), 1)
            .await
            .unwrap();

        let ack = DeliveryAck::new(store.clone(), Arc::new(FailingCache));
        let err = ack
            .ack(&UserId::new("u_bob"), message.message_id, 100)
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::CacheOperationFailed { .. }));

        let row = store.find_by_id(message.message_id).await.unwrap();
        assert!(row.undelivered);
        assert!(row.delivered_at.is_none());
    }
}
