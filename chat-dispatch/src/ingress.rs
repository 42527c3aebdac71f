//! The send path (§4.5): validate, persist, enqueue, compensate on
//! partial failure.

use std::{sync::Arc, time::Instant};

use chat_common::{
    error::{Result, ValidationError},
    ids::MessageId,
    ChatError, UserId,
};
use chat_queue::{MessageQueue, QueueItem};
use chat_store::MessageStore;
use tracing::error;

const MAX_CONTENT_LEN: usize = 1000;

/// What the sender is told once a send is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Accepted {
    pub message_id: MessageId,
    pub timestamp: i64,
}

pub struct Ingress {
    store: Arc<dyn MessageStore>,
    queue: Arc<dyn MessageQueue>,
}

impl Ingress {
    #[must_use]
    pub const fn new(store: Arc<dyn MessageStore>, queue: Arc<dyn MessageQueue>) -> Self {
        Self { store, queue }
    }

    fn validate(receiver_id: &UserId, content: &str) -> Result<()> {
        if receiver_id.as_str().is_empty() {
            return Err(ChatError::Validation(ValidationError::EmptyReceiver));
        }
        let len = content.chars().count();
        if !(1..=MAX_CONTENT_LEN).contains(&len) {
            return Err(ChatError::Validation(ValidationError::ContentLength {
                actual: len,
                max: MAX_CONTENT_LEN,
            }));
        }
        Ok(())
    }

    /// Persists and enqueues a send. `sender_id` must come from the session
    /// binding, never from the client payload.
    ///
    /// # Errors
    /// Returns a validation error if `receiver_id`/`content` are malformed,
    /// or a store/queue error if persistence or publish fails. On publish
    /// failure, the just-created row is deleted (compensation); a failure
    /// of the compensator itself is logged, not propagated.
    pub async fn send(
        &self,
        sender_id: UserId,
        receiver_id: UserId,
        content: String,
        timestamp: i64,
    ) -> Result<Accepted> {
        let started = Instant::now();
        let result = self.send_inner(sender_id, receiver_id, content, timestamp).await;

        if chat_metrics::is_enabled() {
            let metrics = chat_metrics::metrics();
            metrics.send_duration_seconds.record(started.elapsed().as_secs_f64(), &[]);
            if result.is_ok() {
                metrics.messages_sent_total.add(1, &[]);
            } else {
                metrics.messages_failed_total.add(1, &[]);
            }
        }

        result
    }

    async fn send_inner(
        &self,
        sender_id: UserId,
        receiver_id: UserId,
        content: String,
        timestamp: i64,
    ) -> Result<Accepted> {
        Self::validate(&receiver_id, &content)?;

        let message = self
            .store
            .create(sender_id.clone(), receiver_id.clone(), content.clone(), timestamp)
            .await?;

        let item = QueueItem::new(message.message_id, sender_id, receiver_id, content, timestamp);
        if let Err(publish_err) = self.queue.publish(&item).await {
            if let Err(compensation_err) = self.store.delete_by_id(message.message_id).await {
                error!(
                    message_id = %message.message_id,
                    error = %compensation_err,
                    "ingress compensation failed: row now stranded undelivered"
                );
            }
            return Err(publish_err);
        }

        Ok(Accepted {
            message_id: message.message_id,
            timestamp: chrono::Utc::now().timestamp_millis(),
        })
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chat_store::backends::memory::MemoryStore;

    use super::*;

    struct FailingQueue;

    #[async_trait]
    impl MessageQueue for FailingQueue {
        async fn publish(&self, _item: &QueueItem) -> chat_common::error::Result<()> {
            Err(ChatError::QueuePublishFailed("broker unreachable".to_string()))
        }
    }

    struct AcceptingQueue {
        published: std::sync::Mutex<Vec<QueueItem>>,
    }

    #[async_trait]
    impl MessageQueue for AcceptingQueue {
        async fn publish(&self, item: &QueueItem) -> chat_common::error::Result<()> {
            self.published.lock().unwrap().push(item.clone());
            Ok(())
        }
    }

    #[tokio::test]
    async fn rejects_empty_receiver() {
        let store = Arc::new(MemoryStore::new());
        let queue = Arc::new(AcceptingQueue {
            published: std::sync::Mutex::new(Vec::new()),
        });
        let ingress = Ingress::new(store, queue);

        let err = ingress
            .send(UserId::new("u_alice"), UserId::new(""), "hi".to_string(), 1)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ChatError::Validation(ValidationError::EmptyReceiver)
        ));
    }

    #[tokio::test]
    async fn rejects_content_over_1000_code_units() {
        let store = Arc::new(MemoryStore::new());
        let queue = Arc::new(AcceptingQueue {
            published: std::sync::Mutex::new(Vec::new()),
        });
        let ingress = Ingress::new(store, queue);

        let content = "x".repeat(1001);
        let err = ingress
            .send(UserId::new("u_alice"), UserId::new("u_bob"), content, 1)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ChatError::Validation(ValidationError::ContentLength { actual: 1001, max: 1000 })
        ));
    }

    #[tokio::test]
    async fn accepts_content_at_exactly_1000_code_units() {
        let store = Arc::new(MemoryStore::new());
        let queue = Arc::new(AcceptingQueue {
            published: std::sync::Mutex::new(Vec::new()),
        });
        let ingress = Ingress::new(store, queue);

        let content = "x".repeat(1000);
        let accepted = ingress
            .send(UserId::new("u_alice"), UserId::new("u_bob"), content, 1)
            .await
            .unwrap();
        assert!(store_contains(&ingress, accepted.message_id).await);
    }

    async fn store_contains(ingress: &Ingress, id: MessageId) -> bool {
        ingress.store.find_by_id(id).await.is_ok()
    }

    #[tokio::test]
    async fn publish_failure_deletes_the_just_created_row() {
        let store = Arc::new(MemoryStore::new());
        let queue = Arc::new(FailingQueue);
        let ingress = Ingress::new(store.clone(), queue);

        let err = ingress
            .send(UserId::new("u_alice"), UserId::new("u_bob"), "hi".to_string(), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::QueuePublishFailed(_)));
        assert_eq!(store.len(), 0);
    }
}
