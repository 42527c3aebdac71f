//! An entirely in-memory [`MessageStore`], used for tests and for
//! single-process deployments that accept losing the store across restarts.

use ahash::AHashMap;
use async_trait::async_trait;
use chat_common::{ids::MessageId, ChatError, UserId};
use parking_lot::RwLock;

use crate::{
    message::Message,
    store::{HistoryQuery, MessageStore, Result, MAX_HISTORY_LIMIT},
};

fn conversation_key(a: &UserId, b: &UserId) -> (UserId, UserId) {
    if a <= b {
        (a.clone(), b.clone())
    } else {
        (b.clone(), a.clone())
    }
}

#[derive(Default)]
struct Inner {
    messages: AHashMap<MessageId, Message>,
    by_receiver: AHashMap<UserId, Vec<MessageId>>,
    by_conversation: AHashMap<(UserId, UserId), Vec<MessageId>>,
}

/// In-memory backing store, optionally capacity-bounded.
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().messages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn create(
        &self,
        sender_id: UserId,
        receiver_id: UserId,
        content: String,
        timestamp: i64,
    ) -> Result<Message> {
        let message = Message::new(sender_id.clone(), receiver_id.clone(), content, timestamp);

        let mut inner = self.inner.write();
        inner
            .by_receiver
            .entry(receiver_id.clone())
            .or_default()
            .push(message.message_id);
        inner
            .by_conversation
            .entry(conversation_key(&sender_id, &receiver_id))
            .or_default()
            .push(message.message_id);
        inner.messages.insert(message.message_id, message.clone());

        Ok(message)
    }

    async fn find_by_id(&self, message_id: MessageId) -> Result<Message> {
        self.inner
            .read()
            .messages
            .get(&message_id)
            .cloned()
            .ok_or(ChatError::MessageNotFound(message_id))
    }

    async fn mark_delivered(&self, message_id: MessageId, now: i64) -> Result<()> {
        let mut inner = self.inner.write();
        let message = inner
            .messages
            .get_mut(&message_id)
            .ok_or(ChatError::MessageNotFound(message_id))?;
        message.mark_delivered(now);
        Ok(())
    }

    async fn mark_undelivered(&self, message_id: MessageId) -> Result<()> {
        let mut inner = self.inner.write();
        let message = inner
            .messages
            .get_mut(&message_id)
            .ok_or(ChatError::MessageNotFound(message_id))?;
        message.mark_undelivered();
        Ok(())
    }

    async fn delete_by_id(&self, message_id: MessageId) -> Result<()> {
        let mut inner = self.inner.write();
        let Some(message) = inner.messages.remove(&message_id) else {
            return Ok(());
        };
        if let Some(ids) = inner.by_receiver.get_mut(&message.receiver_id) {
            ids.retain(|id| *id != message_id);
        }
        let key = conversation_key(&message.sender_id, &message.receiver_id);
        if let Some(ids) = inner.by_conversation.get_mut(&key) {
            ids.retain(|id| *id != message_id);
        }
        Ok(())
    }

    async fn find_undelivered(&self, receiver_id: &UserId) -> Result<Vec<Message>> {
        let inner = self.inner.read();
        let mut messages: Vec<Message> = inner
            .by_receiver
            .get(receiver_id)
            .into_iter()
            .flatten()
            .filter_map(|id| inner.messages.get(id))
            .filter(|m| m.undelivered)
            .cloned()
            .collect();
        messages.sort_by_key(|m| m.timestamp);
        Ok(messages)
    }

    async fn chat_history(&self, query: HistoryQuery<'_>) -> Result<Vec<Message>> {
        let limit = query.limit.min(MAX_HISTORY_LIMIT);
        let inner = self.inner.read();
        let key = conversation_key(query.participant_a, query.participant_b);
        let mut messages: Vec<Message> = inner
            .by_conversation
            .get(&key)
            .into_iter()
            .flatten()
            .filter_map(|id| inner.messages.get(id))
            .filter(|m| query.before_timestamp.is_none_or(|before| m.timestamp < before))
            .cloned()
            .collect();
        messages.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        messages.truncate(limit);
        Ok(messages)
    }

    async fn delete_delivered_older_than(&self, retention_days: u32, now: i64) -> Result<usize> {
        let horizon_ms = now - i64::from(retention_days) * 86_400_000;
        let mut inner = self.inner.write();

        let stale: Vec<MessageId> = inner
            .messages
            .values()
            .filter(|m| !m.undelivered && m.delivered_at.is_some_and(|at| at < horizon_ms))
            .map(|m| m.message_id)
            .collect();

        for id in &stale {
            if let Some(message) = inner.messages.remove(id) {
                if let Some(ids) = inner.by_receiver.get_mut(&message.receiver_id) {
                    ids.retain(|i| i != id);
                }
                let key = conversation_key(&message.sender_id, &message.receiver_id);
                if let Some(ids) = inner.by_conversation.get_mut(&key) {
                    ids.retain(|i| i != id);
                }
            }
        }

        Ok(stale.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uid(s: &str) -> UserId {
        UserId::new(s)
    }

    #[tokio::test]
    async fn create_then_find_round_trips_the_four_fields() {
        let store = MemoryStore::new();
        let created = store
            .create(uid("u_alice"), uid("u_bob"), "hi".to_string(), 1_700_000_000_000)
            .await
            .unwrap();

        let found = store.find_by_id(created.message_id).await.unwrap();
        assert_eq!(found.sender_id, uid("u_alice"));
        assert_eq!(found.receiver_id, uid("u_bob"));
        assert_eq!(found.content, "hi");
        assert_eq!(found.timestamp, 1_700_000_000_000);
        assert!(found.undelivered);
        assert!(found.delivered_at.is_none());
    }

    #[tokio::test]
    async fn mark_delivered_then_mark_undelivered_restores_invariant() {
        let store = MemoryStore::new();
        let msg = store
            .create(uid("u_alice"), uid("u_bob"), "hi".to_string(), 1)
            .await
            .unwrap();

        store.mark_delivered(msg.message_id, 100).await.unwrap();
        let delivered = store.find_by_id(msg.message_id).await.unwrap();
        assert!(!delivered.undelivered);
        assert_eq!(delivered.delivered_at, Some(100));

        store.mark_undelivered(msg.message_id).await.unwrap();
        let reverted = store.find_by_id(msg.message_id).await.unwrap();
        assert!(reverted.undelivered);
        assert!(reverted.delivered_at.is_none());
    }

    #[tokio::test]
    async fn find_undelivered_is_ordered_by_timestamp_ascending() {
        let store = MemoryStore::new();
        store
            .create(uid("u_alice"), uid("u_bob"), "b".to_string(), 200)
            .await
            .unwrap();
        store
            .create(uid("u_alice"), uid("u_bob"), "a".to_string(), 100)
            .await
            .unwrap();

        let undelivered = store.find_undelivered(&uid("u_bob")).await.unwrap();
        assert_eq!(undelivered.len(), 2);
        assert_eq!(undelivered[0].content, "a");
        assert_eq!(undelivered[1].content, "b");
    }

    #[tokio::test]
    async fn delivered_messages_are_excluded_from_find_undelivered() {
        let store = MemoryStore::new();
        let msg = store
            .create(uid("u_alice"), uid("u_bob"), "hi".to_string(), 1)
            .await
            .unwrap();
        store.mark_delivered(msg.message_id, 2).await.unwrap();

        assert!(store.find_undelivered(&uid("u_bob")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn chat_history_is_descending_and_capped_at_fifty() {
        let store = MemoryStore::new();
        for i in 0..60i64 {
            store
                .create(uid("u_alice"), uid("u_bob"), format!("m{i}"), i)
                .await
                .unwrap();
        }

        let history = store
            .chat_history(HistoryQuery {
                participant_a: &uid("u_alice"),
                participant_b: &uid("u_bob"),
                before_timestamp: None,
                limit: 1000,
            })
            .await
            .unwrap();

        assert_eq!(history.len(), MAX_HISTORY_LIMIT);
        assert_eq!(history[0].content, "m59");
        assert!(history.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
    }

    #[tokio::test]
    async fn chat_history_is_symmetric_in_the_two_participants() {
        let store = MemoryStore::new();
        store
            .create(uid("u_alice"), uid("u_bob"), "hi".to_string(), 1)
            .await
            .unwrap();

        let from_bob = store
            .chat_history(HistoryQuery {
                participant_a: &uid("u_bob"),
                participant_b: &uid("u_alice"),
                before_timestamp: None,
                limit: 50,
            })
            .await
            .unwrap();

        assert_eq!(from_bob.len(), 1);
    }

    #[tokio::test]
    async fn delete_by_id_removes_the_row_and_is_idempotent() {
        let store = MemoryStore::new();
        let msg = store
            .create(uid("u_alice"), uid("u_bob"), "hi".to_string(), 1)
            .await
            .unwrap();

        store.delete_by_id(msg.message_id).await.unwrap();
        assert!(matches!(
            store.find_by_id(msg.message_id).await,
            Err(ChatError::MessageNotFound(_))
        ));
        // Deleting again is a no-op, not an error.
        store.delete_by_id(msg.message_id).await.unwrap();
    }

    #[tokio::test]
    async fn retention_sweep_only_removes_delivered_rows_past_the_horizon() {
        let store = MemoryStore::new();
        let old = store
            .create(uid("u_alice"), uid("u_bob"), "old".to_string(), 0)
            .await
            .unwrap();
        let recent = store
            .create(uid("u_alice"), uid("u_bob"), "recent".to_string(), 0)
            .await
            .unwrap();
        let never_delivered = store
            .create(uid("u_alice"), uid("u_bob"), "pending".to_string(), 0)
            .await
            .unwrap();

        let now = 30i64 * 86_400_000;
        store.mark_delivered(old.message_id, 0).await.unwrap();
        store.mark_delivered(recent.message_id, now - 1_000).await.unwrap();

        let removed = store.delete_delivered_older_than(7, now).await.unwrap();
        assert_eq!(removed, 1);
        assert!(store.find_by_id(old.message_id).await.is_err());
        assert!(store.find_by_id(recent.message_id).await.is_ok());
        assert!(store.find_by_id(never_delivered.message_id).await.is_ok());
    }
}
