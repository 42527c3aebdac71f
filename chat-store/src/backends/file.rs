//! Durable, file-backed [`MessageStore`]: one file per message, with an
//! in-memory index rebuilt from disk on open so that hot-path queries never
//! touch the filesystem.

use std::path::PathBuf;

use ahash::AHashMap;
use async_trait::async_trait;
use chat_common::{ids::MessageId, ChatError, DatabaseError, UserId};
use parking_lot::RwLock;
use tokio::fs;

use crate::{
    message::Message,
    store::{HistoryQuery, MessageStore, Result, MAX_HISTORY_LIMIT},
};

fn bincode_config() -> bincode::config::Configuration {
    bincode::config::standard()
}

fn conversation_key(a: &UserId, b: &UserId) -> (UserId, UserId) {
    if a <= b {
        (a.clone(), b.clone())
    } else {
        (b.clone(), a.clone())
    }
}

#[derive(Default)]
struct Index {
    messages: AHashMap<MessageId, Message>,
    by_receiver: AHashMap<UserId, Vec<MessageId>>,
    by_conversation: AHashMap<(UserId, UserId), Vec<MessageId>>,
}

impl Index {
    fn insert(&mut self, message: Message) {
        self.by_receiver
            .entry(message.receiver_id.clone())
            .or_default()
            .push(message.message_id);
        self.by_conversation
            .entry(conversation_key(&message.sender_id, &message.receiver_id))
            .or_default()
            .push(message.message_id);
        self.messages.insert(message.message_id, message);
    }

    fn remove(&mut self, id: MessageId) -> Option<Message> {
        let message = self.messages.remove(&id)?;
        if let Some(ids) = self.by_receiver.get_mut(&message.receiver_id) {
            ids.retain(|i| *i != id);
        }
        let key = conversation_key(&message.sender_id, &message.receiver_id);
        if let Some(ids) = self.by_conversation.get_mut(&key) {
            ids.retain(|i| *i != id);
        }
        Some(message)
    }
}

/// A store that persists every row as `<path>/<message_id>.bin` and keeps a
/// full in-memory mirror for queries, writing through on every mutation.
pub struct FileStore {
    path: PathBuf,
    index: RwLock<Index>,
}

impl FileStore {
    /// Opens (creating if absent) the directory at `path` and rebuilds the
    /// in-memory index from whatever rows are already on disk.
    ///
    /// # Errors
    /// Returns a [`ChatError::Database`] if the directory cannot be created
    /// or an entry already on disk cannot be read back.
    pub async fn open(path: PathBuf) -> Result<Self> {
        fs::create_dir_all(&path)
            .await
            .map_err(DatabaseError::Io)?;

        let mut index = Index::default();
        let mut entries = fs::read_dir(&path).await.map_err(DatabaseError::Io)?;
        while let Some(entry) = entries.next_entry().await.map_err(DatabaseError::Io)? {
            if entry.path().extension().and_then(std::ffi::OsStr::to_str) != Some("bin") {
                continue;
            }
            let bytes = fs::read(entry.path()).await.map_err(DatabaseError::Io)?;
            let (message, _): (Message, usize) =
                bincode::serde::decode_from_slice(&bytes, bincode_config()).map_err(|e| {
                    ChatError::Database(DatabaseError::Io(std::io::Error::new(
                        std::io::ErrorKind::InvalidData,
                        e.to_string(),
                    )))
                })?;
            index.insert(message);
        }

        Ok(Self {
            path,
            index: RwLock::new(index),
        })
    }

    fn file_path(&self, id: MessageId) -> PathBuf {
        self.path.join(format!("{id}.bin"))
    }

    async fn persist(&self, message: &Message) -> Result<()> {
        let bytes = bincode::serde::encode_to_vec(message, bincode_config()).map_err(|e| {
            ChatError::Database(DatabaseError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                e.to_string(),
            )))
        })?;
        let target = self.file_path(message.message_id);
        let tmp = target.with_extension("bin.tmp");
        fs::write(&tmp, &bytes).await.map_err(DatabaseError::Io)?;
        fs::rename(&tmp, &target).await.map_err(DatabaseError::Io)?;
        Ok(())
    }

    async fn remove_file(&self, id: MessageId) -> Result<()> {
        match fs::remove_file(self.file_path(id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ChatError::Database(DatabaseError::Io(e))),
        }
    }
}

#[async_trait]
impl MessageStore for FileStore {
    async fn create(
        &self,
        sender_id: UserId,
        receiver_id: UserId,
        content: String,
        timestamp: i64,
    ) -> Result<Message> {
        let message = Message::new(sender_id, receiver_id, content, timestamp);
        self.persist(&message).await?;
        self.index.write().insert(message.clone());
        Ok(message)
    }

    async fn find_by_id(&self, message_id: MessageId) -> Result<Message> {
        self.index
            .read()
            .messages
            .get(&message_id)
            .cloned()
            .ok_or(ChatError::MessageNotFound(message_id))
    }

    async fn mark_delivered(&self, message_id: MessageId, now: i64) -> Result<()> {
        let message = {
            let mut index = self.index.write();
            let message = index
                .messages
                .get_mut(&message_id)
                .ok_or(ChatError::MessageNotFound(message_id))?;
            message.mark_delivered(now);
            message.clone()
        };
        self.persist(&message).await
    }

    async fn mark_undelivered(&self, message_id: MessageId) -> Result<()> {
        let message = {
            let mut index = self.index.write();
            let message = index
                .messages
                .get_mut(&message_id)
                .ok_or(ChatError::MessageNotFound(message_id))?;
            message.mark_undelivered();
            message.clone()
        };
        self.persist(&message).await
    }

    async fn delete_by_id(&self, message_id: MessageId) -> Result<()> {
        let removed = self.index.write().remove(message_id);
        if removed.is_some() {
            self.remove_file(message_id).await?;
        }
        Ok(())
    }

    async fn find_undelivered(&self, receiver_id: &UserId) -> Result<Vec<Message>> {
        let index = self.index.read();
        let mut messages: Vec<Message> = index
            .by_receiver
            .get(receiver_id)
            .into_iter()
            .flatten()
            .filter_map(|id| index.messages.get(id))
            .filter(|m| m.undelivered)
            .cloned()
            .collect();
        messages.sort_by_key(|m| m.timestamp);
        Ok(messages)
    }

    async fn chat_history(&self, query: HistoryQuery<'_>) -> Result<Vec<Message>> {
        let limit = query.limit.min(MAX_HISTORY_LIMIT);
        let index = self.index.read();
        let key = conversation_key(query.participant_a, query.participant_b);
        let mut messages: Vec<Message> = index
            .by_conversation
            .get(&key)
            .into_iter()
            .flatten()
            .filter_map(|id| index.messages.get(id))
            .filter(|m| query.before_timestamp.is_none_or(|before| m.timestamp < before))
            .cloned()
            .collect();
        messages.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        messages.truncate(limit);
        Ok(messages)
    }

    async fn delete_delivered_older_than(&self, retention_days: u32, now: i64) -> Result<usize> {
        let horizon_ms = now - i64::from(retention_days) * 86_400_000;
        let stale: Vec<MessageId> = {
            let index = self.index.read();
            index
                .messages
                .values()
                .filter(|m| !m.undelivered && m.delivered_at.is_some_and(|at| at < horizon_ms))
                .map(|m| m.message_id)
                .collect()
        };

        for id in &stale {
            self.index.write().remove(*id);
            self.remove_file(*id).await?;
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
    async fn create_persists_to_disk_and_is_readable_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().to_path_buf()).await.unwrap();

        let created = store
            .create(uid("u_alice"), uid("u_bob"), "hi".to_string(), 1)
            .await
            .unwrap();

        assert!(dir.path().join(format!("{}.bin", created.message_id)).exists());
    }

    #[tokio::test]
    async fn reopening_the_directory_rebuilds_the_index() {
        let dir = tempfile::tempdir().unwrap();
        let created = {
            let store = FileStore::open(dir.path().to_path_buf()).await.unwrap();
            store
                .create(uid("u_alice"), uid("u_bob"), "hi".to_string(), 1)
                .await
                .unwrap()
        };

        let reopened = FileStore::open(dir.path().to_path_buf()).await.unwrap();
        let found = reopened.find_by_id(created.message_id).await.unwrap();
        assert_eq!(found.content, "hi");

        let undelivered = reopened.find_undelivered(&uid("u_bob")).await.unwrap();
        assert_eq!(undelivered.len(), 1);
    }

    #[tokio::test]
    async fn delete_by_id_removes_both_the_index_entry_and_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().to_path_buf()).await.unwrap();
        let created = store
            .create(uid("u_alice"), uid("u_bob"), "hi".to_string(), 1)
            .await
            .unwrap();

        store.delete_by_id(created.message_id).await.unwrap();

        assert!(!dir.path().join(format!("{}.bin", created.message_id)).exists());
        assert!(store.find_by_id(created.message_id).await.is_err());
    }

    #[tokio::test]
    async fn mark_delivered_survives_a_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let created = {
            let store = FileStore::open(dir.path().to_path_buf()).await.unwrap();
            let created = store
                .create(uid("u_alice"), uid("u_bob"), "hi".to_string(), 1)
                .await
                .unwrap();
            store.mark_delivered(created.message_id, 42).await.unwrap();
            created
        };

        let reopened = FileStore::open(dir.path().to_path_buf()).await.unwrap();
        let found = reopened.find_by_id(created.message_id).await.unwrap();
        assert!(!found.undelivered);
        assert_eq!(found.delivered_at, Some(42));
    }
}
