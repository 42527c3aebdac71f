//! A Redis-backed [`InboxCache`].

use async_trait::async_trait;
use chat_common::{ids::MessageId, ChatError, UserId};
use redis::{aio::ConnectionManager, AsyncCommands};

use crate::{
    cache::{CachedMessage, InboxCache, Result},
    config::{CacheConfig, INBOX_TTL_SECS, MESSAGE_CACHE_TTL_SECS, PRESENCE_TTL_SECS},
    keys::{connection_key, inbox_key, message_key},
};

fn op_failed(operation: &'static str, key: impl Into<String>) -> impl FnOnce(redis::RedisError) -> ChatError {
    move |_| ChatError::CacheOperationFailed {
        operation,
        key: key.into(),
    }
}

pub struct RedisCache {
    connection: ConnectionManager,
}

impl RedisCache {
    /// Connects to the backend named by `config`, auto-reconnecting on
    /// transient connection loss.
    ///
    /// # Errors
    /// Returns [`ChatError::CacheConnectionError`] if the initial connection
    /// cannot be established.
    pub async fn connect(config: &CacheConfig) -> Result<Self> {
        let client = redis::Client::open(config.connection_url())
            .map_err(|e| ChatError::CacheConnectionError(e.to_string()))?;
        let connection = client
            .get_connection_manager()
            .await
            .map_err(|e| ChatError::CacheConnectionError(e.to_string()))?;
        Ok(Self { connection })
    }
}

#[async_trait]
impl InboxCache for RedisCache {
    async fn add_to_inbox(&self, user_id: &UserId, message_id: MessageId) -> Result<()> {
        let key = inbox_key(user_id);
        let mut conn = self.connection.clone();
        let id = message_id.to_string();

        let position: Option<i64> = conn
            .lpos(&key, id.clone(), redis::LposOptions::default())
            .await
            .map_err(op_failed("lpos", key.clone()))?;

        if position.is_none() {
            let _: () = conn
                .rpush(&key, id)
                .await
                .map_err(op_failed("rpush", key.clone()))?;
        }

        let _: () = conn
            .expire(&key, i64::try_from(INBOX_TTL_SECS).unwrap_or(i64::MAX))
            .await
            .map_err(op_failed("expire", key))?;

        Ok(())
    }

    async fn get_inbox(&self, user_id: &UserId) -> Result<Vec<MessageId>> {
        let key = inbox_key(user_id);
        let mut conn = self.connection.clone();
        let raw: Vec<String> = conn
            .lrange(&key, 0, -1)
            .await
            .map_err(op_failed("lrange", key.clone()))?;

        raw.into_iter()
            .map(|s| {
                s.parse::<MessageId>()
                    .map_err(|_| ChatError::CacheOperationFailed {
                        operation: "lrange",
                        key: key.clone(),
                    })
            })
            .collect()
    }

    async fn remove_from_inbox(&self, user_id: &UserId, message_id: MessageId) -> Result<()> {
        let key = inbox_key(user_id);
        let mut conn = self.connection.clone();
        let _: () = conn
            .lrem(&key, 1, message_id.to_string())
            .await
            .map_err(op_failed("lrem", key))?;
        Ok(())
    }

    async fn clear_inbox(&self, user_id: &UserId) -> Result<()> {
        let key = inbox_key(user_id);
        let mut conn = self.connection.clone();
        let _: () = conn.del(&key).await.map_err(op_failed("del", key))?;
        Ok(())
    }

    async fn set_user_connection(&self, user_id: &UserId, server_id: &str) -> Result<()> {
        let key = connection_key(user_id);
        let mut conn = self.connection.clone();
        let _: () = conn
            .set_ex(&key, server_id, PRESENCE_TTL_SECS)
            .await
            .map_err(op_failed("set_ex", key))?;
        Ok(())
    }

    async fn is_user_online(&self, user_id: &UserId) -> Result<bool> {
        let key = connection_key(user_id);
        let mut conn = self.connection.clone();
        conn.exists(&key).await.map_err(op_failed("exists", key))
    }

    async fn remove_user_connection(&self, user_id: &UserId) -> Result<()> {
        let key = connection_key(user_id);
        let mut conn = self.connection.clone();
        let _: () = conn.del(&key).await.map_err(op_failed("del", key))?;
        Ok(())
    }

    async fn get_user_server_id(&self, user_id: &UserId) -> Result<Option<String>> {
        let key = connection_key(user_id);
        let mut conn = self.connection.clone();
        conn.get(&key).await.map_err(op_failed("get", key))
    }

    async fn cache_message(&self, message_id: MessageId, message: &CachedMessage) -> Result<()> {
        let key = message_key(message_id);
        let mut conn = self.connection.clone();
        let fields: [(&str, String); 4] = [
            ("sender_id", message.sender_id.to_string()),
            ("receiver_id", message.receiver_id.to_string()),
            ("content", message.content.clone()),
            ("timestamp", message.timestamp.to_string()),
        ];
        let _: () = conn
            .hset_multiple(&key, &fields)
            .await
            .map_err(op_failed("hset", key.clone()))?;
        let _: () = conn
            .expire(&key, i64::try_from(MESSAGE_CACHE_TTL_SECS).unwrap_or(i64::MAX))
            .await
            .map_err(op_failed("expire", key))?;
        Ok(())
    }
}
