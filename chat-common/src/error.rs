//! The error taxonomy shared by every component of the dispatch pipeline.
//!
//! Each variant maps to a kind named in the error handling design: validation
//! failures and missing sessions are reported back to the client, store/cache/
//! queue failures drive the compensators in ingress and delivery-acknowledgment,
//! and anything else collapses to [`ChatError::Internal`] at the client boundary.

use crate::ids::MessageId;

pub type Result<T> = std::result::Result<T, ChatError>;

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// An inbound event failed schema or bounds validation; the event is
    /// discarded and the client is told why.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// An inbound event arrived on a session that has not yet bound a user.
    #[error("session is not authenticated")]
    NotAuthenticated,

    /// A store lookup found no row for the given id.
    #[error("message {0} not found")]
    MessageNotFound(MessageId),

    /// An inbox/presence/message cache operation failed.
    #[error("cache operation {operation} failed for key {key}")]
    CacheOperationFailed { operation: &'static str, key: String },

    /// The cache backend could not be reached at all.
    #[error("cache connection error: {0}")]
    CacheConnectionError(String),

    /// Publishing a queue item failed.
    #[error("queue publish failed: {0}")]
    QueuePublishFailed(String),

    /// Establishing the consumer failed.
    #[error("queue consume setup failed: {0}")]
    QueueConsumeFailed(String),

    /// The queue broker could not be reached at all.
    #[error("queue connection error: {0}")]
    QueueConnectionError(String),

    /// A durable-store failure that isn't one of the above, rare in the core
    /// but mapped to a generic shape at the client boundary.
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// Anything else; collapses to a generic client-facing failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ChatError {
    /// Whether this error should surface to the client as an `error` event
    /// rather than being swallowed (drain lookups, for instance, swallow
    /// [`Self::MessageNotFound`]).
    #[must_use]
    pub const fn is_client_visible(&self) -> bool {
        !matches!(self, Self::MessageNotFound(_))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("content must be between 1 and {max} UTF-8 code units, got {actual}")]
    ContentLength { actual: usize, max: usize },

    #[error("receiver_id must not be empty")]
    EmptyReceiver,

    #[error("{field} is missing or malformed")]
    MalformedField { field: &'static str },
}

#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("duplicate key: {0}")]
    DuplicateKey(String),

    #[error("null constraint violated: {0}")]
    NullConstraint(String),

    #[error("foreign key violation: {0}")]
    ForeignKey(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_not_found_is_not_client_visible() {
        let err = ChatError::MessageNotFound(MessageId::generate());
        assert!(!err.is_client_visible());
    }

    #[test]
    fn validation_errors_are_client_visible() {
        let err = ChatError::Validation(ValidationError::EmptyReceiver);
        assert!(err.is_client_visible());
    }

    #[test]
    fn database_error_converts_into_chat_error() {
        let db_err = DatabaseError::DuplicateKey("messageId".to_string());
        let chat_err: ChatError = db_err.into();
        assert_eq!(
            chat_err.to_string(),
            "database error: duplicate key: messageId"
        );
    }
}
