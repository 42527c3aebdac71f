//! Runtime selection of the backing store implementation.

use std::{path::PathBuf, sync::Arc};

use serde::Deserialize;

use crate::{backends::file::FileStore, backends::memory::MemoryStore, store::MessageStore};

/// Configuration for the message store backend, selected at startup.
///
/// ```ron
/// Chat (
///     store: File(
///         path: "/var/lib/chat/messages",
///     ),
/// )
/// ```
///
/// ```ron
/// Chat (
///     store: Memory,
/// )
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum StoreConfig {
    /// File-backed store (production): every message is a row on disk,
    /// rebuilt into an in-memory index on startup.
    File(FileStoreConfig),
    /// Purely in-memory store (tests, ephemeral deployments).
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FileStoreConfig {
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::Memory
    }
}

impl StoreConfig {
    /// Materializes the configured backend, scanning the directory to
    /// rebuild the in-memory index when file-backed.
    ///
    /// # Errors
    /// Returns an error if the file backend's directory cannot be created
    /// or an existing entry in it cannot be read back.
    pub async fn into_store(self) -> chat_common::error::Result<Arc<dyn MessageStore>> {
        match self {
            Self::File(config) => Ok(Arc::new(FileStore::open(config.path).await?)),
            Self::Memory => Ok(Arc::new(MemoryStore::new())),
        }
    }
}
