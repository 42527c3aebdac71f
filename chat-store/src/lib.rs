#![warn(clippy::pedantic, clippy::all, clippy::nursery)]
#![allow(clippy::must_use_candidate)]

//! The message store: durable source of truth for every accepted chat
//! message, indexed the way the dispatch pipeline needs to query it.

pub mod backends;
pub mod config;
pub mod message;
pub mod store;

pub use backends::{file::FileStore, memory::MemoryStore};
pub use config::{FileStoreConfig, StoreConfig};
pub use message::Message;
pub use store::{HistoryQuery, MessageStore, Result, MAX_HISTORY_LIMIT};
