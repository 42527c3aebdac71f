#![warn(clippy::pedantic, clippy::all, clippy::nursery)]
#![allow(clippy::must_use_candidate)]

//! The inbox cache: per-recipient pending-message lists and connection
//! presence, backed by Redis with the bit-exact key schema the client
//! handshake and dispatcher rely on.

pub mod cache;
pub mod config;
pub mod keys;
pub mod redis_cache;

pub use cache::{CachedMessage, InboxCache, Result};
pub use config::CacheConfig;
pub use redis_cache::RedisCache;
