//! Inbox cache configuration and the TTLs the key schema is built around.

use serde::Deserialize;

/// Presence is short-lived: a silent crash must not leave a user
/// falsely-online indefinitely.
pub const PRESENCE_TTL_SECS: u64 = 3_600;

/// A backlog must survive an offline user's extended absence.
pub const INBOX_TTL_SECS: u64 = 31_536_000;

/// Short-horizon cache of message bodies for fast fetch on drain.
pub const MESSAGE_CACHE_TTL_SECS: u64 = 86_400;

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "CacheConfig::default_host")]
    pub host: String,
    #[serde(default = "CacheConfig::default_port")]
    pub port: u16,
}

impl CacheConfig {
    fn default_host() -> String {
        "localhost".to_string()
    }

    const fn default_port() -> u16 {
        6379
    }

    #[must_use]
    pub fn connection_url(&self) -> String {
        format!("redis://{}:{}", self.host, self.port)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
        }
    }
}
