//! Per-state timeouts for a session's event loop.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionTimeouts {
    /// How long a socket may sit in `Connecting` without a resolvable identity.
    #[serde(default = "default_handshake_secs")]
    pub handshake_secs: u64,

    /// How long a `Bound` session may go without a frame before it is
    /// considered dead and moved to `Draining`.
    #[serde(default = "default_idle_secs")]
    pub idle_secs: u64,
}

impl Default for SessionTimeouts {
    fn default() -> Self {
        Self {
            handshake_secs: default_handshake_secs(),
            idle_secs: default_idle_secs(),
        }
    }
}

const fn default_handshake_secs() -> u64 {
    10
}

const fn default_idle_secs() -> u64 {
    300
}
