//! Listener defaults (§6): the bind port and this instance's server id, the
//! latter recorded alongside presence so a multi-instance deployment can
//! tell which instance owns a live connection.

use serde::{Deserialize, Serialize};

mod defaults {
    pub const fn port() -> u16 {
        3000
    }

    pub fn server_id() -> String {
        "server-1".to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "defaults::port")]
    pub port: u16,
    #[serde(default = "defaults::server_id")]
    pub server_id: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: defaults::port(),
            server_id: defaults::server_id(),
        }
    }
}
