#![deny(clippy::pedantic, clippy::all, clippy::nursery)]
#![allow(clippy::must_use_candidate)]

#[cfg(not(any(target_os = "macos", unix)))]
compile_error!("Only macos and unix are currently supported");

use chat::{config::ChatConfig, controller::Chat};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = find_config_file()?;
    let config_content = std::fs::read_to_string(&config_path)
        .map_err(|e| anyhow::anyhow!("failed to read config from {}: {e}", config_path.display()))?;
    let config: ChatConfig = ron::from_str(&config_content)?;

    Chat::new(config).run().await
}

/// Finds the configuration file using the following precedence:
/// 1. `CHAT_CONFIG` environment variable
/// 2. ./chat.config.ron (current working directory)
/// 3. /etc/chat/chat.config.ron (system-wide config)
fn find_config_file() -> anyhow::Result<std::path::PathBuf> {
    if let Ok(env_path) = std::env::var("CHAT_CONFIG") {
        let path = std::path::PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        }
        anyhow::bail!("CHAT_CONFIG points to a non-existent file: {}", path.display());
    }

    let default_paths = [
        std::path::PathBuf::from("./chat.config.ron"),
        std::path::PathBuf::from("/etc/chat/chat.config.ron"),
    ];

    for path in &default_paths {
        if path.exists() {
            return Ok(path.clone());
        }
    }

    let paths_tried = default_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    anyhow::bail!("no configuration file found. tried:\n  - CHAT_CONFIG environment variable\n{paths_tried}")
}
