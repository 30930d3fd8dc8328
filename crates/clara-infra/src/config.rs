//! Configuration loader for Clara.
//!
//! Reads `config.toml` from the data directory (`~/.clara/` by default) into
//! [`AssistantConfig`], falling back to defaults when the file is missing or
//! malformed, then applies environment overrides.

use std::path::{Path, PathBuf};

use secrecy::SecretString;

use clara_types::config::AssistantConfig;

pub const DATA_DIR_ENV: &str = "CLARA_DATA_DIR";
pub const API_KEY_ENV: &str = "OPENROUTER_API_KEY";
pub const MODEL_ENV: &str = "OPENROUTER_MODEL";

/// Data directory: `$CLARA_DATA_DIR`, else `~/.clara`.
pub fn data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        if !dir.trim().is_empty() {
            return PathBuf::from(dir);
        }
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".clara")
}

/// Load `{data_dir}/config.toml` and apply environment overrides.
///
/// - Missing file: defaults.
/// - Unreadable or unparsable file: a warning, then defaults.
pub async fn load_config(data_dir: &Path) -> AssistantConfig {
    let mut config = read_config_file(data_dir).await;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    config
}

async fn read_config_file(data_dir: &Path) -> AssistantConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return AssistantConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return AssistantConfig::default();
        }
    };

    match toml::from_str::<AssistantConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            AssistantConfig::default()
        }
    }
}

/// Apply `OPENROUTER_MODEL` over the file's `[llm] model`.
pub fn apply_env_overrides(config: &mut AssistantConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(model) = lookup(MODEL_ENV).filter(|m| !m.trim().is_empty()) {
        config.llm.model = model.trim().to_string();
    }
}

/// `OPENROUTER_API_KEY`, if set and non-blank.
pub fn api_key_from_env() -> Option<SecretString> {
    std::env::var(API_KEY_ENV)
        .ok()
        .filter(|k| !k.trim().is_empty())
        .map(|k| SecretString::from(k.trim().to_string()))
}
