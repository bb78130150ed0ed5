//! Moltbot Configuration
//!
//! Loads and saves the agent's configuration from `~/.moltbot/moltbot.json`.
//! Environment variables override file values so deployments can inject
//! tokens without touching the config on disk.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::types::{default_config, MoltbotConfig};

/// Config file name within the moltbot directory.
const CONFIG_FILENAME: &str = "moltbot.json";

/// Returns the moltbot state directory: `~/.moltbot`.
pub fn get_moltbot_dir() -> PathBuf {
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("/root"));
    home.join(".moltbot")
}

/// Returns the full path to the config file: `~/.moltbot/moltbot.json`.
pub fn get_config_path() -> PathBuf {
    get_moltbot_dir().join(CONFIG_FILENAME)
}

/// Load the config from disk.
///
/// Reads `~/.moltbot/moltbot.json` and merges missing fields with
/// defaults. Returns `None` if the file does not exist or cannot be
/// parsed; callers fall back to defaults plus environment overrides.
pub fn load_config() -> Option<MoltbotConfig> {
    let config_path = get_config_path();
    if !config_path.exists() {
        return None;
    }

    let contents = fs::read_to_string(&config_path).ok()?;
    let config: MoltbotConfig = serde_json::from_str(&contents).ok()?;

    Some(merge_defaults(config))
}

/// Merge defaults into unset fields.
pub fn merge_defaults(mut config: MoltbotConfig) -> MoltbotConfig {
    let defaults = default_config();

    if config.agent_name.is_empty() {
        config.agent_name = defaults.agent_name;
    }
    if config.api_url.is_empty() {
        config.api_url = defaults.api_url;
    }
    if config.inference_api_url.is_empty() {
        config.inference_api_url = defaults.inference_api_url;
    }
    if config.inference_model.is_empty() {
        config.inference_model = defaults.inference_model;
    }
    if config.max_tokens == 0 {
        config.max_tokens = defaults.max_tokens;
    }
    if config.interval_secs == 0 {
        config.interval_secs = defaults.interval_secs;
    }
    if config.feed_limit == 0 {
        config.feed_limit = defaults.feed_limit;
    }
    if config.default_submolt.is_empty() {
        config.default_submolt = defaults.default_submolt;
    }
    if config.version.is_empty() {
        config.version = defaults.version;
    }

    config
}

/// Apply environment-variable overrides on top of the loaded config.
/// Tokens and keys normally arrive this way rather than via the file.
pub fn apply_env_overrides(config: &mut MoltbotConfig) {
    override_from_env(&mut config.api_url, "MOLTBOOK_API_URL");
    override_from_env(&mut config.agent_name, "MOLTBOOK_AGENT_NAME");
    override_from_env(&mut config.api_token, "MOLTBOOK_API_TOKEN");
    override_from_env(&mut config.inference_api_url, "INFERENCE_API_URL");
    override_from_env(&mut config.inference_api_key, "INFERENCE_API_KEY");
    override_from_env(&mut config.inference_model, "INFERENCE_MODEL");
}

fn override_from_env(field: &mut String, var: &str) {
    if let Ok(value) = std::env::var(var) {
        if !value.is_empty() {
            *field = value;
        }
    }
}

/// Load the config from disk, falling back to defaults, then apply
/// environment overrides.
pub fn load_or_default() -> MoltbotConfig {
    let mut config = load_config().unwrap_or_else(default_config);
    apply_env_overrides(&mut config);
    config
}

/// Save the config to disk at `~/.moltbot/moltbot.json`.
///
/// Creates the moltbot directory with mode 0o700 if it does not exist.
/// The config file is written with mode 0o600 since it contains tokens.
pub fn save_config(config: &MoltbotConfig) -> Result<()> {
    let dir = get_moltbot_dir();
    if !dir.exists() {
        fs::create_dir_all(&dir).context("Failed to create moltbot directory")?;
        fs::set_permissions(&dir, fs::Permissions::from_mode(0o700))?;
    }

    let config_path = get_config_path();
    let json = serde_json::to_string_pretty(config).context("Failed to serialize config")?;

    fs::write(&config_path, &json).context("Failed to write config file")?;
    fs::set_permissions(&config_path, fs::Permissions::from_mode(0o600))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_defaults_fills_empty_fields() {
        let mut config = default_config();
        config.api_url = String::new();
        config.inference_model = String::new();
        config.max_tokens = 0;
        config.interval_secs = 0;

        let merged = merge_defaults(config);
        assert_eq!(merged.api_url, "https://www.moltbook.com/api/v1");
        assert_eq!(merged.inference_model, "gpt-4o");
        assert_eq!(merged.max_tokens, 4096);
        assert_eq!(merged.interval_secs, 120);
    }

    #[test]
    fn test_merge_defaults_keeps_set_fields() {
        let mut config = default_config();
        config.api_url = "https://staging.moltbook.com/api/v1".to_string();
        config.interval_secs = 30;

        let merged = merge_defaults(config);
        assert_eq!(merged.api_url, "https://staging.moltbook.com/api/v1");
        assert_eq!(merged.interval_secs, 30);
    }

    #[test]
    fn test_merge_defaults_never_invents_credentials() {
        let config = merge_defaults(default_config());
        assert!(config.api_token.is_empty());
        assert!(config.inference_api_key.is_empty());
    }

    #[test]
    fn test_config_path_is_under_moltbot_dir() {
        let path = get_config_path();
        assert!(path.ends_with(".moltbot/moltbot.json"));
    }
}
