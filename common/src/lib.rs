/*!
common/src/lib.rs

Shared configuration types for Newstalk.

This file provides:
- Config data structures (deserialized from TOML)
- An async loader for a TOML config file
- A default/override merge so a packaged config.default.toml can be
  partially overridden by a local config.toml
*/

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// HTTP server configuration section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind the HTTP server to
    pub bind: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

/// News feed search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Keyword search endpoint; the keyword is appended as the `q` parameter
    pub endpoint: String,
    /// `hl` parameter of the feed query
    pub language: String,
    /// `gl` parameter of the feed query
    pub country: String,
    /// `ceid` parameter of the feed query
    pub edition: String,
    pub fetch_timeout_seconds: u64,
    /// Maximum number of entries kept from a feed
    pub max_items: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://news.google.com/rss/search".to_string(),
            language: "ko-KR".to_string(),
            country: "KR".to_string(),
            edition: "KR:ko".to_string(),
            fetch_timeout_seconds: 10,
            max_items: 10,
        }
    }
}

/// Remote LLM configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Base URL of the generateContent API
    pub api_url: String,
    /// Name of the environment variable holding the API key
    pub api_key_env: String,
    pub model: String,
    pub timeout_seconds: u64,
    pub max_output_tokens: u32,
    pub temperature: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            model: "gemini-2.5-flash".to_string(),
            timeout_seconds: 30,
            max_output_tokens: 1024,
            temperature: 0.7,
        }
    }
}

/// Chat behaviour configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Maximum number of prior turns embedded into the chat prompt.
    /// The caller may send more; older turns are not rendered.
    pub history_window: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self { history_window: 20 }
    }
}

/// Top-level application configuration (deserialized from config.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub feed: FeedConfig,
    pub llm: LlmConfig,
    pub chat: ChatConfig,
}

impl Config {
    /// Load configuration from a TOML file asynchronously.
    ///
    /// Example:
    ///   let cfg = Config::from_file("config.toml").await?;
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = tokio::fs::read_to_string(path.as_ref())
            .await
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;
        let cfg: Config = toml::from_str(&data).context("Failed to parse TOML configuration")?;
        Ok(cfg)
    }

    /// Load configuration with an optional default file and an optional override file.
    /// If both are present, they are merged (override takes precedence).
    pub async fn load_with_defaults(
        default_path: Option<&Path>,
        override_path: Option<&Path>,
    ) -> Result<Self> {
        let mut config_value = toml::Value::Table(toml::map::Map::new());

        if let Some(path) = default_path {
            if path.exists() {
                let data = tokio::fs::read_to_string(path)
                    .await
                    .with_context(|| format!("Failed to read default config: {}", path.display()))?;
                let val: toml::Value =
                    toml::from_str(&data).context("Failed to parse default configuration")?;
                merge_toml(&mut config_value, val);
            }
        }

        if let Some(path) = override_path {
            if path.exists() {
                let data = tokio::fs::read_to_string(path)
                    .await
                    .with_context(|| format!("Failed to read override config: {}", path.display()))?;
                let val: toml::Value =
                    toml::from_str(&data).context("Failed to parse override configuration")?;
                merge_toml(&mut config_value, val);
            }
        }

        let cfg: Config = config_value
            .try_into()
            .context("Failed to parse merged configuration")?;
        Ok(cfg)
    }
}

fn merge_toml(a: &mut toml::Value, b: toml::Value) {
    match (a, b) {
        (toml::Value::Table(a_map), toml::Value::Table(b_map)) => {
            for (k, v) in b_map {
                if let Some(a_val) = a_map.get_mut(&k) {
                    merge_toml(a_val, v);
                } else {
                    a_map.insert(k, v);
                }
            }
        }
        (a_val, b_val) => *a_val = b_val,
    }
}
