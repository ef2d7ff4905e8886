//! Bot configuration
//!
//! Loaded from a TOML file; every field has a default so a missing file
//! or a partial one still yields a runnable configuration.

use crate::llm::LlmConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// Path to the SQLite database
    #[serde(default = "default_database_path")]
    pub database_path: String,

    #[serde(default)]
    pub review: ReviewSettings,

    #[serde(default)]
    pub llm: LlmSettings,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            review: ReviewSettings::default(),
            llm: LlmSettings::default(),
        }
    }
}

/// Tuning for the review pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewSettings {
    /// Concurrent reviews allowed against the AI endpoint
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    /// Consecutive AI failures before the circuit breaker opens
    #[serde(default = "default_breaker_threshold")]
    pub breaker_threshold: u32,

    /// How long the breaker stays open, in seconds
    #[serde(default = "default_breaker_cooldown_secs")]
    pub breaker_cooldown_secs: u64,

    /// Age after which a Reviewing row is considered orphaned, in seconds
    #[serde(default = "default_stale_review_secs")]
    pub stale_review_secs: i64,

    /// Interval between metrics summaries, in seconds
    #[serde(default = "default_metrics_interval_secs")]
    pub metrics_interval_secs: u64,
}

impl Default for ReviewSettings {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
            breaker_threshold: default_breaker_threshold(),
            breaker_cooldown_secs: default_breaker_cooldown_secs(),
            stale_review_secs: default_stale_review_secs(),
            metrics_interval_secs: default_metrics_interval_secs(),
        }
    }
}

/// AI endpoint settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSettings {
    #[serde(default = "default_llm_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_llm_model")]
    pub model: String,

    /// Bearer token for OpenAI-compatible endpoints
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_llm_max_tokens")]
    pub max_tokens: usize,

    #[serde(default = "default_llm_temperature")]
    pub temperature: f32,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            endpoint: default_llm_endpoint(),
            model: default_llm_model(),
            api_key: None,
            max_tokens: default_llm_max_tokens(),
            temperature: default_llm_temperature(),
        }
    }
}

impl LlmSettings {
    /// Build the client config from these settings
    pub fn to_client_config(&self) -> LlmConfig {
        LlmConfig {
            endpoint: self.endpoint.clone(),
            model: self.model.clone(),
            api_key: self.api_key.clone(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }
}

fn default_database_path() -> String {
    "codedojo.db".to_string()
}

fn default_max_concurrent() -> usize {
    crate::review::MAX_CONCURRENT_REVIEWS
}

fn default_breaker_threshold() -> u32 {
    crate::review::BREAKER_FAILURE_THRESHOLD
}

fn default_breaker_cooldown_secs() -> u64 {
    crate::review::BREAKER_COOLDOWN.as_secs()
}

fn default_stale_review_secs() -> i64 {
    crate::review::STALE_REVIEW_WINDOW_SECS
}

fn default_metrics_interval_secs() -> u64 {
    300
}

fn default_llm_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_llm_model() -> String {
    "llama3".to_string()
}

fn default_llm_max_tokens() -> usize {
    1024
}

fn default_llm_temperature() -> f32 {
    0.1
}

impl BotConfig {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file {:?}", path.as_ref()))?;
        let config: Self =
            toml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }

    /// Load from a path if given, otherwise use defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BotConfig::default();
        assert_eq!(config.review.max_concurrent, 5);
        assert_eq!(config.review.breaker_threshold, 5);
        assert_eq!(config.review.breaker_cooldown_secs, 60);
        assert_eq!(config.review.stale_review_secs, 30);
        assert_eq!(config.review.metrics_interval_secs, 300);
        assert!(config.llm.endpoint.contains("11434"));
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: BotConfig = toml::from_str(
            r#"
            database_path = "/tmp/dojo.db"

            [review]
            max_concurrent = 2

            [llm]
            model = "qwen2.5-coder"
            "#,
        )
        .unwrap();

        assert_eq!(config.database_path, "/tmp/dojo.db");
        assert_eq!(config.review.max_concurrent, 2);
        assert_eq!(config.review.breaker_threshold, 5);
        assert_eq!(config.llm.model, "qwen2.5-coder");
        assert_eq!(config.llm.max_tokens, 1024);
    }

    #[test]
    fn test_empty_toml_is_valid() {
        let config: BotConfig = toml::from_str("").unwrap();
        assert_eq!(config.database_path, "codedojo.db");
    }
}
