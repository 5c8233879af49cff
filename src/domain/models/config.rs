//! Main configuration tree for specmend.

use serde::{Deserialize, Serialize};

/// Main configuration structure for specmend.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Language model client configuration.
    #[serde(default)]
    pub llm: LlmConfig,

    /// Result cache configuration.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Language model client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LlmConfig {
    /// Model identifier.
    #[serde(default = "default_model")]
    pub model: String,

    /// Base URL for the Messages API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// API key. Falls back to the ANTHROPIC_API_KEY environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Default token budget for completions.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Sampling temperature (0.0-1.0).
    #[serde(default = "default_temperature")]
    pub temperature: f64,

    /// Per-call timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Sustained request rate in requests per second.
    #[serde(default = "default_rate_limit_rps")]
    pub rate_limit_rps: f64,

    /// Retry policy for transient API errors.
    #[serde(default)]
    pub retry: RetryConfig,
}

fn default_model() -> String {
    "claude-3-5-sonnet-20241022".to_string()
}

fn default_base_url() -> String {
    "https://api.anthropic.com".to_string()
}

const fn default_max_tokens() -> u32 {
    4096
}

const fn default_temperature() -> f64 {
    0.2
}

const fn default_timeout_secs() -> u64 {
    120
}

const fn default_rate_limit_rps() -> f64 {
    10.0
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            base_url: default_base_url(),
            api_key: None,
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
            rate_limit_rps: default_rate_limit_rps(),
            retry: RetryConfig::default(),
        }
    }
}

/// Retry policy configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RetryConfig {
    /// Maximum retry attempts for transient errors.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Initial backoff delay in milliseconds.
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Maximum backoff delay in milliseconds.
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

const fn default_max_retries() -> u32 {
    3
}

const fn default_initial_backoff_ms() -> u64 {
    1_000
}

const fn default_max_backoff_ms() -> u64 {
    60_000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

/// Result cache configuration.
///
/// All cache state is in-process and ephemeral: a restart clears every
/// namespace. There is no warm-start.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CacheConfig {
    /// Maximum entries per namespace before LRU eviction.
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,

    /// Default TTL for cached values, in seconds.
    #[serde(default = "default_ttl_secs")]
    pub default_ttl_secs: u64,

    /// TTL for full-document attack-chain results, in seconds.
    #[serde(default = "default_signature_full_ttl_secs")]
    pub signature_full_ttl_secs: u64,

    /// TTL for signature-keyed partial attack-chain results, in seconds.
    /// Longer than the full TTL: partial results survive document edits
    /// that do not change the security-relevant projection.
    #[serde(default = "default_signature_partial_ttl_secs")]
    pub signature_partial_ttl_secs: u64,
}

const fn default_max_entries() -> usize {
    500
}

const fn default_ttl_secs() -> u64 {
    1_800
}

const fn default_signature_full_ttl_secs() -> u64 {
    1_800
}

const fn default_signature_partial_ttl_secs() -> u64 {
    3_600
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: default_max_entries(),
            default_ttl_secs: default_ttl_secs(),
            signature_full_ttl_secs: default_signature_full_ttl_secs(),
            signature_partial_ttl_secs: default_signature_partial_ttl_secs(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty.
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.llm.max_tokens, 4096);
        assert_eq!(config.cache.max_entries, 500);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let config: Config = serde_yaml::from_str("cache:\n  max_entries: 10\n").unwrap();
        assert_eq!(config.cache.max_entries, 10);
        assert_eq!(config.cache.default_ttl_secs, 1_800);
        assert_eq!(config.llm.model, "claude-3-5-sonnet-20241022");
    }
}
