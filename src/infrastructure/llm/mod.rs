//! Anthropic Messages API adapter for the language-model port.

pub mod client;
pub mod error;
pub mod rate_limiter;
pub mod retry;
pub mod streaming;
pub mod types;

pub use client::AnthropicClient;
pub use error::LlmApiError;
pub use rate_limiter::TokenBucketRateLimiter;
pub use retry::RetryPolicy;
