//! Port trait for the language-model collaborator.

use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;

/// Result type for language model operations.
pub type LlmResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Stream of completion chunks returned by [`LlmClient::chat_stream`].
pub type ChunkStream = Pin<Box<dyn Stream<Item = LlmResult<StreamChunk>> + Send>>;

/// A single message in a conversation.
///
/// The Messages API expects an alternating sequence of user and assistant
/// messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message author ("user" or "assistant").
    pub role: String,

    /// Content of the message.
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Chunk of a streaming completion.
///
/// Each chunk carries a partial text delta; the final chunk carries the
/// stop reason.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamChunk {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delta: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<String>,
}

/// Port trait for the language-model collaborator.
///
/// This is the only network-bound operation in the mutation pipeline. The
/// domain layer depends on this trait, not on a concrete HTTP client;
/// adapters in the infrastructure layer implement it. Completions are
/// best-effort: the engine validates everything the model returns.
///
/// Implementations must enforce a per-call timeout and surface failures as
/// errors — never silently return empty success. Retry of transient faults
/// is an adapter concern; the orchestrator does not retry.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send a conversation and receive the complete text response.
    async fn chat(
        &self,
        messages: &[ChatMessage],
        temperature: f64,
        max_tokens: u32,
    ) -> LlmResult<String>;

    /// Stream a completion token-by-token.
    ///
    /// Errors can occur both when initiating the stream (returned as `Err`)
    /// and during streaming (yielded as stream items).
    async fn chat_stream(
        &self,
        messages: &[ChatMessage],
        temperature: f64,
        max_tokens: u32,
    ) -> LlmResult<ChunkStream>;

    /// Request a structured JSON completion for a single prompt.
    ///
    /// The returned text is expected, not guaranteed, to be a JSON document;
    /// callers must treat parse failures as a normal outcome.
    async fn generate_json(&self, prompt: &str, max_tokens: u32) -> LlmResult<String>;

    /// Check that the API is reachable and the credentials are valid.
    async fn health_check(&self) -> LlmResult<bool>;
}
