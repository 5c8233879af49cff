//! Port traits consumed by the mutation engine.

pub mod llm_client;

pub use llm_client::{ChatMessage, ChunkStream, LlmClient, LlmResult, StreamChunk};
