//! Shared fixtures for integration tests.

use async_trait::async_trait;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use specmend::domain::ports::ChunkStream;
use specmend::{ChatMessage, Document, LlmClient, LlmResult, StreamChunk};

/// Scripted language-model collaborator.
///
/// Responses are queued per method and consumed in order; running out of
/// script is an error so tests notice unexpected calls.
#[derive(Default)]
pub struct MockLlmClient {
    json_responses: Mutex<VecDeque<Result<String, String>>>,
    chat_responses: Mutex<VecDeque<Result<String, String>>>,
    pub json_calls: AtomicUsize,
    pub chat_calls: AtomicUsize,
}

impl MockLlmClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_json(self, response: impl Into<String>) -> Self {
        self.json_responses
            .lock()
            .unwrap()
            .push_back(Ok(response.into()));
        self
    }

    pub fn with_json_error(self, message: impl Into<String>) -> Self {
        self.json_responses
            .lock()
            .unwrap()
            .push_back(Err(message.into()));
        self
    }

    pub fn with_chat(self, response: impl Into<String>) -> Self {
        self.chat_responses
            .lock()
            .unwrap()
            .push_back(Ok(response.into()));
        self
    }

    #[allow(dead_code)]
    pub fn with_chat_error(self, message: impl Into<String>) -> Self {
        self.chat_responses
            .lock()
            .unwrap()
            .push_back(Err(message.into()));
        self
    }

    fn next(
        queue: &Mutex<VecDeque<Result<String, String>>>,
        method: &str,
    ) -> LlmResult<String> {
        match queue.lock().unwrap().pop_front() {
            Some(Ok(response)) => Ok(response),
            Some(Err(message)) => Err(message.into()),
            None => Err(format!("unexpected {method} call: mock script exhausted").into()),
        }
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn chat(
        &self,
        _messages: &[ChatMessage],
        _temperature: f64,
        _max_tokens: u32,
    ) -> LlmResult<String> {
        self.chat_calls.fetch_add(1, Ordering::SeqCst);
        Self::next(&self.chat_responses, "chat")
    }

    async fn chat_stream(
        &self,
        messages: &[ChatMessage],
        temperature: f64,
        max_tokens: u32,
    ) -> LlmResult<ChunkStream> {
        let text = self.chat(messages, temperature, max_tokens).await?;
        let chunks = vec![
            Ok(StreamChunk {
                delta: Some(text),
                stop_reason: None,
            }),
            Ok(StreamChunk {
                delta: None,
                stop_reason: Some("end_turn".to_string()),
            }),
        ];
        Ok(Box::pin(futures::stream::iter(chunks)))
    }

    async fn generate_json(&self, _prompt: &str, _max_tokens: u32) -> LlmResult<String> {
        self.json_calls.fetch_add(1, Ordering::SeqCst);
        Self::next(&self.json_responses, "generate_json")
    }

    async fn health_check(&self) -> LlmResult<bool> {
        Ok(true)
    }
}

/// A small but realistic specification document.
pub fn petstore_document() -> Document {
    json!({
        "openapi": "3.0.0",
        "info": {"title": "Petstore", "version": "1.0.0"},
        "servers": [{"url": "https://api.example.com"}],
        "paths": {
            "/pets": {
                "get": {"summary": "List pets", "responses": {"200": {"description": "ok"}}}
            }
        },
        "components": {"schemas": {"Pet": {"type": "object"}}}
    })
}

/// A patch proposal reply bumping the document version.
pub fn version_bump_proposal() -> String {
    json!({
        "patches": [
            {"op": "replace", "path": "/info/version", "value": "2.0.0"}
        ],
        "explanation": "bump the version",
        "confidence": 0.95
    })
    .to_string()
}
