//! Server-Sent Events parsing for streaming completions.
//!
//! The Messages API streams SSE blocks separated by blank lines. Only
//! `content_block_delta` (text) and `message_delta` (stop reason) events
//! produce chunks; everything else (message_start, ping, block boundaries)
//! is bookkeeping and is skipped.

use bytes::Bytes;
use futures::{Stream, StreamExt};
use serde_json::Value;
use std::collections::VecDeque;
use std::pin::Pin;

use super::error::LlmApiError;
use crate::domain::ports::{ChunkStream, StreamChunk};

type ByteStream = Pin<Box<dyn Stream<Item = reqwest::Result<Bytes>> + Send>>;

struct SseState {
    inner: ByteStream,
    buffer: String,
    pending: VecDeque<StreamChunk>,
    done: bool,
}

/// Adapt a streaming HTTP response into a stream of text chunks.
pub(crate) fn chunk_stream(response: reqwest::Response) -> ChunkStream {
    let state = SseState {
        inner: Box::pin(response.bytes_stream()),
        buffer: String::new(),
        pending: VecDeque::new(),
        done: false,
    };
    Box::pin(futures::stream::unfold(state, |mut state| async move {
        loop {
            if let Some(chunk) = state.pending.pop_front() {
                return Some((Ok(chunk), state));
            }
            if state.done {
                return None;
            }
            match state.inner.next().await {
                None => {
                    state.done = true;
                }
                Some(Err(e)) => {
                    state.done = true;
                    return Some((Err(LlmApiError::from(e).into()), state));
                }
                Some(Ok(bytes)) => {
                    state.buffer.push_str(&String::from_utf8_lossy(&bytes));
                    while let Some(pos) = state.buffer.find("\n\n") {
                        let block: String = state.buffer.drain(..pos + 2).collect();
                        if let Some(chunk) = parse_event_block(&block) {
                            state.pending.push_back(chunk);
                        }
                    }
                }
            }
        }
    }))
}

/// Parse one SSE block (possibly multiple `data:` lines) into a chunk.
fn parse_event_block(block: &str) -> Option<StreamChunk> {
    let data = block
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n");
    if data.is_empty() {
        return None;
    }
    let event: Value = serde_json::from_str(&data).ok()?;
    event_to_chunk(&event)
}

fn event_to_chunk(event: &Value) -> Option<StreamChunk> {
    match event["type"].as_str()? {
        "content_block_delta" => event["delta"]["text"].as_str().map(|text| StreamChunk {
            delta: Some(text.to_string()),
            stop_reason: None,
        }),
        "message_delta" => event["delta"]["stop_reason"]
            .as_str()
            .map(|reason| StreamChunk {
                delta: None,
                stop_reason: Some(reason.to_string()),
            }),
        _ => None,
    }
}
