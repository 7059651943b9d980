//! Server-Sent-Events stream aggregation.
//!
//! Reassembles discrete events out of a raw byte-chunk feed and decodes
//! each event's `data: ` payload. Undecodable events are tolerated and
//! skipped; a stream that ends without a single decoded event and without
//! the `[DONE]` sentinel is a protocol error.

use futures::StreamExt;
use serde_json::Value;

use super::base::{Completion, Usage};
use crate::errors::{AgentError, AgentResult};

/// Sentinel payload that terminates the semantic stream.
const DONE_SENTINEL: &str = "[DONE]";

/// Incremental SSE event reassembler.
///
/// Chunks may split events (and multi-byte characters) at arbitrary byte
/// positions, so the buffer stays in bytes and events are only decoded to
/// text once a complete boundary has arrived.
#[derive(Debug, Default)]
pub struct SseAggregator {
    buffer: Vec<u8>,
    decoded: usize,
    done: bool,
}

impl SseAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the `[DONE]` sentinel has been seen.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Feed one transport chunk and return the JSON payloads of every event
    /// completed by it. Events arriving after the sentinel are ignored.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<Value> {
        let mut events = Vec::new();
        if self.done {
            return events;
        }

        self.buffer.extend_from_slice(chunk);

        // Events are separated by a blank line (two consecutive newlines).
        while let Some(pos) = find_boundary(&self.buffer) {
            let event_bytes = self.buffer[..pos].to_vec();
            self.buffer.drain(..pos + 2);

            if self.done {
                continue;
            }

            let event = String::from_utf8_lossy(&event_bytes);
            if let Some(payload) = self.decode(&event) {
                events.push(payload);
            }
        }

        events
    }

    /// Verify the stream reached a decodable state before the transport
    /// ended. Trailing bytes after the sentinel are fine; a stream that
    /// never produced a valid event is not.
    pub fn finish(&self) -> AgentResult<()> {
        if self.done || self.decoded > 0 {
            Ok(())
        } else {
            Err(AgentError::Provider(
                "stream ended without any decodable events".to_string(),
            ))
        }
    }

    fn decode(&mut self, event: &str) -> Option<Value> {
        let payload = event.strip_prefix("data: ")?;

        if payload.trim() == DONE_SENTINEL {
            self.done = true;
            return None;
        }

        match serde_json::from_str(payload) {
            Ok(value) => {
                self.decoded += 1;
                Some(value)
            }
            Err(e) => {
                // Robustness over strictness: skip the event, keep the stream.
                tracing::debug!(error = %e, "skipping undecodable stream event");
                None
            }
        }
    }
}

fn find_boundary(buffer: &[u8]) -> Option<usize> {
    buffer.windows(2).position(|pair| pair == b"\n\n")
}

/// The incremental content field of an OpenAI-style stream event, if any.
pub fn delta_content(event: &Value) -> Option<&str> {
    event
        .get("choices")?
        .get(0)?
        .get("delta")?
        .get("content")?
        .as_str()
}

/// Drive an OpenAI-style SSE response to completion.
///
/// Invokes `on_token` synchronously, in arrival order, for each content
/// delta, and aggregates the deltas into the returned completion. Tool
/// calls are not reassembled from the delta stream.
pub async fn collect_openai_stream(
    response: reqwest::Response,
    on_token: &mut (dyn for<'a> FnMut(&'a str) + Send),
) -> AgentResult<Completion> {
    let mut aggregator = SseAggregator::new();
    let mut content = String::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk
            .map_err(|e| AgentError::Provider(format!("network error during stream: {}", e)))?;

        for event in aggregator.feed(&chunk) {
            if let Some(delta) = delta_content(&event) {
                content.push_str(delta);
                on_token(delta);
            }
        }
    }

    aggregator.finish()?;

    Ok(Completion {
        content,
        tool_calls: Vec::new(),
        usage: Usage::default(),
    })
}
