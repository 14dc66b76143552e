//! Server-Sent-Events decoding for streamed chat completions.

use std::collections::VecDeque;
use std::pin::Pin;

use futures_util::{Stream, StreamExt};
use serde_json::Value;

use crate::{client::ChunkStream, error::LlmError, types::ChatCompletionChunk};

const DONE_SENTINEL: &str = "[DONE]";

/// Splits an arbitrary byte stream into trimmed, non-empty lines.
#[derive(Default)]
pub struct SseLineBuffer {
    buffer: Vec<u8>,
}

impl SseLineBuffer {
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);
        self.drain_lines(false)
    }

    /// Flush whatever is left once the body ends without a trailing newline
    pub fn finish(&mut self) -> Vec<String> {
        self.drain_lines(true)
    }

    fn drain_lines(&mut self, flush: bool) -> Vec<String> {
        let mut lines = Vec::new();
        let mut start = 0;

        while let Some(offset) = self.buffer[start..].iter().position(|b| *b == b'\n') {
            let end = start + offset;
            push_trimmed(&mut lines, &self.buffer[start..end]);
            start = end + 1;
        }

        if flush {
            push_trimmed(&mut lines, &self.buffer[start..]);
            self.buffer.clear();
        } else if start > 0 {
            self.buffer.drain(..start);
        }

        lines
    }
}

fn push_trimmed(lines: &mut Vec<String>, bytes: &[u8]) {
    // Lines are only split on '\n', so a multi-byte char is never cut in half
    let text = String::from_utf8_lossy(bytes);
    let trimmed = text.trim();
    if !trimmed.is_empty() {
        lines.push(trimmed.to_string());
    }
}

/// Payload of a `data:` field, `None` for comments and other fields
pub fn sse_data_payload(line: &str) -> Option<&str> {
    line.strip_prefix("data:").map(str::trim)
}

struct DecodeState<S> {
    inner: Pin<Box<S>>,
    lines: SseLineBuffer,
    queue: VecDeque<Result<ChatCompletionChunk, LlmError>>,
    finished: bool,
}

impl<S> DecodeState<S> {
    fn handle_line(&mut self, line: &str) {
        if self.finished {
            return;
        }
        let Some(payload) = sse_data_payload(line) else {
            return;
        };
        if payload.is_empty() {
            return;
        }
        if payload == DONE_SENTINEL {
            self.finished = true;
            return;
        }

        let value: Value = match serde_json::from_str(payload) {
            Ok(value) => value,
            Err(e) => {
                self.fail(LlmError::from(e));
                return;
            }
        };

        // Providers report failures after the 200 as an in-band error object
        if let Some(error) = value.get("error") {
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| error.to_string());
            self.fail(LlmError::stream(message));
            return;
        }

        match serde_json::from_value::<ChatCompletionChunk>(value) {
            Ok(chunk) => self.queue.push_back(Ok(chunk)),
            Err(e) => self.fail(LlmError::from(e)),
        }
    }

    fn fail(&mut self, error: LlmError) {
        self.queue.push_back(Err(error));
        self.finished = true;
    }
}

/// Turn a raw response body into a stream of chunks.
///
/// The stream ends after `data: [DONE]`, at end of body, or right after the
/// first error it yields.
pub fn decode_chunk_stream<S, B, E>(body: S) -> ChunkStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]>,
    E: Into<LlmError>,
{
    let state = DecodeState {
        inner: Box::pin(body),
        lines: SseLineBuffer::default(),
        queue: VecDeque::new(),
        finished: false,
    };

    Box::pin(futures_util::stream::unfold(state, |mut state| async move {
        loop {
            if let Some(item) = state.queue.pop_front() {
                return Some((item, state));
            }
            if state.finished {
                return None;
            }

            match state.inner.next().await {
                Some(Ok(bytes)) => {
                    for line in state.lines.push(bytes.as_ref()) {
                        state.handle_line(&line);
                    }
                }
                Some(Err(e)) => state.fail(e.into()),
                None => {
                    for line in state.lines.finish() {
                        state.handle_line(&line);
                    }
                    state.finished = true;
                }
            }
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;

    fn body(parts: &[&str]) -> impl Stream<Item = Result<Vec<u8>, LlmError>> + Send + 'static {
        let owned: Vec<Result<Vec<u8>, LlmError>> =
            parts.iter().map(|p| Ok(p.as_bytes().to_vec())).collect();
        stream::iter(owned)
    }

    async fn collect(parts: &[&str]) -> Vec<Result<ChatCompletionChunk, LlmError>> {
        decode_chunk_stream(body(parts)).collect().await
    }

    #[test]
    fn test_line_buffer_handles_split_lines() {
        let mut buffer = SseLineBuffer::default();
        assert!(buffer.push(b"data: {\"a\"").is_empty());
        assert_eq!(buffer.push(b":1}\r\n\r\n"), vec!["data: {\"a\":1}"]);
        assert!(buffer.push(b"data: [DO").is_empty());
        assert_eq!(buffer.finish(), vec!["data: [DO"]);
    }

    #[test]
    fn test_data_payload() {
        assert_eq!(sse_data_payload("data: [DONE]"), Some("[DONE]"));
        assert_eq!(sse_data_payload("data:{}"), Some("{}"));
        assert_eq!(sse_data_payload(": OPENROUTER PROCESSING"), None);
    }

    #[tokio::test]
    async fn test_decodes_content_across_network_chunks() {
        let chunks = collect(&[
            "data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n\ndata: {\"choi",
            "ces\":[{\"delta\":{\"content\":\"lo\"}}]}\n\n",
            "data: [DONE]\n\n",
        ])
        .await;

        let text: String = chunks
            .into_iter()
            .map(|c| c.unwrap().choices[0].delta.content.clone().unwrap_or_default())
            .collect();
        assert_eq!(text, "Hello");
    }

    #[tokio::test]
    async fn test_comments_are_skipped_and_done_ends_stream() {
        let chunks = collect(&[
            ": OPENROUTER PROCESSING\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"a\"}}]}\n\n",
            "data: [DONE]\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"ignored\"}}]}\n\n",
        ])
        .await;
        assert_eq!(chunks.len(), 1);
    }

    #[tokio::test]
    async fn test_in_band_error_terminates_stream() {
        let chunks = collect(&[
            "data: {\"error\":{\"message\":\"upstream overloaded\"}}\n\n",
            "data: {\"choices\":[]}\n\n",
        ])
        .await;
        assert_eq!(chunks.len(), 1);
        match &chunks[0] {
            Err(LlmError::Stream { message }) => assert_eq!(message, "upstream overloaded"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_malformed_payload_yields_parse_error() {
        let chunks = collect(&["data: {not json}\n\n"]).await;
        assert!(matches!(chunks.as_slice(), [Err(LlmError::Parse { .. })]));
    }

    #[tokio::test]
    async fn test_trailing_line_without_newline_is_decoded() {
        let chunks = collect(&["data: {\"choices\":[{\"delta\":{\"content\":\"x\"}}]}"]).await;
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].is_ok());
    }
}
