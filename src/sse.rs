//! Server-Sent Events (SSE) processing for streaming responses.
//!
//! This module turns the raw byte stream of a streamed chat completion into
//! a stream of [`ChatCompletionChunk`]s. Events are separated by a blank
//! line; each carries its payload on one or more `data:` lines. The payload
//! `[DONE]` ends the stream.

use std::error;

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};
use serde_json::Value;

use crate::observability::{STREAM_BYTES, STREAM_CHUNKS, STREAM_ERRORS};
use crate::{ChatCompletionChunk, Error, Result};

const DONE_MARKER: &str = "[DONE]";

/// A decoded SSE event, before its payload is interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
enum SseEvent {
    Data(String),
    Done,
    Empty,
}

struct SseState<S> {
    stream: S,
    pending: Vec<u8>,
    buffer: String,
    done: bool,
}

impl<S> SseState<S> {
    /// Append bytes to the text buffer, holding back an incomplete trailing
    /// UTF-8 sequence until the rest of it arrives.
    fn push_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.pending.extend_from_slice(bytes);
        let valid = match std::str::from_utf8(&self.pending) {
            Ok(text) => text.len(),
            Err(e) if e.error_len().is_none() => e.valid_up_to(),
            Err(e) => {
                self.pending.clear();
                return Err(Error::encoding(
                    format!("Invalid UTF-8 in stream: {e}"),
                    Some(Box::new(e)),
                ));
            }
        };
        let rest = self.pending.split_off(valid);
        let text = std::str::from_utf8(&self.pending)?;
        self.buffer.push_str(text);
        self.pending = rest;
        if self.buffer.contains('\r') {
            self.buffer = self.buffer.replace("\r\n", "\n");
        }
        Ok(())
    }
}

/// Process a stream of bytes into a stream of chat completion chunks.
///
/// The returned stream ends at the `[DONE]` marker or when the byte stream
/// ends, whichever comes first. Transport errors, undecodable bytes,
/// malformed JSON, and error payloads sent by the server are yielded as
/// `Err` items.
pub fn process_sse<S, E>(byte_stream: S) -> impl Stream<Item = Result<ChatCompletionChunk>>
where
    S: Stream<Item = std::result::Result<Bytes, E>> + Unpin + Send + 'static,
    E: error::Error + Send + Sync + 'static,
{
    let state = SseState {
        stream: byte_stream,
        pending: Vec::new(),
        buffer: String::new(),
        done: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if state.done {
                return None;
            }

            // First check if we have a complete event in the buffer
            if let Some((event, remaining)) = extract_event(&state.buffer) {
                state.buffer = remaining;
                match event {
                    SseEvent::Data(data) => return Some((parse_data(&data), state)),
                    SseEvent::Done => {
                        state.done = true;
                        return None;
                    }
                    SseEvent::Empty => continue,
                }
            }

            // Read more data
            match state.stream.next().await {
                Some(Ok(bytes)) => {
                    STREAM_BYTES.count(bytes.len() as u64);
                    if let Err(e) = state.push_bytes(&bytes) {
                        STREAM_ERRORS.click();
                        return Some((Err(e), state));
                    }
                }
                Some(Err(e)) => {
                    STREAM_ERRORS.click();
                    return Some((
                        Err(Error::streaming(
                            format!("Error in HTTP stream: {e}"),
                            Some(Box::new(e)),
                        )),
                        state,
                    ));
                }
                None => {
                    // End of stream; a final event may lack its blank line.
                    state.done = true;
                    if !state.pending.is_empty() {
                        STREAM_ERRORS.click();
                        return Some((
                            Err(Error::encoding("Stream ended inside a UTF-8 sequence", None)),
                            state,
                        ));
                    }
                    let tail = std::mem::take(&mut state.buffer);
                    return match parse_event(&tail) {
                        SseEvent::Data(data) => Some((parse_data(&data), state)),
                        SseEvent::Done | SseEvent::Empty => None,
                    };
                }
            }
        }
    })
}

/// Extract a complete SSE event from a buffer string.
fn extract_event(buffer: &str) -> Option<(SseEvent, String)> {
    let (event_text, rest) = buffer.split_once("\n\n")?;
    Some((parse_event(event_text), rest.to_string()))
}

/// Collect the `data:` lines of one event, ignoring comments and the
/// `event:`, `id:` and `retry:` fields.
fn parse_event(event_text: &str) -> SseEvent {
    let mut data: Option<String> = None;
    for line in event_text.lines() {
        if line.starts_with(':') {
            continue;
        }
        if let Some(value) = line.strip_prefix("data:") {
            let value = value.strip_prefix(' ').unwrap_or(value);
            match data.as_mut() {
                Some(data) => {
                    data.push('\n');
                    data.push_str(value);
                }
                None => data = Some(value.to_string()),
            }
        }
    }
    match data {
        Some(data) if data.trim() == DONE_MARKER => SseEvent::Done,
        Some(data) => SseEvent::Data(data),
        None => SseEvent::Empty,
    }
}

/// Interpret one data payload as a chunk or as an error sent mid-stream.
fn parse_data(data: &str) -> Result<ChatCompletionChunk> {
    let value: Value = serde_json::from_str(data).map_err(|e| {
        STREAM_ERRORS.click();
        Error::serialization(
            format!("Failed to parse event JSON: {e}"),
            Some(Box::new(e)),
        )
    })?;

    // Some servers send `"error": null` on ordinary chunks.
    if let Some(error) = value.get("error").filter(|e| e.is_object()) {
        STREAM_ERRORS.click();
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .map(String::from)
            .unwrap_or_else(|| error.to_string());
        let error_type = error
            .get("type")
            .and_then(Value::as_str)
            .map(String::from)
            .or_else(|| Some("stream_error".to_string()));
        return Err(Error::api(500, error_type, message, None));
    }

    STREAM_CHUNKS.click();
    serde_json::from_value(value).map_err(|e| {
        STREAM_ERRORS.click();
        Error::serialization(
            format!("Unexpected chunk shape: {e}"),
            Some(Box::new(e)),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;
    use std::io;

    fn bytes_stream(
        chunks: &[&'static [u8]],
    ) -> impl Stream<Item = std::result::Result<Bytes, io::Error>> + Unpin + Send + 'static {
        stream::iter(
            chunks
                .iter()
                .copied()
                .map(|chunk| Ok(Bytes::from_static(chunk)))
                .collect::<Vec<_>>(),
        )
    }

    async fn collect(chunks: &[&'static [u8]]) -> Vec<Result<ChatCompletionChunk>> {
        process_sse(bytes_stream(chunks)).collect().await
    }

    fn content(chunk: &ChatCompletionChunk) -> Option<&str> {
        chunk.first_choice()?.delta.content.as_deref()
    }

    #[tokio::test]
    async fn parse_single_chunk() {
        let events =
            collect(&[b"data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\"Hi\"}}]}\n\n"])
                .await;
        assert_eq!(events.len(), 1);
        assert_eq!(content(events[0].as_ref().unwrap()), Some("Hi"));
    }

    #[tokio::test]
    async fn done_marker_ends_stream() {
        let events = collect(&[
            b"data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\"a\"}}]}\n\n",
            b"data: [DONE]\n\n",
            b"data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\"b\"}}]}\n\n",
        ])
        .await;
        assert_eq!(events.len(), 1);
        assert_eq!(content(events[0].as_ref().unwrap()), Some("a"));
    }

    #[tokio::test]
    async fn handle_split_event() {
        let events = collect(&[
            b"data: {\"choices\":[{\"index\":0,",
            b"\"delta\":{\"content\":\"joined\"}}]}\n",
            b"\n",
        ])
        .await;
        assert_eq!(events.len(), 1);
        assert_eq!(content(events[0].as_ref().unwrap()), Some("joined"));
    }

    #[tokio::test]
    async fn handle_split_utf8_sequence() {
        // "é" is 0xC3 0xA9; split it across two network chunks.
        let events = collect(&[
            b"data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\"caf\xC3",
            b"\xA9\"}}]}\n\n",
        ])
        .await;
        assert_eq!(events.len(), 1);
        assert_eq!(content(events[0].as_ref().unwrap()), Some("café"));
    }

    #[tokio::test]
    async fn crlf_separated_events() {
        let events = collect(&[
            b"data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\"x\"}}]}\r\n\r\n",
            b"data: [DONE]\r\n\r\n",
        ])
        .await;
        assert_eq!(events.len(), 1);
        assert_eq!(content(events[0].as_ref().unwrap()), Some("x"));
    }

    #[tokio::test]
    async fn comments_are_skipped() {
        let events = collect(&[
            b": keep-alive\n\n",
            b"data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\"y\"}}]}\n\n",
        ])
        .await;
        assert_eq!(events.len(), 1);
        assert!(events[0].is_ok());
    }

    #[tokio::test]
    async fn trailing_event_without_blank_line() {
        let events =
            collect(&[b"data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\"z\"}}]}"])
                .await;
        assert_eq!(events.len(), 1);
        assert_eq!(content(events[0].as_ref().unwrap()), Some("z"));
    }

    #[tokio::test]
    async fn handle_malformed_event() {
        let events = collect(&[b"data: {not json\n\n"]).await;
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], Err(Error::Serialization { .. })));
    }

    #[tokio::test]
    async fn error_payload_becomes_api_error() {
        let events = collect(&[
            b"data: {\"error\":{\"message\":\"overloaded\",\"type\":\"server_error\"}}\n\n",
        ])
        .await;
        assert_eq!(events.len(), 1);
        match &events[0] {
            Err(Error::Api {
                message,
                error_type,
                ..
            }) => {
                assert_eq!(message, "overloaded");
                assert_eq!(error_type.as_deref(), Some("server_error"));
            }
            other => panic!("expected API error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn null_error_field_is_an_ordinary_chunk() {
        let events = collect(&[
            b"data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\"Hi\"}}],\"error\":null}\n\n",
        ])
        .await;
        assert_eq!(events.len(), 1);
        assert_eq!(content(events[0].as_ref().unwrap()), Some("Hi"));
    }

    #[tokio::test]
    async fn invalid_utf8_is_an_encoding_error() {
        let events = collect(&[b"data: \xFF\xFE\n\n"]).await;
        assert!(matches!(events[0], Err(Error::Encoding { .. })));
    }

    #[tokio::test]
    async fn transport_error_is_a_streaming_error() {
        let stream = stream::iter(vec![Err::<Bytes, _>(io::Error::other("reset"))]);
        let events: Vec<_> = process_sse(stream).collect().await;
        assert!(matches!(events[0], Err(Error::Streaming { .. })));
    }

    #[test]
    fn multi_line_data_is_joined() {
        assert_eq!(
            parse_event("event: message\ndata: a\ndata: b"),
            SseEvent::Data("a\nb".to_string())
        );
        assert_eq!(parse_event("id: 7"), SseEvent::Empty);
        assert_eq!(parse_event("data: [DONE]"), SseEvent::Done);
    }
}
