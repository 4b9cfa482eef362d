use super::LLMBackend;
use crate::ai::payload::InvokeRequest;
use crate::ai::stream::{Frame, FrameSource};
use crate::ai::{ChatError, ChatResult};
use crate::config::AnthropicSettings;
use crate::types::Message;
use async_trait::async_trait;
use futures::StreamExt;
use futures::stream::BoxStream;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

const API_VERSION: &str = "2023-06-01";

/// Claude through Anthropic's own Messages API, streamed as server-sent events.
pub struct AnthropicBackend {
    client: Client,
    settings: AnthropicSettings,
}

impl AnthropicBackend {
    pub fn new(settings: AnthropicSettings) -> Self {
        Self {
            client: Client::new(),
            settings,
        }
    }
}

// The Messages API takes the version as a header and wants the model in the body.
#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    max_tokens: u32,
    temperature: f64,
    top_p: f64,
    stop_sequences: &'a [String],
    stream: bool,
}

#[async_trait]
impl LLMBackend for AnthropicBackend {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    async fn open_stream(&self, request: &InvokeRequest<'_>) -> ChatResult<Box<dyn FrameSource>> {
        let response = self
            .client
            .post(&self.settings.endpoint)
            .header("x-api-key", &self.settings.api_key)
            .header("anthropic-version", API_VERSION)
            .header("accept", "text/event-stream")
            .json(&MessagesRequest {
                model: &self.settings.model,
                messages: request.messages,
                max_tokens: request.max_tokens,
                temperature: request.temperature,
                top_p: request.top_p,
                stop_sequences: request.stop_sequences,
                stream: true,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChatError::Provider(format!("Anthropic error {status}: {body}")));
        }

        let bytes = response
            .bytes_stream()
            .map(|item| item.map(|chunk| chunk.to_vec()))
            .boxed();
        Ok(Box::new(SseFrames::new(bytes)))
    }
}

#[derive(Deserialize)]
struct ErrorEvent {
    #[serde(rename = "type")]
    kind: String,
    error: Option<ErrorBody>,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(rename = "type")]
    kind: Option<String>,
    message: Option<String>,
}

/// Detect an in-stream `{"type":"error"}` event and describe it.
///
/// The Messages API reports overload and server faults this way after the
/// HTTP status has already been sent as 200.
pub fn stream_error_message(data: &str) -> Option<String> {
    let event: ErrorEvent = serde_json::from_str(data).ok()?;
    if event.kind != "error" {
        return None;
    }
    let body = event.error?;
    Some(match (body.kind, body.message) {
        (Some(kind), Some(message)) => format!("{kind}: {message}"),
        (None, Some(message)) => message,
        (Some(kind), None) => kind,
        (None, None) => "unknown stream error".to_string(),
    })
}

fn event_to_frame(data: String) -> ChatResult<Frame> {
    match stream_error_message(&data) {
        Some(message) => Err(ChatError::Provider(format!("Anthropic stream error {message}"))),
        None => Ok(Frame::chunk(data)),
    }
}

/// Splits a server-sent event stream into frames, one per event `data` field.
pub struct SseFrames {
    bytes: BoxStream<'static, reqwest::Result<Vec<u8>>>,
    parser: SseParser,
    ready: VecDeque<ChatResult<Frame>>,
    exhausted: bool,
}

impl SseFrames {
    pub fn new(bytes: BoxStream<'static, reqwest::Result<Vec<u8>>>) -> Self {
        Self {
            bytes,
            parser: SseParser::default(),
            ready: VecDeque::new(),
            exhausted: false,
        }
    }
}

#[async_trait]
impl FrameSource for SseFrames {
    async fn next_frame(&mut self) -> ChatResult<Option<Frame>> {
        loop {
            if let Some(frame) = self.ready.pop_front() {
                return frame.map(Some);
            }
            if self.exhausted {
                return Ok(None);
            }
            match self.bytes.next().await {
                Some(Ok(chunk)) => {
                    let data = self.parser.feed(&chunk);
                    self.ready.extend(data.into_iter().map(event_to_frame));
                }
                Some(Err(err)) => return Err(ChatError::from(err)),
                None => {
                    self.exhausted = true;
                    self.ready.extend(self.parser.flush().map(event_to_frame));
                }
            }
        }
    }
}

/// Incremental line parser for `text/event-stream` bodies.
///
/// Bytes are buffered until a full line is available, so multi-byte
/// characters split across network chunks decode intact.
#[derive(Debug, Default)]
pub struct SseParser {
    buffer: Vec<u8>,
    data: Option<String>,
}

impl SseParser {
    /// Feed raw body bytes; returns the `data` of every event completed by them.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(bytes);
        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=pos).collect();
            let mut line = String::from_utf8_lossy(&raw[..pos]).into_owned();
            if line.ends_with('\r') {
                line.pop();
            }

            if line.is_empty() {
                if let Some(data) = self.data.take() {
                    events.push(data);
                }
                continue;
            }

            if let Some(rest) = line.strip_prefix("data:") {
                let fragment = rest.strip_prefix(' ').unwrap_or(rest);
                match &mut self.data {
                    Some(existing) => {
                        existing.push('\n');
                        existing.push_str(fragment);
                    }
                    None => self.data = Some(fragment.to_string()),
                }
            }
        }
        events
    }

    /// Emit an event left open when the body ended without a blank line.
    pub fn flush(&mut self) -> Option<String> {
        if !self.buffer.is_empty() {
            let mut events = self.feed(b"\n");
            if let Some(data) = events.pop() {
                return Some(data);
            }
        }
        self.data.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::stream::collect_text;

    #[test]
    fn parses_events_split_across_chunks() {
        let mut parser = SseParser::default();
        assert!(parser.feed(b"event: content_block_delta\ndata: {\"a\"").is_empty());
        let events = parser.feed(b":1}\n\nevent: ping\r\ndata: {}\r\n\r\n");
        assert_eq!(events, vec![r#"{"a":1}"#.to_string(), "{}".to_string()]);
    }

    #[test]
    fn joins_multiline_data_and_ignores_other_fields() {
        let mut parser = SseParser::default();
        let events = parser.feed(b": comment\nid: 7\ndata: one\ndata: two\n\n");
        assert_eq!(events, vec!["one\ntwo".to_string()]);
    }

    #[test]
    fn flush_emits_unterminated_event() {
        let mut parser = SseParser::default();
        assert!(parser.feed(b"data: tail").is_empty());
        assert_eq!(parser.flush(), Some("tail".to_string()));
        assert_eq!(parser.flush(), None);
    }

    #[tokio::test]
    async fn assembles_text_from_sse_body() {
        let body = concat!(
            "event: message_start\n",
            "data: {\"type\":\"message_start\",\"message\":{}}\n\n",
            "event: content_block_delta\n",
            "data: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"Olá\"}}\n\n",
            "event: ping\n",
            "data: {\"type\": \"ping\"}\n\n",
            "event: content_block_delta\n",
            "data: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"!\"}}\n\n",
            "event: message_stop\n",
            "data: {\"type\":\"message_stop\"}\n\n",
        );
        // Split inside the multi-byte "á" to exercise byte buffering.
        let bytes = body.as_bytes();
        let split = body.find("lá").unwrap() + 2;
        let chunks: Vec<reqwest::Result<Vec<u8>>> =
            vec![Ok(bytes[..split].to_vec()), Ok(bytes[split..].to_vec())];
        let mut frames = SseFrames::new(futures::stream::iter(chunks).boxed());

        let text = collect_text(&mut frames, |_| {}).await.unwrap();
        assert_eq!(text, "Olá!");
    }

    #[test]
    fn recognizes_error_events() {
        assert_eq!(
            stream_error_message(
                r#"{"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#
            ),
            Some("overloaded_error: Overloaded".to_string())
        );
        assert_eq!(stream_error_message(r#"{"type":"ping"}"#), None);
        assert_eq!(stream_error_message("not json"), None);
    }

    #[tokio::test]
    async fn error_event_mid_stream_fails_the_call() {
        let body = concat!(
            "event: content_block_delta\n",
            "data: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"Ol\"}}\n\n",
            "event: error\n",
            "data: {\"type\":\"error\",\"error\":{\"type\":\"overloaded_error\",\"message\":\"Overloaded\"}}\n\n",
        );
        let chunks: Vec<reqwest::Result<Vec<u8>>> = vec![Ok(body.as_bytes().to_vec())];
        let mut frames = SseFrames::new(futures::stream::iter(chunks).boxed());

        let mut seen = String::new();
        let err = collect_text(&mut frames, |piece| seen.push_str(piece))
            .await
            .unwrap_err();
        assert_eq!(seen, "Ol");
        assert!(matches!(err, ChatError::Provider(ref detail) if detail.contains("Overloaded")));
    }
}
