//! Reassembly of streamed model output.
//!
//! Providers deliver a response as a sequence of frames. Each frame may carry a
//! JSON payload; only `content_block_delta` frames whose delta is a
//! `text_delta` contribute text. Everything else is skipped.

use super::{ChatError, ChatResult};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::VecDeque;

const CONTENT_BLOCK_DELTA: &str = "content_block_delta";
const TEXT_DELTA: &str = "text_delta";

/// One unit of a server-streamed response.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Frame {
    pub chunk: Option<Vec<u8>>,
}

impl Frame {
    pub fn chunk(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            chunk: Some(bytes.into()),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }
}

/// Pull-based source of frames. `Ok(None)` means the stream is exhausted.
#[async_trait]
pub trait FrameSource: Send {
    async fn next_frame(&mut self) -> ChatResult<Option<Frame>>;
}

/// Frames replayed from memory, in order. Errors are yielded where they sit.
#[derive(Debug, Default)]
pub struct ReplayFrames {
    items: VecDeque<ChatResult<Frame>>,
}

impl ReplayFrames {
    pub fn new(frames: impl IntoIterator<Item = Frame>) -> Self {
        Self {
            items: frames.into_iter().map(Ok).collect(),
        }
    }

    pub fn from_results(items: impl IntoIterator<Item = ChatResult<Frame>>) -> Self {
        Self {
            items: items.into_iter().collect(),
        }
    }
}

#[async_trait]
impl FrameSource for ReplayFrames {
    async fn next_frame(&mut self) -> ChatResult<Option<Frame>> {
        self.items.pop_front().transpose()
    }
}

#[derive(Deserialize, Debug)]
struct StreamEvent {
    #[serde(rename = "type")]
    kind: Option<String>,
    delta: Option<EventDelta>,
}

#[derive(Deserialize, Debug)]
struct EventDelta {
    #[serde(rename = "type")]
    kind: Option<String>,
    text: Option<String>,
}

/// Decode one frame payload and pull out its text delta, if any.
pub fn parse_frame_payload(bytes: &[u8]) -> serde_json::Result<Option<String>> {
    let event: StreamEvent = serde_json::from_slice(bytes)?;
    if event.kind.as_deref() != Some(CONTENT_BLOCK_DELTA) {
        return Ok(None);
    }
    Ok(event
        .delta
        .filter(|delta| delta.kind.as_deref() == Some(TEXT_DELTA))
        .map(|delta| delta.text.unwrap_or_default()))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamState {
    Streaming,
    Done,
}

/// Folds frames into the final response text, strictly in arrival order.
#[derive(Debug)]
pub struct StreamAssembler {
    text: String,
    state: StreamState,
    frames_seen: usize,
}

impl Default for StreamAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamAssembler {
    pub fn new() -> Self {
        Self {
            text: String::new(),
            state: StreamState::Streaming,
            frames_seen: 0,
        }
    }

    /// Feed one frame. Returns the text fragment it contributed, if any.
    ///
    /// A payload that fails to decode aborts the whole response.
    pub fn push(&mut self, frame: &Frame) -> ChatResult<Option<&str>> {
        if self.state == StreamState::Done {
            return Err(ChatError::StreamClosed);
        }
        let index = self.frames_seen;
        self.frames_seen += 1;

        let Some(bytes) = frame.chunk.as_deref() else {
            return Ok(None);
        };
        let piece = parse_frame_payload(bytes).map_err(|source| ChatError::Decode { index, source })?;

        match piece {
            Some(piece) => {
                let start = self.text.len();
                self.text.push_str(&piece);
                Ok(Some(&self.text[start..]))
            }
            None => Ok(None),
        }
    }

    pub fn finish(&mut self) {
        self.state = StreamState::Done;
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    pub fn frames_seen(&self) -> usize {
        self.frames_seen
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

/// Drain `source` and return the concatenated text deltas.
///
/// `on_delta` sees each fragment as it arrives. Blocks until the source is
/// exhausted or fails.
pub async fn collect_text<S>(source: &mut S, mut on_delta: impl FnMut(&str)) -> ChatResult<String>
where
    S: FrameSource + ?Sized,
{
    let mut assembler = StreamAssembler::new();
    while let Some(frame) = source.next_frame().await? {
        if let Some(piece) = assembler.push(&frame)? {
            on_delta(piece);
        }
    }
    assembler.finish();
    tracing::debug!(
        frames = assembler.frames_seen(),
        chars = assembler.text().chars().count(),
        "response stream drained"
    );
    Ok(assembler.into_text())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delta(text: &str) -> Frame {
        Frame::chunk(
            serde_json::json!({
                "type": "content_block_delta",
                "delta": { "type": "text_delta", "text": text }
            })
            .to_string(),
        )
    }

    #[test]
    fn parses_text_delta() {
        let payload = br#"{"type":"content_block_delta","index":0,"delta":{"type":"text_delta","text":"Hi"}}"#;
        assert_eq!(parse_frame_payload(payload).unwrap(), Some("Hi".to_string()));
    }

    #[test]
    fn missing_text_defaults_to_empty() {
        let payload = br#"{"type":"content_block_delta","delta":{"type":"text_delta"}}"#;
        assert_eq!(parse_frame_payload(payload).unwrap(), Some(String::new()));
    }

    #[test]
    fn ignores_other_shapes() {
        for payload in [
            br#"{"type":"message_start","message":{"id":"x"}}"#.as_slice(),
            br#"{"type":"content_block_delta","delta":{"type":"input_json_delta","partial_json":"{"}}"#,
            br#"{"type":"message_delta","delta":{"stop_reason":"end_turn"}}"#,
            br#"{}"#,
        ] {
            assert_eq!(parse_frame_payload(payload).unwrap(), None);
        }
    }

    #[test]
    fn rejects_malformed_payload() {
        assert!(parse_frame_payload(b"{not json").is_err());
        assert!(parse_frame_payload(b"").is_err());
    }

    #[test]
    fn assembler_skips_frames_without_payload() {
        let mut assembler = StreamAssembler::new();
        assert_eq!(assembler.push(&Frame::empty()).unwrap(), None);
        assert_eq!(assembler.push(&delta("a")).unwrap(), Some("a"));
        assert_eq!(assembler.frames_seen(), 2);
        assert_eq!(assembler.state(), StreamState::Streaming);
        assembler.finish();
        assert_eq!(assembler.state(), StreamState::Done);
        assert_eq!(assembler.into_text(), "a");
    }

    #[test]
    fn assembler_refuses_frames_after_finish() {
        let mut assembler = StreamAssembler::new();
        assembler.finish();
        assert!(matches!(
            assembler.push(&delta("late")),
            Err(ChatError::StreamClosed)
        ));
    }

    #[test]
    fn decode_error_reports_frame_index() {
        let mut assembler = StreamAssembler::new();
        assembler.push(&delta("ok")).unwrap();
        let err = assembler.push(&Frame::chunk("oops")).unwrap_err();
        assert!(matches!(err, ChatError::Decode { index: 1, .. }));
    }

    #[tokio::test]
    async fn collects_deltas_in_order() {
        let mut source = ReplayFrames::new([
            delta("Olá"),
            Frame::chunk(r#"{"type":"other"}"#),
            delta("!"),
        ]);
        let mut seen = Vec::new();
        let text = collect_text(&mut source, |piece| seen.push(piece.to_string()))
            .await
            .unwrap();
        assert_eq!(text, "Olá!");
        assert_eq!(seen, vec!["Olá", "!"]);
    }

    #[tokio::test]
    async fn empty_stream_yields_empty_text() {
        let mut source = ReplayFrames::default();
        let text = collect_text(&mut source, |_| {}).await.unwrap();
        assert_eq!(text, "");
    }

    #[tokio::test]
    async fn transport_error_mid_stream_aborts() {
        let mut source = ReplayFrames::from_results([
            Ok(delta("partial")),
            Err(ChatError::Transport("connection reset".into())),
        ]);
        let err = collect_text(&mut source, |_| {}).await.unwrap_err();
        assert!(err.to_string().contains("connection reset"));
    }
}
