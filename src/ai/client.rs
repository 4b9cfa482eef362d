use crate::locale::Locale;
use crate::types::Message;
use thiserror::Error;

use super::payload::{GenerationParams, InvokeRequest};
use super::providers::LLMBackend;
use super::stream::collect_text;

// ============================================
// Error Types
// ============================================

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("failed to encode request: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("provider error: {0}")]
    Provider(String),

    #[error("malformed frame #{index}: {source}")]
    Decode {
        index: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("frame received after the stream finished")]
    StreamClosed,
}

impl From<reqwest::Error> for ChatError {
    fn from(err: reqwest::Error) -> Self {
        ChatError::Transport(err.to_string())
    }
}

pub type ChatResult<T> = Result<T, ChatError>;

// ============================================
// Model Invocation
// ============================================

/// Sends a conversation to the configured backend and reassembles the
/// streamed answer.
pub struct ModelAdapter {
    backend: Box<dyn LLMBackend>,
    params: GenerationParams,
    locale: Locale,
}

impl ModelAdapter {
    pub fn new(backend: Box<dyn LLMBackend>, locale: Locale) -> Self {
        Self {
            backend,
            params: GenerationParams::default(),
            locale,
        }
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    /// Stream a reply for the full ordered history, hidden entries included.
    ///
    /// A frame that fails to decode aborts the call and any text gathered so
    /// far is dropped.
    pub async fn try_invoke(
        &self,
        messages: &[Message],
        on_delta: impl FnMut(&str) + Send,
    ) -> ChatResult<String> {
        let request = InvokeRequest::new(messages, &self.params);
        tracing::debug!(
            backend = self.backend.name(),
            messages = messages.len(),
            "invoking model"
        );

        let mut frames = self.backend.open_stream(&request).await?;
        collect_text(frames.as_mut(), on_delta).await
    }

    /// Like [`try_invoke`](Self::try_invoke) but never fails: errors come back
    /// as display text in the configured locale.
    pub async fn invoke(&self, messages: &[Message]) -> String {
        match self.try_invoke(messages, |_| {}).await {
            Ok(text) => text,
            Err(err) => self.failure_text(&err),
        }
    }

    pub fn failure_text(&self, err: &ChatError) -> String {
        tracing::warn!(backend = self.backend.name(), error = %err, "model invocation failed");
        self.locale.invocation_failed(&err.to_string())
    }
}
