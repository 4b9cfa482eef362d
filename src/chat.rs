use crate::ai::{ChatError, ModelAdapter};
use crate::locale::Locale;
use crate::session::Conversation;
use crate::types::Role;

/// Outcome of one submit.
///
/// Failures keep the inline text that went into the transcript so the
/// front-end can show them like any other answer, or style them apart.
#[derive(Debug)]
pub enum Reply {
    Answer(String),
    Failed { error: ChatError, text: String },
}

impl Reply {
    pub fn text(&self) -> &str {
        match self {
            Reply::Answer(text) => text,
            Reply::Failed { text, .. } => text,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Reply::Failed { .. })
    }
}

/// One chat session: the history plus the model it talks to.
pub struct ChatApp {
    conversation: Conversation,
    adapter: ModelAdapter,
}

impl ChatApp {
    /// Seed the session with the hidden persona context.
    pub fn new(adapter: ModelAdapter, persona: impl Into<String>) -> Self {
        Self {
            conversation: Conversation::with_context(persona),
            adapter,
        }
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn locale(&self) -> Locale {
        self.adapter.locale()
    }

    /// Record the user's turn, ask the model and record its answer.
    ///
    /// Blank input is ignored and returns `None`. The call blocks until the
    /// response stream is fully drained; `on_delta` sees text as it arrives.
    pub async fn submit(&mut self, input: &str, on_delta: impl FnMut(&str) + Send) -> Option<Reply> {
        if input.trim().is_empty() {
            return None;
        }

        self.conversation.append(Role::User, input, false);
        let reply = match self
            .adapter
            .try_invoke(self.conversation.messages(), on_delta)
            .await
        {
            Ok(text) => Reply::Answer(text),
            Err(error) => {
                let text = self.adapter.failure_text(&error);
                Reply::Failed { error, text }
            }
        };
        self.conversation
            .append(Role::Assistant, reply.text().to_string(), false);
        Some(reply)
    }
}
