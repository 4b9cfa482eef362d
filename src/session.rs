//! In-memory chat history for one session.
//!
//! The whole history, hidden persona message included, is replayed to the
//! model on every call. There is no size cap, so request size grows with the
//! length of the conversation.

use crate::types::{Message, Role};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a session whose first entry is the hidden persona context.
    pub fn with_context(context: impl Into<String>) -> Self {
        let mut conversation = Self::new();
        conversation.append(Role::User, context, true);
        conversation
    }

    /// Append a turn.
    ///
    /// Hidden messages always go in. A visible message is dropped when the last
    /// visible message already has the same role; the content is discarded,
    /// not merged. Returns whether the message was stored.
    pub fn append(&mut self, role: Role, content: impl Into<String>, hidden: bool) -> bool {
        if hidden {
            self.messages.push(Message::hidden(role, content));
            return true;
        }

        if self.last_visible().is_some_and(|last| last.role == role) {
            tracing::debug!(?role, "dropping consecutive message with the same role");
            return false;
        }

        self.messages.push(Message::new(role, content));
        true
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn visible(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter().filter(|msg| !msg.hidden)
    }

    pub fn last_visible(&self) -> Option<&Message> {
        self.messages.iter().rev().find(|msg| !msg.hidden)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_visible_user_message_follows_hidden_context() {
        let mut conv = Conversation::with_context("persona");
        assert!(conv.append(Role::User, "olá", false));
        assert_eq!(conv.len(), 2);
        assert!(conv.messages()[0].hidden);
        assert_eq!(conv.messages()[1].content, "olá");
    }

    #[test]
    fn same_role_append_is_a_noop() {
        let mut conv = Conversation::new();
        assert!(conv.append(Role::User, "first", false));
        assert!(!conv.append(Role::User, "second", false));
        assert_eq!(conv.len(), 1);
        assert_eq!(conv.messages()[0].content, "first");
    }

    #[test]
    fn alternating_appends_never_repeat_a_role() {
        let mut conv = Conversation::with_context("persona");
        let roles = [
            Role::User,
            Role::User,
            Role::Assistant,
            Role::Assistant,
            Role::User,
            Role::Assistant,
            Role::User,
        ];
        for (i, role) in roles.into_iter().enumerate() {
            conv.append(role, format!("turn {i}"), false);
        }

        let visible: Vec<_> = conv.visible().collect();
        assert_eq!(visible.len(), 5);
        for pair in visible.windows(2) {
            assert_ne!(pair[0].role, pair[1].role);
        }
    }

    #[test]
    fn hidden_messages_are_always_appended() {
        let mut conv = Conversation::new();
        assert!(conv.append(Role::User, "a", true));
        assert!(conv.append(Role::User, "b", true));
        assert_eq!(conv.len(), 2);
        assert_eq!(conv.visible().count(), 0);
        assert!(conv.last_visible().is_none());
    }

    #[test]
    fn empty_conversation_accepts_any_role() {
        let mut conv = Conversation::new();
        assert!(conv.is_empty());
        assert!(conv.append(Role::Assistant, "hi", false));
        assert_eq!(conv.last_visible().map(|m| m.role), Some(Role::Assistant));
    }
}
