use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One conversational turn.
///
/// `hidden` only controls local rendering; it is never written to the wire,
/// so a `&[Message]` serializes straight into the provider's `messages` array.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing)]
    pub hidden: bool,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            hidden: false,
        }
    }

    pub fn hidden(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            hidden: true,
        }
    }
}
