use crate::types::Message;
use serde::Serialize;

pub const DEFAULT_MAX_TOKENS: u32 = 200;
pub const BEDROCK_ANTHROPIC_VERSION: &str = "bedrock-2023-05-31";
pub const DEFAULT_TEMPERATURE: f64 = 1.0;
pub const DEFAULT_TOP_P: f64 = 0.95;

/// Sampling settings attached to every call. Static, never derived from the
/// conversation.
#[derive(Clone, Debug, PartialEq)]
pub struct GenerationParams {
    pub max_tokens: u32,
    pub anthropic_version: String,
    pub temperature: f64,
    pub top_p: f64,
    pub stop_sequences: Vec<String>,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_tokens: DEFAULT_MAX_TOKENS,
            anthropic_version: BEDROCK_ANTHROPIC_VERSION.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            top_p: DEFAULT_TOP_P,
            stop_sequences: Vec::new(),
        }
    }
}

/// Body of a Bedrock `InvokeModelWithResponseStream` call for Claude models.
///
/// `messages` borrows the session history directly; `Message` skips its
/// `hidden` flag when serialized, so only role and content go out.
#[derive(Debug, Serialize)]
pub struct InvokeRequest<'a> {
    pub messages: &'a [Message],
    pub max_tokens: u32,
    pub anthropic_version: &'a str,
    pub temperature: f64,
    pub top_p: f64,
    pub stop_sequences: &'a [String],
}

impl<'a> InvokeRequest<'a> {
    pub fn new(messages: &'a [Message], params: &'a GenerationParams) -> Self {
        Self {
            messages,
            max_tokens: params.max_tokens,
            anthropic_version: &params.anthropic_version,
            temperature: params.temperature,
            top_p: params.top_p,
            stop_sequences: &params.stop_sequences,
        }
    }

    pub fn to_json_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;
    use serde_json::json;

    #[test]
    fn payload_carries_fixed_parameters() {
        let params = GenerationParams::default();
        let messages = vec![
            Message::hidden(Role::User, "persona"),
            Message::new(Role::User, "olá"),
        ];
        let body = InvokeRequest::new(&messages, &params).to_json_bytes().unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(
            value,
            json!({
                "messages": [
                    { "role": "user", "content": "persona" },
                    { "role": "user", "content": "olá" }
                ],
                "max_tokens": 200,
                "anthropic_version": "bedrock-2023-05-31",
                "temperature": 1.0,
                "top_p": 0.95,
                "stop_sequences": []
            })
        );
    }
}
