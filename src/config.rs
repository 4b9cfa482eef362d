//! Runtime configuration.
//!
//! Values come from the process environment (a local `.env` is loaded into it
//! at startup) and fall back to the defaults bundled in `assets/config.env`.

use crate::locale::Locale;
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

/// Bundled defaults, compiled into the binary.
pub const BUNDLED_CONFIG: &str = include_str!("../assets/config.env");

/// Persona instructions sent as the hidden first message of every session.
pub const DEFAULT_PERSONA: &str = include_str!("../assets/persona.txt");

pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_BEDROCK_MODEL: &str = "anthropic.claude-v2:1";
pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-3-5-sonnet-20241022";
pub const DEFAULT_ANTHROPIC_ENDPOINT: &str = "https://api.anthropic.com/v1/messages";

#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    pub provider: ProviderSettings,
    pub locale: Locale,
    pub persona: String,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ProviderSettings {
    Bedrock(BedrockSettings),
    Anthropic(AnthropicSettings),
}

#[derive(Clone, Debug, PartialEq)]
pub struct BedrockSettings {
    pub region: String,
    pub model_id: String,
    pub profile: Option<String>,
    pub credentials: Option<StaticCredentials>,
}

#[derive(Clone, PartialEq)]
pub struct StaticCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl fmt::Debug for StaticCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"***")
            .field("session_token", &self.session_token.as_ref().map(|_| "***"))
            .finish()
    }
}

#[derive(Clone, PartialEq)]
pub struct AnthropicSettings {
    pub endpoint: String,
    pub model: String,
    pub api_key: String,
}

impl fmt::Debug for AnthropicSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnthropicSettings")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("api_key", &"***")
            .finish()
    }
}

/// Parse `KEY=VALUE` lines, skipping blanks and `#` comments.
pub fn parse_env_file(text: &str) -> HashMap<String, String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .collect()
}

impl Settings {
    /// Read settings from the environment, falling back to bundled defaults.
    pub fn from_env() -> Result<Self> {
        let bundled = parse_env_file(BUNDLED_CONFIG);
        Self::from_lookup(|key| {
            std::env::var(key)
                .ok()
                .or_else(|| bundled.get(key).cloned())
        })
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let provider = match get("CHAT_PROVIDER")
            .unwrap_or_else(|| "bedrock".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "bedrock" => ProviderSettings::Bedrock(BedrockSettings {
                region: get("BEDROCK_REGION").unwrap_or_else(|| DEFAULT_REGION.to_string()),
                model_id: get("BEDROCK_MODEL_ID")
                    .unwrap_or_else(|| DEFAULT_BEDROCK_MODEL.to_string()),
                profile: get("AWS_PROFILE"),
                credentials: match (get("AWS_ACCESS_KEY_ID"), get("AWS_SECRET_ACCESS_KEY")) {
                    (Some(access_key_id), Some(secret_access_key)) => Some(StaticCredentials {
                        access_key_id,
                        secret_access_key,
                        session_token: get("AWS_SESSION_TOKEN"),
                    }),
                    _ => None,
                },
            }),
            "anthropic" => ProviderSettings::Anthropic(AnthropicSettings {
                endpoint: get("ANTHROPIC_ENDPOINT")
                    .unwrap_or_else(|| DEFAULT_ANTHROPIC_ENDPOINT.to_string()),
                model: get("ANTHROPIC_MODEL")
                    .unwrap_or_else(|| DEFAULT_ANTHROPIC_MODEL.to_string()),
                api_key: get("ANTHROPIC_API_KEY").ok_or_else(|| {
                    anyhow::anyhow!("CHAT_PROVIDER=anthropic requires ANTHROPIC_API_KEY")
                })?,
            }),
            other => anyhow::bail!("unknown CHAT_PROVIDER `{other}`, expected bedrock or anthropic"),
        };

        let locale = get("CHAT_LOCALE")
            .map(|tag| Locale::from_tag(&tag))
            .unwrap_or_default();

        let persona = match get("CHAT_PERSONA_FILE") {
            Some(path) => load_persona(Path::new(&path))?,
            None => DEFAULT_PERSONA.trim().to_string(),
        };

        Ok(Self {
            provider,
            locale,
            persona,
        })
    }
}

fn load_persona(path: &Path) -> Result<String> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read persona file {}", path.display()))?;
    Ok(text.trim().to_string())
}
