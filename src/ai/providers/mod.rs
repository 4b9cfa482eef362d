pub mod anthropic;
pub mod bedrock;

use super::ChatResult;
use super::payload::InvokeRequest;
use super::stream::FrameSource;
use crate::config::{ProviderSettings, Settings};
use async_trait::async_trait;

pub use anthropic::AnthropicBackend;
pub use bedrock::BedrockBackend;

/// A hosted model that answers with a stream of frames.
#[async_trait]
pub trait LLMBackend: Send + Sync {
    fn name(&self) -> &'static str;

    async fn open_stream(&self, request: &InvokeRequest<'_>) -> ChatResult<Box<dyn FrameSource>>;
}

/// Build the backend selected by `settings`.
pub async fn backend_from_settings(settings: &Settings) -> Box<dyn LLMBackend> {
    match &settings.provider {
        ProviderSettings::Bedrock(bedrock) => Box::new(BedrockBackend::connect(bedrock).await),
        ProviderSettings::Anthropic(anthropic) => Box::new(AnthropicBackend::new(anthropic.clone())),
    }
}
