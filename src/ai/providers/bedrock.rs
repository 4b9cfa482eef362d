use super::LLMBackend;
use crate::ai::payload::InvokeRequest;
use crate::ai::stream::{Frame, FrameSource};
use crate::ai::{ChatError, ChatResult};
use crate::config::BedrockSettings;
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_bedrockruntime::Client;
use aws_sdk_bedrockruntime::config::{Credentials, Region};
use aws_sdk_bedrockruntime::error::DisplayErrorContext;
use aws_sdk_bedrockruntime::operation::invoke_model_with_response_stream::InvokeModelWithResponseStreamOutput;
use aws_sdk_bedrockruntime::primitives::Blob;
use aws_sdk_bedrockruntime::types::ResponseStream;

const JSON: &str = "application/json";

/// Claude on AWS Bedrock via `InvokeModelWithResponseStream`.
pub struct BedrockBackend {
    client: Client,
    model_id: String,
}

impl BedrockBackend {
    /// Resolve credentials and region, then build the runtime client.
    ///
    /// An explicit key pair wins over the default provider chain.
    pub async fn connect(settings: &BedrockSettings) -> Self {
        let mut loader =
            aws_config::defaults(BehaviorVersion::latest()).region(Region::new(settings.region.clone()));
        if let Some(profile) = &settings.profile {
            loader = loader.profile_name(profile);
        }
        if let Some(creds) = &settings.credentials {
            loader = loader.credentials_provider(Credentials::new(
                creds.access_key_id.clone(),
                creds.secret_access_key.clone(),
                creds.session_token.clone(),
                None,
                "nuvem-chat",
            ));
        }
        let sdk_config = loader.load().await;
        tracing::info!(
            region = %settings.region,
            model = %settings.model_id,
            "bedrock client ready"
        );

        Self::from_client(Client::new(&sdk_config), settings.model_id.clone())
    }

    pub fn from_client(client: Client, model_id: impl Into<String>) -> Self {
        Self {
            client,
            model_id: model_id.into(),
        }
    }
}

fn sdk_error(err: impl std::error::Error) -> ChatError {
    ChatError::Provider(DisplayErrorContext(err).to_string())
}

#[async_trait]
impl LLMBackend for BedrockBackend {
    fn name(&self) -> &'static str {
        "bedrock"
    }

    async fn open_stream(&self, request: &InvokeRequest<'_>) -> ChatResult<Box<dyn FrameSource>> {
        let body = request.to_json_bytes().map_err(ChatError::Encode)?;
        let output = self
            .client
            .invoke_model_with_response_stream()
            .model_id(&self.model_id)
            .body(Blob::new(body))
            .content_type(JSON)
            .accept(JSON)
            .send()
            .await
            .map_err(sdk_error)?;

        Ok(Box::new(BedrockFrames { output }))
    }
}

/// Maps Bedrock event-stream messages onto frames. Only `chunk` events carry
/// a payload.
struct BedrockFrames {
    output: InvokeModelWithResponseStreamOutput,
}

#[async_trait]
impl FrameSource for BedrockFrames {
    async fn next_frame(&mut self) -> ChatResult<Option<Frame>> {
        match self.output.body.recv().await {
            Ok(Some(ResponseStream::Chunk(part))) => Ok(Some(Frame {
                chunk: part.bytes().map(|blob| blob.as_ref().to_vec()),
            })),
            Ok(Some(other)) => {
                tracing::debug!(?other, "ignoring unrecognized bedrock event");
                Ok(Some(Frame::empty()))
            }
            Ok(None) => Ok(None),
            Err(err) => Err(sdk_error(err)),
        }
    }
}
