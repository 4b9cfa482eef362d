//! Model invocation for the chatbot
//!
//! Serializes the session history into a provider request, opens a streaming
//! call and folds the returned frames back into one answer.
//!
//! # Architecture
//!
//! - `client` - `ModelAdapter` and the shared error type
//! - `payload` - request body and fixed generation parameters
//! - `stream` - frame decoding and response reassembly
//! - `providers` - Bedrock and Anthropic Messages API backends
//!
//! # Usage
//!
//! ```rust,no_run
//! use nuvem_chat::ai::{ModelAdapter, providers};
//! use nuvem_chat::config::Settings;
//! use nuvem_chat::session::Conversation;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let settings = Settings::from_env()?;
//! let adapter = ModelAdapter::new(providers::backend_from_settings(&settings).await, settings.locale);
//! let conversation = Conversation::with_context(settings.persona);
//! let answer = adapter.invoke(conversation.messages()).await;
//! # Ok(())
//! # }
//! ```
mod client;
pub mod payload;
pub mod providers;
pub mod stream;

pub use client::{ChatError, ChatResult, ModelAdapter};
pub use payload::{GenerationParams, InvokeRequest};
pub use providers::LLMBackend;
pub use stream::{Frame, FrameSource, ReplayFrames, StreamAssembler, StreamState, collect_text};
