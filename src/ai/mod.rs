//! AI provider integration for question answering and image generation
//!
//! The gateway only talks to these traits. `workers` holds the Workers AI REST
//! implementation and `mock` the in-memory doubles used by tests.

pub mod mime;
pub mod mock;
pub mod workers;

pub use mock::{MockChatClient, MockImageGenerationClient};
pub use workers::{WorkersAiChatClient, WorkersAiHttpClient, WorkersAiImageClient};

use crate::models::ModelName;
use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait ChatService: Send + Sync {
    /// Answer a single user prompt. Returns the provider result object
    /// unchanged, e.g. `{ "response": "..." }`.
    async fn ask(&self, prompt: &str) -> Result<serde_json::Value>;
}

#[async_trait]
pub trait ImageGenerationService: Send + Sync {
    async fn generate_image(&self, model: ModelName, prompt: &str) -> Result<Vec<u8>>;
}
