//! Request validation and forwarding
//!
//! Everything the HTTP layer does besides routing lives here: prompt checks,
//! the model allow-list lookup and the calls into the provider services.

use crate::ai::{mime, ChatService, ImageGenerationService};
use crate::models::{AskRequest, Detail, GenerateImageRequest, ModelName};
use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

pub const INVALID_PROMPT_MESSAGE: &str = "Please enter a valid prompt.";

/// A generated image ready to be sent back unwrapped.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedImage {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
}

/// Reject a missing or empty prompt. Whitespace is forwarded as-is.
pub fn validate_prompt(prompt: Option<&str>) -> Result<&str> {
    match prompt {
        Some(p) if !p.is_empty() => Ok(p),
        _ => Err(Error::InvalidPrompt(INVALID_PROMPT_MESSAGE.to_string())),
    }
}

/// Look the requested key up in the allow-list. A missing key is reported
/// like an unknown one.
pub fn resolve_model(model_name: Option<&str>) -> Result<ModelName> {
    match model_name {
        Some(name) => name.parse(),
        None => Err(Error::UnsupportedModel {
            name: "(none)".to_string(),
            supported: ModelName::supported(),
        }),
    }
}

/// Decode a JSON request body. Any body that is not the expected JSON shape
/// becomes an [`Error::InvalidBody`].
pub fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    serde_json::from_slice(body).map_err(|e| Error::InvalidBody(e.to_string()))
}

pub struct Gateway {
    chat: Arc<dyn ChatService>,
    image_gen: Arc<dyn ImageGenerationService>,
}

impl Gateway {
    pub fn new(chat: Arc<dyn ChatService>, image_gen: Arc<dyn ImageGenerationService>) -> Self {
        Self { chat, image_gen }
    }

    pub async fn ask(&self, request: AskRequest) -> Result<Detail<Value>> {
        let prompt = validate_prompt(request.prompt.as_deref())?;

        tracing::info!("Forwarding question ({} chars)", prompt.chars().count());
        let response = self.chat.ask(prompt).await?;

        Ok(Detail::new(response))
    }

    pub async fn generate_image(&self, request: GenerateImageRequest) -> Result<GeneratedImage> {
        let prompt = validate_prompt(request.prompt.as_deref())?;
        let model = resolve_model(request.model_name.as_deref())?;

        tracing::info!(
            "Forwarding image prompt ({} chars) to {}",
            prompt.chars().count(),
            model.provider_id()
        );
        let bytes = self.image_gen.generate_image(model, prompt).await?;

        if bytes.is_empty() {
            return Err(Error::EmptyResponse(
                "Error getting a valid response.".to_string(),
            ));
        }

        Ok(GeneratedImage {
            content_type: mime::detect_image_mime(&bytes),
            bytes,
        })
    }
}
