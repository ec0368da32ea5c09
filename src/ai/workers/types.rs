//! Workers AI request/response payloads used by provider modules.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Request body for text generation models.
#[derive(Debug, Serialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: &str) -> Self {
        Self {
            role: "system".to_string(),
            content: content.to_string(),
        }
    }

    pub fn user(content: &str) -> Self {
        Self {
            role: "user".to_string(),
            content: content.to_string(),
        }
    }
}

/// Request body for text-to-image models.
#[derive(Debug, Serialize)]
pub struct TextToImageRequest {
    pub prompt: String,
}

/// Result payload of image models that answer with JSON instead of bytes.
#[derive(Debug, Deserialize)]
pub struct ImageResult {
    pub image: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApiMessage {
    #[serde(default)]
    pub code: Option<i64>,
    pub message: String,
}

/// JSON envelope wrapped around every non-binary Workers AI response.
#[derive(Debug, Deserialize)]
pub struct RunEnvelope<T> {
    pub result: Option<T>,
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default)]
    pub errors: Vec<ApiMessage>,
}

fn default_success() -> bool {
    true
}

impl<T> RunEnvelope<T> {
    /// Unwrap the result, turning `success: false` into a provider error.
    pub fn into_result(self) -> Result<Option<T>> {
        if !self.success {
            let messages: Vec<String> = self
                .errors
                .iter()
                .map(|e| match e.code {
                    Some(code) => format!("{} (code {})", e.message, code),
                    None => e.message.clone(),
                })
                .collect();
            return Err(Error::AiProvider(if messages.is_empty() {
                "Request was not successful".to_string()
            } else {
                messages.join("; ")
            }));
        }
        Ok(self.result)
    }
}
