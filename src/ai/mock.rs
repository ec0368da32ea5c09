use super::{ChatService, ImageGenerationService};
use crate::models::ModelName;
use crate::{Error, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

/// Tiny valid PNG returned when no image response is configured.
pub const DEFAULT_MOCK_PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, // PNG signature
    0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52, // IHDR chunk
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, // 1x1 pixel
    0x08, 0x02, 0x00, 0x00, 0x00, 0x90, 0x77, 0x53, 0xDE, 0x00, 0x00, 0x00, 0x0C, 0x49, 0x44,
    0x41, // IDAT chunk
    0x54, 0x08, 0x99, 0x63, 0xF8, 0xCF, 0xC0, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01, 0xE2, 0x25,
    0x00, 0xBC, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, // IEND chunk
    0x44, 0xAE, 0x42, 0x60, 0x82,
];

pub struct MockChatClient {
    responses: Arc<Mutex<Vec<Value>>>,
    error: Option<String>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl MockChatClient {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            error: None,
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queue a text answer, wrapped the way the provider wraps it.
    pub fn with_response(self, response: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push(json!({ "response": response }));
        self
    }

    /// Make every call fail with a provider error.
    pub fn with_error(mut self, message: &str) -> Self {
        self.error = Some(message.to_string());
        self
    }

    pub fn get_call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn received_prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

impl Default for MockChatClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatService for MockChatClient {
    async fn ask(&self, prompt: &str) -> Result<Value> {
        let count = {
            let mut prompts = self.prompts.lock().unwrap();
            prompts.push(prompt.to_string());
            prompts.len()
        };

        if let Some(message) = &self.error {
            return Err(Error::AiProvider(message.clone()));
        }

        let responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok(json!({ "response": format!("Mock answer to: {}", prompt) }))
        } else {
            let index = (count - 1) % responses.len();
            Ok(responses[index].clone())
        }
    }
}

pub struct MockImageGenerationClient {
    image_responses: Arc<Mutex<Vec<Vec<u8>>>>,
    error: Option<String>,
    calls: Arc<Mutex<Vec<(ModelName, String)>>>,
}

impl MockImageGenerationClient {
    pub fn new() -> Self {
        Self {
            image_responses: Arc::new(Mutex::new(Vec::new())),
            error: None,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_image_response(self, response: Vec<u8>) -> Self {
        self.image_responses.lock().unwrap().push(response);
        self
    }

    pub fn with_error(mut self, message: &str) -> Self {
        self.error = Some(message.to_string());
        self
    }

    pub fn get_call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Models and prompts received, in call order.
    pub fn received_calls(&self) -> Vec<(ModelName, String)> {
        self.calls.lock().unwrap().clone()
    }
}

impl Default for MockImageGenerationClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageGenerationService for MockImageGenerationClient {
    async fn generate_image(&self, model: ModelName, prompt: &str) -> Result<Vec<u8>> {
        let count = {
            let mut calls = self.calls.lock().unwrap();
            calls.push((model, prompt.to_string()));
            calls.len()
        };

        if let Some(message) = &self.error {
            return Err(Error::AiProvider(message.clone()));
        }

        let responses = self.image_responses.lock().unwrap();
        if responses.is_empty() {
            Ok(DEFAULT_MOCK_PNG.to_vec())
        } else {
            let index = (count - 1) % responses.len();
            Ok(responses[index].clone())
        }
    }
}
