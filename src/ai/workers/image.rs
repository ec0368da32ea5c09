use super::client::WorkersAiHttpClient;
use super::types::{ImageResult, RunEnvelope, TextToImageRequest};
use crate::ai::ImageGenerationService;
use crate::models::ModelName;
use crate::{Error, Result};
use async_trait::async_trait;

pub struct WorkersAiImageClient {
    http: WorkersAiHttpClient,
}

impl WorkersAiImageClient {
    pub fn new(http: WorkersAiHttpClient) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ImageGenerationService for WorkersAiImageClient {
    async fn generate_image(&self, model: ModelName, prompt: &str) -> Result<Vec<u8>> {
        let request = TextToImageRequest {
            prompt: prompt.to_string(),
        };

        let raw = self.http.run_raw(model.provider_id(), &request).await?;

        // SDXL models stream PNG bytes; some models answer with base64 JSON instead.
        let image_bytes = if raw.is_json() {
            let envelope: RunEnvelope<ImageResult> = serde_json::from_slice(&raw.body)?;
            match envelope.into_result()?.and_then(|r| r.image) {
                Some(b64) => {
                    use base64::Engine as _;
                    base64::engine::general_purpose::STANDARD
                        .decode(b64)
                        .map_err(|e| {
                            Error::AiProvider(format!("Failed to decode base64 image: {}", e))
                        })?
                }
                None => Vec::new(),
            }
        } else {
            raw.body
        };

        if image_bytes.is_empty() {
            return Err(Error::EmptyResponse(format!(
                "No image data returned by {}",
                model.provider_id()
            )));
        }

        tracing::info!(
            "Generated image with {} ({} bytes)",
            model.provider_id(),
            image_bytes.len()
        );

        Ok(image_bytes)
    }
}
