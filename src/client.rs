//! Frontend client for the gateway
//!
//! Mirrors the web forms: prompts are checked locally before anything is
//! sent, answers come back as text and images as raw bytes.

use crate::ai::mime;
use crate::models::{ClientConfig, Detail, ModelInfo, ModelName};
use crate::{Error, Result};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

pub const MIN_PROMPT_CHARS: usize = 10;
pub const SHORT_PROMPT_MESSAGE: &str = "Prompt must be at least 10 characters.";
pub const REQUEST_FAILED_MESSAGE: &str = "Failed to get a response from server, please try again.";
pub const EMPTY_ANSWER_MESSAGE: &str = "Empty response, this might be out of my knowledge.";

/// Applies to every call. Image generation can take a while on the heavier
/// model.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Client-side prompt check, applied before any request is made. Length is
/// measured in UTF-16 code units, like the browser form.
pub fn validate_prompt(prompt: &str) -> Result<&str> {
    if prompt.encode_utf16().count() < MIN_PROMPT_CHARS {
        return Err(Error::InvalidPrompt(SHORT_PROMPT_MESSAGE.to_string()));
    }
    Ok(prompt)
}

/// Image bytes as returned by `/generate-image`.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceivedImage {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

impl ReceivedImage {
    pub fn extension(&self) -> &'static str {
        mime::extension_for_mime(&self.content_type)
    }
}

pub struct GatewayClient {
    client: Client,
    base_url: String,
}

impl GatewayClient {
    pub fn new(base_url: String) -> Self {
        Self::new_with_timeout(base_url, REQUEST_TIMEOUT)
    }

    pub fn new_with_timeout(base_url: String, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to build HTTP client");

        Self::new_with_client(base_url, client)
    }

    pub fn new_with_client(base_url: String, client: Client) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.gateway_url.clone())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post(&self, path: &str, body: &Value) -> Result<reqwest::Response> {
        let response = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            tracing::debug!("POST {} returned status {}", path, response.status());
            return Err(Error::Gateway(REQUEST_FAILED_MESSAGE.to_string()));
        }

        Ok(response)
    }

    async fn get_json(&self, path: &str) -> Result<Value> {
        let response = self.client.get(self.url(path)).send().await?;
        if !response.status().is_success() {
            return Err(Error::Gateway(REQUEST_FAILED_MESSAGE.to_string()));
        }
        let body = response.json().await?;
        envelope_error(&body)?;
        Ok(body)
    }

    /// `GET /`: the gateway's liveness message.
    pub async fn health(&self) -> Result<String> {
        let body = self.get_json("/").await?;
        Ok(body["detail"].as_str().unwrap_or_default().to_string())
    }

    /// `GET /models`: the image models the gateway accepts.
    pub async fn models(&self) -> Result<Vec<ModelInfo>> {
        let body = self.get_json("/models").await?;
        let models: Detail<Vec<ModelInfo>> = serde_json::from_value(body)?;
        Ok(models.detail)
    }

    /// `POST /ask`: returns the answer text.
    pub async fn ask(&self, prompt: &str) -> Result<String> {
        let prompt = validate_prompt(prompt)?;

        let body: Value = self
            .post("/ask", &json!({ "prompt": prompt }))
            .await?
            .json()
            .await?;
        envelope_error(&body)?;

        let answer = match body.get("detail").and_then(|d| d.get("response")) {
            Some(Value::String(text)) => text.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };

        if answer.trim().is_empty() {
            return Ok(EMPTY_ANSWER_MESSAGE.to_string());
        }
        Ok(answer)
    }

    /// `POST /generate-image`: returns the image exactly as the gateway sent it.
    pub async fn generate_image(&self, model: ModelName, prompt: &str) -> Result<ReceivedImage> {
        let prompt = validate_prompt(prompt)?;

        let response = self
            .post(
                "/generate-image",
                &json!({ "modelName": model, "prompt": prompt }),
            )
            .await?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();

        // Failures come back as a JSON envelope with status 200.
        if content_type.starts_with("application/json") {
            let body: Value = response.json().await?;
            envelope_error(&body)?;
            return Err(Error::Gateway(REQUEST_FAILED_MESSAGE.to_string()));
        }

        let bytes = response.bytes().await?.to_vec();
        if bytes.is_empty() {
            return Err(Error::Gateway(REQUEST_FAILED_MESSAGE.to_string()));
        }

        Ok(ReceivedImage {
            bytes,
            content_type,
        })
    }
}

fn envelope_error(body: &Value) -> Result<()> {
    match body.get("error") {
        Some(Value::String(message)) => Err(Error::Gateway(message.clone())),
        Some(other) => Err(Error::Gateway(other.to_string())),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn make_client(server: &MockServer) -> GatewayClient {
        GatewayClient::new(server.uri())
    }

    #[test]
    fn test_validate_prompt_counts_characters() {
        assert!(validate_prompt("too short").is_err());
        assert!(validate_prompt("just right").is_ok());
        // Ten characters, more than ten bytes.
        assert!(validate_prompt("éééééééééé").is_ok());
        // Emoji outside the BMP are two UTF-16 units each.
        assert!(validate_prompt("😀😀😀😀😀").is_ok());
        assert!(validate_prompt("😀😀😀😀").is_err());

        let err = validate_prompt("").unwrap_err();
        assert_eq!(err.to_string(), SHORT_PROMPT_MESSAGE);
    }

    #[tokio::test]
    async fn test_short_prompt_is_never_submitted() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = make_client(&server);
        assert!(matches!(
            client.ask("hi").await,
            Err(Error::InvalidPrompt(_))
        ));
        assert!(matches!(
            client.generate_image(ModelName::Sdxl1, "cat").await,
            Err(Error::InvalidPrompt(_))
        ));
    }

    #[tokio::test]
    async fn test_ask_returns_detail_response() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/ask"))
            .and(body_json(json!({"prompt": "What's the capital of India?"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "detail": {"response": "New Delhi"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let answer = make_client(&server)
            .ask("What's the capital of India?")
            .await
            .unwrap();
        assert_eq!(answer, "New Delhi");
    }

    #[tokio::test]
    async fn test_ask_empty_answer_message() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/ask"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "detail": {"response": ""}
            })))
            .mount(&server)
            .await;

        let answer = make_client(&server)
            .ask("What is beyond the universe?")
            .await
            .unwrap();
        assert_eq!(answer, EMPTY_ANSWER_MESSAGE);
    }

    #[tokio::test]
    async fn test_ask_surfaces_error_envelope() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/ask"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "error": "AI provider error: boom"
            })))
            .mount(&server)
            .await;

        let err = make_client(&server)
            .ask("What's the capital of India?")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Gateway error: AI provider error: boom");
    }

    #[tokio::test]
    async fn test_non_ok_status_is_request_failure() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let err = make_client(&server)
            .ask("What's the capital of India?")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Gateway(ref msg) if msg == REQUEST_FAILED_MESSAGE));
    }

    #[tokio::test]
    async fn test_generate_image_returns_bytes() {
        let server = MockServer::start().await;
        let png = vec![0x89, 0x50, 0x4E, 0x47];

        Mock::given(method("POST"))
            .and(path("/generate-image"))
            .and(body_json(json!({"modelName": "sdxll", "prompt": "a fox in the snow"})))
            .respond_with(ResponseTemplate::new(200).set_body_raw(png.clone(), "image/png"))
            .expect(1)
            .mount(&server)
            .await;

        let image = make_client(&server)
            .generate_image(ModelName::Sdxll, "a fox in the snow")
            .await
            .unwrap();
        assert_eq!(image.bytes, png);
        assert_eq!(image.extension(), "png");
    }

    #[tokio::test]
    async fn test_generate_image_json_body_is_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/generate-image"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "error": "Unsupported model: x. Supported models: sdxl1, sdxll"
            })))
            .mount(&server)
            .await;

        let err = make_client(&server)
            .generate_image(ModelName::Sdxl1, "a fox in the snow")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Gateway(ref msg) if msg.starts_with("Unsupported model")));
    }

    #[tokio::test]
    async fn test_models_and_health() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "detail": "Picture AI gateway is up!"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/models"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "detail": [ModelInfo::from(ModelName::Sdxl1)]
            })))
            .mount(&server)
            .await;

        let client = make_client(&server);
        assert_eq!(client.health().await.unwrap(), "Picture AI gateway is up!");
        assert_eq!(
            client.models().await.unwrap(),
            vec![ModelInfo::from(ModelName::Sdxl1)]
        );
    }

    #[tokio::test]
    async fn test_slow_gateway_times_out() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"detail": "Picture AI gateway is up!"}))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/ask"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"detail": {"response": "late"}}))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let client = GatewayClient::new_with_timeout(server.uri(), Duration::from_millis(100));

        let err = client.health().await.unwrap_err();
        assert!(matches!(err, Error::Http(ref e) if e.is_timeout()));

        let err = client.ask("Why is the sky blue?").await.unwrap_err();
        assert!(matches!(err, Error::Http(ref e) if e.is_timeout()));
    }
}
