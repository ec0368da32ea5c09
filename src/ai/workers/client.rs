use super::types::RunEnvelope;
use crate::models::DEFAULT_PROVIDER_BASE_URL;
use crate::{Error, Result};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

/// Raw provider answer: declared content type plus body.
#[derive(Debug)]
pub struct RawResponse {
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn is_json(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.starts_with("application/json"))
    }
}

/// Lightweight Workers AI REST client shared by the chat and image modules.
pub struct WorkersAiHttpClient {
    client: Client,
    account_id: String,
    api_token: String,
    base_url: String,
    timeout: Duration,
}

impl WorkersAiHttpClient {
    pub fn new(account_id: String, api_token: String, timeout: Duration) -> Self {
        Self::new_with_client(account_id, api_token, timeout, Client::new())
    }

    pub fn new_with_client(
        account_id: String,
        api_token: String,
        timeout: Duration,
        client: Client,
    ) -> Self {
        Self {
            client,
            account_id,
            api_token,
            base_url: DEFAULT_PROVIDER_BASE_URL.to_string(),
            timeout,
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn run_url(&self, model_id: &str) -> String {
        format!(
            "{}/client/v4/accounts/{}/ai/run/{}",
            self.base_url, self.account_id, model_id
        )
    }

    async fn send<Req: Serialize>(&self, model_id: &str, request: &Req) -> Result<reqwest::Response> {
        let response = self
            .client
            .post(self.run_url(model_id))
            .timeout(self.timeout)
            .bearer_auth(&self.api_token)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to send request to Workers AI ({}): {}", model_id, e);
                e
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            tracing::error!(
                "Workers AI error for {} (status {}): {}",
                model_id,
                status,
                error_text
            );
            return Err(Error::AiProvider(format!(
                "Workers AI error (status {}): {}",
                status, error_text
            )));
        }

        Ok(response)
    }

    /// Run a model that answers with a JSON envelope and return its `result`.
    pub async fn run_json<Req: Serialize, Resp: DeserializeOwned>(
        &self,
        model_id: &str,
        request: &Req,
    ) -> Result<Option<Resp>> {
        tracing::debug!("Running Workers AI model {}", model_id);

        let body = self.send(model_id, request).await?.text().await?;
        let envelope: RunEnvelope<Resp> = serde_json::from_str(&body).map_err(|e| {
            tracing::error!("Failed to parse Workers AI response: {}\nBody: {}", e, body);
            Error::AiProvider(format!("Failed to parse Workers AI response: {}", e))
        })?;

        envelope.into_result()
    }

    /// Run a model whose answer may be binary (image models).
    pub async fn run_raw<Req: Serialize>(&self, model_id: &str, request: &Req) -> Result<RawResponse> {
        tracing::debug!("Running Workers AI model {} (raw)", model_id);

        let response = self.send(model_id, request).await?;
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await?.to_vec();

        Ok(RawResponse { content_type, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn make_client(server: &MockServer) -> WorkersAiHttpClient {
        WorkersAiHttpClient::new("acct".to_string(), "token".to_string(), Duration::from_secs(5))
            .with_base_url(format!("{}/", server.uri()))
    }

    #[test]
    fn test_default_base_url_matches_config_default() {
        let client =
            WorkersAiHttpClient::new("acct".to_string(), "token".to_string(), Duration::from_secs(5));

        assert_eq!(
            client.run_url("@cf/meta/llama-3.1-8b-instruct"),
            format!(
                "{}/client/v4/accounts/acct/ai/run/@cf/meta/llama-3.1-8b-instruct",
                DEFAULT_PROVIDER_BASE_URL
            )
        );
    }

    #[tokio::test]
    async fn test_run_json_sends_bearer_token_to_account_path() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/client/v4/accounts/acct/ai/run/test-model"))
            .and(header("Authorization", "Bearer token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": {"response": "ok"},
                "success": true,
                "errors": []
            })))
            .expect(1)
            .mount(&server)
            .await;

        let result: Option<serde_json::Value> = make_client(&server)
            .run_json("test-model", &json!({"prompt": "hi"}))
            .await
            .unwrap();
        assert_eq!(result.unwrap()["response"], "ok");
    }

    #[tokio::test]
    async fn test_non_success_status_is_provider_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad token"))
            .mount(&server)
            .await;

        let err = make_client(&server)
            .run_json::<_, serde_json::Value>("test-model", &json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::AiProvider(ref msg) if msg.contains("401")));
    }

    #[tokio::test]
    async fn test_malformed_json_is_provider_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\"result\":"))
            .mount(&server)
            .await;

        let err = make_client(&server)
            .run_json::<_, serde_json::Value>("test-model", &json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::AiProvider(_)));
    }

    #[tokio::test]
    async fn test_run_raw_keeps_content_type() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(vec![0x89, 0x50, 0x4E, 0x47], "image/png"),
            )
            .mount(&server)
            .await;

        let raw = make_client(&server)
            .run_raw("test-model", &json!({"prompt": "a cat"}))
            .await
            .unwrap();
        assert_eq!(raw.content_type.as_deref(), Some("image/png"));
        assert!(!raw.is_json());
        assert_eq!(raw.body, vec![0x89, 0x50, 0x4E, 0x47]);
    }
}
