use super::client::WorkersAiHttpClient;
use super::types::{ChatMessage, ChatRequest};
use crate::ai::ChatService;
use crate::{prompts, Error, Result};
use async_trait::async_trait;
use serde_json::Value;

pub struct WorkersAiChatClient {
    http: WorkersAiHttpClient,
    model: String,
}

impl WorkersAiChatClient {
    pub fn new(http: WorkersAiHttpClient, model: String) -> Self {
        Self { http, model }
    }
}

fn is_empty_result(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Object(map) => {
            map.is_empty()
                || map
                    .get("response")
                    .is_some_and(|r| r.is_null() || r.as_str().is_some_and(|s| s.trim().is_empty()))
        }
        _ => false,
    }
}

#[async_trait]
impl ChatService for WorkersAiChatClient {
    async fn ask(&self, prompt: &str) -> Result<Value> {
        let request = ChatRequest {
            messages: vec![ChatMessage::system(prompts::ASK_SYSTEM), ChatMessage::user(prompt)],
        };

        let result: Option<Value> = self.http.run_json(&self.model, &request).await?;

        match result {
            Some(value) if !is_empty_result(&value) => Ok(value),
            _ => Err(Error::EmptyResponse(
                "Error getting a valid response.".to_string(),
            )),
        }
    }
}
