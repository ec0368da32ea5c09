//! Data models and structures
//!
//! Defines the model allow-list, the gateway request/response envelopes and
//! configuration for both the gateway and the frontend client.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

/// Short model keys accepted by `/generate-image`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ModelName {
    Sdxl1,
    Sdxll,
}

impl ModelName {
    pub const ALL: [ModelName; 2] = [ModelName::Sdxl1, ModelName::Sdxll];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelName::Sdxl1 => "sdxl1",
            ModelName::Sdxll => "sdxll",
        }
    }

    /// Provider model identifier this key maps to.
    pub fn provider_id(&self) -> &'static str {
        match self {
            ModelName::Sdxl1 => "@cf/stabilityai/stable-diffusion-xl-base-1.0",
            ModelName::Sdxll => "@cf/bytedance/stable-diffusion-xl-lightning",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ModelName::Sdxl1 => "stable-diffusion-xl-base-1.0",
            ModelName::Sdxll => "stable-diffusion-xl-lightning",
        }
    }

    /// Comma separated list of every accepted key, for error messages.
    pub fn supported() -> String {
        Self::ALL
            .iter()
            .map(|m| m.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for ModelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| Error::UnsupportedModel {
                name: s.to_string(),
                supported: Self::supported(),
            })
    }
}

// Gateway request bodies. Fields are optional so that missing values reach
// validation instead of failing deserialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AskRequest {
    pub prompt: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerateImageRequest {
    pub prompt: Option<String>,
    #[serde(rename = "modelName")]
    pub model_name: Option<String>,
}

/// Success envelope: `{ "detail": ... }`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Detail<T> {
    pub detail: T,
}

impl<T> Detail<T> {
    pub fn new(detail: T) -> Self {
        Self { detail }
    }
}

/// Failure envelope: `{ "error": "..." }`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorEnvelope {
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelInfo {
    pub name: ModelName,
    pub label: String,
    pub id: String,
}

impl From<ModelName> for ModelInfo {
    fn from(model: ModelName) -> Self {
        Self {
            name: model,
            label: model.label().to_string(),
            id: model.provider_id().to_string(),
        }
    }
}

pub const DEFAULT_CHAT_MODEL: &str = "@cf/meta/llama-3.1-8b-instruct";
pub const DEFAULT_PROVIDER_BASE_URL: &str = "https://api.cloudflare.com";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8787";
pub const DEFAULT_GATEWAY_URL: &str = "http://localhost:8787";
const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 60;

// Gateway configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub account_id: String,
    pub api_token: String,
    pub provider_base_url: String,
    pub chat_model: String,
    pub bind_addr: SocketAddr,
    pub provider_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source; `from_env` passes the process
    /// environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| Error::Config(format!("{} not set", key)))
        };

        let bind_addr = lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_addr
            .parse()
            .map_err(|e| Error::Config(format!("Invalid BIND_ADDR '{}': {}", bind_addr, e)))?;

        let provider_timeout = match lookup("PROVIDER_TIMEOUT_SECS") {
            Some(raw) => raw.parse::<u64>().map_err(|e| {
                Error::Config(format!("Invalid PROVIDER_TIMEOUT_SECS '{}': {}", raw, e))
            })?,
            None => DEFAULT_PROVIDER_TIMEOUT_SECS,
        };

        Ok(Self {
            account_id: required("CLOUDFLARE_ACCOUNT_ID")?,
            api_token: required("CLOUDFLARE_API_TOKEN")?,
            provider_base_url: lookup("WORKERS_AI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_PROVIDER_BASE_URL.to_string()),
            chat_model: lookup("CHAT_MODEL").unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string()),
            bind_addr,
            provider_timeout: Duration::from_secs(provider_timeout),
        })
    }
}

// Frontend configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub gateway_url: String,
}

impl ClientConfig {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            gateway_url: std::env::var("PICTURE_AI_GATEWAY_URL")
                .unwrap_or_else(|_| DEFAULT_GATEWAY_URL.to_string()),
        }
    }
}
