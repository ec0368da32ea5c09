//! Error handling and custom error types
//!
//! Provides unified error handling across the gateway and the frontend client
//! using thiserror.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error("{0}")]
    InvalidPrompt(String),

    #[error("Unsupported model: {name}. Supported models: {supported}")]
    UnsupportedModel { name: String, supported: String },

    #[error("{0}")]
    EmptyResponse(String),

    #[error("AI provider error: {0}")]
    AiProvider(String),

    #[error("Gateway error: {0}")]
    Gateway(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
