//! Picture AI - a thin gateway in front of a hosted inference provider
//!
//! The gateway validates prompts, maps short model keys to provider model
//! identifiers and relays text answers or generated images. The client module
//! is the matching frontend used by the `picture-ai` binary.

pub mod ai;
pub mod app;
pub mod client;
pub mod error;
pub mod gateway;
pub mod models;
pub mod prompts;

pub use error::{Error, Result};
