pub mod chat;
pub mod client;
pub mod image;
pub mod types;

pub use chat::WorkersAiChatClient;
pub use client::WorkersAiHttpClient;
pub use image::WorkersAiImageClient;
