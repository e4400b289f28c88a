//! vecsearch embedding provider
//!
//! Provider trait and HTTP client for the text embedding API

mod client;
mod provider;
mod types;

pub use client::HttpEmbeddingClient;
pub use provider::EmbeddingProvider;
pub use types::{EmbedRequest, EmbedResponse};
