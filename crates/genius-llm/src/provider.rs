use async_trait::async_trait;
use futures::Stream;
use genius_core::{Attachment, Message};
use std::pin::Pin;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Malformed attachment: {0}")]
    MalformedAttachment(String),
}

pub type Result<T> = std::result::Result<T, LlmError>;

/// One incremental unit of assistant output.
#[derive(Debug, Clone, PartialEq)]
pub enum LlmChunk {
    Token(String),
    Done,
}

pub type LlmStream = Pin<Box<dyn Stream<Item = Result<LlmChunk>> + Send>>;

/// The upstream generation call: one request per submission, a lazy finite
/// chunk stream back, no retries. Chunks arrive in provider order.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    async fn stream_generate(
        &self,
        transcript: &[Message],
        attachments: &[Attachment],
    ) -> Result<LlmStream>;
}
