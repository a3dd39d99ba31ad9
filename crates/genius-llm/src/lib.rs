//! Gemini-facing half of the generation pipeline: a pure prompt composer
//! over the transcript plus pending attachments, and a streaming client
//! that turns the upstream SSE response into an ordered chunk stream.

pub mod protocol;
pub mod provider;
pub mod providers;

pub use protocol::gemini::{compose_request, GenerateContentRequest, ModelVariant};
pub use provider::{GenerationProvider, LlmChunk, LlmError, LlmStream, Result};
pub use providers::gemini::GeminiClient;
