//! Gemini SSE stream parser.
//!
//! Each event's data payload is one JSON object:
//! ```text
//! data: {"candidates":[{"content":{"parts":[{"text":"Hello"}],"role":"model"}}]}
//!
//! data: {"candidates":[{"content":{"parts":[{"text":"!"}],"role":"model"},"finishReason":"STOP"}]}
//! ```

use serde_json::Value;

use crate::provider::{LlmChunk, LlmError, Result};

/// Parse a single Gemini SSE event into an optional [`LlmChunk`].
///
/// Gemini sends JSON objects as data, not named events; the `event_type`
/// is typically empty for these streams.
///
/// Returns:
/// - `Ok(Some(chunk))` for content-bearing events and end-of-stream markers
/// - `Ok(None)` for non-content events (empty data, metadata-only chunks)
/// - `Err(_)` for malformed JSON, embedded API errors, or blocked prompts
pub fn parse_gemini_sse_event(_event_type: &str, data: &str) -> Result<Option<LlmChunk>> {
    let data = data.trim();

    if data.is_empty() {
        return Ok(None);
    }

    if data == "[DONE]" {
        return Ok(Some(LlmChunk::Done));
    }

    let value: Value = serde_json::from_str(data).map_err(|e| {
        LlmError::Stream(format!("Failed to parse Gemini SSE data: {}: {}", e, data))
    })?;

    if let Some(error) = value.get("error") {
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("Unknown Gemini API error");
        return Err(LlmError::Api(message.to_string()));
    }

    if let Some(reason) = value
        .get("promptFeedback")
        .and_then(|f| f.get("blockReason"))
        .and_then(|r| r.as_str())
    {
        return Err(LlmError::Api(format!("Prompt was blocked: {reason}")));
    }

    // Metadata-only chunks (usage accounting etc.) carry no candidates.
    let candidates = match value.get("candidates").and_then(|c| c.as_array()) {
        Some(c) if !c.is_empty() => c,
        _ => return Ok(None),
    };

    // Gemini returns a single candidate for chat streams.
    let candidate = &candidates[0];

    if let Some(text) = candidate
        .get("content")
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.as_array())
        .and_then(|parts| parts.first())
        .and_then(|part| part.get("text"))
        .and_then(|t| t.as_str())
    {
        if !text.is_empty() {
            return Ok(Some(LlmChunk::Token(text.to_string())));
        }
    }

    if candidate.get("finishReason").and_then(|f| f.as_str()).is_some() {
        return Ok(Some(LlmChunk::Done));
    }

    Ok(None)
}
