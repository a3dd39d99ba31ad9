//! Google Gemini request format and prompt composition.
//!
//! Gemini's shape differs from the internal transcript:
//! - Messages are called "contents"
//! - Role is "user" or "model" (not "assistant")
//! - Content is an array of "parts"; images ride along as `inlineData`
//!
//! # Example request
//! ```json
//! {
//!   "contents": [
//!     {
//!       "role": "user",
//!       "parts": [{"text": "Hello"}, {"inlineData": {"mimeType": "image/png", "data": "..."}}]
//!     }
//!   ]
//! }
//! ```

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use genius_core::{Attachment, Message, Role};
use serde::{Deserialize, Serialize};

use crate::provider::{LlmError, Result};

/// Which upstream model a composed request targets.
///
/// Image-bearing submissions go to the flash model; text-only conversations
/// go to the larger text model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelVariant {
    Text,
    Multimodal,
}

impl ModelVariant {
    pub fn default_model(self) -> &'static str {
        match self {
            ModelVariant::Text => "gemini-1.5-pro-latest",
            ModelVariant::Multimodal => "gemini-1.5-flash",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Content {
    /// "user" or "model"
    pub role: String,
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

fn attachment_to_part(attachment: &Attachment) -> Result<Part> {
    if !attachment.mime_type.starts_with("image/") {
        return Err(LlmError::MalformedAttachment(format!(
            "unsupported mime type {}",
            attachment.mime_type
        )));
    }
    if BASE64_STANDARD.decode(&attachment.data).is_err() {
        return Err(LlmError::MalformedAttachment(format!(
            "payload of {} attachment is not valid base64",
            attachment.mime_type
        )));
    }
    Ok(Part::InlineData {
        inline_data: InlineData {
            mime_type: attachment.mime_type.clone(),
            data: attachment.data.clone(),
        },
    })
}

/// Build the provider-facing request for the current submission.
///
/// With attachments, only the most recent user turn is sent: its text (or
/// an empty string) followed by the images in submission order. Without
/// attachments, the whole transcript is replayed with the assistant role
/// mapped to "model". Pure: identical input always composes an identical
/// request.
pub fn compose_request(
    transcript: &[Message],
    attachments: &[Attachment],
) -> Result<(ModelVariant, GenerateContentRequest)> {
    if attachments.is_empty() {
        let contents = transcript
            .iter()
            .map(|message| Content {
                role: match message.role {
                    Role::User => "user".to_string(),
                    Role::Assistant => "model".to_string(),
                },
                parts: vec![Part::Text {
                    text: message.content.clone(),
                }],
            })
            .collect();

        return Ok((ModelVariant::Text, GenerateContentRequest { contents }));
    }

    let prompt = transcript
        .iter()
        .rev()
        .find(|message| message.role == Role::User)
        .map(|message| message.content.clone())
        .unwrap_or_default();

    let mut parts = vec![Part::Text { text: prompt }];
    for attachment in attachments {
        parts.push(attachment_to_part(attachment)?);
    }

    let contents = vec![Content {
        role: "user".to_string(),
        parts,
    }];

    Ok((ModelVariant::Multimodal, GenerateContentRequest { contents }))
}
