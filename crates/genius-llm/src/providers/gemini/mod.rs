//! Google Gemini streaming client.

mod stream;

pub use stream::parse_gemini_sse_event;

use async_trait::async_trait;
use genius_core::{Attachment, Message};
use reqwest::Client;

use crate::protocol::gemini::{compose_request, ModelVariant};
use crate::provider::{GenerationProvider, LlmError, LlmStream, Result};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Environment variable holding the upstream credential.
pub const API_KEY_ENV: &str = "GOOGLE_API_KEY";

/// Gemini REST API client: one `streamGenerateContent` call per submission.
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    text_model: String,
    vision_model: String,
}

impl GeminiClient {
    /// Create a new client with an API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            text_model: ModelVariant::Text.default_model().to_string(),
            vision_model: ModelVariant::Multimodal.default_model().to_string(),
        }
    }

    /// Read the credential from `GOOGLE_API_KEY`.
    ///
    /// A missing key is fatal before any request is made.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var(API_KEY_ENV)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| LlmError::Config(format!("{API_KEY_ENV} is not set")))?;
        Ok(Self::new(api_key))
    }

    /// Set a custom base URL (e.g., for proxies or test servers).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Override the text-only model.
    pub fn with_text_model(mut self, model: impl Into<String>) -> Self {
        self.text_model = model.into();
        self
    }

    /// Override the multimodal model.
    pub fn with_vision_model(mut self, model: impl Into<String>) -> Self {
        self.vision_model = model.into();
        self
    }

    fn model_for(&self, variant: ModelVariant) -> &str {
        match variant {
            ModelVariant::Text => &self.text_model,
            ModelVariant::Multimodal => &self.vision_model,
        }
    }

    fn stream_url(&self, model: &str) -> String {
        format!(
            "{}/models/{}:streamGenerateContent?alt=sse&key={}",
            self.base_url, model, self.api_key
        )
    }
}

#[async_trait]
impl GenerationProvider for GeminiClient {
    async fn stream_generate(
        &self,
        transcript: &[Message],
        attachments: &[Attachment],
    ) -> Result<LlmStream> {
        let (variant, request) = compose_request(transcript, attachments)?;
        let model = self.model_for(variant);

        log::debug!(
            "Gemini request: model={}, contents={}",
            model,
            request.contents.len()
        );

        let response = self
            .client
            .post(self.stream_url(model))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(LlmError::Http)?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.map_err(LlmError::Http)?;

            if status == 401 || status == 403 {
                return Err(LlmError::Auth(format!(
                    "Gemini authentication failed: {}. Please check your API key.",
                    text
                )));
            }

            return Err(LlmError::Api(format!(
                "Gemini API error: HTTP {}: {}",
                status, text
            )));
        }

        log::debug!("Gemini stream started");

        let stream = crate::providers::common::sse::llm_stream_from_sse(response, |event, data| {
            parse_gemini_sse_event(event, data)
        });

        Ok(stream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::LlmChunk;
    use futures_util::StreamExt;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn new_client_uses_defaults() {
        let client = GeminiClient::new("test_key");
        assert_eq!(client.api_key, "test_key");
        assert_eq!(client.base_url, DEFAULT_BASE_URL);
        assert_eq!(client.text_model, "gemini-1.5-pro-latest");
        assert_eq!(client.vision_model, "gemini-1.5-flash");
    }

    #[test]
    fn chained_builders() {
        let client = GeminiClient::new("test_key")
            .with_base_url("https://custom.api.com/v1beta")
            .with_text_model("gemini-text")
            .with_vision_model("gemini-vision");

        assert_eq!(client.base_url, "https://custom.api.com/v1beta");
        assert_eq!(client.text_model, "gemini-text");
        assert_eq!(client.vision_model, "gemini-vision");
    }

    #[test]
    fn stream_url_carries_sse_framing_and_key() {
        let client = GeminiClient::new("my_api_key_123")
            .with_base_url("https://test.api.com/v1beta");

        assert_eq!(
            client.stream_url("gemini-1.5-pro-latest"),
            "https://test.api.com/v1beta/models/gemini-1.5-pro-latest:streamGenerateContent?alt=sse&key=my_api_key_123"
        );
    }

    #[tokio::test]
    async fn streams_tokens_from_sse_response() {
        let mock_server = MockServer::start().await;

        let sse_body = concat!(
            "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"Hi\"}],\"role\":\"model\"}}]}\n",
            "\n",
            "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\" there\"}],\"role\":\"model\"},\"finishReason\":\"STOP\"}]}\n",
            "\n",
        );

        Mock::given(method("POST"))
            .and(path("/models/gemini-1.5-pro-latest:streamGenerateContent"))
            .and(query_param("alt", "sse"))
            .and(query_param("key", "test_key"))
            .and(body_partial_json(serde_json::json!({
                "contents": [{"role": "user", "parts": [{"text": "Hello"}]}]
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(sse_body),
            )
            .mount(&mock_server)
            .await;

        let client = GeminiClient::new("test_key").with_base_url(mock_server.uri());
        let mut stream = client
            .stream_generate(&[Message::user("Hello")], &[])
            .await
            .expect("stream");

        let mut tokens = Vec::new();
        while let Some(item) = stream.next().await {
            match item.expect("chunk") {
                LlmChunk::Token(token) => tokens.push(token),
                LlmChunk::Done => break,
            }
        }

        assert_eq!(tokens, vec!["Hi".to_string(), " there".to_string()]);
    }

    #[tokio::test]
    async fn non_success_status_is_an_api_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
            .mount(&mock_server)
            .await;

        let client = GeminiClient::new("test_key").with_base_url(mock_server.uri());
        let err = match client.stream_generate(&[Message::user("Hello")], &[]).await {
            Ok(_) => panic!("expected an error, got a stream"),
            Err(err) => err,
        };

        match err {
            LlmError::Api(message) => assert!(message.contains("500")),
            other => panic!("expected LlmError::Api, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn forbidden_status_is_an_auth_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_string("bad key"))
            .mount(&mock_server)
            .await;

        let client = GeminiClient::new("bad_key").with_base_url(mock_server.uri());
        let err = match client.stream_generate(&[Message::user("Hello")], &[]).await {
            Ok(_) => panic!("expected an error, got a stream"),
            Err(err) => err,
        };

        assert!(matches!(err, LlmError::Auth(_)));
    }

    #[tokio::test]
    async fn vision_model_is_used_for_attachments() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/models/gemini-1.5-flash:streamGenerateContent"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(""),
            )
            .mount(&mock_server)
            .await;

        let client = GeminiClient::new("test_key").with_base_url(mock_server.uri());
        let attachments = vec![genius_core::Attachment::from_bytes("image/png", b"img")];
        let result = client
            .stream_generate(&[Message::user("what is this")], &attachments)
            .await;

        // Hitting the flash-model path proves variant selection; an empty
        // body is a valid, immediately-finished stream.
        assert!(result.is_ok());
    }
}
