use std::path::PathBuf;

use genius_llm::{GeminiClient, LlmError};
use genius_state::LocalStorage;

pub const BASE_URL_ENV: &str = "GENIUS_BASE_URL";
pub const TEXT_MODEL_ENV: &str = "GENIUS_TEXT_MODEL";
pub const VISION_MODEL_ENV: &str = "GENIUS_VISION_MODEL";
pub const STORAGE_DIR_ENV: &str = "GENIUS_STORAGE_DIR";

/// Assembly knobs for the pipeline; everything has a sensible default.
#[derive(Debug, Clone, Default)]
pub struct ChatConfig {
    pub base_url: Option<String>,
    pub text_model: Option<String>,
    pub vision_model: Option<String>,
    pub storage_dir: Option<PathBuf>,
}

impl ChatConfig {
    /// Read overrides from the environment.
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var(BASE_URL_ENV).ok(),
            text_model: std::env::var(TEXT_MODEL_ENV).ok(),
            vision_model: std::env::var(VISION_MODEL_ENV).ok(),
            storage_dir: std::env::var_os(STORAGE_DIR_ENV).map(PathBuf::from),
        }
    }

    /// Build the Gemini client; fails fast when the credential is missing.
    pub fn build_provider(&self) -> Result<GeminiClient, LlmError> {
        let mut client = GeminiClient::from_env()?;
        if let Some(url) = &self.base_url {
            client = client.with_base_url(url);
        }
        if let Some(model) = &self.text_model {
            client = client.with_text_model(model);
        }
        if let Some(model) = &self.vision_model {
            client = client.with_vision_model(model);
        }
        Ok(client)
    }

    /// Build the durable storage backend for the configured profile.
    pub fn build_storage(&self) -> LocalStorage {
        match &self.storage_dir {
            Some(dir) => LocalStorage::new(dir),
            None => LocalStorage::discover(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use genius_state::DurableStorage;

    #[test]
    fn default_config_has_no_overrides() {
        let config = ChatConfig::default();
        assert!(config.base_url.is_none());
        assert!(config.text_model.is_none());
        assert!(config.vision_model.is_none());
        assert!(config.storage_dir.is_none());
    }

    #[test]
    fn explicit_storage_dir_is_available() {
        let dir = tempfile::tempdir().unwrap();
        let config = ChatConfig {
            storage_dir: Some(dir.path().to_path_buf()),
            ..Default::default()
        };

        assert!(config.build_storage().is_available());
    }
}
