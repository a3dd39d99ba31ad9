//! Durable key-value storage, the profile-scoped localStorage analog.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use crate::error::Result;

/// Key holding the serialized transcript.
pub const MESSAGES_KEY: &str = "messages";

/// Key holding the serialized submission history.
pub const HISTORY_KEY: &str = "history";

/// Key holding the opaque auth credential.
pub const AUTH_TOKEN_KEY: &str = "authToken";

/// A key -> JSON-string mapping surviving restarts.
///
/// Absence of a key is equivalent to an empty value; callers treat every
/// stored value as the full serialized sequence, replaced wholesale on
/// each write.
#[async_trait]
pub trait DurableStorage: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> Result<()>;
    async fn remove(&self, key: &str) -> Result<()>;

    /// Whether writes actually land anywhere.
    fn is_available(&self) -> bool {
        true
    }
}

/// File-backed storage: one `<key>.json` file per key under a profile
/// directory.
///
/// In non-interactive contexts (no resolvable profile directory) the
/// backend is unavailable: reads come back empty and writes are silently
/// skipped, so the rest of the system degrades to in-memory state.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: Option<PathBuf>,
}

impl LocalStorage {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: Some(root.as_ref().to_path_buf()),
        }
    }

    /// Resolve the default profile directory (`~/.genius/storage`).
    pub fn discover() -> Self {
        Self {
            root: dirs::home_dir().map(|home| home.join(".genius").join("storage")),
        }
    }

    /// A backend with nowhere to write; every operation is a no-op.
    pub fn unavailable() -> Self {
        Self { root: None }
    }

    fn key_path(&self, key: &str) -> Option<PathBuf> {
        self.root.as_ref().map(|root| root.join(format!("{key}.json")))
    }
}

#[async_trait]
impl DurableStorage for LocalStorage {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let Some(path) = self.key_path(key) else {
            return Ok(None);
        };

        match fs::read_to_string(&path).await {
            Ok(value) => Ok(Some(value)),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(error) => Err(error.into()),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let Some(path) = self.key_path(key) else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, value).await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let Some(path) = self.key_path(key) else {
            return Ok(());
        };

        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(error.into()),
        }
    }

    fn is_available(&self) -> bool {
        self.root.is_some()
    }
}
