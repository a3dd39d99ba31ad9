//! The authentication boundary.
//!
//! Credential issuance (password checks, token signing) lives outside this
//! system; the core only needs to know whether the user is authenticated
//! and what opaque token to associate with the session.

use std::sync::{Arc, RwLock};

use crate::storage::{DurableStorage, AUTH_TOKEN_KEY};

/// What the session bootstrap consults before loading any cached state.
pub trait AccessGate: Send + Sync {
    fn is_authenticated(&self) -> bool;
    fn current_token(&self) -> Option<String>;
}

/// A gate backed by the `authToken` key in durable storage: the presence of
/// a stored token is what "logged in" means, exactly like the original
/// browser profile.
pub struct StoredTokenGate {
    storage: Arc<dyn DurableStorage>,
    token: RwLock<Option<String>>,
}

impl StoredTokenGate {
    /// Load the current token, if any, from storage.
    pub async fn load(storage: Arc<dyn DurableStorage>) -> Self {
        let token = match storage.get(AUTH_TOKEN_KEY).await {
            Ok(token) => token,
            Err(error) => {
                log::warn!("failed to read stored auth token: {error}");
                None
            }
        };
        Self {
            storage,
            token: RwLock::new(token),
        }
    }

    /// Store an externally issued token.
    pub async fn login(&self, token: impl Into<String>) {
        let token = token.into();
        if let Err(error) = self.storage.set(AUTH_TOKEN_KEY, &token).await {
            log::warn!("failed to persist auth token: {error}");
        }
        *self.token.write().expect("gate lock poisoned") = Some(token);
    }

    /// Drop the stored token. The caller is expected to clear the session
    /// store as well; logging out invalidates the cached conversation.
    pub async fn logout(&self) {
        if let Err(error) = self.storage.remove(AUTH_TOKEN_KEY).await {
            log::warn!("failed to remove auth token: {error}");
        }
        *self.token.write().expect("gate lock poisoned") = None;
    }
}

impl AccessGate for StoredTokenGate {
    fn is_authenticated(&self) -> bool {
        self.token.read().expect("gate lock poisoned").is_some()
    }

    fn current_token(&self) -> Option<String> {
        self.token.read().expect("gate lock poisoned").clone()
    }
}
