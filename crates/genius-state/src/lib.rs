//! Session persistence: the key-value durable storage analog of the
//! browser's profile storage, the authentication gate in front of it, and
//! the single-writer store that owns the live [`genius_core::Session`].

pub mod auth;
pub mod error;
pub mod storage;
pub mod store;

pub use auth::{AccessGate, StoredTokenGate};
pub use error::{Result, StateError};
pub use storage::{DurableStorage, LocalStorage, AUTH_TOKEN_KEY, HISTORY_KEY, MESSAGES_KEY};
pub use store::{ClearScope, SessionStore};
