//! The single writer over the live session.
//!
//! Every transcript/history mutation funnels through this store, which
//! re-serializes the full sequence into durable storage after each change.
//! Parse failures on load are recovered per log: the corrupt log comes
//! back empty, the other is unaffected.

use std::sync::Arc;

use genius_core::{HistoryEntry, Message, Session};
use tokio::sync::Mutex;

use crate::auth::AccessGate;
use crate::storage::{DurableStorage, HISTORY_KEY, MESSAGES_KEY};

/// Which durable log(s) to erase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearScope {
    Transcript,
    History,
    Both,
}

pub struct SessionStore {
    storage: Arc<dyn DurableStorage>,
    session: Mutex<Session>,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn DurableStorage>) -> Self {
        Self {
            storage,
            session: Mutex::new(Session::new()),
        }
    }

    /// Load both logs from durable storage into a fresh session.
    ///
    /// Does nothing while the gate reports unauthenticated: cached state
    /// must not surface before login. Each log loads independently; a log
    /// that fails to parse is logged and replaced with an empty sequence
    /// without touching the other.
    pub async fn bootstrap(&self, gate: &dyn AccessGate) {
        let mut session = self.session.lock().await;
        session.reset();

        if !gate.is_authenticated() {
            log::debug!("bootstrap skipped: not authenticated");
            return;
        }
        session.auth_token = gate.current_token();

        session.transcript = self.load_log::<Message>(MESSAGES_KEY).await;
        session.history = self.load_log::<HistoryEntry>(HISTORY_KEY).await;

        log::debug!(
            "bootstrapped session: {} messages, {} history entries",
            session.transcript.len(),
            session.history.len()
        );
    }

    async fn load_log<T: serde::de::DeserializeOwned>(&self, key: &str) -> Vec<T> {
        let raw = match self.storage.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(error) => {
                log::warn!("failed to read durable {key}: {error}");
                return Vec::new();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(entries) => entries,
            Err(error) => {
                log::warn!("corrupt durable {key}, starting empty: {error}");
                Vec::new()
            }
        }
    }

    /// Record a submitted query. Empty (post-trim) text is a no-op; the
    /// entry is recorded whether or not the generation afterwards succeeds.
    pub async fn record_submission(&self, text: &str) {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return;
        }

        let mut session = self.session.lock().await;
        session.append_history(HistoryEntry::new(trimmed));
        self.persist_history(&session).await;
    }

    pub async fn append_user_message(&self, text: impl Into<String>) {
        let mut session = self.session.lock().await;
        session.append_message(Message::user(text));
        self.persist_transcript(&session).await;
    }

    /// The single-flight gate: flips `generation_in_flight` on, or reports
    /// that a generation is already active.
    pub async fn try_begin_generation(&self) -> bool {
        let mut session = self.session.lock().await;
        if session.generation_in_flight {
            return false;
        }
        session.generation_in_flight = true;
        true
    }

    /// Open the assistant turn the relay will stream into.
    pub async fn begin_assistant_message(&self) {
        let mut session = self.session.lock().await;
        session.append_message(Message::assistant(""));
        self.persist_transcript(&session).await;
    }

    /// Append one relayed fragment to the in-flight assistant turn.
    pub async fn append_to_assistant_message(&self, fragment: &str) {
        let mut session = self.session.lock().await;
        match session.streaming_assistant_mut() {
            Some(message) => message.content.push_str(fragment),
            None => {
                log::warn!("dropped fragment: no assistant turn in flight");
                return;
            }
        }
        self.persist_transcript(&session).await;
    }

    /// Seal the current generation: whatever content has arrived stays
    /// as-is and the in-flight flag clears. Safe to call when no assistant
    /// turn was ever opened.
    pub async fn finalize_assistant_message(&self) {
        let mut session = self.session.lock().await;
        session.generation_in_flight = false;
    }

    /// Erase the selected durable log(s) and the matching in-memory state.
    pub async fn clear(&self, scope: ClearScope) {
        let mut session = self.session.lock().await;

        if matches!(scope, ClearScope::Transcript | ClearScope::Both) {
            session.transcript.clear();
            if let Err(error) = self.storage.remove(MESSAGES_KEY).await {
                log::warn!("failed to clear durable {MESSAGES_KEY}: {error}");
            }
        }
        if matches!(scope, ClearScope::History | ClearScope::Both) {
            session.history.clear();
            if let Err(error) = self.storage.remove(HISTORY_KEY).await {
                log::warn!("failed to clear durable {HISTORY_KEY}: {error}");
            }
        }
    }

    pub async fn transcript(&self) -> Vec<Message> {
        self.session.lock().await.transcript.clone()
    }

    pub async fn history(&self) -> Vec<HistoryEntry> {
        self.session.lock().await.history.clone()
    }

    pub async fn generation_in_flight(&self) -> bool {
        self.session.lock().await.generation_in_flight
    }

    pub async fn auth_token(&self) -> Option<String> {
        self.session.lock().await.auth_token.clone()
    }

    async fn persist_transcript(&self, session: &Session) {
        self.persist(MESSAGES_KEY, &session.transcript).await;
    }

    async fn persist_history(&self, session: &Session) {
        self.persist(HISTORY_KEY, &session.history).await;
    }

    async fn persist<T: serde::Serialize>(&self, key: &str, entries: &[T]) {
        let serialized = match serde_json::to_string(entries) {
            Ok(serialized) => serialized,
            Err(error) => {
                log::warn!("failed to serialize {key}: {error}");
                return;
            }
        };
        if let Err(error) = self.storage.set(key, &serialized).await {
            log::warn!("failed to persist {key}: {error}");
        }
    }
}
