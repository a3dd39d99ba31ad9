use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;

use genius_core::{encode_image_files, AttachmentError, ChatEvent};
use genius_llm::GenerationProvider;
use genius_state::SessionStore;

use crate::relay::relay_stream;

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("a generation is already in flight")]
    Busy,

    #[error("nothing to send: empty message and no attachments")]
    EmptySubmission,

    #[error(transparent)]
    Attachment(#[from] AttachmentError),
}

pub type Result<T> = std::result::Result<T, ChatError>;

/// The submission and cancellation entry points.
///
/// `submit` validates up front, commits the history entry and user turn,
/// and hands the upstream stream to the relay on a spawned task; the call
/// itself returns immediately. Progress is observable through the event
/// channel and the store.
pub struct ChatClient {
    provider: Arc<dyn GenerationProvider>,
    store: Arc<SessionStore>,
    cancel: Mutex<Option<CancellationToken>>,
}

impl ChatClient {
    pub fn new(provider: Arc<dyn GenerationProvider>, store: Arc<SessionStore>) -> Self {
        Self {
            provider,
            store,
            cancel: Mutex::new(None),
        }
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// Submit a message with optional image attachments.
    ///
    /// Validation failures (attachment limits, empty submission, an active
    /// generation) reject the call before any session state changes. Once
    /// accepted: one history entry for non-empty text, one user turn, then
    /// exactly one upstream attempt whose outcome arrives as events.
    pub async fn submit(
        &self,
        text: &str,
        image_paths: &[PathBuf],
        event_tx: mpsc::Sender<ChatEvent>,
    ) -> Result<()> {
        let attachments = encode_image_files(image_paths).await?;

        if text.trim().is_empty() && attachments.is_empty() {
            return Err(ChatError::EmptySubmission);
        }

        if !self.store.try_begin_generation().await {
            return Err(ChatError::Busy);
        }

        // From here the submission is committed: the history entry and the
        // user turn survive whatever the upstream does.
        self.store.record_submission(text).await;
        self.store.append_user_message(text).await;

        let cancel_token = CancellationToken::new();
        *self.cancel.lock().await = Some(cancel_token.clone());

        let provider = self.provider.clone();
        let store = self.store.clone();
        let transcript = store.transcript().await;

        tokio::spawn(async move {
            match provider.stream_generate(&transcript, &attachments).await {
                Ok(stream) => {
                    if let Err(error) = relay_stream(stream, &store, &event_tx, &cancel_token).await
                    {
                        log::warn!("generation failed mid-stream: {error}");
                    }
                }
                Err(error) => {
                    log::warn!("generation failed before streaming: {error}");
                    store.finalize_assistant_message().await;
                    let _ = event_tx
                        .send(ChatEvent::Error {
                            message: error.to_string(),
                        })
                        .await;
                }
            }
        });

        Ok(())
    }

    /// Request cancellation of the in-flight generation, if any.
    ///
    /// Takes effect at the next fragment boundary; a no-op while idle.
    pub async fn cancel(&self) {
        if !self.store.generation_in_flight().await {
            return;
        }
        if let Some(token) = self.cancel.lock().await.as_ref() {
            token.cancel();
        }
    }

    pub async fn is_generating(&self) -> bool {
        self.store.generation_in_flight().await
    }
}
