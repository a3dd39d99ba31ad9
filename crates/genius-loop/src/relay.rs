use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use genius_core::ChatEvent;
use genius_llm::{LlmChunk, LlmError, LlmStream};
use genius_state::SessionStore;

/// How a relayed generation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayOutcome {
    Completed,
    Cancelled,
}

/// Drive one generation's chunk stream into the session store.
///
/// The first token opens the assistant turn; every token after that appends
/// in arrival order. Cancellation is cooperative: it is observed between
/// fragments (or while waiting on a hung stream), never against a fragment
/// that has already arrived. On every exit path the assistant turn is
/// finalized and partial content stays in the transcript as-is.
pub async fn relay_stream(
    mut stream: LlmStream,
    store: &SessionStore,
    event_tx: &mpsc::Sender<ChatEvent>,
    cancel_token: &CancellationToken,
) -> Result<RelayOutcome, LlmError> {
    let mut begun = false;

    let outcome = loop {
        let chunk_result = tokio::select! {
            biased;

            _ = cancel_token.cancelled() => break RelayOutcome::Cancelled,
            chunk = stream.next() => match chunk {
                Some(chunk) => chunk,
                None => break RelayOutcome::Completed,
            },
        };

        match chunk_result {
            Ok(LlmChunk::Token(token)) => {
                if !begun {
                    store.begin_assistant_message().await;
                    begun = true;
                }
                store.append_to_assistant_message(&token).await;

                let _ = event_tx.send(ChatEvent::Token { content: token }).await;
            }
            Ok(LlmChunk::Done) => {
                log::debug!("generation stream completed");
                break RelayOutcome::Completed;
            }
            Err(error) => {
                // Whatever was already relayed stays; only the flag clears.
                store.finalize_assistant_message().await;
                let _ = event_tx
                    .send(ChatEvent::Error {
                        message: error.to_string(),
                    })
                    .await;
                return Err(error);
            }
        }
    };

    store.finalize_assistant_message().await;

    match outcome {
        RelayOutcome::Completed => {
            let _ = event_tx.send(ChatEvent::Complete).await;
        }
        RelayOutcome::Cancelled => {
            log::debug!("generation cancelled by caller");
            let _ = event_tx.send(ChatEvent::Cancelled).await;
        }
    }

    Ok(outcome)
}
