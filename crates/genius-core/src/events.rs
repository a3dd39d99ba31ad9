use serde::{Deserialize, Serialize};

/// Progress events emitted by the stream relay while a generation runs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatEvent {
    Token { content: String },

    Complete,

    Cancelled,

    Error { message: String },
}
