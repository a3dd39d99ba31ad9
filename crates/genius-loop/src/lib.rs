//! The pipeline that turns a submission into transcript updates: attachment
//! encoding, the single-in-flight gate, the upstream call, and the stream
//! relay that keeps the session store in sync fragment by fragment.

pub mod config;
pub mod relay;
pub mod runner;

pub use config::ChatConfig;
pub use relay::{relay_stream, RelayOutcome};
pub use runner::{ChatClient, ChatError};
