use serde::{Deserialize, Serialize};

use crate::history::HistoryEntry;
use crate::message::{Message, Role};

/// Browser-profile-scoped conversation state.
///
/// The session is owned by the session store and mutated only through it;
/// the stream relay touches nothing but the most recent assistant message,
/// and only while `generation_in_flight` is set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Session {
    pub transcript: Vec<Message>,
    pub history: Vec<HistoryEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
    #[serde(skip)]
    pub generation_in_flight: bool,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append_message(&mut self, message: Message) {
        self.transcript.push(message);
    }

    pub fn append_history(&mut self, entry: HistoryEntry) {
        self.history.push(entry);
    }

    /// The assistant message currently being streamed into, if any.
    ///
    /// Returns `None` unless a generation is in flight and the transcript
    /// ends with an assistant turn.
    pub fn streaming_assistant_mut(&mut self) -> Option<&mut Message> {
        if !self.generation_in_flight {
            return None;
        }
        self.transcript
            .last_mut()
            .filter(|message| message.role == Role::Assistant)
    }

    pub fn reset(&mut self) {
        self.transcript.clear();
        self.history.clear();
        self.auth_token = None;
        self.generation_in_flight = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_is_empty() {
        let session = Session::new();
        assert!(session.transcript.is_empty());
        assert!(session.history.is_empty());
        assert!(session.auth_token.is_none());
        assert!(!session.generation_in_flight);
    }

    #[test]
    fn streaming_assistant_requires_in_flight_flag() {
        let mut session = Session::new();
        session.append_message(Message::user("hi"));
        session.append_message(Message::assistant(""));

        assert!(session.streaming_assistant_mut().is_none());

        session.generation_in_flight = true;
        let assistant = session.streaming_assistant_mut().expect("assistant turn");
        assistant.content.push_str("hello");
        assert_eq!(session.transcript.last().unwrap().content, "hello");
    }

    #[test]
    fn streaming_assistant_ignores_trailing_user_turn() {
        let mut session = Session::new();
        session.generation_in_flight = true;
        session.append_message(Message::user("hi"));
        assert!(session.streaming_assistant_mut().is_none());
    }

    #[test]
    fn reset_clears_everything() {
        let mut session = Session::new();
        session.append_message(Message::user("hi"));
        session.append_history(HistoryEntry::new("hi"));
        session.auth_token = Some("token".into());
        session.generation_in_flight = true;

        session.reset();

        assert!(session.transcript.is_empty());
        assert!(session.history.is_empty());
        assert!(session.auth_token.is_none());
        assert!(!session.generation_in_flight);
    }
}
