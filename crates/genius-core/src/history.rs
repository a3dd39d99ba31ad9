use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A submitted query, recorded independently of the transcript.
///
/// Every non-empty submission produces exactly one entry, even when the
/// generation that follows fails.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryEntry {
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_stamps_the_entry() {
        let before = Utc::now();
        let entry = HistoryEntry::new("what is rust");
        assert_eq!(entry.text, "what is rust");
        assert!(entry.timestamp >= before);
    }

    #[test]
    fn entry_roundtrips_through_json() {
        let entry = HistoryEntry::new("persisted");
        let json = serde_json::to_string(&entry).unwrap();
        let decoded: HistoryEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, entry);
    }
}
