//! Conversation history for one chat session

use serde::{Deserialize, Serialize};

/// Who said it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One entry in the history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Append-only history of user/assistant exchanges
///
/// Entries are only added in pairs, so the log always alternates
/// `User, Assistant, User, Assistant, ...`.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct ConversationLog {
    turns: Vec<ConversationTurn>,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a user message and the assistant's answer to it
    pub fn record_exchange(&mut self, user: impl Into<String>, assistant: impl Into<String>) {
        self.turns.push(ConversationTurn::user(user));
        self.turns.push(ConversationTurn::assistant(assistant));
    }

    /// Move every turn of `other` to the end of this log
    pub fn append(&mut self, other: ConversationLog) {
        self.turns.extend(other.turns);
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Number of completed exchanges
    pub fn exchanges(&self) -> usize {
        self.turns.len() / 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_alternates_starting_with_user() {
        let mut log = ConversationLog::new();
        for i in 0..4 {
            log.record_exchange(format!("q{}", i), format!("a{}", i));
        }

        assert_eq!(log.len(), 8);
        assert_eq!(log.exchanges(), 4);
        for (i, turn) in log.turns().iter().enumerate() {
            let expected = if i % 2 == 0 { Role::User } else { Role::Assistant };
            assert_eq!(turn.role, expected);
        }
        assert_eq!(log.turns()[6], ConversationTurn::user("q3"));
    }

    #[test]
    fn test_append_keeps_order() {
        let mut log = ConversationLog::new();
        log.record_exchange("q0", "a0");
        let mut exchange = ConversationLog::new();
        exchange.record_exchange("q1", "a1");

        log.append(exchange);
        assert_eq!(log.exchanges(), 2);
        assert_eq!(log.turns()[2], ConversationTurn::user("q1"));
        assert_eq!(log.turns()[3], ConversationTurn::assistant("a1"));
    }

    #[test]
    fn test_serializes_as_role_content_list() {
        let mut log = ConversationLog::new();
        log.record_exchange("hi", "hello");
        let json = serde_json::to_value(&log).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                {"role": "user", "content": "hi"},
                {"role": "assistant", "content": "hello"}
            ])
        );
    }
}
