//! Per-session chat history

use serde::{Deserialize, Serialize};

/// Who produced a chat turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One entry in the history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

/// Ordered conversation held in memory for one UI session
#[derive(Debug, Clone, Default, Serialize)]
pub struct ChatHistory {
    turns: Vec<ChatTurn>,
}

impl ChatHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.push(Role::User, content);
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.push(Role::Assistant, content);
    }

    fn push(&mut self, role: Role, content: impl Into<String>) {
        self.turns.push(ChatTurn {
            role,
            content: content.into(),
        });
    }

    /// Turns in insertion order
    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    /// Turns newest first, the order the UI displays them
    pub fn recent_first(&self) -> impl Iterator<Item = &ChatTurn> {
        self.turns.iter().rev()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recent_first() {
        let mut history = ChatHistory::new();
        history.push_user("What is the repo rate?");
        history.push_assistant("The repo rate is 6.5%.");
        history.push_user("Since when?");

        let order: Vec<(Role, &str)> = history
            .recent_first()
            .map(|t| (t.role, t.content.as_str()))
            .collect();

        assert_eq!(
            order,
            vec![
                (Role::User, "Since when?"),
                (Role::Assistant, "The repo rate is 6.5%."),
                (Role::User, "What is the repo rate?"),
            ]
        );
        assert_eq!(history.turns()[0].content, "What is the repo rate?");
    }

    #[test]
    fn test_clear() {
        let mut history = ChatHistory::new();
        history.push_user("q");
        assert_eq!(history.len(), 1);
        history.clear();
        assert!(history.is_empty());
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let turn = ChatTurn { role: Role::Assistant, content: "x".to_string() };
        assert_eq!(
            serde_json::to_value(&turn).unwrap(),
            serde_json::json!({"role": "assistant", "content": "x"})
        );
    }
}
