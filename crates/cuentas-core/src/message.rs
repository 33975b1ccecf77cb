use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Who authored a conversation entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => f.write_str("user"),
            Self::Assistant => f.write_str("assistant"),
        }
    }
}

/// A single turn in a user's recent conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationEntry {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// Flatten a conversation window into a transcript for the classifier.
pub fn render_transcript(entries: &[ConversationEntry]) -> String {
    entries
        .iter()
        .map(|e| {
            let who = match e.role {
                Role::User => "Usuario",
                Role::Assistant => "Asistente",
            };
            format!("{who}: {}", e.content)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
