//! Types for the conversation log.

use core::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a message.
///
/// Used only for UI identity, never for ordering: display order is the
/// insertion order of the log.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    /// Generate a fresh identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Borrow as `&str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Who authored a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    /// The person asking questions.
    User,
    /// The assistant.
    Bot,
}

/// What a message carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// Plain answer or question text.
    Text,
    /// Follow-up suggestion chips.
    Suggestion,
    /// An inline failure notice.
    Error,
}

/// One entry in the conversation log. Never mutated after creation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Message {
    /// Identity for UI reconciliation.
    pub id: MessageId,
    /// Author.
    pub sender: Sender,
    /// Payload kind.
    pub kind: MessageKind,
    /// Present for `Text` and `Error` messages.
    pub content: Option<String>,
    /// Present and non-empty for `Suggestion` messages.
    pub suggestions: Option<Vec<String>>,
    /// Creation time.
    pub timestamp: DateTime<Utc>,
}

impl Message {
    fn new(sender: Sender, kind: MessageKind) -> Self {
        Self {
            id: MessageId::new(),
            sender,
            kind,
            content: None,
            suggestions: None,
            timestamp: Utc::now(),
        }
    }

    /// A question from the user.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        let mut message = Self::new(Sender::User, MessageKind::Text);
        message.content = Some(content.into());
        message
    }

    /// An answer from the assistant.
    #[must_use]
    pub fn bot_answer(content: impl Into<String>) -> Self {
        let mut message = Self::new(Sender::Bot, MessageKind::Text);
        message.content = Some(content.into());
        message
    }

    /// Follow-up suggestions from the assistant.
    ///
    /// Callers must not pass an empty sequence; a suggestion message always
    /// carries at least one entry.
    #[must_use]
    pub fn bot_suggestions(suggestions: Vec<String>) -> Self {
        let mut message = Self::new(Sender::Bot, MessageKind::Suggestion);
        message.suggestions = Some(suggestions);
        message
    }

    /// An inline failure notice from the assistant.
    #[must_use]
    pub fn bot_error(content: impl Into<String>) -> Self {
        let mut message = Self::new(Sender::Bot, MessageKind::Error);
        message.content = Some(content.into());
        message
    }
}

/// Identity produced by the mocked login boundary.
///
/// No real credential exchange happens anywhere in this crate.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct User {
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// Avatar URL.
    pub picture: String,
}

impl User {
    /// Demo identity used in place of a real sign-in flow.
    #[must_use]
    pub fn demo() -> Self {
        Self {
            name: "CS Student".to_string(),
            email: "student@studygenius.app".to_string(),
            picture: "https://ui-avatars.com/api/?name=CS+Student&size=128".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_ids_are_unique() {
        let a = Message::user("hi");
        let b = Message::user("hi");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_constructors_set_kind_and_sender() {
        let user = Message::user("q");
        assert_eq!(user.sender, Sender::User);
        assert_eq!(user.kind, MessageKind::Text);
        assert_eq!(user.content.as_deref(), Some("q"));

        let suggestions = Message::bot_suggestions(vec!["a".to_string()]);
        assert_eq!(suggestions.sender, Sender::Bot);
        assert_eq!(suggestions.kind, MessageKind::Suggestion);
        assert!(suggestions.content.is_none());

        let error = Message::bot_error("boom");
        assert_eq!(error.kind, MessageKind::Error);
    }
}
