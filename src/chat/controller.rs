//! Conversation state machine: the ordered message log plus the in-flight
//! request guard.
//!
//! Two states: idle (`pending == false`) and awaiting (`pending == true`).
//! A send cycle is `begin_send` followed by exactly one `complete`; the
//! controller never talks to the network itself.

use crate::chat::types::{Message, User};
use crate::completion::{Completion, CompletionError};

/// Ordered message log and pending flag; the only state the UI renders from.
#[derive(Default)]
pub struct ConversationController {
    messages: Vec<Message>,
    pending: bool,
}

impl ConversationController {
    /// Create an empty, idle controller.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            messages: Vec::new(),
            pending: false,
        }
    }

    /// Start a fresh session for `user`, seeding the log with the greeting.
    pub fn start_session(&mut self, user: &User) {
        self.messages.clear();
        self.pending = false;
        self.messages.push(Message::bot_answer(greeting(&user.name)));
    }

    /// Accept or reject a send.
    ///
    /// Blank text and a send issued while a request is already in flight are
    /// both no-ops. On acceptance the user message is appended immediately,
    /// before any network activity, and the returned question is what must
    /// be forwarded to the provider.
    pub fn begin_send(&mut self, text: &str) -> Option<String> {
        if text.trim().is_empty() || self.pending {
            return None;
        }

        self.messages.push(Message::user(text));
        self.pending = true;
        Some(text.to_string())
    }

    /// Terminal step of a send cycle.
    ///
    /// Success appends the answer and then its suggestions; failure appends
    /// a single apology-prefixed error message. Either way the controller
    /// returns to idle.
    pub fn complete(&mut self, outcome: Result<Completion, CompletionError>) {
        match outcome {
            Ok(completion) => {
                self.messages.push(Message::bot_answer(completion.answer));
                // An empty suggestion list is tolerated from the provider
                // but never becomes a suggestion message.
                if !completion.suggestions.is_empty() {
                    self.messages
                        .push(Message::bot_suggestions(completion.suggestions));
                }
            }
            Err(err) => {
                self.messages
                    .push(Message::bot_error(format!(
                        "I'm sorry, I encountered an issue. {err}"
                    )));
            }
        }
        self.pending = false;
    }

    /// Clear the conversation and return to idle. Safe to call repeatedly.
    pub fn reset(&mut self) {
        self.messages.clear();
        self.pending = false;
    }

    /// The ordered message log.
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Whether a send is outstanding.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.pending
    }
}

/// Deterministic session-start greeting.
fn greeting(name: &str) -> String {
    format!(
        "Hello {name}! I am Study Genius, your personal AI assistant. \
How can I help you with your Computer Science studies today?"
    )
}
