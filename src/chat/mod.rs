//! Conversation management for the Study Genius client.
//!
//! [`ConversationController`] is the pure state machine; [`ChatService`]
//! ties it to an [`AnswerProvider`] and holds the at-most-one-in-flight
//! guarantee across concurrent callers.

pub mod controller;
pub mod markdown;
pub mod types;

pub use controller::ConversationController;
pub use markdown::MarkdownLite;
pub use types::{Message, MessageId, MessageKind, Sender, User};

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::completion::AnswerProvider;

/// Chat session service driving send cycles end to end.
pub struct ChatService {
    controller: Mutex<ConversationController>,
    provider: Arc<dyn AnswerProvider>,
}

impl ChatService {
    /// Create a service over `provider` with an empty conversation.
    #[must_use]
    pub fn new(provider: Arc<dyn AnswerProvider>) -> Self {
        Self {
            controller: Mutex::new(ConversationController::new()),
            provider,
        }
    }

    /// Start a session for `user`, seeding the greeting.
    pub async fn login(&self, user: &User) {
        self.controller.lock().await.start_session(user);
    }

    /// Clear the conversation log.
    pub async fn reset(&self) {
        self.controller.lock().await.reset();
    }

    /// Send a question through the guarded path.
    ///
    /// The user message lands in the log before the provider is called, and
    /// the lock is dropped around the provider call so that a concurrent
    /// send observes the guard and becomes a no-op instead of queueing
    /// behind the lock. A suggestion click goes through this same path.
    pub async fn send(&self, text: &str) {
        let accepted = { self.controller.lock().await.begin_send(text) };
        let Some(question) = accepted else {
            tracing::debug!("send ignored: blank input or request in flight");
            return;
        };

        let outcome = self.provider.ask(&question).await;
        if let Err(err) = &outcome {
            tracing::warn!(detail = err.detail(), "completion request failed");
        }

        self.controller.lock().await.complete(outcome);
    }

    /// Snapshot of the log and pending flag for rendering.
    pub async fn snapshot(&self) -> (Vec<Message>, bool) {
        let controller = self.controller.lock().await;
        (controller.messages().to_vec(), controller.is_pending())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use tokio::sync::Notify;

    use crate::completion::{Completion, CompletionError};

    fn stack_completion() -> Completion {
        Completion {
            answer: "A LIFO structure.".to_string(),
            suggestions: vec![
                "What is a queue?".to_string(),
                "What is a heap?".to_string(),
                "What is recursion?".to_string(),
            ],
        }
    }

    /// Provider that parks every call until released, counting calls.
    struct BlockingProvider {
        calls: AtomicUsize,
        release: Notify,
    }

    impl BlockingProvider {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                release: Notify::new(),
            })
        }
    }

    #[async_trait]
    impl AnswerProvider for BlockingProvider {
        async fn ask(&self, _question: &str) -> Result<Completion, CompletionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.release.notified().await;
            Ok(stack_completion())
        }
    }

    /// Provider that answers or fails immediately.
    struct ImmediateProvider {
        outcome: fn() -> Result<Completion, CompletionError>,
    }

    #[async_trait]
    impl AnswerProvider for ImmediateProvider {
        async fn ask(&self, _question: &str) -> Result<Completion, CompletionError> {
            (self.outcome)()
        }
    }

    #[tokio::test]
    async fn test_successful_send_produces_message_triple() {
        let provider = Arc::new(ImmediateProvider {
            outcome: || Ok(stack_completion()),
        });
        let service = ChatService::new(provider);

        service.send("What is a stack?").await;

        let (messages, pending) = service.snapshot().await;
        assert!(!pending);
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].content.as_deref(), Some("What is a stack?"));
        assert_eq!(messages[1].content.as_deref(), Some("A LIFO structure."));
        assert_eq!(
            messages[2].suggestions.as_deref().unwrap_or_default().len(),
            3
        );
    }

    #[tokio::test]
    async fn test_failed_send_produces_error_pair() {
        let provider = Arc::new(ImmediateProvider {
            outcome: || Err(CompletionError::Configuration),
        });
        let service = ChatService::new(provider);

        service.send("What is a stack?").await;

        let (messages, pending) = service.snapshot().await;
        assert!(!pending);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].kind, MessageKind::Error);
        assert!(
            messages[1]
                .content
                .as_deref()
                .unwrap_or_default()
                .contains("invalid")
        );
    }

    #[tokio::test]
    async fn test_concurrent_send_is_ignored_not_queued() {
        let provider = BlockingProvider::new();
        let service = Arc::new(ChatService::new(provider.clone()));

        let background = {
            let service = Arc::clone(&service);
            tokio::spawn(async move { service.send("What is a stack?").await })
        };

        // Wait for the first send to reach the provider.
        for _ in 0..1000 {
            if provider.calls.load(Ordering::SeqCst) > 0 {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);

        // Issued while awaiting: must return immediately with nothing logged.
        service.send("What is a queue?").await;
        let (messages, pending) = service.snapshot().await;
        assert!(pending);
        assert_eq!(messages.len(), 1);

        provider.release.notify_one();
        background.await.unwrap();

        let (messages, pending) = service.snapshot().await;
        assert!(!pending);
        assert_eq!(messages.len(), 3);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_login_then_reset_round_trip() {
        let provider = Arc::new(ImmediateProvider {
            outcome: || Ok(stack_completion()),
        });
        let service = ChatService::new(provider);

        service.login(&User::demo()).await;
        let (messages, _) = service.snapshot().await;
        assert_eq!(messages.len(), 1);

        service.reset().await;
        let (messages, pending) = service.snapshot().await;
        assert!(messages.is_empty());
        assert!(!pending);
    }
}
