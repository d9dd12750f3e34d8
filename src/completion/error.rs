//! Error types for the completion provider client.

use thiserror::Error;

/// Faults surfaced by the completion client.
///
/// Provider-specific failures are fully normalized into these two kinds
/// before they reach the conversation layer; `Display` is the user-facing
/// message shown in chat.
#[derive(Debug, Error)]
pub enum CompletionError {
    /// The provider credential is missing or was rejected by the provider.
    #[error("Your API key is invalid. Please check your configuration.")]
    Configuration,

    /// The provider call failed, or its payload failed validation.
    #[error("Failed to get a response from the AI. The service may be temporarily unavailable.")]
    Provider(String),
}

impl CompletionError {
    /// Diagnostic detail for logs; `Display` stays user-facing.
    #[must_use]
    pub fn detail(&self) -> &str {
        match self {
            Self::Configuration => "provider credential missing or rejected",
            Self::Provider(detail) => detail,
        }
    }

    /// Check if the user has to fix credentials before retrying.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration)
    }
}
