//! Application state shared across all request handlers.

use std::sync::Arc;

use crate::assets::AssetService;
use crate::chat::{ChatService, MarkdownLite};

/// Shared application state.
pub struct AppState {
    /// Offline shell asset layer.
    pub assets: AssetService,
    /// Chat session service.
    pub chat: ChatService,
    /// Sanitizing renderer for message HTML.
    pub renderer: MarkdownLite,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    /// Returns an error if the markdown renderer cannot be built.
    pub fn new(
        assets: AssetService,
        chat: ChatService,
    ) -> Result<Arc<Self>, Box<dyn std::error::Error + Send + Sync>> {
        let renderer = MarkdownLite::new()?;
        Ok(Arc::new(Self {
            assets,
            chat,
            renderer,
        }))
    }
}
