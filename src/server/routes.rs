//! HTTP route handlers for the Study Genius API.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::chat::{Message, MessageKind, Sender, User};

use super::state::AppState;

/// Create the API router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/login", post(login))
        .route("/api/logout", post(logout))
        .route("/api/chat", post(send_message))
        .route("/api/messages", get(list_messages))
        .route("/", get(shell_root))
        .route("/index.html", get(shell_index))
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "study-genius",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Serve the site root through the asset cache.
async fn shell_root(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    serve_shell(&state, "/").await
}

/// Serve the entry document through the asset cache.
async fn shell_index(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    serve_shell(&state, "/index.html").await
}

/// Cache-first delivery of one shell resource.
async fn serve_shell(
    state: &AppState,
    key: &str,
) -> Result<impl IntoResponse + use<>, (StatusCode, String)> {
    let asset = state
        .assets
        .fetch(key)
        .await
        .map_err(|e| (StatusCode::BAD_GATEWAY, format!("shell fetch failed: {e}")))?;

    Ok(([(header::CONTENT_TYPE, asset.content_type)], asset.body))
}

/// A message as rendered to the frontend.
#[derive(Debug, Serialize)]
pub struct MessageDto {
    /// Stable identity for UI reconciliation.
    pub id: String,
    /// Author.
    pub sender: Sender,
    /// Payload kind.
    pub kind: MessageKind,
    /// Raw content for `text` and `error` messages.
    pub content: Option<String>,
    /// Sanitized HTML rendering of `content`.
    pub html: Option<String>,
    /// Suggestion chips.
    pub suggestions: Option<Vec<String>>,
    /// Creation time.
    pub timestamp: DateTime<Utc>,
}

impl MessageDto {
    fn from_message(message: &Message, state: &AppState) -> Self {
        Self {
            id: message.id.to_string(),
            sender: message.sender,
            kind: message.kind,
            content: message.content.clone(),
            html: message
                .content
                .as_deref()
                .map(|content| state.renderer.render(content)),
            suggestions: message.suggestions.clone(),
            timestamp: message.timestamp,
        }
    }
}

/// The conversation as the UI renders it.
#[derive(Debug, Serialize)]
pub struct ConversationView {
    /// Ordered message log.
    pub messages: Vec<MessageDto>,
    /// Whether a send is outstanding.
    pub pending: bool,
}

async fn conversation_view(state: &AppState) -> ConversationView {
    let (messages, pending) = state.chat.snapshot().await;
    ConversationView {
        messages: messages
            .iter()
            .map(|message| MessageDto::from_message(message, state))
            .collect(),
        pending,
    }
}

/// Mock sign-in: no credential exchange, a demo identity, and the greeting.
async fn login(State(state): State<Arc<AppState>>) -> Json<ConversationView> {
    let user = User::demo();
    state.chat.login(&user).await;
    Json(conversation_view(&state).await)
}

/// Logout: the only way messages are destroyed.
async fn logout(State(state): State<Arc<AppState>>) -> Json<ConversationView> {
    state.chat.reset().await;
    Json(conversation_view(&state).await)
}

/// Chat send request. Suggestion clicks post the chip text here too.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// The user's question.
    pub message: String,
}

/// Handle a chat send.
async fn send_message(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Json<ConversationView> {
    state.chat.send(&request.message).await;
    Json(conversation_view(&state).await)
}

/// Return the current conversation.
async fn list_messages(State(state): State<Arc<AppState>>) -> Json<ConversationView> {
    Json(conversation_view(&state).await)
}
