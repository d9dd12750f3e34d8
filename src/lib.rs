//! Offline-capable chat service for computer-science study questions.
//!
//! Two independent cores and the glue around them:
//! - `assets`: cache-first shell asset layer with generation rollover
//! - `chat`: conversation log state machine and send lifecycle
//! - `completion`: structured-output client for the answer provider
//! - `server`: HTTP surface the UI talks to

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(unused_must_use)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

/// Offline shell asset cache and fetch interception.
pub mod assets;
/// Conversation state machine, message types, and rendering.
pub mod chat;
/// Answer provider client with a structured response contract.
pub mod completion;
/// HTTP server and API routes.
pub mod server;
/// Entry helpers to start the Study Genius server.
pub mod start_study_genius;
