//! Startup helpers for the Study Genius server.
//!
//! Environment handling lives here, not in the core modules: the services
//! below take explicit configuration structs and never read the process
//! environment themselves.

use std::future::Future;
use std::process::ExitCode;
use std::sync::Arc;

use crate::assets::{AssetConfig, AssetService};
use crate::chat::ChatService;
use crate::completion::{CompletionClient, CompletionConfig};
use crate::server::{self, AppState};

/// Run the server (used by the `study-genius-server` binary).
///
/// # Returns
/// `ExitCode::SUCCESS` on graceful shutdown, `1` on failure.
#[must_use]
pub fn run() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("Starting Study Genius v{}", env!("CARGO_PKG_VERSION"));

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to create runtime: {e}");
            return ExitCode::from(1);
        }
    };

    let state = match rt.block_on(initialize()) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to create state: {e}");
            return ExitCode::from(1);
        }
    };

    let port = get_port();

    if let Err(e) = rt.block_on(server::run_server(state, port)) {
        tracing::error!("Server error: {e}");
        return ExitCode::from(1);
    }

    ExitCode::SUCCESS
}

/// Initialize application state without starting the server.
///
/// Wires configuration from the environment, primes and activates the asset
/// cache, and constructs the chat service.
///
/// # Errors
/// Returns an error if the API key is absent, the shell cannot be primed,
/// or any service fails to construct.
pub async fn initialize() -> Result<Arc<AppState>, Box<dyn std::error::Error + Send + Sync>> {
    let api_key = std::env::var("STUDY_GENIUS_API_KEY")
        .map_err(|_| "STUDY_GENIUS_API_KEY environment variable not set")?;

    let mut completion_config = CompletionConfig::new().with_api_key(api_key);
    if let Ok(model) = std::env::var("STUDY_GENIUS_MODEL") {
        completion_config = completion_config.with_model(model);
    }
    let client = CompletionClient::new(completion_config)?;

    let mut asset_config = AssetConfig::new();
    if let Ok(origin) = std::env::var("STUDY_GENIUS_SHELL_ORIGIN") {
        asset_config = asset_config.with_origin(origin);
    }
    if let Ok(dir) = std::env::var("STUDY_GENIUS_CACHE_DIR") {
        asset_config = asset_config.with_cache_dir(dir);
    }
    if let Ok(generation) = std::env::var("STUDY_GENIUS_CACHE_GENERATION") {
        asset_config = asset_config.with_generation(generation);
    }
    tracing::info!(origin = %asset_config.origin, "shell origin");

    let assets = AssetService::new(asset_config)?;

    // The new generation must not go live with a partial shell.
    assets.install().await?;
    assets.activate()?;

    let chat = ChatService::new(Arc::new(client));

    AppState::new(assets, chat)
}

/// Run server with graceful shutdown.
///
/// # Errors
/// Returns an error if the server fails.
pub async fn run_server_with_shutdown<F>(
    state: Arc<AppState>,
    port: u16,
    shutdown_signal: F,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>>
where
    F: Future<Output = ()> + Send + 'static,
{
    server::run_server_with_shutdown(state, port, shutdown_signal).await
}

/// Get configured server port.
#[must_use]
pub fn get_port() -> u16 {
    std::env::var("STUDY_GENIUS_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(server::DEFAULT_PORT)
}
