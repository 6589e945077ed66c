//! Startup helpers for the chatmap server.

use std::future::Future;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;

use crate::config::AppConfig;
use crate::conversation::{ConversationStore, InMemoryConversationStore, SqliteConversationStore};
use crate::llm::OpenAiChatClient;
use crate::maintenance::SessionSweeper;
use crate::scraping::ScrapingService;
use crate::server::{self, AppState};

/// Run the server (used by the `chatmap-server` binary).
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

    tracing::info!("Starting chatmap v{}", env!("CARGO_PKG_VERSION"));

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {e}");
            return ExitCode::from(1);
        }
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to create runtime: {e}");
            return ExitCode::from(1);
        }
    };

    if let Err(e) = rt.block_on(serve(&config, shutdown_signal())) {
        tracing::error!("Server error: {e:#}");
        return ExitCode::from(1);
    }

    ExitCode::SUCCESS
}

/// Build application state from configuration without starting the server.
///
/// # Errors
/// Returns an error if the store or an HTTP client cannot be created.
pub async fn initialize(config: &AppConfig) -> anyhow::Result<Arc<AppState>> {
    let store: Arc<dyn ConversationStore> = match &config.sqlite_path {
        Some(path) => {
            tracing::info!(path = %path.display(), "Using SQLite session store");
            Arc::new(
                SqliteConversationStore::open(path)
                    .await
                    .with_context(|| format!("Failed to open session store {}", path.display()))?,
            )
        }
        None => {
            tracing::info!("Using in-memory session store");
            Arc::new(InMemoryConversationStore::new())
        }
    };

    tracing::info!(
        endpoint = %config.llm.base_url,
        model = %config.llm.model,
        style = %config.prompt_style,
        "Model configured"
    );
    let model = OpenAiChatClient::new(config.llm.clone()).context("Failed to create model client")?;

    let mut state = AppState::new(Arc::new(model))
        .with_store(store)
        .with_prompt_style(config.prompt_style);

    if config.web_context {
        let scraper = ScrapingService::new(config.scraping.clone())
            .context("Failed to create web scraper")?;
        tracing::info!(max_sources = config.scraping.max_sources, "Web context enabled");
        state = state.with_web_context(Arc::new(scraper));
    }

    Ok(state.shared())
}

/// Initialize state, start the idle-session sweeper and serve until
/// `shutdown_signal` completes.
///
/// # Errors
/// Returns an error if initialization or the server fails.
pub async fn serve<F>(config: &AppConfig, shutdown_signal: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let state = initialize(config).await?;

    let sweeper = SessionSweeper::new(Arc::clone(&state.store), &config.retention);
    let sweeper_shutdown = sweeper.as_ref().map(SessionSweeper::shutdown_notifier);
    let sweeper_handle = sweeper.map(SessionSweeper::spawn);

    let result = server::run_server_with_shutdown(state, config.port, shutdown_signal)
        .await
        .context("HTTP server failed");

    if let Some(shutdown) = sweeper_shutdown {
        shutdown.notify_one();
    }
    if let Some(handle) = sweeper_handle {
        if let Err(e) = handle.await {
            tracing::warn!("Session sweeper ended abnormally: {e}");
        }
    }

    result
}

/// Resolve when the process receives Ctrl-C.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
