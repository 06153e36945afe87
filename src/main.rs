use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};

use a2a_console::metrics;
use a2a_console::tracing::{init_tracing, shutdown_tracing};
use a2a_console::web::{create_router, AppState};
use a2a_console::{A2aClient, A2aRegistry, ChatClient, ConsoleConfig, SessionCache};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = ConsoleConfig::parse();

    init_tracing(
        "a2a-console",
        config.otlp_endpoint.as_deref(),
        config.log_json,
    )?;
    metrics::init();

    let registry = A2aRegistry::new(A2aClient::new(
        config.supervisor_url.clone(),
        config.http_timeout(),
    )?);
    let backend = ChatClient::new(config.ollama_url.clone(), config.http_timeout())?;
    let cache = Arc::new(SessionCache::new(
        Arc::new(registry),
        Arc::new(backend),
        config.agent_config(),
    ));

    info!(
        supervisor = %config.supervisor_url,
        ollama = %config.ollama_url,
        model = %config.model,
        "Starting a2a-console"
    );

    if config.discover_on_start {
        if let Err(e) = cache.get_or_init().await {
            error!(error = %e, "Agent system is not available; serving the error page");
        }
    }

    let app = create_router(AppState::with_limits(cache, config.session_limits()));
    let listener = tokio::net::TcpListener::bind(config.listen).await?;
    info!(addr = %config.listen, "Chat interface listening on http://{}", config.listen);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for shutdown signal");
            }
            info!("Shutting down");
        })
        .await?;

    shutdown_tracing();
    Ok(())
}
