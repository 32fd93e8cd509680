use tokio_util::sync::CancellationToken;
use tracing::info;
use crate::api;
use crate::cli::commands::ServeArgs;
use crate::cli::runtime::{build_orchestrator, load_config};
use crate::config::credentials::resolve_credential;
use crate::errors::ScoutError;

pub async fn handle_serve(args: ServeArgs) -> Result<(), ScoutError> {
    let config = load_config(&args.runtime).await?;
    let host = args.host.unwrap_or_else(|| config.server.host.clone());
    let port = args.port.unwrap_or(config.server.port);
    let api_token = args.api_token.or_else(|| config.server.api_token.as_deref().map(resolve_credential));

    let orchestrator = build_orchestrator(&config, args.runtime.api_key.as_deref())?;
    let shutdown = CancellationToken::new();
    let sweeper = orchestrator.store().spawn_sweeper(shutdown.clone());

    let state = api::AppState::new(orchestrator, api_token);
    let protected = state.api_token.is_some();
    let app = api::build_router(state);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, auth = protected, "Listening");

    let signal = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown requested");
            signal.cancel();
        })
        .await
        .map_err(|e| ScoutError::Internal(format!("Server error: {}", e)))?;

    shutdown.cancel();
    let _ = sweeper.await;
    Ok(())
}
