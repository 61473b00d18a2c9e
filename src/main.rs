use tracing_subscriber::EnvFilter;

use vault_api::{
    api::{create_router, AppState},
    config::Config,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("vault_api=debug,tower_http=info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let config = Config::from_env()?;
    tracing::info!(
        tmdb_api_url = %config.tmdb_api_url,
        player_base_url = %config.player_base_url,
        "Configuration loaded"
    );

    let (state, cache_handle) = AppState::from_config(&config);
    let listener_handle = state.spawn_favorites_listener();

    match config.session_refresh_token.as_deref() {
        Some(refresh_token) => match state.auth.restore_session(refresh_token).await {
            Ok(identity) => {
                tracing::info!(user_id = %identity.user_id, "Resumed previous session")
            }
            Err(e) => tracing::warn!(error = %e, "Could not resume previous session"),
        },
        None => tracing::debug!("No stored session, starting signed out"),
    }
    state.session.mark_initialized();

    let app = create_router(state);

    let address = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(address = %address, "Server running");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    listener_handle.shutdown().await;
    cache_handle.shutdown().await;
    tracing::info!("Server stopped");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => tracing::warn!(error = %e, "Failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
