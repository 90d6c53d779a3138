//! Serve command implementation

use crate::api::{create_router, AppState};
use crate::cli::{load_config, ServeArgs};
use crate::config::PosterConfig;
use crate::llm::LlmClient;
use crate::logging::init_tracing;
use crate::services::ServiceManager;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Load configuration with CLI overrides applied to `[server]`
pub fn load_config_with_overrides(
    args: &ServeArgs,
) -> Result<PosterConfig, Box<dyn std::error::Error>> {
    let mut config = load_config(&args.config)?;

    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(ref host) = args.host {
        config.server.host = host.clone();
    }
    if let Some(ref log_level) = args.log_level {
        config.logging.level = log_level.clone();
    }

    config.validate()?;
    Ok(config)
}

/// Wait for SIGINT or SIGTERM, then cancel `cancel_token`.
pub async fn shutdown_signal(cancel_token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install CTRL+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, shutting down...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down...");
        }
        _ = cancel_token.cancelled() => {}
    }

    cancel_token.cancel();
}

/// Build the shared state used by the dashboard router.
pub fn build_app_state(
    config: PosterConfig,
    http: reqwest::Client,
) -> Result<Arc<AppState>, Box<dyn std::error::Error>> {
    let llm = LlmClient::from_config(&config.llm, http.clone())?;
    let services = ServiceManager::with_client(
        config.services.descriptors(),
        config.services.connect_timeout(),
        http,
    );

    Ok(Arc::new(AppState::new(Arc::new(config), llm, services)))
}

/// Main serve command handler
pub async fn run_serve(args: ServeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config_with_overrides(&args)?;
    init_tracing(&config.logging)?;

    tracing::info!(
        mode = ?config.llm.mode,
        priority = ?config.llm.priority.as_slice(),
        "Starting poster dashboard API"
    );
    tracing::debug!(?config, "Loaded configuration");

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = build_app_state(config, reqwest::Client::new())?;
    let services = state.services.clone();
    let app = create_router(state);

    // Connect in the background so the API answers while `initializing`.
    let init_handle = {
        let services = services.clone();
        tokio::spawn(async move {
            let status = services.initialize().await;
            tracing::info!(?status, "Service connection round finished");
        })
    };

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "Dashboard API listening");

    let cancel_token = CancellationToken::new();
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancel_token.clone()))
        .await?;

    init_handle.abort();
    services.shutdown();

    tracing::info!("Poster server stopped");
    Ok(())
}
