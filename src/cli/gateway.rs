//! Gateway command implementation

use crate::cli::serve::shutdown_signal;
use crate::cli::{load_config, ServeArgs};
use crate::config::PosterConfig;
use crate::gateway::{create_router, GatewayState};
use crate::logging::init_tracing;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Load configuration with CLI overrides applied to `[gateway]`
pub fn load_gateway_config(args: &ServeArgs) -> Result<PosterConfig, Box<dyn std::error::Error>> {
    let mut config = load_config(&args.config)?;

    if let Some(port) = args.port {
        config.gateway.port = port;
    }
    if let Some(ref host) = args.host {
        config.gateway.host = host.clone();
    }
    if let Some(ref log_level) = args.log_level {
        config.logging.level = log_level.clone();
    }

    config.validate()?;
    Ok(config)
}

pub async fn run_gateway(args: ServeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_gateway_config(&args)?;
    init_tracing(&config.logging)?;

    let state = GatewayState::from_config(&config, reqwest::Client::new())?;
    tracing::info!(
        enabled = ?state.enabled(),
        disabled = ?state.disabled(),
        "Starting LLM gateway"
    );

    let app = create_router(Arc::new(state));
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "LLM gateway listening");

    let cancel_token = CancellationToken::new();
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancel_token))
        .await?;

    tracing::info!("LLM gateway stopped");
    Ok(())
}
