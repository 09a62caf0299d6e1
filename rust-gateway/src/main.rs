//! AlphaGate Web Server - authenticated trading-signal webhook.
//!
//! This binary:
//! - Refuses to start unless all four secrets are present
//! - Verifies the HMAC signature of every signal
//! - Forwards valid signals to Bitget (or the dry-run exchange)

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use tokio::{net::TcpListener, signal};
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use alphagate::web::router;
use alphagate::{AppState, BitgetClient, Config, DryRunExchange, Exchange, Notifier};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured JSON logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    info!("web_server_starting");

    // Fail fast before binding if any secret is missing
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "config_invalid");
            return Err(e).context("Refusing to start");
        }
    };

    info!(
        port = config.port,
        dry_run = config.dry_run,
        signal_max_age_seconds = config.signal_max_age_secs,
        whitelist_size = config.symbol_whitelist.len(),
        blacklist_size = config.symbol_blacklist.len(),
        discord_configured = config.discord_webhook_url.is_some(),
        telegram_configured = config.telegram_bot_token.is_some() && config.telegram_chat_id.is_some(),
        "config_loaded"
    );

    let http = Client::builder()
        .timeout(Duration::from_millis(config.request_timeout_ms))
        .pool_max_idle_per_host(16)
        .build()
        .context("Failed to create HTTP client")?;

    let exchange: Arc<dyn Exchange> = if config.dry_run {
        Arc::new(DryRunExchange)
    } else {
        Arc::new(
            BitgetClient::new(http.clone(), &config.bitget_base_url, &config.secrets)
                .context("Failed to create Bitget client")?,
        )
    };
    info!(exchange = exchange.name(), "exchange_client_created");

    let notifier = Notifier::from_config(http, &config);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let app = router(AppState::new(config, exchange, notifier));

    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(address = %addr, "web_server_listening");

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("web_server_shutdown_complete");

    Ok(())
}

/// Create a future that completes when a shutdown signal is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }

    info!("web_server_shutting_down");
}
