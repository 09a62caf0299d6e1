//! Webhook endpoint handlers.
//!
//! The signal handler:
//! 1. Verifies the body signature
//! 2. Parses and filters the signal
//! 3. Forwards it to the exchange
//!
//! Only event names, status codes, and sizes are logged. Signal fields
//! (symbol, side, size, prices) never reach the logs or the response.

use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::exchange::{Exchange, OrderRequest};
use crate::notify::{Notifier, NotifyLevel};
use crate::signal::{SignalEnvelope, SymbolFilter};
use crate::web::signature::{verify_signature, SIGNATURE_HEADER};
use crate::Config;

/// Shared application state. Read-only after startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub exchange: Arc<dyn Exchange>,
    pub notifier: Notifier,
    pub filter: Arc<SymbolFilter>,
}

impl AppState {
    pub fn new(config: Config, exchange: Arc<dyn Exchange>, notifier: Notifier) -> Self {
        let filter = SymbolFilter::from_config(&config);
        Self {
            config: Arc::new(config),
            exchange,
            notifier,
            filter: Arc::new(filter),
        }
    }
}

// =============================================================================
// Health Check
// =============================================================================

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// =============================================================================
// Signal Webhook
// =============================================================================

/// Webhook response. Never carries signal content.
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub status: &'static str,
}

fn reply(code: StatusCode, status: &'static str) -> (StatusCode, Json<WebhookResponse>) {
    (code, Json(WebhookResponse { status }))
}

fn now_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

/// Trading signal webhook endpoint.
pub async fn signal_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let started = Instant::now();
    let signature = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok());

    info!(
        body_length = body.len(),
        has_signature = signature.is_some(),
        "signal_webhook_received"
    );

    if !verify_signature(&state.config.secrets.hmac_secret, &body, signature) {
        warn!(status_code = 401, "signal_webhook_unauthorized");
        return reply(StatusCode::UNAUTHORIZED, "unauthorized");
    }

    let envelope: SignalEnvelope = match serde_json::from_slice(&body) {
        Ok(e) => e,
        Err(e) => {
            warn!(
                status_code = 400,
                line = e.line(),
                column = e.column(),
                "signal_payload_malformed"
            );
            return reply(StatusCode::BAD_REQUEST, "invalid_payload");
        }
    };

    if envelope.dust {
        info!("signal_heartbeat_received");
        return reply(StatusCode::OK, "ok");
    }

    if envelope.is_expired(now_secs(), state.config.signal_max_age_secs) {
        warn!(
            max_age_seconds = state.config.signal_max_age_secs,
            "signal_expired"
        );
        return reply(StatusCode::OK, "expired");
    }

    if !envelope.has_trade_fields() {
        info!("signal_not_actionable");
        return reply(StatusCode::OK, "ignored");
    }

    let signal = match envelope.into_signal() {
        Ok(s) => s,
        Err(e) => {
            warn!(status_code = 400, reason = %e, "signal_payload_invalid");
            return reply(StatusCode::BAD_REQUEST, "invalid_payload");
        }
    };

    if !state.filter.allows(&signal.symbol) {
        info!("signal_symbol_filtered");
        state.notifier.spawn_notify(
            NotifyLevel::Info,
            format!("Signal for {} IGNORED (symbol filter)", signal.symbol),
        );
        return reply(StatusCode::OK, "ignored");
    }

    let order = OrderRequest::from(&signal);

    match state.exchange.place_market_order(&order).await {
        Ok(receipt) => {
            info!(
                exchange = state.exchange.name(),
                order_id = %receipt.order_id,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "signal_order_placed"
            );
            state.notifier.spawn_notify(
                NotifyLevel::Success,
                format!(
                    "{} {} {} placed (order {})",
                    signal.side.as_str().to_uppercase(),
                    signal.amount,
                    signal.symbol,
                    receipt.order_id
                ),
            );
            reply(StatusCode::OK, "ok")
        }
        Err(e) => {
            error!(
                exchange = state.exchange.name(),
                error_kind = e.kind(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "signal_order_failed"
            );
            state.notifier.spawn_notify(
                NotifyLevel::Error,
                format!("Order for {} failed: {}", signal.symbol, e.kind()),
            );
            reply(StatusCode::INTERNAL_SERVER_ERROR, "error")
        }
    }
}
