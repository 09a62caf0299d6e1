//! Web server module for the signal webhook.
//!
//! This module provides the HTTP surface:
//! - `POST /webhook`: authenticated trading signals
//! - `GET /health`: liveness check

pub mod handlers;
pub mod signature;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

pub use handlers::{health, signal_webhook, AppState, HealthResponse, WebhookResponse};
pub use signature::{sign_body, verify_signature, SIGNATURE_HEADER};

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/webhook", post(signal_webhook))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
