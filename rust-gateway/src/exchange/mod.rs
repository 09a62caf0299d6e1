//! Exchange clients for order placement.
//!
//! The webhook handler only sees the [`Exchange`] trait. Two implementations
//! exist:
//! - [`BitgetClient`]: signed REST calls to Bitget
//! - [`DryRunExchange`]: logs and acknowledges without any network I/O

pub mod bitget;

use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use crate::signal::{Side, TradingSignal};

pub use bitget::BitgetClient;

/// Failures talking to the exchange. None of these are retried.
#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("exchange request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("exchange returned HTTP {0}")]
    Status(u16),

    #[error("exchange rejected order: code={code} msg={msg}")]
    Rejected { code: String, msg: String },

    #[error("malformed exchange response: {0}")]
    InvalidResponse(String),

    #[error("invalid exchange url: {0}")]
    Url(#[from] url::ParseError),

    #[error("unsupported symbol format")]
    Symbol,

    #[error("failed to sign exchange request")]
    Signing,
}

impl ExchangeError {
    /// Short, content-free code for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ExchangeError::Transport(e) if e.is_timeout() => "timeout",
            ExchangeError::Transport(_) => "transport",
            ExchangeError::Status(_) => "http_status",
            ExchangeError::Rejected { .. } => "rejected",
            ExchangeError::InvalidResponse(_) => "invalid_response",
            ExchangeError::Url(_) => "invalid_url",
            ExchangeError::Symbol => "invalid_symbol",
            ExchangeError::Signing => "signing",
        }
    }
}

/// A market order derived from a trading signal.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRequest {
    /// Unified symbol, e.g. `BTC/USDT`
    pub symbol: String,
    pub side: Side,
    /// Amount in base coin
    pub size: f64,
    pub take_profit: Option<f64>,
    pub stop_loss: Option<f64>,
}

impl From<&TradingSignal> for OrderRequest {
    fn from(signal: &TradingSignal) -> Self {
        Self {
            symbol: signal.symbol.clone(),
            side: signal.side,
            size: signal.amount,
            take_profit: signal.take_profit,
            stop_loss: signal.stop_loss,
        }
    }
}

/// Acknowledgement of an accepted order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderReceipt {
    pub order_id: String,
}

#[async_trait]
pub trait Exchange: Send + Sync {
    /// Exchange identifier used in logs (e.g. "bitget", "dry_run")
    fn name(&self) -> &'static str;

    /// Place a market order with optional take-profit / stop-loss.
    async fn place_market_order(&self, order: &OrderRequest) -> Result<OrderReceipt, ExchangeError>;
}

/// Exchange stand-in used when `DRY_RUN` is enabled.
#[derive(Debug, Default, Clone)]
pub struct DryRunExchange;

#[async_trait]
impl Exchange for DryRunExchange {
    fn name(&self) -> &'static str {
        "dry_run"
    }

    async fn place_market_order(&self, order: &OrderRequest) -> Result<OrderReceipt, ExchangeError> {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();

        let order_id = format!("dry-run-{}", millis);

        info!(
            order_id = %order_id,
            has_take_profit = order.take_profit.is_some(),
            has_stop_loss = order.stop_loss.is_some(),
            "dry_run_order_skipped"
        );

        Ok(OrderReceipt { order_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_request_from_signal() {
        let signal = TradingSignal {
            symbol: "ETH/USDT".to_string(),
            side: Side::Sell,
            amount: 2.0,
            take_profit: None,
            stop_loss: Some(2500.0),
        };

        let order = OrderRequest::from(&signal);
        assert_eq!(order.symbol, "ETH/USDT");
        assert_eq!(order.side, Side::Sell);
        assert_eq!(order.size, 2.0);
        assert_eq!(order.stop_loss, Some(2500.0));
    }

    #[tokio::test]
    async fn test_dry_run_returns_synthetic_id() {
        let order = OrderRequest {
            symbol: "BTC/USDT".to_string(),
            side: Side::Buy,
            size: 1.0,
            take_profit: None,
            stop_loss: None,
        };

        let receipt = DryRunExchange.place_market_order(&order).await.unwrap();
        assert!(receipt.order_id.starts_with("dry-run-"));
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(ExchangeError::Status(502).kind(), "http_status");
        assert_eq!(
            ExchangeError::Rejected {
                code: "43012".to_string(),
                msg: "Insufficient balance".to_string()
            }
            .kind(),
            "rejected"
        );
        assert_eq!(ExchangeError::Symbol.kind(), "invalid_symbol");
        assert_eq!(ExchangeError::Signing.kind(), "signing");
    }
}
