//! Trading signal payload types.
//!
//! A webhook body is first decoded into a loose [`SignalEnvelope`] so that
//! heartbeats and stale signals can be recognised before the trade fields are
//! required. [`SignalEnvelope::into_signal`] then produces a validated
//! [`TradingSignal`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Order direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    #[serde(alias = "BUY", alias = "Buy")]
    Buy,
    #[serde(alias = "SELL", alias = "Sell")]
    Sell,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "buy",
            Side::Sell => "sell",
        }
    }
}

/// Reasons an authenticated payload cannot become a trade.
#[derive(Debug, Error, PartialEq)]
pub enum SignalError {
    #[error("missing field: {0}")]
    MissingField(&'static str),

    #[error("invalid value for field: {0}")]
    InvalidValue(&'static str),
}

/// Raw signal as sent by the signal provider.
///
/// Every field is optional at this stage.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignalEnvelope {
    /// Heartbeat marker, no trade is placed
    #[serde(default)]
    pub dust: bool,

    /// Unix epoch seconds when the signal was emitted
    #[serde(default)]
    pub timestamp: Option<f64>,

    /// Unified market symbol, e.g. `BTC/USDT`
    #[serde(default)]
    pub symbol: Option<String>,

    #[serde(default)]
    pub side: Option<Side>,

    /// Order size in base currency
    #[serde(default)]
    pub entry: Option<f64>,

    /// Take-profit price
    #[serde(default)]
    pub tp: Option<f64>,

    /// Stop-loss price
    #[serde(default)]
    pub sl: Option<f64>,
}

impl SignalEnvelope {
    /// Whether the signal was emitted more than `max_age_secs` before `now_secs`.
    ///
    /// Signals without a timestamp (or with a zero timestamp) never expire.
    pub fn is_expired(&self, now_secs: f64, max_age_secs: u64) -> bool {
        match self.timestamp {
            Some(ts) if ts > 0.0 => now_secs - ts > max_age_secs as f64,
            _ => false,
        }
    }

    /// Whether any trade field is present at all.
    ///
    /// Bodies with none of `symbol`, `side`, `entry` are not trade requests.
    pub fn has_trade_fields(&self) -> bool {
        self.symbol.is_some() || self.side.is_some() || self.entry.is_some()
    }

    /// Validate the trade fields.
    pub fn into_signal(self) -> Result<TradingSignal, SignalError> {
        let symbol = self
            .symbol
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or(SignalError::MissingField("symbol"))?;

        let side = self.side.ok_or(SignalError::MissingField("side"))?;

        let amount = self.entry.ok_or(SignalError::MissingField("entry"))?;
        if !amount.is_finite() || amount <= 0.0 {
            return Err(SignalError::InvalidValue("entry"));
        }

        Ok(TradingSignal {
            symbol,
            side,
            amount,
            take_profit: optional_price(self.tp, "tp")?,
            stop_loss: optional_price(self.sl, "sl")?,
        })
    }
}

/// Zero means "not set", negative or non-finite prices are rejected.
fn optional_price(value: Option<f64>, field: &'static str) -> Result<Option<f64>, SignalError> {
    match value {
        None => Ok(None),
        Some(v) if v == 0.0 => Ok(None),
        Some(v) if v.is_finite() && v > 0.0 => Ok(Some(v)),
        Some(_) => Err(SignalError::InvalidValue(field)),
    }
}

/// A validated trading signal, ready to become an order.
#[derive(Debug, Clone, PartialEq)]
pub struct TradingSignal {
    pub symbol: String,
    pub side: Side,
    pub amount: f64,
    pub take_profit: Option<f64>,
    pub stop_loss: Option<f64>,
}
