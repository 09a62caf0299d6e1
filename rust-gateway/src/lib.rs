//! AlphaGate - authenticated trading-signal relay.
//!
//! Receives signed trading signals over a webhook, verifies their HMAC
//! signature, and forwards them as market orders to Bitget.
//!
//! ## Architecture
//!
//! ```text
//! Signal provider → POST /webhook → signature check → SignalEnvelope → Exchange → Bitget
//!                                                                    ↘ Notifier → Discord / Telegram
//! ```

pub mod config;
pub mod exchange;
pub mod notify;
pub mod signal;
pub mod web;

// Re-export commonly used types
pub use config::{Config, ConfigError};
pub use exchange::{BitgetClient, DryRunExchange, Exchange, ExchangeError, OrderReceipt, OrderRequest};
pub use notify::{Notifier, NotifyLevel};
pub use signal::{Side, SignalEnvelope, SymbolFilter, TradingSignal};
pub use web::AppState;
