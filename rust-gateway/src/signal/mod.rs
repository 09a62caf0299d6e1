//! Trading signal payloads and the symbol filter applied before trading.
//!
//! ## Flow
//!
//! ```text
//! raw body → SignalEnvelope → (heartbeat | expired | TradingSignal) → SymbolFilter → OrderRequest
//! ```

pub mod filter;
pub mod types;

pub use filter::SymbolFilter;
pub use types::{Side, SignalEnvelope, SignalError, TradingSignal};
