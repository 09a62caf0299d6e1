//! Bitget REST client.
//!
//! Requests are signed as Bitget's v2 API requires:
//! `ACCESS-SIGN = base64(HMAC-SHA256(secret_key, timestamp + METHOD + path + body))`
//! with the timestamp in unix milliseconds.
//! Reference: https://www.bitget.com/api-doc/common/signature

use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::{error, info, warn};
use url::Url;

use super::{Exchange, ExchangeError, OrderReceipt, OrderRequest};
use crate::config::Secrets;
use crate::signal::Side;

type HmacSha256 = Hmac<Sha256>;

pub const PLACE_ORDER_PATH: &str = "/api/v2/spot/trade/place-order";
pub const TICKER_PATH: &str = "/api/v2/spot/market/tickers";

/// Bitget's success code in the response envelope.
const SUCCESS_CODE: &str = "00000";

/// Signed Bitget spot-trading client.
///
/// Cheap to clone; the underlying `reqwest::Client` shares its pool.
#[derive(Clone)]
pub struct BitgetClient {
    http: Client,
    base_url: Url,
    api_key: String,
    secret_key: String,
    passphrase: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PlaceOrderBody {
    symbol: String,
    side: &'static str,
    order_type: &'static str,
    force: &'static str,
    size: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    preset_take_profit_price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    preset_stop_loss_price: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    code: String,
    #[serde(default)]
    msg: String,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaceOrderData {
    order_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TickerData {
    last_pr: String,
}

impl BitgetClient {
    pub fn new(http: Client, base_url: &str, secrets: &Secrets) -> Result<Self, ExchangeError> {
        Ok(Self {
            http,
            base_url: Url::parse(base_url)?,
            api_key: secrets.api_key.clone(),
            secret_key: secrets.secret_key.clone(),
            passphrase: secrets.passphrase.clone(),
        })
    }

    async fn signed_post(&self, path: &str, body: String) -> Result<String, ExchangeError> {
        let url = self.base_url.join(path)?;
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis()
            .to_string();

        let signature = sign_request(&self.secret_key, &timestamp, "POST", path, &body)?;

        let response = self
            .http
            .post(url)
            .header("ACCESS-KEY", &self.api_key)
            .header("ACCESS-SIGN", signature)
            .header("ACCESS-TIMESTAMP", &timestamp)
            .header("ACCESS-PASSPHRASE", &self.passphrase)
            .header("Content-Type", "application/json")
            .header("locale", "en-US")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        // Bitget reports most rejections as 4xx with a JSON envelope, so the
        // envelope is preferred over the bare status when it parses.
        if !status.is_success() && serde_json::from_str::<Envelope<serde_json::Value>>(&text).is_err() {
            return Err(ExchangeError::Status(status.as_u16()));
        }

        Ok(text)
    }

    /// Last traded price for a venue symbol. Public endpoint, unsigned.
    async fn last_price(&self, venue_symbol: &str) -> Result<f64, ExchangeError> {
        let mut url = self.base_url.join(TICKER_PATH)?;
        url.query_pairs_mut().append_pair("symbol", venue_symbol);

        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ExchangeError::Status(status.as_u16()));
        }

        let envelope: Envelope<Vec<TickerData>> = response
            .json()
            .await
            .map_err(|e| ExchangeError::InvalidResponse(e.to_string()))?;

        if envelope.code != SUCCESS_CODE {
            return Err(ExchangeError::Rejected {
                code: envelope.code,
                msg: envelope.msg,
            });
        }

        envelope
            .data
            .and_then(|tickers| tickers.into_iter().next())
            .and_then(|t| t.last_pr.parse::<f64>().ok())
            .filter(|p| p.is_finite() && *p > 0.0)
            .ok_or_else(|| ExchangeError::InvalidResponse("missing last price".to_string()))
    }

    /// Bitget reads `size` as quote coin for market buys and base coin for
    /// market sells, while signals always carry a base-coin amount.
    async fn venue_size(&self, venue_symbol: &str, order: &OrderRequest) -> Result<String, ExchangeError> {
        match order.side {
            Side::Sell => Ok(format_amount(order.size)),
            Side::Buy => {
                let last = self.last_price(venue_symbol).await?;
                Ok(format_amount(order.size * last))
            }
        }
    }
}

#[async_trait]
impl Exchange for BitgetClient {
    fn name(&self) -> &'static str {
        "bitget"
    }

    async fn place_market_order(&self, order: &OrderRequest) -> Result<OrderReceipt, ExchangeError> {
        let symbol = to_venue_symbol(&order.symbol)?;
        let size = self.venue_size(&symbol, order).await?;

        let body = PlaceOrderBody {
            symbol,
            side: order.side.as_str(),
            order_type: "market",
            force: "gtc",
            size,
            preset_take_profit_price: order.take_profit.map(|p| p.to_string()),
            preset_stop_loss_price: order.stop_loss.map(|p| p.to_string()),
        };

        let body = serde_json::to_string(&body)
            .map_err(|e| ExchangeError::InvalidResponse(e.to_string()))?;

        let text = self.signed_post(PLACE_ORDER_PATH, body).await?;

        let envelope: Envelope<PlaceOrderData> = serde_json::from_str(&text)
            .map_err(|e| ExchangeError::InvalidResponse(e.to_string()))?;

        if envelope.code != SUCCESS_CODE {
            error!(code = %envelope.code, "bitget_order_rejected");
            return Err(ExchangeError::Rejected {
                code: envelope.code,
                msg: envelope.msg,
            });
        }

        let data = envelope
            .data
            .ok_or_else(|| ExchangeError::InvalidResponse("missing data".to_string()))?;

        info!(order_id = %data.order_id, "bitget_order_accepted");

        Ok(OrderReceipt {
            order_id: data.order_id,
        })
    }
}

/// Compute the base64 `ACCESS-SIGN` header value.
pub fn sign_request(
    secret_key: &str,
    timestamp: &str,
    method: &str,
    path: &str,
    body: &str,
) -> Result<String, ExchangeError> {
    let mut mac = match HmacSha256::new_from_slice(secret_key.as_bytes()) {
        Ok(m) => m,
        Err(_) => {
            warn!("bitget_signing_invalid_key");
            return Err(ExchangeError::Signing);
        }
    };
    mac.update(timestamp.as_bytes());
    mac.update(method.to_ascii_uppercase().as_bytes());
    mac.update(path.as_bytes());
    mac.update(body.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

/// Render an amount with at most 8 decimals.
fn format_amount(value: f64) -> String {
    ((value * 1e8).round() / 1e8).to_string()
}

/// Convert a unified symbol (`BTC/USDT`, `BTC/USDT:USDT`) to Bitget's `BTCUSDT`.
///
/// Symbols already in venue form are passed through uppercased.
pub fn to_venue_symbol(symbol: &str) -> Result<String, ExchangeError> {
    let market = symbol.trim().split(':').next().unwrap_or_default();

    let venue: String = match market.split_once('/') {
        Some((base, quote)) if !base.is_empty() && !quote.is_empty() => format!("{}{}", base, quote),
        Some(_) => return Err(ExchangeError::Symbol),
        None => market.to_string(),
    };

    if venue.is_empty() || !venue.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ExchangeError::Symbol);
    }

    Ok(venue.to_ascii_uppercase())
}
