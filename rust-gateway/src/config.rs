//! Configuration module for environment variable parsing.
//!
//! The four exchange/webhook secrets are mandatory: startup fails, naming every
//! missing variable, before the listener is bound. Everything else has a default.

use std::env;
use std::fmt;

use thiserror::Error;
use tracing::warn;

pub const BITGET_API_KEY: &str = "BITGET_API_KEY";
pub const BITGET_SECRET_KEY: &str = "BITGET_SECRET_KEY";
pub const BITGET_PASSPHRASE: &str = "BITGET_PASSPHRASE";
pub const ALPHAGATE_HMAC_SECRET: &str = "ALPHAGATE_HMAC_SECRET";

/// Required variables, in the order they are reported when missing.
pub const REQUIRED_VARS: [&str; 4] = [
    BITGET_API_KEY,
    BITGET_SECRET_KEY,
    BITGET_PASSPHRASE,
    ALPHAGATE_HMAC_SECRET,
];

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_BITGET_BASE_URL: &str = "https://api.bitget.com";

/// Fatal startup errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable(s): {}", .0.join(", "))]
    MissingVars(Vec<&'static str>),
}

/// Credentials and the webhook signing secret.
///
/// Loaded once at startup and never mutated. `Debug` is redacted so the
/// struct can be logged or printed in panics without leaking anything.
#[derive(Clone)]
pub struct Secrets {
    pub api_key: String,
    pub secret_key: String,
    pub passphrase: String,
    pub hmac_secret: String,
}

impl fmt::Debug for Secrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secrets")
            .field("api_key", &"<redacted>")
            .field("secret_key", &"<redacted>")
            .field("passphrase", &"<redacted>")
            .field("hmac_secret", &"<redacted>")
            .finish()
    }
}

/// Application configuration loaded from environment variables.
///
/// `Debug` redacts the notification targets as well: the Discord URL embeds
/// its webhook token and the Telegram bot token is a credential.
#[derive(Clone)]
pub struct Config {
    pub secrets: Secrets,

    /// Port for the web server to listen on
    pub port: u16,

    /// Log orders instead of sending them to the exchange
    pub dry_run: bool,

    /// Signals whose `timestamp` is older than this are ignored
    pub signal_max_age_secs: u64,

    /// Bitget REST API base URL
    pub bitget_base_url: String,

    /// Outbound HTTP request timeout in milliseconds
    pub request_timeout_ms: u64,

    /// When non-empty, only these symbols are traded
    pub symbol_whitelist: Vec<String>,

    /// Symbols that are never traded
    pub symbol_blacklist: Vec<String>,

    pub discord_webhook_url: Option<String>,
    pub telegram_bot_token: Option<String>,
    pub telegram_chat_id: Option<String>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "<redacted>");

        f.debug_struct("Config")
            .field("secrets", &self.secrets)
            .field("port", &self.port)
            .field("dry_run", &self.dry_run)
            .field("signal_max_age_secs", &self.signal_max_age_secs)
            .field("bitget_base_url", &self.bitget_base_url)
            .field("request_timeout_ms", &self.request_timeout_ms)
            .field("symbol_whitelist", &self.symbol_whitelist)
            .field("symbol_blacklist", &self.symbol_blacklist)
            .field("discord_webhook_url", &redact(&self.discord_webhook_url))
            .field("telegram_bot_token", &redact(&self.telegram_bot_token))
            .field("telegram_chat_id", &self.telegram_chat_id)
            .finish()
    }
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let missing: Vec<&'static str> = REQUIRED_VARS
            .iter()
            .copied()
            .filter(|name| required(*name).is_none())
            .collect();

        if !missing.is_empty() {
            return Err(ConfigError::MissingVars(missing));
        }

        let secrets = Secrets {
            api_key: required(BITGET_API_KEY).unwrap_or_default(),
            secret_key: required(BITGET_SECRET_KEY).unwrap_or_default(),
            passphrase: required(BITGET_PASSPHRASE).unwrap_or_default(),
            hmac_secret: required(ALPHAGATE_HMAC_SECRET).unwrap_or_default(),
        };

        Ok(Config {
            secrets,

            port: parse_or(&lookup, "PORT", DEFAULT_PORT),

            dry_run: parse_bool(&lookup, "DRY_RUN", false),

            signal_max_age_secs: parse_or(&lookup, "SIGNAL_MAX_AGE_SECONDS", 60),

            bitget_base_url: non_empty(&lookup, "BITGET_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BITGET_BASE_URL.to_string()),

            request_timeout_ms: parse_or(&lookup, "REQUEST_TIMEOUT_MS", 10_000),

            symbol_whitelist: parse_csv(&lookup, "SYMBOL_WHITELIST"),

            symbol_blacklist: parse_csv(&lookup, "SYMBOL_BLACKLIST"),

            discord_webhook_url: non_empty(&lookup, "DISCORD_WEBHOOK_URL"),
            telegram_bot_token: non_empty(&lookup, "TELEGRAM_BOT_TOKEN"),
            telegram_chat_id: non_empty(&lookup, "TELEGRAM_CHAT_ID"),
        })
    }
}

fn non_empty<F>(lookup: &F, name: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse a value, warning and falling back to `default` if it is malformed.
fn parse_or<F, T>(lookup: &F, name: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    let Some(raw) = non_empty(lookup, name) else {
        return default;
    };

    match raw.parse() {
        Ok(v) => v,
        Err(_) => {
            warn!(env_var = name, value = %raw, "Invalid value, using default");
            default
        }
    }
}

fn parse_bool<F>(lookup: &F, name: &str, default: bool) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = non_empty(lookup, name) else {
        return default;
    };

    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => {
            warn!(env_var = name, value = %raw, "Invalid boolean, using default");
            default
        }
    }
}

/// Parse a comma-separated list of strings.
fn parse_csv<F>(lookup: &F, name: &str) -> Vec<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|raw| {
            raw.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    fn required() -> Vec<(&'static str, &'static str)> {
        vec![
            (BITGET_API_KEY, "key"),
            (BITGET_SECRET_KEY, "secret"),
            (BITGET_PASSPHRASE, "pass"),
            (ALPHAGATE_HMAC_SECRET, "hmac"),
        ]
    }

    #[test]
    fn test_all_required_present() {
        let config = Config::from_lookup(lookup_from(&required())).unwrap();
        assert_eq!(config.secrets.api_key, "key");
        assert_eq!(config.secrets.hmac_secret, "hmac");
        assert_eq!(config.port, 8000);
        assert!(!config.dry_run);
        assert_eq!(config.signal_max_age_secs, 60);
        assert_eq!(config.bitget_base_url, DEFAULT_BITGET_BASE_URL);
        assert!(config.symbol_whitelist.is_empty());
        assert!(config.discord_webhook_url.is_none());
    }

    #[test]
    fn test_each_missing_var_is_fatal() {
        for name in REQUIRED_VARS {
            let pairs: Vec<_> = required().into_iter().filter(|(k, _)| *k != name).collect();
            let err = Config::from_lookup(lookup_from(&pairs)).unwrap_err();
            assert_eq!(err, ConfigError::MissingVars(vec![name]));
            assert!(err.to_string().contains(name));
        }
    }

    #[test]
    fn test_empty_var_counts_as_missing() {
        let mut pairs = required();
        pairs[1] = (BITGET_SECRET_KEY, "");
        pairs[3] = (ALPHAGATE_HMAC_SECRET, "   ");
        let err = Config::from_lookup(lookup_from(&pairs)).unwrap_err();
        assert_eq!(
            err,
            ConfigError::MissingVars(vec![BITGET_SECRET_KEY, ALPHAGATE_HMAC_SECRET])
        );
    }

    #[test]
    fn test_nothing_set_names_all_vars() {
        let err = Config::from_lookup(|_| None).unwrap_err();
        let msg = err.to_string();
        for name in REQUIRED_VARS {
            assert!(msg.contains(name));
        }
    }

    #[test]
    fn test_optional_overrides() {
        let mut pairs = required();
        pairs.extend([
            ("PORT", "9000"),
            ("DRY_RUN", "true"),
            ("SIGNAL_MAX_AGE_SECONDS", "120"),
            ("SYMBOL_WHITELIST", "BTC/USDT, ETH/USDT"),
            ("SYMBOL_BLACKLIST", "DOGE/USDT"),
            ("TELEGRAM_BOT_TOKEN", "bot"),
            ("TELEGRAM_CHAT_ID", "42"),
        ]);
        let config = Config::from_lookup(lookup_from(&pairs)).unwrap();
        assert_eq!(config.port, 9000);
        assert!(config.dry_run);
        assert_eq!(config.signal_max_age_secs, 120);
        assert_eq!(config.symbol_whitelist, vec!["BTC/USDT", "ETH/USDT"]);
        assert_eq!(config.symbol_blacklist, vec!["DOGE/USDT"]);
        assert_eq!(config.telegram_chat_id.as_deref(), Some("42"));
    }

    #[test]
    fn test_invalid_optional_uses_default() {
        let mut pairs = required();
        pairs.extend([("PORT", "not-a-port"), ("DRY_RUN", "maybe")]);
        let config = Config::from_lookup(lookup_from(&pairs)).unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
        assert!(!config.dry_run);
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let mut pairs = required();
        pairs.extend([
            ("DISCORD_WEBHOOK_URL", "https://discord.com/api/webhooks/1/WEBHOOKTOKEN"),
            ("TELEGRAM_BOT_TOKEN", "123456:SUPERSECRETBOT"),
            ("TELEGRAM_CHAT_ID", "42"),
        ]);
        let config = Config::from_lookup(lookup_from(&pairs)).unwrap();
        let printed = format!("{:?}", config);

        assert!(printed.contains("<redacted>"));
        assert!(!printed.contains("\"hmac\""));
        assert!(!printed.contains("\"secret\""));
        assert!(!printed.contains("\"pass\""));
        assert!(!printed.contains("WEBHOOKTOKEN"));
        assert!(!printed.contains("SUPERSECRETBOT"));
        assert!(printed.contains("telegram_chat_id: Some(\"42\")"));
    }

    #[test]
    fn test_debug_unset_targets_print_none() {
        let config = Config::from_lookup(lookup_from(&required())).unwrap();
        let printed = format!("{:?}", config);
        assert!(printed.contains("discord_webhook_url: None"));
        assert!(printed.contains("telegram_bot_token: None"));
    }
}
