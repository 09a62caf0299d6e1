//! Best-effort trade notifications to Discord and Telegram.
//!
//! Failures are logged and swallowed: a notification can never change the
//! outcome of a webhook request.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde_json::json;
use tracing::{info, warn};

use crate::Config;

const NOTIFY_TIMEOUT: Duration = Duration::from_secs(5);
const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyLevel {
    Success,
    Error,
    Info,
}

impl NotifyLevel {
    fn prefix(&self) -> &'static str {
        match self {
            NotifyLevel::Success => "✅ ",
            NotifyLevel::Error => "❌ ",
            NotifyLevel::Info => "ℹ️ ",
        }
    }
}

/// Format a notification line.
pub fn format_message(level: NotifyLevel, message: &str) -> String {
    format!("**[AlphaGate]** {}{}", level.prefix(), message)
}

struct TelegramTarget {
    api_base: String,
    bot_token: String,
    chat_id: String,
}

/// Notification fan-out. Cloning shares the HTTP pool and targets.
#[derive(Clone)]
pub struct Notifier {
    client: Client,
    discord_url: Option<Arc<str>>,
    telegram: Option<Arc<TelegramTarget>>,
}

impl Notifier {
    pub fn new(
        client: Client,
        discord_url: Option<String>,
        telegram: Option<(String, String)>,
    ) -> Self {
        Self::with_telegram_base(client, discord_url, telegram, TELEGRAM_API_BASE)
    }

    /// Same as [`Notifier::new`] with a custom Telegram API host.
    pub fn with_telegram_base(
        client: Client,
        discord_url: Option<String>,
        telegram: Option<(String, String)>,
        api_base: &str,
    ) -> Self {
        Self {
            client,
            discord_url: discord_url.map(Arc::from),
            telegram: telegram.map(|(bot_token, chat_id)| {
                Arc::new(TelegramTarget {
                    api_base: api_base.trim_end_matches('/').to_string(),
                    bot_token,
                    chat_id,
                })
            }),
        }
    }

    pub fn from_config(client: Client, config: &Config) -> Self {
        let telegram = match (&config.telegram_bot_token, &config.telegram_chat_id) {
            (Some(token), Some(chat)) => Some((token.clone(), chat.clone())),
            _ => None,
        };
        Self::new(client, config.discord_webhook_url.clone(), telegram)
    }

    /// A notifier with no targets.
    pub fn disabled(client: Client) -> Self {
        Self::new(client, None, None)
    }

    pub fn is_enabled(&self) -> bool {
        self.discord_url.is_some() || self.telegram.is_some()
    }

    /// Send `message` to every configured target concurrently.
    ///
    /// Returns the number of targets that accepted the message.
    pub async fn notify(&self, level: NotifyLevel, message: &str) -> usize {
        if !self.is_enabled() {
            return 0;
        }

        let text = format_message(level, message);

        let discord = async {
            match &self.discord_url {
                Some(url) => self.post_json("discord", url, json!({ "content": text })).await,
                None => false,
            }
        };

        let telegram = async {
            match &self.telegram {
                Some(target) => {
                    let url = format!("{}/bot{}/sendMessage", target.api_base, target.bot_token);
                    self.post_json(
                        "telegram",
                        &url,
                        json!({ "chat_id": target.chat_id, "text": text }),
                    )
                    .await
                }
                None => false,
            }
        };

        let (discord_ok, telegram_ok) = futures::future::join(discord, telegram).await;
        let delivered = usize::from(discord_ok) + usize::from(telegram_ok);

        info!(level = ?level, delivered = delivered, "notification_sent");

        delivered
    }

    /// Fire-and-forget variant used from request handlers.
    pub fn spawn_notify(&self, level: NotifyLevel, message: String) {
        if !self.is_enabled() {
            return;
        }
        let notifier = self.clone();
        tokio::spawn(async move {
            notifier.notify(level, &message).await;
        });
    }

    async fn post_json(&self, target: &'static str, url: &str, payload: serde_json::Value) -> bool {
        match self
            .client
            .post(url)
            .timeout(NOTIFY_TIMEOUT)
            .json(&payload)
            .send()
            .await
        {
            Ok(resp) if resp.status().is_success() => true,
            Ok(resp) => {
                warn!(
                    target_name = target,
                    status_code = resp.status().as_u16(),
                    "notification_rejected"
                );
                false
            }
            Err(e) => {
                // reqwest errors embed the URL, which carries the bot token
                warn!(
                    target_name = target,
                    is_timeout = e.is_timeout(),
                    "notification_failed"
                );
                false
            }
        }
    }
}
