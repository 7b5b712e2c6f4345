use crate::error::ConfigError;

pub const DEFAULT_PORT: u16 = 8080;
const DEFAULT_BOT_LINK: &str = "https://t.me/vxrelay_bot";

/// How the bot receives updates from Telegram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Long-poll `getUpdates` directly. No public endpoint required.
    Poll,
    /// Serve a publicly reachable webhook gateway.
    Webhook,
}

/// Runtime configuration, sourced from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub bot_token: String,
    pub port: u16,
    pub mode: Mode,
    pub webhook_domain: Option<String>,
    /// t.me link shown on the landing page.
    pub bot_link: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bot_token = lookup("BOT_TOKEN")
            .filter(|token| !token.is_empty())
            .ok_or(ConfigError::MissingToken)?;

        let port = match lookup("PORT") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidPort(raw))?,
            None => DEFAULT_PORT,
        };

        let mode = match lookup("VXRELAY_MODE")
            .map(|m| m.to_ascii_lowercase())
            .as_deref()
        {
            None | Some("poll") => Mode::Poll,
            Some("webhook") => Mode::Webhook,
            Some(other) => return Err(ConfigError::InvalidMode(other.to_string())),
        };

        let webhook_domain = lookup("VXRELAY_WEBHOOK_DOMAIN").filter(|d| !d.is_empty());
        let bot_link = lookup("VXRELAY_BOT_LINK").unwrap_or_else(|| DEFAULT_BOT_LINK.to_string());

        Ok(Self {
            bot_token,
            port,
            mode,
            webhook_domain,
            bot_link,
        })
    }

    /// The public domain Telegram calls back on. Only meaningful in webhook
    /// mode, and an error to leave unset there.
    pub fn webhook_domain(&self) -> Result<&str, ConfigError> {
        self.webhook_domain
            .as_deref()
            .ok_or(ConfigError::MissingWebhookDomain)
    }
}
