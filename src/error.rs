use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for the relay.
///
/// Each subsystem defines its own error variant. Callers can match on these to
/// decide recovery strategy; internal code continues to use `anyhow::Result`
/// for ad-hoc context chains.
#[derive(Debug, Error)]
pub enum RelayError {
    // ── Config ───────────────────────────────────────────────────────────
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    // ── Telegram transport ───────────────────────────────────────────────
    #[error("telegram: {0}")]
    Telegram(#[from] TelegramError),

    // ── Generic fallthrough (wraps anyhow for interop) ──────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ─── Config errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("BOT_TOKEN is not set")]
    MissingToken,

    #[error("PORT is not a valid port number: {0}")]
    InvalidPort(String),

    #[error("unknown VXRELAY_MODE: {0} (expected \"poll\" or \"webhook\")")]
    InvalidMode(String),

    #[error("VXRELAY_WEBHOOK_DOMAIN is required in webhook mode")]
    MissingWebhookDomain,
}

// ─── Telegram transport errors ──────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("Telegram {method} failed ({status}): {body}")]
    Api {
        method: String,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("http: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected response payload: {0}")]
    Payload(#[from] serde_json::Error),
}
