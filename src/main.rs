#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use vxrelay::RelayError;
use vxrelay::config::{Config, Mode};
use vxrelay::gateway;
use vxrelay::links::Resolver;
use vxrelay::relay::Relay;
use vxrelay::telegram::{TelegramApi, poller};

#[derive(Parser)]
#[command(
    name = "vxrelay",
    about = "Telegram bot that reposts TikTok links as embed-friendly vxtiktok links"
)]
struct Cli {
    /// Serve the public webhook gateway instead of long-polling.
    #[arg(long)]
    webhook: bool,

    /// Override the listen port (webhook mode).
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Install default crypto provider for Rustls TLS.
    // This prevents the error: "could not automatically determine the process-level CryptoProvider"
    // when both aws-lc-rs and ring features are available (or neither is explicitly selected).
    if let Err(e) = rustls::crypto::ring::default_provider().install_default() {
        eprintln!("Warning: Failed to install default crypto provider: {e:?}");
    }

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let cli = Cli::parse();
    let mut config = Config::from_env().map_err(RelayError::from)?;
    if cli.webhook {
        config.mode = Mode::Webhook;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }

    run(config).await
}

async fn run(config: Config) -> Result<()> {
    let api = TelegramApi::new(config.bot_token.clone());
    let relay = Arc::new(Relay::new(api, Resolver::new()));

    match config.mode {
        Mode::Poll => {
            // A webhook left over from an earlier deployment blocks getUpdates.
            if let Err(err) = relay.api().delete_webhook().await {
                tracing::warn!(error = %err, "could not clear stale webhook");
            }

            tokio::select! {
                result = poller::run(Arc::clone(&relay)) => result,
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("shutdown requested");
                    Ok(())
                }
            }
        }
        Mode::Webhook => {
            let domain = config.webhook_domain()?;
            relay
                .api()
                .set_webhook(&format!("https://{domain}/webhook"))
                .await?;

            tokio::select! {
                result = gateway::run_gateway(Arc::clone(&relay), &config) => result,
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("shutdown requested");
                    if let Err(err) = relay.api().delete_webhook().await {
                        tracing::warn!(error = %err, "could not remove webhook");
                    }
                    Ok(())
                }
            }
        }
    }
}
