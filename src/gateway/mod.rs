//! Axum-based webhook gateway.
//!
//! Telegram delivers updates to `POST /webhook`; the root path serves a tiny
//! landing page that forwards visitors to the bot. Handler failures are
//! logged and still answered with 200 so Telegram does not re-deliver the
//! same update.

use crate::config::Config;
use crate::relay::Relay;
use anyhow::Result;
use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Json},
    routing::{get, post},
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;

use crate::telegram::update::Update;

/// Maximum request body size (64KB)
pub const MAX_BODY_SIZE: usize = 65_536;
/// Request timeout (30s)
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Clone)]
struct AppState {
    relay: Arc<Relay>,
    bot_link: Arc<str>,
}

/// Bind and serve the gateway on the configured port.
pub async fn run_gateway(relay: Arc<Relay>, config: &Config) -> Result<()> {
    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    run_gateway_with_listener(listener, relay, config).await
}

/// Serve the gateway from a pre-bound listener.
pub async fn run_gateway_with_listener(
    listener: tokio::net::TcpListener,
    relay: Arc<Relay>,
    config: &Config,
) -> Result<()> {
    let state = AppState {
        relay,
        bot_link: Arc::from(config.bot_link.as_str()),
    };

    let app = Router::new()
        .route("/", get(handle_index))
        .route("/health", get(handle_health))
        .route("/webhook", post(handle_webhook))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_SIZE))
        .layer(TimeoutLayer::new(Duration::from_secs(REQUEST_TIMEOUT_SECS)))
        .with_state(state);

    tracing::info!("gateway listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}

/// GET / — landing page that forwards to the bot
async fn handle_index(State(state): State<AppState>) -> Html<String> {
    Html(landing_page(&state.bot_link))
}

/// GET /health — liveness probe
async fn handle_health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// POST /webhook — update delivery from Telegram
async fn handle_webhook(
    State(state): State<AppState>,
    body: Result<Json<Update>, axum::extract::rejection::JsonRejection>,
) -> StatusCode {
    match body {
        Ok(Json(update)) => state.relay.handle_update(update).await,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "undecodable webhook payload");
        }
    }
    StatusCode::OK
}

fn landing_page(bot_link: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
  <head>
    <meta http-equiv="refresh" content="5; url='{bot_link}'" />
    <title>vxrelay</title>
  </head>
  <body>
    <p>
        <a href="{bot_link}">vxrelay</a>
    </p>
  </body>
</html>
"#
    )
}
