use std::sync::Arc;

use axum::{
    Router,
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json},
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::{info, warn};

use crate::compose::compose_request_with_base;
use crate::config::Config;
use crate::connector::TelegramConnector;
use crate::telegram::OperationSelector;

/// Header Telegram echoes when a secret token was registered with setWebhook
pub const SECRET_TOKEN_HEADER: &str = "x-telegram-bot-api-secret-token";

/// Application state shared across handlers
pub struct AppState {
    pub connector: Arc<TelegramConnector>,
    pub config: Arc<Config>,
}

/// Build the HTTP router serving the connector surface
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/inbound/{context}", post(handle_telegram_update))
        .route("/outbound", post(execute_outbound))
        .route("/health", get(health_check))
        .with_state(state)
}

/// Handle one delivered Telegram update.
///
/// Telegram requires a fast, unconditional 2xx acknowledgement of every
/// delivered update, so after the context and secret-token checks the
/// response is always `200 {"status": "received"}` regardless of how the
/// update maps downstream.
pub async fn handle_telegram_update(
    State(state): State<Arc<AppState>>,
    Path(context): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    if context != state.connector.context() {
        warn!(context = %context, "Received update for unknown inbound context");
        return (StatusCode::NOT_FOUND, "Unknown inbound context").into_response();
    }

    if let Some(expected) = &state.config.webhook_secret_token {
        if !secret_token_matches(&headers, expected) {
            warn!(context = %context, "Rejected update with missing or wrong secret token");
            return (StatusCode::UNAUTHORIZED, "Invalid webhook secret token").into_response();
        }
    }

    let event = state.connector.handle_update(&body);
    info!(
        context = %context,
        update_id = ?event.update_id,
        update_type = %event.update_type,
        chat_id = ?event.chat_id,
        "Received Telegram update"
    );

    (StatusCode::OK, Json(json!({"status": "received"}))).into_response()
}

/// One outbound Bot API invocation as submitted by the workflow engine
#[derive(Debug, Deserialize)]
pub struct OutboundInvocation {
    #[serde(flatten)]
    pub selector: OperationSelector,

    /// Flat operation arguments; null and empty-string values are elided
    #[serde(default)]
    pub parameters: Map<String, Value>,

    /// Serialized reply_markup JSON, merged under the reserved key
    #[serde(default)]
    pub reply_markup: Option<String>,

    /// Free-form JSON object merged last, overriding everything else
    #[serde(default)]
    pub payload: Option<String>,
}

/// Compose and execute one outbound Bot API request
pub async fn execute_outbound(
    State(state): State<Arc<AppState>>,
    Json(invocation): Json<OutboundInvocation>,
) -> impl IntoResponse {
    let operation = invocation.selector.resolve();

    let composed = match compose_request_with_base(
        &state.config.telegram_api_url,
        Some(state.config.bot_token.as_str()),
        Some(operation),
        &invocation.parameters,
        invocation.reply_markup.as_deref(),
        invocation.payload.as_deref(),
    ) {
        Ok(request) => request,
        Err(e) => {
            warn!(operation = %operation, error = %e, "Rejected outbound invocation");
            return (StatusCode::BAD_REQUEST, Json(json!({"error": e.to_string()})))
                .into_response();
        }
    };

    match state.connector.api().execute(operation, &composed).await {
        Ok(envelope) => Json(envelope).into_response(),
        Err(e) => {
            warn!(operation = %operation, error = %e, "Outbound Telegram operation failed");
            (StatusCode::BAD_GATEWAY, Json(json!({"error": e.to_string()}))).into_response()
        }
    }
}

/// Health check endpoint
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.connector.health();
    let lifecycle = state.connector.lifecycle_state().await;
    Json(json!({
        "status": if health.is_up() { "healthy" } else { "unhealthy" },
        "state": lifecycle.as_str(),
        "context": state.connector.context(),
        "error": health.error(),
    }))
}

/// Compare the secret-token header against the configured value
fn secret_token_matches(headers: &HeaderMap, expected: &str) -> bool {
    headers
        .get(SECRET_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|presented| presented == expected)
}
