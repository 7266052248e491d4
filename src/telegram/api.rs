use std::sync::Arc;

use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::compose::{ComposedRequest, operation_url};
use crate::config::Config;

/// Client for the Telegram Bot API.
///
/// Every call is a single attempt with no retry: registration runs inside a
/// synchronous activation path whose caller owns the failure policy.
pub struct TelegramApiClient {
    client: Client,
    config: Arc<Config>,
}

impl TelegramApiClient {
    pub fn new(config: Arc<Config>) -> Self {
        let client = Client::new();
        Self { client, config }
    }

    /// Register `webhook_url` as this bot's webhook (setWebhook).
    /// When a secret token is configured it is registered alongside, and
    /// Telegram will echo it on every delivered update.
    pub async fn register(&self, webhook_url: &str) -> Result<(), TelegramApiError> {
        let mut query = vec![("url", webhook_url.to_string())];
        if let Some(secret) = &self.config.webhook_secret_token {
            query.push(("secret_token", secret.clone()));
        }
        self.call("setWebhook", &query).await?;
        Ok(())
    }

    /// Remove this bot's webhook (deleteWebhook), dropping pending updates
    pub async fn deregister(&self) -> Result<(), TelegramApiError> {
        self.call("deleteWebhook", &[("drop_pending_updates", "true".to_string())])
            .await?;
        Ok(())
    }

    /// Execute a composed outbound request, returning the full response
    /// envelope on success
    pub async fn execute(
        &self,
        operation: &str,
        request: &ComposedRequest,
    ) -> Result<Value, TelegramApiError> {
        debug!(operation, body_keys = request.body.len(), "Executing Telegram operation");

        let response = self
            .client
            .post(&request.url)
            .json(&request.body)
            .send()
            .await
            .map_err(|e| TelegramApiError::Transport(e.to_string()))?;

        Self::validate_envelope(operation, response).await
    }

    /// POST an empty-bodied operation call with the given query parameters.
    /// The URL embeds the bot token and is therefore never logged.
    async fn call(&self, operation: &str, query: &[(&str, String)]) -> Result<Value, TelegramApiError> {
        let url = operation_url(
            &self.config.telegram_api_url,
            Some(self.config.bot_token.as_str()),
            Some(operation),
        );

        debug!(operation, "Calling Telegram Bot API");

        let response = self
            .client
            .post(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| TelegramApiError::Transport(e.to_string()))?;

        Self::validate_envelope(operation, response).await
    }

    /// Enforce the `{"ok": bool, ...}` response envelope: anything other
    /// than a 200 with `ok == true` is an error carrying the raw body.
    /// A 200 status alone is not proof of success.
    async fn validate_envelope(
        operation: &str,
        response: reqwest::Response,
    ) -> Result<Value, TelegramApiError> {
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| TelegramApiError::Transport(e.to_string()))?;

        if status != 200 {
            return Err(TelegramApiError::Status {
                operation: operation.to_string(),
                status,
                body,
            });
        }

        let parsed: Value = match serde_json::from_str(&body) {
            Ok(value) => value,
            Err(_) => {
                return Err(TelegramApiError::Rejected {
                    operation: operation.to_string(),
                    body,
                });
            }
        };

        if parsed.get("ok").and_then(Value::as_bool) != Some(true) {
            return Err(TelegramApiError::Rejected {
                operation: operation.to_string(),
                body,
            });
        }

        Ok(parsed)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TelegramApiError {
    #[error("Request to Telegram API failed: {0}")]
    Transport(String),

    #[error("Telegram API call {operation} failed with status {status}. Response: {body}")]
    Status {
        operation: String,
        status: u16,
        body: String,
    },

    #[error("Telegram API did not return ok=true for {operation}: {body}")]
    Rejected { operation: String, body: String },
}
