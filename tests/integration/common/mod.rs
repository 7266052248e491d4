//! Shared helpers for the integration tests: connector construction against
//! a configurable Bot API origin and an in-process HTTP server on an
//! ephemeral port.

use std::collections::HashMap;
use std::sync::Arc;

use telegram_connector::config::{
    BotToken, Config, DeactivatePolicy, UnresolvedBaseUrlPolicy,
};
use telegram_connector::connector::TelegramConnector;
use telegram_connector::routes::{AppState, app};

pub const TEST_TOKEN: &str = "123456:TEST-TOKEN";
pub const TEST_CONTEXT: &str = "telegram";
pub const TEST_BASE_URL: &str = "https://connector.example.com";

/// A connector configuration pointing at `api_url` instead of the real
/// Telegram origin, with an explicit webhook base URL
pub fn test_config(api_url: &str) -> Config {
    Config {
        bot_token: BotToken::new(TEST_TOKEN),
        inbound_context: TEST_CONTEXT.to_string(),
        webhook_base_url: Some(TEST_BASE_URL.to_string()),
        webhook_secret_token: None,
        telegram_api_url: api_url.to_string(),
        listen_addr: "127.0.0.1:0".to_string(),
        on_unresolved_base_url: UnresolvedBaseUrlPolicy::default(),
        on_deactivate: DeactivatePolicy::default(),
        register_on_cloud_inference: true,
    }
}

pub fn connector_with(config: Config) -> (Arc<Config>, Arc<TelegramConnector>) {
    let config = Arc::new(config);
    let connector = Arc::new(TelegramConnector::new(config.clone()));
    (config, connector)
}

/// Serve the connector HTTP app on an ephemeral port and return its base URL
pub async fn spawn_app(config: Arc<Config>, connector: Arc<TelegramConnector>) -> String {
    let state = Arc::new(AppState { connector, config });
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Test listener has no address");

    tokio::spawn(async move {
        axum::serve(listener, app(state))
            .await
            .expect("Test server failed");
    });

    format!("http://{addr}")
}

pub fn empty_env() -> HashMap<String, String> {
    HashMap::new()
}

pub fn env_of(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
