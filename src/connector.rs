use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::config::{
    BotToken, Config, ConfigError, ConnectorProperties, DeactivatePolicy, UnresolvedBaseUrlPolicy,
};
use crate::resolver::{self, BaseUrlSource};
use crate::telegram::api::{TelegramApiClient, TelegramApiError};
use crate::telegram::update::UpdateEvent;

/// Lifecycle of one connector instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Inactive,
    Activating,
    Active,
    Deactivating,
}

impl LifecycleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleState::Inactive => "inactive",
            LifecycleState::Activating => "activating",
            LifecycleState::Active => "active",
            LifecycleState::Deactivating => "deactivating",
        }
    }
}

/// Health as reported to the hosting runtime
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Health {
    Up,
    Down(Option<String>),
}

impl Health {
    pub fn is_up(&self) -> bool {
        matches!(self, Health::Up)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Health::Down(Some(reason)) => Some(reason),
            _ => None,
        }
    }
}

/// The Telegram webhook connector instance: holds the immutable identifying
/// configuration, drives webhook registration against the Bot API, and maps
/// delivered updates into engine events.
///
/// Lifecycle transitions are serialized on an async mutex; the health flag
/// lives in its own lock so the health endpoint never contends with an
/// in-flight activation.
pub struct TelegramConnector {
    properties: ConnectorProperties,
    config: Arc<Config>,
    api: TelegramApiClient,
    state: Mutex<LifecycleState>,
    health: RwLock<Health>,
}

/// Why activation failed. Configuration errors and registration errors are
/// both fatal: the instance does not become active.
#[derive(Debug, thiserror::Error)]
pub enum ActivationError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to register Telegram webhook: {0}")]
    Registration(#[from] TelegramApiError),
}

impl TelegramConnector {
    pub fn new(config: Arc<Config>) -> Self {
        Self {
            properties: config.connector_properties(),
            api: TelegramApiClient::new(config.clone()),
            config,
            state: Mutex::new(LifecycleState::Inactive),
            health: RwLock::new(Health::Down(None)),
        }
    }

    /// The normalized inbound context identifying this instance
    pub fn context(&self) -> &str {
        &self.properties.inbound_context
    }

    pub fn api(&self) -> &TelegramApiClient {
        &self.api
    }

    pub fn health(&self) -> Health {
        self.health.read().clone()
    }

    pub async fn lifecycle_state(&self) -> LifecycleState {
        *self.state.lock().await
    }

    /// Activate the connector: validate the identifying configuration,
    /// resolve the callback base URL and register the webhook when the
    /// resolution and policies call for it.
    ///
    /// The environment is injected so resolution stays testable; production
    /// callers pass `std::env::vars().collect()`.
    pub async fn activate(&self, env: &HashMap<String, String>) -> Result<(), ActivationError> {
        let mut state = self.state.lock().await;
        *state = LifecycleState::Activating;

        if let Err(e) = self.properties.validate() {
            self.fail(&mut state, e.to_string());
            return Err(e.into());
        }

        info!(
            context = %self.properties.inbound_context,
            "Activating Telegram webhook connector"
        );

        match resolver::resolve_base_url(self.properties.base_url.as_deref(), env) {
            None => match self.config.on_unresolved_base_url {
                UnresolvedBaseUrlPolicy::Skip => {
                    info!(
                        "No webhook base URL configured. Skipping Telegram setWebhook registration."
                    );
                }
                UnresolvedBaseUrlPolicy::Fail => {
                    let err = ConfigError::UnresolvedBaseUrl;
                    self.fail(&mut state, err.to_string());
                    return Err(err.into());
                }
            },
            Some(resolved)
                if resolved.source == BaseUrlSource::CloudTopology
                    && !self.config.register_on_cloud_inference =>
            {
                info!(
                    base_url = %resolved.url,
                    "Base URL was inferred from cloud topology and registration on inference is disabled. Skipping setWebhook."
                );
            }
            Some(resolved) => {
                let webhook_url = match resolver::build_webhook_url(
                    Some(&resolved.url),
                    &self.properties.inbound_context,
                ) {
                    Ok(url) => url,
                    Err(e) => {
                        self.fail(&mut state, e.to_string());
                        return Err(e.into());
                    }
                };

                info!(
                    webhook_url = %webhook_url,
                    source = ?resolved.source,
                    "Registering Telegram webhook"
                );
                if let Err(e) = self.api.register(&webhook_url).await {
                    self.fail(&mut state, e.to_string());
                    return Err(e.into());
                }
            }
        }

        *self.health.write() = Health::Up;
        *state = LifecycleState::Active;
        info!(context = %self.properties.inbound_context, "Telegram webhook connector active");
        Ok(())
    }

    /// Deactivate the connector. Deregistration is best-effort: a failed
    /// deleteWebhook call is recorded at warn level and never blocks the
    /// transition to inactive.
    pub async fn deactivate(&self) {
        let mut state = self.state.lock().await;
        *state = LifecycleState::Deactivating;

        info!(
            context = %self.properties.inbound_context,
            "Deactivating Telegram webhook connector"
        );

        if should_deregister(self.config.on_deactivate, &self.properties.bot_token) {
            if let Err(e) = self.api.deregister().await {
                warn!(
                    error = %e,
                    "Failed to deregister Telegram webhook during deactivation (continuing shutdown)"
                );
            }
        }

        *self.health.write() = Health::Down(None);
        *state = LifecycleState::Inactive;
    }

    /// Map one delivered update into an engine event. An empty body is an
    /// empty mapping; a malformed body is logged and treated the same way,
    /// since the caller acknowledges every delivered update regardless.
    pub fn handle_update(&self, raw_body: &[u8]) -> UpdateEvent {
        let body: Map<String, Value> = if raw_body.is_empty() {
            Map::new()
        } else {
            match serde_json::from_slice::<Value>(raw_body) {
                Ok(Value::Object(map)) => map,
                Ok(_) => {
                    warn!("Telegram update body is not a JSON object, ignoring");
                    Map::new()
                }
                Err(e) => {
                    warn!(error = %e, "Failed to parse Telegram update body, ignoring");
                    Map::new()
                }
            }
        };

        UpdateEvent::from_update(body)
    }

    fn fail(&self, state: &mut LifecycleState, reason: String) {
        *self.health.write() = Health::Down(Some(reason));
        *state = LifecycleState::Inactive;
    }
}

/// Whether deactivation should attempt a deleteWebhook call under `policy`
fn should_deregister(policy: DeactivatePolicy, token: &BotToken) -> bool {
    match policy {
        DeactivatePolicy::AlwaysDeregister => true,
        DeactivatePolicy::DeregisterIfCredentialPresent => !token.is_blank(),
    }
}
