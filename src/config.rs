use std::fmt;

use serde::Deserialize;

/// Configuration for the Telegram connector runtime.
/// All values are loaded from environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Telegram Bot API token (as issued by @BotFather).
    /// A value wrapped in a single pair of double quotes is unwrapped.
    pub bot_token: BotToken,

    /// The unique path segment of the inbound webhook URL
    /// (e.g. "telegram" yields "{base}/inbound/telegram")
    pub inbound_context: String,

    /// Externally reachable base URL the Telegram API should call back to.
    /// Only required for Self-Managed or local deployments; when unset, the
    /// TELEGRAM_WEBHOOK_BASE_URL env var and cloud topology are consulted.
    #[serde(default)]
    pub webhook_base_url: Option<String>,

    /// Shared secret registered with setWebhook and verified against the
    /// X-Telegram-Bot-Api-Secret-Token header on every inbound update
    #[serde(default)]
    pub webhook_secret_token: Option<String>,

    /// Telegram Bot API origin (default: "https://api.telegram.org")
    #[serde(default = "default_telegram_api_url")]
    pub telegram_api_url: String,

    /// Address to bind the HTTP server (default: "0.0.0.0:3000")
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// What to do when no webhook base URL can be resolved during activation
    #[serde(default)]
    pub on_unresolved_base_url: UnresolvedBaseUrlPolicy,

    /// Whether (and when) to call deleteWebhook during deactivation
    #[serde(default)]
    pub on_deactivate: DeactivatePolicy,

    /// Whether a base URL inferred from cloud topology triggers webhook
    /// registration. When false, an inferred URL is resolved for display
    /// but registration is skipped (default: true)
    #[serde(default = "default_register_on_cloud_inference")]
    pub register_on_cloud_inference: bool,
}

fn default_telegram_api_url() -> String {
    "https://api.telegram.org".to_string()
}

fn default_listen_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_register_on_cloud_inference() -> bool {
    true
}

impl Config {
    /// Load configuration from environment variables
    /// (e.g. BOT_TOKEN, INBOUND_CONTEXT, WEBHOOK_BASE_URL).
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::from_env::<Config>()
    }

    /// The per-instance connector properties carried by this configuration
    pub fn connector_properties(&self) -> ConnectorProperties {
        ConnectorProperties::new(
            self.bot_token.clone(),
            &self.inbound_context,
            self.webhook_base_url.clone(),
        )
    }
}

/// Policy for activation when no webhook base URL is resolvable
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum UnresolvedBaseUrlPolicy {
    /// Proceed without registering the webhook (self-managed without remote control)
    #[default]
    Skip,
    /// Treat an unresolvable base URL as a fatal configuration error
    Fail,
}

/// Policy for the deregistration step during deactivation
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DeactivatePolicy {
    /// Always attempt deleteWebhook (best-effort)
    #[default]
    AlwaysDeregister,
    /// Only attempt deleteWebhook when a non-blank bot token is present
    DeregisterIfCredentialPresent,
}

/// A Telegram bot token. Normalized on construction: surrounding whitespace
/// is trimmed and a single pair of wrapping double quotes is stripped.
/// The token never appears in `Debug` output.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub struct BotToken(String);

impl BotToken {
    pub fn new(raw: &str) -> Self {
        Self::from(raw.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl From<String> for BotToken {
    fn from(raw: String) -> Self {
        let trimmed = raw.trim();
        let unquoted = trimmed
            .strip_prefix('"')
            .and_then(|rest| rest.strip_suffix('"'))
            .unwrap_or(trimmed);
        BotToken(unquoted.trim().to_string())
    }
}

impl fmt::Debug for BotToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BotToken(***)")
    }
}

/// Identifying properties of one connector instance, supplied once at
/// activation and immutable afterwards
#[derive(Debug, Clone)]
pub struct ConnectorProperties {
    pub bot_token: BotToken,

    /// Normalized inbound context: trimmed, with a single leading '/' stripped
    pub inbound_context: String,

    /// Explicit operator-configured base URL, if any
    pub base_url: Option<String>,
}

impl ConnectorProperties {
    pub fn new(bot_token: BotToken, inbound_context: &str, base_url: Option<String>) -> Self {
        Self {
            bot_token,
            inbound_context: normalize_context(inbound_context).to_string(),
            base_url,
        }
    }

    /// Check that the identifying configuration is present and non-blank
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.inbound_context.is_empty() {
            return Err(ConfigError::MissingContext);
        }
        if self.bot_token.is_blank() {
            return Err(ConfigError::MissingToken);
        }
        Ok(())
    }
}

/// Strip surrounding whitespace and a single leading '/' from an inbound
/// context path segment
pub fn normalize_context(context: &str) -> &str {
    let trimmed = context.trim();
    trimmed.strip_prefix('/').unwrap_or(trimmed)
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Property inbound_context must not be empty")]
    MissingContext,

    #[error("Property bot_token must not be empty")]
    MissingToken,

    #[error(
        "Cannot determine webhook base URL. Set 'webhook_base_url' in the connector config or the TELEGRAM_WEBHOOK_BASE_URL environment variable."
    )]
    UnresolvedBaseUrl,
}
