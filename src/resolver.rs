use std::collections::HashMap;

use crate::config::{ConfigError, normalize_context};

/// Domain under which Camunda SaaS exposes per-cluster connector endpoints
pub const CONNECTORS_DOMAIN: &str = "connectors.camunda.io";

/// Environment variable carrying an explicit base-URL override
pub const BASE_URL_ENV: &str = "TELEGRAM_WEBHOOK_BASE_URL";

/// Accepted names for the cloud region variable, checked in order
const REGION_ALIASES: &[&str] = &["CAMUNDA_CLIENT_CLOUD_REGION", "CAMUNDA_CLUSTER_REGION"];

/// Accepted names for the cluster-id variable, checked in order.
/// The lowercase alias covers environments that export the legacy
/// lowercased form.
const CLUSTER_ID_ALIASES: &[&str] = &[
    "CAMUNDA_CLIENT_CLOUD_CLUSTER_ID",
    "CAMUNDA_CLUSTER_ID",
    "camunda_cluster_id",
];

/// Which configuration source produced the resolved base URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseUrlSource {
    /// Operator-set `webhook_base_url` in the connector configuration
    ExplicitConfig,
    /// The TELEGRAM_WEBHOOK_BASE_URL environment override
    Environment,
    /// Synthesized from the cloud region and cluster-id variables
    CloudTopology,
}

/// The single winning base URL after precedence resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedBaseUrl {
    pub url: String,
    pub source: BaseUrlSource,
}

/// Resolve the externally reachable webhook base URL.
///
/// Precedence is strictly first-match-wins: explicit configuration, then the
/// environment override, then cloud-topology inference. Absence is a valid
/// outcome (self-managed deployment without remote webhook control), not an
/// error.
///
/// The environment is injected as a plain map so resolution stays a pure
/// function; callers pass `std::env::vars().collect()` in production.
pub fn resolve_base_url(
    explicit: Option<&str>,
    env: &HashMap<String, String>,
) -> Option<ResolvedBaseUrl> {
    if let Some(url) = explicit.filter(|value| !value.trim().is_empty()) {
        return Some(ResolvedBaseUrl {
            url: url.to_string(),
            source: BaseUrlSource::ExplicitConfig,
        });
    }

    if let Some(url) = non_blank(env.get(BASE_URL_ENV)) {
        return Some(ResolvedBaseUrl {
            url: url.to_string(),
            source: BaseUrlSource::Environment,
        });
    }

    let region = first_non_blank(env, REGION_ALIASES)?;
    let cluster_id = first_non_blank(env, CLUSTER_ID_ALIASES)?;
    Some(ResolvedBaseUrl {
        url: format!("https://{region}.{CONNECTORS_DOMAIN}/{cluster_id}"),
        source: BaseUrlSource::CloudTopology,
    })
}

fn non_blank(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|v| !v.trim().is_empty())
}

fn first_non_blank<'a>(env: &'a HashMap<String, String>, aliases: &[&str]) -> Option<&'a str> {
    aliases
        .iter()
        .find_map(|alias| non_blank(env.get(*alias)))
}

/// Combine a resolved base URL with the inbound context into the full
/// webhook callback URL: `{base}/inbound/{context}`.
///
/// A single trailing '/' on the base is dropped, and a base that already
/// ends with `/inbound/{context}` is returned unchanged, so an operator can
/// paste a previously constructed webhook URL back into the base-URL field
/// without doubling the suffix. Pure: identical inputs yield byte-identical
/// output.
pub fn build_webhook_url(base_url: Option<&str>, context: &str) -> Result<String, ConfigError> {
    let context = normalize_context(context);
    if context.is_empty() {
        return Err(ConfigError::MissingContext);
    }

    let base = base_url
        .map(str::trim)
        .filter(|b| !b.is_empty())
        .ok_or(ConfigError::UnresolvedBaseUrl)?;

    let base = base.strip_suffix('/').unwrap_or(base);
    let suffix = format!("/inbound/{context}");
    if base.ends_with(&suffix) {
        return Ok(base.to_string());
    }
    Ok(format!("{base}{suffix}"))
}
