use serde_json::{Map, Value};

/// Origin of the Telegram Bot API
pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// A fully composed outbound Bot API request, ready for a generic
/// JSON-over-HTTP transport
#[derive(Debug, Clone, PartialEq)]
pub struct ComposedRequest {
    pub url: String,
    pub method: &'static str,
    pub body: Map<String, Value>,
}

#[derive(Debug, thiserror::Error)]
pub enum ComposeError {
    #[error("Payload override is not valid JSON: {0}")]
    InvalidPayload(String),

    #[error("Payload override must be a JSON object")]
    PayloadNotAnObject,
}

/// Build `{base}/bot{credential}/{operation}`.
///
/// Construction is total: an absent credential or operation becomes an empty
/// path segment rather than an error, because at the point this runs inside
/// a declarative expression not all inputs are guaranteed resolved yet.
pub fn operation_url(base: &str, credential: Option<&str>, operation: Option<&str>) -> String {
    format!(
        "{}/bot{}/{}",
        base.strip_suffix('/').unwrap_or(base),
        credential.unwrap_or(""),
        operation.unwrap_or("")
    )
}

/// Compose one outbound Bot API request from the three parameter sources.
///
/// The body is a layered merge, later layers overriding earlier ones key by
/// key:
/// 1. every `parameters` entry whose value is neither null nor `""`
///    (blank entries are elided, not forwarded),
/// 2. a non-blank `reply_markup` string under the reserved `reply_markup` key,
/// 3. every entry of the parsed `payload` object.
///
/// A malformed or non-object payload override fails loudly instead of
/// silently producing a wrong body.
pub fn compose_request(
    credential: Option<&str>,
    operation: Option<&str>,
    parameters: &Map<String, Value>,
    reply_markup: Option<&str>,
    payload: Option<&str>,
) -> Result<ComposedRequest, ComposeError> {
    compose_request_with_base(
        TELEGRAM_API_BASE,
        credential,
        operation,
        parameters,
        reply_markup,
        payload,
    )
}

/// Same as [`compose_request`] against a non-default API origin (used by the
/// runtime, whose origin is configurable)
pub fn compose_request_with_base(
    base: &str,
    credential: Option<&str>,
    operation: Option<&str>,
    parameters: &Map<String, Value>,
    reply_markup: Option<&str>,
    payload: Option<&str>,
) -> Result<ComposedRequest, ComposeError> {
    let mut body = Map::new();

    for (key, value) in parameters {
        if is_blank_value(value) {
            continue;
        }
        body.insert(key.clone(), value.clone());
    }

    if let Some(markup) = reply_markup.filter(|m| !m.trim().is_empty()) {
        body.insert("reply_markup".to_string(), Value::String(markup.to_string()));
    }

    if let Some(raw) = payload.filter(|p| !p.trim().is_empty()) {
        let parsed: Value = serde_json::from_str(raw)
            .map_err(|e| ComposeError::InvalidPayload(e.to_string()))?;
        let Value::Object(overrides) = parsed else {
            return Err(ComposeError::PayloadNotAnObject);
        };
        for (key, value) in overrides {
            body.insert(key, value);
        }
    }

    Ok(ComposedRequest {
        url: operation_url(base, credential, operation),
        method: "POST",
        body,
    })
}

fn is_blank_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}
