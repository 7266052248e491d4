use serde::Serialize;
use serde_json::{Map, Value};

/// Data handed to the workflow engine as the "event" variable for one
/// delivered Telegram update.
///
/// Every derived field is optional: Telegram update shapes vary widely and a
/// missing piece maps to `None` rather than a failure.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateEvent {
    pub update_id: Option<i64>,

    /// One of "message", "edited_message", "channel_post", "callback_query"
    /// or "other"
    pub update_type: String,

    /// The raw update as delivered
    pub update: Map<String, Value>,

    /// The message object, falling back to edited_message
    pub message: Option<Map<String, Value>>,

    pub text: Option<String>,
    pub chat_id: Option<i64>,
    pub sender_username: Option<String>,
}

impl UpdateEvent {
    pub fn from_update(update: Map<String, Value>) -> Self {
        let message = message_of(&update);
        let text = message
            .and_then(|msg| msg.get("text"))
            .and_then(Value::as_str)
            .map(str::to_string);
        let chat_id = message
            .and_then(|msg| msg.get("chat"))
            .and_then(|chat| chat.get("id"))
            .and_then(Value::as_i64);
        let sender_username = message
            .and_then(|msg| msg.get("from"))
            .and_then(|from| from.get("username"))
            .and_then(Value::as_str)
            .map(str::to_string);

        Self {
            update_id: update.get("update_id").and_then(Value::as_i64),
            update_type: update_type_of(&update).to_string(),
            message: message.cloned(),
            text,
            chat_id,
            sender_username,
            update,
        }
    }
}

fn update_type_of(update: &Map<String, Value>) -> &'static str {
    if update.contains_key("message") {
        "message"
    } else if update.contains_key("edited_message") {
        "edited_message"
    } else if update.contains_key("channel_post") {
        "channel_post"
    } else if update.contains_key("callback_query") {
        "callback_query"
    } else {
        "other"
    }
}

fn message_of(update: &Map<String, Value>) -> Option<&Map<String, Value>> {
    update
        .get("message")
        .or_else(|| update.get("edited_message"))
        .and_then(Value::as_object)
}
