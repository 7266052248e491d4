//! Inbound routing tests: every delivered update is acknowledged with the
//! fixed `{"status": "received"}` payload, the health endpoint mirrors the
//! lifecycle, and outbound invocations compose and execute Bot API calls.

use serde_json::{Value, json};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::{TEST_TOKEN, connector_with, empty_env, spawn_app, test_config};

/// A connector that skips registration (no base URL), activated and served
/// on an ephemeral port
async fn spawn_unregistered_app(api_url: &str) -> String {
    let mut config = test_config(api_url);
    config.webhook_base_url = None;
    let (config, connector) = connector_with(config);
    connector.activate(&empty_env()).await.unwrap();
    spawn_app(config, connector).await
}

#[tokio::test]
async fn test_update_is_acknowledged() {
    let base = spawn_unregistered_app("http://127.0.0.1:1").await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{base}/inbound/telegram"))
        .json(&json!({
            "update_id": 12345,
            "message": {
                "text": "hello",
                "chat": {"id": 789},
                "from": {"username": "camunda-bot"}
            }
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({"status": "received"}));
}

#[tokio::test]
async fn test_empty_body_is_acknowledged() {
    let base = spawn_unregistered_app("http://127.0.0.1:1").await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{base}/inbound/telegram"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({"status": "received"}));
}

#[tokio::test]
async fn test_malformed_body_is_acknowledged() {
    // A parse failure must not trigger Telegram's redelivery loop
    let base = spawn_unregistered_app("http://127.0.0.1:1").await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{base}/inbound/telegram"))
        .body("{not json")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 200);
}

#[tokio::test]
async fn test_unknown_context_is_not_found() {
    let base = spawn_unregistered_app("http://127.0.0.1:1").await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{base}/inbound/other-connector"))
        .json(&json!({"update_id": 1}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn test_secret_token_is_enforced_when_configured() {
    let mut config = test_config("http://127.0.0.1:1");
    config.webhook_base_url = None;
    config.webhook_secret_token = Some("s3cret".to_string());
    let (config, connector) = connector_with(config);
    connector.activate(&empty_env()).await.unwrap();
    let base = spawn_app(config, connector).await;
    let client = reqwest::Client::new();

    let missing = client
        .post(format!("{base}/inbound/telegram"))
        .json(&json!({"update_id": 1}))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status().as_u16(), 401);

    let wrong = client
        .post(format!("{base}/inbound/telegram"))
        .header("x-telegram-bot-api-secret-token", "nope")
        .json(&json!({"update_id": 1}))
        .send()
        .await
        .unwrap();
    assert_eq!(wrong.status().as_u16(), 401);

    let correct = client
        .post(format!("{base}/inbound/telegram"))
        .header("x-telegram-bot-api-secret-token", "s3cret")
        .json(&json!({"update_id": 1}))
        .send()
        .await
        .unwrap();
    assert_eq!(correct.status().as_u16(), 200);
}

#[tokio::test]
async fn test_health_reflects_lifecycle() {
    let mut config = test_config("http://127.0.0.1:1");
    config.webhook_base_url = None;
    let (config, connector) = connector_with(config);
    let base = spawn_app(config, connector.clone()).await;
    let client = reqwest::Client::new();

    let before: Value = client
        .get(format!("{base}/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(before["status"], "unhealthy");
    assert_eq!(before["state"], "inactive");
    assert_eq!(before["context"], "telegram");

    connector.activate(&empty_env()).await.unwrap();

    let after: Value = client
        .get(format!("{base}/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(after["status"], "healthy");
    assert_eq!(after["state"], "active");
}

#[tokio::test]
async fn test_outbound_invocation_composes_and_executes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/bot{TEST_TOKEN}/sendMessage")))
        .and(body_json(json!({
            "chat_id": "12345",
            "text": "hello",
            "reply_markup": "{\"inline_keyboard\":[]}",
            "disable_notification": true
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "result": {"message_id": 1}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let base = spawn_unregistered_app(&server.uri()).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{base}/outbound"))
        .json(&json!({
            "operation_group": "messages",
            "operation": "sendMessage",
            "parameters": {
                "chat_id": "12345",
                "text": "hello",
                "emptyField": ""
            },
            "reply_markup": "{\"inline_keyboard\":[]}",
            "payload": "{\"disable_notification\":true}"
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["ok"], true);
    assert_eq!(body["result"]["message_id"], 1);
}

#[tokio::test]
async fn test_outbound_invocation_rejects_malformed_payload() {
    let base = spawn_unregistered_app("http://127.0.0.1:1").await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{base}/outbound"))
        .json(&json!({
            "operation_group": "messages",
            "operation": "sendMessage",
            "payload": "{not json"
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert!(
        body["error"]
            .as_str()
            .unwrap()
            .contains("Payload override")
    );
}

#[tokio::test]
async fn test_outbound_failure_is_reported_as_bad_gateway() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/bot{TEST_TOKEN}/sendMessage")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": false,
            "description": "Bad Request: chat not found"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let base = spawn_unregistered_app(&server.uri()).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{base}/outbound"))
        .json(&json!({
            "operation_group": "messages",
            "operation": "sendMessage",
            "parameters": {"chat_id": "12345", "text": "hi"}
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 502);
    let body: Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("sendMessage"));
}
