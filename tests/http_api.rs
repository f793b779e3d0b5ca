//! HTTP API against a seeded SQLite ledger, served on an ephemeral port.

mod common;

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};

use ledger_mirror::config::parse_config;
use ledger_mirror::{server, service};

async fn spawn_server(config_text: &str) -> String {
    let cfg = parse_config(config_text, None).unwrap();
    let svc = Arc::new(service::connect(&cfg).await.unwrap());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, server::router(svc)).await.unwrap();
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn test_health() {
    let fx = common::setup().await;
    let base = spawn_server(&fx.config_text).await;

    let body: Value = reqwest::get(format!("{}/health", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_sync_user_then_status_and_documents() {
    let fx = common::setup().await;
    let base = spawn_server(&fx.config_text).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/sync/user", base))
        .json(&json!({"user_id": "u1"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "success");
    assert_eq!(body["details"]["overall_status"], "success");
    assert_eq!(body["details"]["results"]["transactions"]["synced"], 4);

    let status: Value = client
        .get(format!("{}/sync/status/u1", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status["sync_stats"]["account_count"], 2);
    assert_eq!(status["sync_stats"]["has_profile"], true);
    assert!(status["last_sync"].is_string());

    let docs: Value = client
        .get(format!("{}/documents/accounts/u1?limit=1", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(docs["collection"], "Account");
    assert_eq!(docs["count"], 1);
}

#[tokio::test]
async fn test_sync_user_single_entity() {
    let fx = common::setup().await;
    let base = spawn_server(&fx.config_text).await;

    let body: Value = reqwest::Client::new()
        .post(format!("{}/sync/user", base))
        .json(&json!({"user_id": "u1", "sync_type": "transactions", "limit": 1}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["details"]["status"], "success");
    assert_eq!(body["details"]["synced"], 1);
}

#[tokio::test]
async fn test_bad_requests_use_error_envelope() {
    let fx = common::setup().await;
    let base = spawn_server(&fx.config_text).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/sync/user", base))
        .json(&json!({"user_id": "u1", "sync_type": "everything"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "bad_request");
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("invalid sync_type"));

    let resp = client
        .post(format!("{}/sync/user", base))
        .json(&json!({"user_id": "  "}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let resp = client
        .get(format!("{}/documents/ledgers/u1", base))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_batch_is_accepted_and_runs_in_background() {
    let fx = common::setup().await;
    let base = spawn_server(&fx.config_text).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/sync/batch", base))
        .json(&json!(["u1", "u2"]))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 202);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "accepted");
    assert_eq!(body["details"]["user_count"], 2);

    let mut has_profile = false;
    for _ in 0..50 {
        let status: Value = client
            .get(format!("{}/sync/status/u1", base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        if status["sync_stats"]["transaction_count"] == 4 {
            has_profile = status["sync_stats"]["has_profile"] == true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    assert!(has_profile, "batch sync did not finish in time");

    let resp = client
        .post(format!("{}/sync/batch", base))
        .json(&json!([]))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_collections() {
    let fx = common::setup().await;
    let base = spawn_server(&fx.config_text).await;

    let body: Value = reqwest::get(format!("{}/collections", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["collections"], json!(["Account", "Transaction", "UserProfile"]));
}
