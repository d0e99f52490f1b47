use std::sync::{Arc, OnceLock};

use keymint_license::{
    ExpiryPolicy, HistoryRecord, Issuer, IssuerConfig, KeySource, LicensePayload, decode,
};
use keymint_server::{AppState, build_router};
use rsa::RsaPrivateKey;
use rsa::pkcs1::{EncodeRsaPrivateKey, LineEnding};
use tempfile::TempDir;

const TOKEN: &str = "test-token";

fn test_key_pem() -> String {
    static KEY: OnceLock<String> = OnceLock::new();
    KEY.get_or_init(|| {
        RsaPrivateKey::new(&mut rand::thread_rng(), 2048)
            .expect("generate test key")
            .to_pkcs1_pem(LineEnding::LF)
            .expect("encode test key")
            .to_string()
    })
    .clone()
}

fn test_state(dir: &TempDir, key: KeySource) -> Arc<AppState> {
    Arc::new(AppState {
        issuer: Issuer::new(IssuerConfig {
            key,
            policy: ExpiryPolicy {
                preferred_zone: "UTC".to_string(),
                max_lead_months: None,
            },
            ledger_path: dir.path().join("history.json"),
        }),
        api_token: TOKEN.to_string(),
    })
}

/// Spin up the HTTP server on an OS-assigned port, returning the base URL.
async fn spawn_test_server(state: Arc<AppState>) -> String {
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://127.0.0.1:{port}")
}

fn generate_body(token: &str, machine_id: &str, expiry: &str) -> serde_json::Value {
    serde_json::json!({
        "token": token,
        "machine_id": machine_id,
        "expiry": expiry,
    })
}

#[tokio::test]
async fn generate_returns_decodable_code() {
    let dir = TempDir::new().unwrap();
    let base = spawn_test_server(test_state(&dir, KeySource::inline(test_key_pem()))).await;

    let resp = reqwest::Client::new()
        .post(format!("{base}/api/generate"))
        .json(&generate_body(TOKEN, "machine-42", "2030-06-30"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let code = resp.text().await.unwrap();
    let (payload_bytes, _) = decode(&code).unwrap();
    let payload: LicensePayload = serde_json::from_slice(&payload_bytes).unwrap();
    assert_eq!(payload.machine_id, "machine-42");
}

#[tokio::test]
async fn wrong_token_is_forbidden() {
    let dir = TempDir::new().unwrap();
    let base = spawn_test_server(test_state(&dir, KeySource::inline(test_key_pem()))).await;

    let resp = reqwest::Client::new()
        .post(format!("{base}/api/generate"))
        .json(&generate_body("wrong", "machine-42", "2030-06-30"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 403);
}

#[tokio::test]
async fn empty_machine_id_is_bad_request() {
    let dir = TempDir::new().unwrap();
    let base = spawn_test_server(test_state(&dir, KeySource::inline(test_key_pem()))).await;

    let resp = reqwest::Client::new()
        .post(format!("{base}/api/generate"))
        .json(&generate_body(TOKEN, "", "2030-06-30"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 400);
    assert!(resp.text().await.unwrap().contains("missing field"));
}

#[tokio::test]
async fn malformed_date_is_bad_request() {
    let dir = TempDir::new().unwrap();
    let base = spawn_test_server(test_state(&dir, KeySource::inline(test_key_pem()))).await;

    let resp = reqwest::Client::new()
        .post(format!("{base}/api/generate"))
        .json(&generate_body(TOKEN, "machine-42", "30/06/2030"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn missing_key_is_server_error() {
    let dir = TempDir::new().unwrap();
    let base = spawn_test_server(test_state(&dir, KeySource::default())).await;

    let resp = reqwest::Client::new()
        .post(format!("{base}/api/generate"))
        .json(&generate_body(TOKEN, "machine-42", "2030-06-30"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 500);
    assert!(resp.text().await.unwrap().contains("no signing key"));
}

#[tokio::test]
async fn health_endpoint_is_open() {
    let dir = TempDir::new().unwrap();
    let base = spawn_test_server(test_state(&dir, KeySource::default())).await;

    let resp = reqwest::get(format!("{base}/health")).await.unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn history_requires_token() {
    let dir = TempDir::new().unwrap();
    let base = spawn_test_server(test_state(&dir, KeySource::inline(test_key_pem()))).await;

    let resp = reqwest::get(format!("{base}/api/history")).await.unwrap();
    assert_eq!(resp.status(), 403);

    let resp = reqwest::get(format!("{base}/api/history?token=wrong"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);
}

#[tokio::test]
async fn history_lists_newest_first() {
    let dir = TempDir::new().unwrap();
    let base = spawn_test_server(test_state(&dir, KeySource::inline(test_key_pem()))).await;
    let client = reqwest::Client::new();

    for machine in ["machine-1", "machine-2"] {
        let resp = client
            .post(format!("{base}/api/generate"))
            .json(&generate_body(TOKEN, machine, "2030-06-30"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
    }

    let records: Vec<HistoryRecord> = reqwest::get(format!("{base}/api/history?token={TOKEN}"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].machine_id, "machine-2");
    assert_eq!(records[1].machine_id, "machine-1");
}
