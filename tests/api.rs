//! HTTP Integration Tests
//!
//! Drives the full router in-process with `tower::ServiceExt::oneshot`.
//! Uses the test config: no latency, no sample seeding, no injected failures.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use crypto_fd_api::{create_router, AppState, Config, RandomAddressGenerator};

// =============================================================
// Helpers
// =============================================================

fn app() -> Router {
    let state = AppState::with_generator(
        Config::for_tests(),
        Arc::new(RandomAddressGenerator::seeded(7)),
    );
    create_router(state)
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

fn assert_close(value: &Value, expected: f64) {
    let actual = value.as_f64().unwrap_or_else(|| panic!("not a number: {}", value));
    assert!((actual - expected).abs() < 1e-9, "expected {}, got {}", expected, actual);
}

async fn login(app: &Router, email: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "email": email, "password": "secret" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_string()
}

async fn connect_wallet(app: &Router, token: &str) -> String {
    let (status, body) = send(app, Method::POST, "/wallet/connect", Some(token), None).await;
    assert_eq!(status, StatusCode::OK);
    body["address"].as_str().unwrap().to_string()
}

async fn create(app: &Router, token: &str, amount: Value, duration: u32) -> Value {
    let (status, body) = send(
        app,
        Method::POST,
        "/deposits",
        Some(token),
        Some(json!({ "amount": amount, "duration": duration })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {}", body);
    body
}

// =============================================================
// Public Endpoints
// =============================================================

#[tokio::test]
async fn test_health() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["store"]["available"], true);
    assert_eq!(body["store"]["deposits"], 0);
}

#[tokio::test]
async fn test_terms_table() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/deposits/terms", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["version"], "2024-01");
    assert_close(&body["earlyWithdrawalRate"], 2.0);
    assert_close(&body["minimumAmount"], 0.04);

    let tiers = body["tiers"].as_array().unwrap();
    let pairs: Vec<(u64, f64)> = tiers
        .iter()
        .map(|t| (t["duration"].as_u64().unwrap(), t["interestRate"].as_f64().unwrap()))
        .collect();
    assert_eq!(
        pairs,
        vec![(1, 5.0), (3, 6.0), (6, 7.0), (12, 8.0), (24, 9.0)]
    );
    assert_eq!(tiers[0]["label"], "1 Month");
    assert_eq!(tiers[4]["label"], "24 Months");
}

#[tokio::test]
async fn test_preview() {
    let app = app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/deposits/preview",
        None,
        Some(json!({ "amount": "1", "duration": 12, "currency": "eth" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_close(&body["interestRate"], 8.0);
    assert_close(&body["projectedInterest"], 0.08);
    assert_close(&body["maturityAmount"], 1.08);
    assert_close(&body["localInterest"], 20000.0);
}

#[tokio::test]
async fn test_preview_matches_created_deposit() {
    let app = app();
    let token = login(&app, "kate@example.com").await;
    connect_wallet(&app, &token).await;

    let (status, preview) = send(
        &app,
        Method::POST,
        "/deposits/preview",
        None,
        Some(json!({ "amount": "1.00000001", "duration": "1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_close(&preview["maturityAmount"], 1.0042);

    create(&app, &token, json!("1.00000001"), 1).await;
    let (_, list) = send(&app, Method::GET, "/deposits", Some(&token), None).await;
    assert_eq!(list[0]["maturityAmount"], preview["maturityAmount"]);
}

#[tokio::test]
async fn test_preview_rejects_bad_duration() {
    let app = app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/deposits/preview",
        None,
        Some(json!({ "amount": 1, "duration": 2 })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    for duration in [json!("abc"), json!(-1), json!(3.5)] {
        let (status, body) = send(
            &app,
            Method::POST,
            "/deposits/preview",
            None,
            Some(json!({ "amount": 1, "duration": duration })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }
}

#[tokio::test]
async fn test_rates() {
    let app = app();

    let (status, body) = send(&app, Method::GET, "/rates/eth", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["symbol"], "ETH");
    assert_eq!(body["currency"], "INR");
    assert_close(&body["rate"], 250000.0);

    let (status, body) = send(&app, Method::GET, "/rates/doge", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

// =============================================================
// Session
// =============================================================

#[tokio::test]
async fn test_requires_token() {
    let app = app();

    let (status, body) = send(&app, Method::GET, "/deposits", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");

    let (status, _) = send(&app, Method::GET, "/deposits", Some("not-a-token"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_validation() {
    let app = app();
    let (status, _) = send(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "email": "nobody", "password": "secret" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_logout_invalidates_token_and_wallet() {
    let app = app();
    let token = login(&app, "alice@example.com").await;
    connect_wallet(&app, &token).await;

    let (status, body) = send(&app, Method::GET, "/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "alice@example.com");

    let (status, _) = send(&app, Method::POST, "/auth/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, Method::GET, "/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // 같은 이메일로 재로그인 → 같은 사용자, 지갑은 해제된 상태
    let token = login(&app, "alice@example.com").await;
    let (status, _) = send(&app, Method::GET, "/wallet", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================
// Wallet
// =============================================================

#[tokio::test]
async fn test_wallet_connect_is_idempotent() {
    let app = app();
    let token = login(&app, "bob@example.com").await;

    let first = connect_wallet(&app, &token).await;
    let second = connect_wallet(&app, &token).await;
    assert_eq!(first, second);
    assert!(first.starts_with("0x"));
    assert_eq!(first.len(), 42);

    let (status, body) = send(&app, Method::GET, "/wallet", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["address"], first.as_str());
    assert_eq!(body["chainId"], 1);

    let (status, _) = send(&app, Method::POST, "/wallet/disconnect", Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, Method::GET, "/wallet", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================
// Deposit Lifecycle
// =============================================================

#[tokio::test]
async fn test_create_requires_wallet() {
    let app = app();
    let token = login(&app, "carol@example.com").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/deposits",
        Some(&token),
        Some(json!({ "amount": 1, "duration": 3 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["details"].as_str().unwrap().contains("Wallet"));

    // 명시적 주소는 연결 없이도 허용
    let (status, body) = send(
        &app,
        Method::POST,
        "/deposits",
        Some(&token),
        Some(json!({ "amount": 1, "duration": 3, "walletAddress": "0xabc" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["walletAddress"], "0xabc");
}

#[tokio::test]
async fn test_create_rejects_invalid_input() {
    let app = app();
    let token = login(&app, "dave@example.com").await;
    connect_wallet(&app, &token).await;

    let cases = [
        json!({ "amount": true, "duration": 3 }),
        json!({ "amount": "-1", "duration": 3 }),
        json!({ "amount": "abc", "duration": 3 }),
        json!({ "amount": 0, "duration": 3 }),
        json!({ "duration": 3 }),
        json!({ "amount": "0.01", "duration": 1 }),
        json!({ "amount": 1, "duration": 2 }),
        json!({ "amount": 1 }),
        json!({ "amount": 1, "duration": "abc" }),
        json!({ "amount": 1, "duration": -1 }),
        json!({ "amount": 1, "duration": 3.5 }),
        json!({ "amount": 1, "duration": [3] }),
    ];

    for case in cases {
        let (status, body) = send(&app, Method::POST, "/deposits", Some(&token), Some(case.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "case {} → {}", case, body);
        assert_eq!(body["code"], "VALIDATION_ERROR", "case {}", case);
        assert!(body["details"].is_string(), "case {}", case);
    }

    let (_, body) = send(&app, Method::GET, "/deposits", Some(&token), None).await;
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_create_accepts_duration_as_string() {
    let app = app();
    let token = login(&app, "ivan@example.com").await;
    connect_wallet(&app, &token).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/deposits",
        Some(&token),
        Some(json!({ "amount": "0.04", "duration": "3" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["duration"], 3);
    assert_close(&body["interestRate"], 6.0);
}

#[tokio::test]
async fn test_create_reports_wallet_before_other_fields() {
    let app = app();
    let token = login(&app, "judy@example.com").await;

    // 지갑 → 금액 → 기간 순서
    let (status, body) = send(
        &app,
        Method::POST,
        "/deposits",
        Some(&token),
        Some(json!({ "amount": true, "duration": "abc" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["details"].as_str().unwrap().contains("Wallet"));

    let (status, body) = send(
        &app,
        Method::POST,
        "/deposits",
        Some(&token),
        Some(json!({ "amount": 0, "duration": "abc", "walletAddress": "0xabc" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["details"].as_str().unwrap().contains("Amount"));
}

#[tokio::test]
async fn test_full_lifecycle() {
    let app = app();
    let token = login(&app, "erin@example.com").await;
    let address = connect_wallet(&app, &token).await;

    let created = create(&app, &token, json!("2"), 3).await;
    let id = created["id"].as_str().unwrap().to_string();
    assert!(id.starts_with("fd_"));
    assert_close(&created["amount"], 2.0);
    assert_eq!(created["duration"], 3);
    assert_close(&created["interestRate"], 6.0);
    assert_eq!(created["walletAddress"], address.as_str());

    // 목록: 파생 값 포함
    let (status, body) = send(&app, Method::GET, "/deposits?currency=ETH", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let list = body.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["id"], id.as_str());
    assert_eq!(list[0]["status"], "active");
    assert_close(&list[0]["maturityAmount"], 2.03);
    assert_close(&list[0]["earlyWithdrawalAmount"], 2.01);
    assert_close(&list[0]["penalty"], 0.02);
    assert_close(&list[0]["localValue"], 507500.0);

    // 상세
    let (status, body) = send(&app, Method::GET, &format!("/deposits/{}", id), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], id.as_str());
    assert!(body.get("localValue").is_none());

    // 만기 전 일반 출금 거부
    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/deposits/{}/withdraw", id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    // 견적
    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/deposits/{}/quote", id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["early"], true);
    assert_close(&body["settlementAmount"], 2.01);

    // 중도 해지
    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/deposits/{}/withdraw-early", id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["depositId"], id.as_str());
    assert_eq!(body["early"], true);
    assert_close(&body["settlementAmount"], 2.01);
    assert_close(&body["penalty"], 0.02);

    // 두 번째 출금 → 404
    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/deposits/{}/withdraw-early", id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");

    let (_, body) = send(&app, Method::GET, "/deposits", Some(&token), None).await;
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_deposits_are_scoped_to_owner() {
    let app = app();
    let owner = login(&app, "frank@example.com").await;
    let other = login(&app, "grace@example.com").await;
    connect_wallet(&app, &owner).await;

    let created = create(&app, &owner, json!(1.5), 6).await;
    let id = created["id"].as_str().unwrap();

    let (status, _) = send(&app, Method::GET, &format!("/deposits/{}", id), Some(&other), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/deposits/{}/withdraw-early", id),
        Some(&other),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = send(&app, Method::GET, "/deposits", Some(&other), None).await;
    assert!(body.as_array().unwrap().is_empty());

    let (_, body) = send(&app, Method::GET, "/deposits", Some(&owner), None).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_unknown_deposit() {
    let app = app();
    let token = login(&app, "heidi@example.com").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/deposits/fd_missing/withdraw",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Deposit fd_missing not found");
}
