//! API integration tests
//!
//! Each test drives the full router with `oneshot` against a fresh
//! in-memory SQLite database.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use chrono::Utc;
use mt_api::auth::jwt::{generate_access_token_at, validate_access_token, JwtConfig};
use mt_api::{create_router, state::AppState};
use mt_core::{AppConfig, PasswordHashConfig, TransactionRepository, UserRepository};
use mt_store::SqliteStore;
use serde_json::{json, Value};
use tower::ServiceExt;

const SECRET: &str = "integration-test-secret";

struct TestApp {
    router: Router,
    store: Arc<SqliteStore>,
    jwt: JwtConfig,
}

async fn test_app() -> TestApp {
    let mut config = AppConfig::default();
    config.auth.jwt_secret = SECRET.to_string();
    config.auth.token_ttl_secs = 3600;
    config.auth.password = PasswordHashConfig {
        memory_cost: 64,
        time_cost: 1,
        parallelism: 1,
    };
    let jwt = JwtConfig::from(&config.auth);

    let store = Arc::new(SqliteStore::in_memory().await.unwrap());
    let state = Arc::new(AppState::with_store(config, store.clone()));

    TestApp {
        router: create_router(state),
        store,
        jwt,
    }
}

fn json_request(method: &str, uri: &str, body: Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn delete_request(uri: &str, authorization: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("DELETE").uri(uri);
    if let Some(value) = authorization {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    builder.body(Body::empty()).unwrap()
}

async fn send(app: &TestApp, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, json)
}

async fn register(app: &TestApp, email: &str, password: &str) -> (StatusCode, Value) {
    send(
        app,
        json_request(
            "POST",
            "/register",
            json!({"email": email, "password": password}),
            None,
        ),
    )
    .await
}

async fn login(app: &TestApp, email: &str, password: &str) -> (StatusCode, Value) {
    send(
        app,
        json_request(
            "POST",
            "/login",
            json!({"email": email, "password": password}),
            None,
        ),
    )
    .await
}

/// Register and log in, returning (user_id, token)
async fn signed_in(app: &TestApp, email: &str) -> (i64, String) {
    let (status, _) = register(app, email, "password123").await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = login(app, email, "password123").await;
    assert_eq!(status, StatusCode::OK);
    (
        body["user_id"].as_i64().unwrap(),
        body["token"].as_str().unwrap().to_string(),
    )
}

async fn create_transaction(app: &TestApp, token: &str, body: Value) -> (StatusCode, Value) {
    send(app, json_request("POST", "/transactions", body, Some(token))).await
}

async fn user_rows(app: &TestApp) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(app.store.pool())
        .await
        .unwrap()
}

// =============================================================================
// Health and docs
// =============================================================================

#[tokio::test]
async fn test_health_check() {
    let app = test_app().await;
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();

    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_openapi_document_lists_endpoints() {
    let app = test_app().await;
    let request = Request::builder()
        .uri("/api-docs/openapi.json")
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    for path in ["/register", "/login", "/transactions", "/transactions/{id}"] {
        assert!(body["paths"][path].is_object(), "missing {path}");
    }

    let login_401 = &body["paths"]["/login"]["post"]["responses"]["401"];
    assert_eq!(
        login_401["content"]["application/json"]["schema"]["$ref"],
        "#/components/schemas/StatusResponse"
    );
    assert!(body["components"]["schemas"]["StatusResponse"].is_object());
}

#[tokio::test]
async fn test_request_id_is_returned() {
    let app = test_app().await;
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();
    assert!(response.headers().contains_key("x-request-id"));
}

// =============================================================================
// Registration
// =============================================================================

#[tokio::test]
async fn test_register_returns_user_id() {
    let app = test_app().await;

    let (status, body) = register(&app, "alice@example.com", "password123").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "OK");
    assert!(body["user_id"].as_i64().unwrap() > 0);
    assert!(body.get("error").is_none());

    let user = app
        .store
        .find_user_by_email("alice@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_ne!(user.password_hash, "password123");
}

#[tokio::test]
async fn test_duplicate_registration_conflicts() {
    let app = test_app().await;
    register(&app, "dup@example.com", "password123").await;

    let (status, body) = register(&app, "dup@example.com", "different99").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["status"], "Error");
    assert_eq!(user_rows(&app).await, 1);
}

#[tokio::test]
async fn test_register_validation() {
    let app = test_app().await;

    let (status, body) = register(&app, "short@example.com", "1234567").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "Error");
    assert!(body["error"].as_str().unwrap().contains("8 characters"));

    let (status, body) = register(&app, "", "password123").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "email is required");

    let (status, _) = send(
        &app,
        json_request("POST", "/register", json!({"email": "x@example.com"}), None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(user_rows(&app).await, 0);
}

#[tokio::test]
async fn test_password_length_counts_characters() {
    let app = test_app().await;

    // 8 characters, 16 bytes
    let (status, _) = register(&app, "unicode@example.com", "пароль12").await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_malformed_json_rejected() {
    let app = test_app().await;
    let request = Request::builder()
        .method("POST")
        .uri("/register")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({"status": "Error", "error": "failed to decode request"})
    );
}

// =============================================================================
// Login
// =============================================================================

#[tokio::test]
async fn test_login_token_subject_is_user_id() {
    let app = test_app().await;
    let (_, registered) = register(&app, "bob@example.com", "password123").await;

    let (status, body) = login(&app, "bob@example.com", "password123").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "OK");
    assert_eq!(body["user_id"], registered["user_id"]);

    let claims = validate_access_token(&app.jwt, body["token"].as_str().unwrap()).unwrap();
    assert_eq!(claims.user_id().unwrap(), registered["user_id"].as_i64().unwrap());
}

#[tokio::test]
async fn test_wrong_password_and_unknown_email_look_the_same() {
    let app = test_app().await;
    register(&app, "carol@example.com", "password123").await;

    let wrong_password = login(&app, "carol@example.com", "password124").await;
    let unknown_email = login(&app, "nobody@example.com", "password123").await;

    assert_eq!(wrong_password.0, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password, unknown_email);
    assert_eq!(wrong_password.1["error"], "invalid credentials");
}

#[tokio::test]
async fn test_email_is_case_sensitive() {
    let app = test_app().await;
    register(&app, "Dave@example.com", "password123").await;

    let (status, _) = login(&app, "dave@example.com", "password123").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// =============================================================================
// Identity middleware
// =============================================================================

#[tokio::test]
async fn test_protected_routes_reject_bad_credentials_uniformly() {
    let app = test_app().await;
    let (user_id, token) = signed_in(&app, "erin@example.com").await;
    let expired = generate_access_token_at(&app.jwt, user_id, 1_000).unwrap();
    let forged = {
        let other = JwtConfig {
            secret: "other-secret".to_string(),
            ..app.jwt.clone()
        };
        mt_api::auth::generate_access_token(&other, user_id).unwrap()
    };

    let mut responses = Vec::new();
    for authorization in [
        None,
        Some(token.clone()),
        Some(format!("Token {token}")),
        Some(format!("Bearer {token} extra")),
        Some(format!("Bearer {expired}")),
        Some(format!("Bearer {forged}")),
        Some("Bearer garbage".to_string()),
    ] {
        responses.push(
            send(
                &app,
                delete_request("/transactions/1", authorization.as_deref()),
            )
            .await,
        );
    }

    for (status, body) in &responses {
        assert_eq!(*status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, &responses[0].1);
    }
    assert_eq!(responses[0].1["status"], "Error");
}

#[tokio::test]
async fn test_create_transaction_requires_token() {
    let app = test_app().await;
    let request = Request::builder()
        .method("POST")
        .uri("/transactions")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({"transaction": {"amount": 1, "category": "food"}}).to_string(),
        ))
        .unwrap();

    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// =============================================================================
// Transactions
// =============================================================================

#[tokio::test]
async fn test_create_transaction_uses_caller_and_server_time() {
    let app = test_app().await;
    let (user_id, token) = signed_in(&app, "frank@example.com").await;
    let before = Utc::now();

    let (status, body) = create_transaction(
        &app,
        &token,
        json!({
            "transaction": {"amount": 500, "category": "food", "user_id": 9999, "date": "2001-01-01T00:00:00Z"},
            "user_id": 9999
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "OK");

    let id = body["transaction_id"].as_i64().unwrap();
    let stored = app.store.find_transaction(id).await.unwrap().unwrap();
    assert_eq!(stored.user_id, user_id);
    assert_eq!(stored.amount, 500);
    assert_eq!(stored.category, "food");
    assert_eq!(stored.description, "");
    assert!((stored.date - before).num_seconds().abs() < 5);
}

#[tokio::test]
async fn test_negative_amount_and_description() {
    let app = test_app().await;
    let (_, token) = signed_in(&app, "gina@example.com").await;

    let (status, body) = create_transaction(
        &app,
        &token,
        json!({"transaction": {"amount": -1250, "category": "transport", "description": "train"}}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let id = body["transaction_id"].as_i64().unwrap();
    let stored = app.store.find_transaction(id).await.unwrap().unwrap();
    assert_eq!(stored.amount, -1250);
    assert_eq!(stored.description, "train");
}

#[tokio::test]
async fn test_create_transaction_validation() {
    let app = test_app().await;
    let (_, token) = signed_in(&app, "hank@example.com").await;

    let (status, body) = create_transaction(
        &app,
        &token,
        json!({"transaction": {"amount": 10, "category": ""}}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "category is required");

    let (status, _) = create_transaction(
        &app,
        &token,
        json!({"transaction": {"amount": "ten", "category": "food"}}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = create_transaction(&app, &token, json!({"amount": 10})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_token_for_deleted_user_is_rejected() {
    let app = test_app().await;
    let (user_id, token) = signed_in(&app, "ivan@example.com").await;

    sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(user_id)
        .execute(app.store.pool())
        .await
        .unwrap();

    let (status, _) = create_transaction(
        &app,
        &token,
        json!({"transaction": {"amount": 1, "category": "food"}}),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_owner_deletes_transaction() {
    let app = test_app().await;
    let (_, token) = signed_in(&app, "judy@example.com").await;
    let (_, body) = create_transaction(
        &app,
        &token,
        json!({"transaction": {"amount": 500, "category": "food"}}),
    )
    .await;
    let id = body["transaction_id"].as_i64().unwrap();
    let uri = format!("/transactions/{id}");
    let bearer = format!("Bearer {token}");

    let (status, body) = send(&app, delete_request(&uri, Some(&bearer))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "OK"}));
    assert!(app.store.find_transaction(id).await.unwrap().is_none());

    let (status, _) = send(&app, delete_request(&uri, Some(&bearer))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_foreign_and_missing_transactions_look_the_same() {
    let app = test_app().await;
    let (_, alice) = signed_in(&app, "alice@example.com").await;
    let (_, bob) = signed_in(&app, "bob@example.com").await;

    let (_, body) = create_transaction(
        &app,
        &alice,
        json!({"transaction": {"amount": 500, "category": "food"}}),
    )
    .await;
    let id = body["transaction_id"].as_i64().unwrap();
    let bob_bearer = format!("Bearer {bob}");

    let foreign = send(
        &app,
        delete_request(&format!("/transactions/{id}"), Some(&bob_bearer)),
    )
    .await;
    let missing = send(
        &app,
        delete_request(&format!("/transactions/{}", id + 1000), Some(&bob_bearer)),
    )
    .await;

    assert_eq!(foreign.0, StatusCode::NOT_FOUND);
    assert_eq!(foreign, missing);
    assert_eq!(foreign.1["status"], "Error");
    assert!(app.store.find_transaction(id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_non_numeric_transaction_id() {
    let app = test_app().await;
    let (_, token) = signed_in(&app, "kim@example.com").await;

    let (status, body) = send(
        &app,
        delete_request("/transactions/abc", Some(&format!("Bearer {token}"))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid transaction id");
}
