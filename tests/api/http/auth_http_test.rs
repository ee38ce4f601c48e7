//! Registration and login HTTP API handler tests

use super::{
    build_test_router, message, post_json, post_json_with_auth, post_raw, register_user,
    TestAppState,
};
use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;

// ============================================================================
// Register Tests
// ============================================================================

#[tokio::test]
async fn test_register_returns_session_and_public_user() {
    let state = TestAppState::new();
    let app = build_test_router(state.clone());

    let (status, body) = post_json(
        &app,
        "/api/auth/register",
        &json!({ "name": "Ann", "email": "Ann@Example.com", "password": "pw123" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let body = body.unwrap();
    assert!(!body["token"].as_str().unwrap().is_empty());
    assert_eq!(body["user"]["name"], "Ann");
    assert_eq!(body["user"]["email"], "ann@example.com");
    assert_eq!(body["user"]["isAdmin"], false);
    assert!(body["user"].get("password_hash").is_none());
    assert!(body["user"].get("passwordHash").is_none());

    let stored = state.user_repo.get_by_email("ann@example.com").await.unwrap();
    assert_ne!(stored.password_hash, "pw123");
    assert!(stored.password_hash.starts_with("$argon2"));
}

#[tokio::test]
async fn test_register_ignores_admin_flag() {
    let state = TestAppState::new();
    let app = build_test_router(state.clone());

    let (status, body) = post_json(
        &app,
        "/api/auth/register",
        &json!({ "name": "Eve", "email": "eve@example.com", "password": "pw123", "isAdmin": true }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap()["user"]["isAdmin"], false);
    assert!(!state.user_repo.get_by_email("eve@example.com").await.unwrap().is_admin);
}

#[tokio::test]
async fn test_register_duplicate_normalized_email() {
    let state = TestAppState::new();
    let app = build_test_router(state.clone());
    register_user(&app, "Ann", "ann@example.com", "pw123").await;

    let (status, body) = post_json(
        &app,
        "/api/auth/register",
        &json!({ "name": "Other", "email": "  ANN@example.COM ", "password": "other" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(message(&body), "User exists");
    assert_eq!(state.user_repo.count().await, 1);
}

#[tokio::test]
async fn test_register_missing_fields() {
    let app = build_test_router(TestAppState::new());

    let (status, body) = post_json(
        &app,
        "/api/auth/register",
        &json!({ "email": "ann@example.com" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(!message(&body).is_empty());
}

#[tokio::test]
async fn test_blank_email_is_rejected_everywhere() {
    let state = TestAppState::new();
    let app = build_test_router(state.clone());

    let (status, body) = post_json(
        &app,
        "/api/auth/register",
        &json!({ "name": "Ann", "email": "   ", "password": "pw123" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(message(&body), "Email is required");

    let (status, body) = post_json(
        &app,
        "/api/auth/register",
        &json!({ "name": "   ", "email": "   ", "password": "pw123" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body.unwrap()["error"], "validation");
    assert_eq!(state.user_repo.count().await, 0);

    let (status, body) = post_json(&app, "/api/auth/send-signup-otp", &json!({ "email": "   " })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(message(&body), "Email is required");

    let (status, body) = post_json(&app, "/api/auth/forgotpassword", &json!({ "email": "  " })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(message(&body), "Email is required");

    let (status, body) = post_json(
        &app,
        "/api/auth/resetpassword",
        &json!({ "email": " ", "token": "abc", "password": "fresh", "confirmPassword": "fresh" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(message(&body), "Email is required");

    assert_eq!(state.user_repo.count().await, 0);
    assert_eq!(state.otp_repo.count().await, 0);
    assert!(state.sent_messages().await.is_empty());
}

#[tokio::test]
async fn test_register_trims_name() {
    let app = build_test_router(TestAppState::new());

    let (status, body) = post_json(
        &app,
        "/api/auth/register",
        &json!({ "name": "  Ann  ", "email": "ann@example.com", "password": "pw123" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap()["user"]["name"], "Ann");
}

#[tokio::test]
async fn test_concurrent_register_creates_one_account() {
    let state = TestAppState::new();
    let app = build_test_router(state.clone());

    let requests = (0..4).map(|i| {
        let app = app.clone();
        async move {
            post_json(
                &app,
                "/api/auth/register",
                &json!({ "name": format!("Racer {}", i), "email": "race@example.com", "password": "pw123" }),
            )
            .await
            .0
        }
    });
    let handles: Vec<_> = requests.map(tokio::spawn).collect();
    let mut statuses = Vec::with_capacity(handles.len());
    for handle in handles {
        statuses.push(handle.await.unwrap());
    }

    let created = statuses.iter().filter(|s| **s == StatusCode::OK).count();
    assert_eq!(created, 1);
    assert!(statuses
        .iter()
        .all(|s| *s == StatusCode::OK || *s == StatusCode::BAD_REQUEST));
    assert_eq!(state.user_repo.count().await, 1);
}

// ============================================================================
// Login Tests
// ============================================================================

#[tokio::test]
async fn test_login_is_case_insensitive_on_email() {
    let app = build_test_router(TestAppState::new());
    register_user(&app, "Ann", "ann@example.com", "pw123").await;

    let (status, body) = post_json(
        &app,
        "/api/auth/login",
        &json!({ "email": "ANN@EXAMPLE.COM", "password": "pw123" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let body = body.unwrap();
    assert_eq!(body["user"]["email"], "ann@example.com");
    assert!(!body["token"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_login_wrong_password_and_unknown_email_look_alike() {
    let app = build_test_router(TestAppState::new());
    register_user(&app, "Ann", "ann@example.com", "pw123").await;

    let (wrong_status, wrong_body) = post_json(
        &app,
        "/api/auth/login",
        &json!({ "email": "ann@example.com", "password": "nope" }),
    )
    .await;
    let (unknown_status, unknown_body) = post_json(
        &app,
        "/api/auth/login",
        &json!({ "email": "ghost@example.com", "password": "pw123" }),
    )
    .await;

    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_body, unknown_body);
    assert_eq!(message(&wrong_body), "Invalid credentials");
}

#[tokio::test]
async fn test_session_token_identifies_account() {
    let state = TestAppState::new();
    let app = build_test_router(state.clone());
    let token = register_user(&app, "Ann", "ann@example.com", "pw123").await;

    let claims = state.jwt_manager.verify_session_token(&token).unwrap();
    let stored = state.user_repo.get_by_email("ann@example.com").await.unwrap();
    assert_eq!(claims.sub, stored.id.to_string());
    assert_eq!(claims.email, "ann@example.com");
}

// ============================================================================
// Session Guard Tests
// ============================================================================

#[tokio::test]
async fn test_protected_route_without_token() {
    let app = build_test_router(TestAppState::new());

    let (status, body) = post_json(
        &app,
        "/api/auth/resetpassword-me",
        &json!({ "password": "fresh", "confirmPassword": "fresh" }),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body.unwrap()["error"], "unauthorized");
}

#[tokio::test]
async fn test_protected_route_with_garbage_token() {
    let app = build_test_router(TestAppState::new());

    let (status, _) = post_json_with_auth(
        &app,
        "/api/auth/resetpassword-me",
        &json!({ "password": "fresh", "confirmPassword": "fresh" }),
        "not-a-jwt",
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Error Body Tests
// ============================================================================

#[tokio::test]
async fn test_malformed_json_gets_uniform_error_body() {
    let app = build_test_router(TestAppState::new());

    let (status, body) = post_raw(&app, "/api/auth/login", "application/json", "{not json").await;

    assert!(status.is_client_error());
    let body = body.unwrap();
    assert!(body["error"].is_string());
    assert!(body["msg"].is_string());
}

#[tokio::test]
async fn test_unknown_route_gets_uniform_error_body() {
    let app = build_test_router(TestAppState::new());

    let (status, body) = post_json(&app, "/api/auth/nope", &json!({})).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body.unwrap()["error"], "not_found");
}
