//! OTP-gated signup HTTP API handler tests

use super::{build_test_router, message, post_json, register_user, TestAppState};
use crate::api::extract_otp;
use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;
use storefront_auth::domain::OtpPurpose;

async fn request_signup_code(app: &axum::Router, state: &TestAppState, email: &str) -> String {
    let (status, body) = post_json(app, "/api/auth/send-signup-otp", &json!({ "email": email })).await;
    assert_eq!(status, StatusCode::OK, "send-signup-otp failed: {:?}", body);
    assert_eq!(message(&body), "OTP sent to email for signup verification");
    extract_otp(&state.last_message_to(email).await)
}

fn signup_body(email: &str, otp: &str) -> serde_json::Value {
    json!({ "name": "Ann", "email": email, "password": "pw123", "otp": otp })
}

// ============================================================================
// Send Signup OTP Tests
// ============================================================================

#[tokio::test]
async fn test_send_signup_otp_emails_four_digit_code() {
    let state = TestAppState::new();
    let app = build_test_router(state.clone());

    let code = request_signup_code(&app, &state, "ann@example.com").await;

    assert_eq!(code.len(), 4);
    assert!(code.chars().all(|c| c.is_ascii_digit()));
    assert!(code.parse::<u32>().unwrap() >= 1000);

    let messages = state.sent_messages().await;
    assert_eq!(messages.len(), 1);
    assert!(messages[0].html_body.contains(&code));

    let record = state
        .otp_repo
        .get("ann@example.com", OtpPurpose::Signup)
        .await
        .unwrap();
    assert_ne!(record.code_hash, code);
}

#[tokio::test]
async fn test_signup_otp_email_states_configured_lifetime() {
    let state = TestAppState::with_config(&[("OTP_TTL_SECS", "600")]);
    let app = build_test_router(state.clone());

    let code = request_signup_code(&app, &state, "ann@example.com").await;

    let sent = state.last_message_to("ann@example.com").await;
    let expected = format!(
        "Welcome to {}, your OTP is {}. It is valid for 10 minutes.",
        state.config.app.name, code
    );
    assert_eq!(sent.text_body.as_deref(), Some(expected.as_str()));
}

#[tokio::test]
async fn test_send_signup_otp_normalizes_address() {
    let state = TestAppState::new();
    let app = build_test_router(state.clone());

    let (status, _) = post_json(
        &app,
        "/api/auth/send-signup-otp",
        &json!({ "email": " Ann@Example.COM " }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(state
        .otp_repo
        .get("ann@example.com", OtpPurpose::Signup)
        .await
        .is_some());
    state.last_message_to("ann@example.com").await;
}

#[tokio::test]
async fn test_send_signup_otp_for_registered_email() {
    let state = TestAppState::new();
    let app = build_test_router(state.clone());
    register_user(&app, "Ann", "ann@example.com", "pw123").await;

    let (status, body) = post_json(
        &app,
        "/api/auth/send-signup-otp",
        &json!({ "email": "ann@example.com" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(message(&body), "User already registered with this email");
    assert_eq!(state.otp_repo.count().await, 0);
    assert!(state.sent_messages().await.is_empty());
}

#[tokio::test]
async fn test_send_signup_otp_without_mail_in_production() {
    let state = TestAppState::with_config(&[("APP_ENV", "production")]);
    let app = build_test_router(state.clone());

    let (status, body) = post_json(
        &app,
        "/api/auth/send-signup-otp",
        &json!({ "email": "ann@example.com" }),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body.unwrap()["error"], "mail_not_configured");
    assert!(state.sent_messages().await.is_empty());
    assert_eq!(state.otp_repo.count().await, 0);
}

#[tokio::test]
async fn test_send_signup_otp_delivery_failure() {
    let state = TestAppState::with_failing_mail(&[]);
    let app = build_test_router(state.clone());

    let (status, body) = post_json(
        &app,
        "/api/auth/send-signup-otp",
        &json!({ "email": "ann@example.com" }),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(message(&body), "Failed to deliver email");
}

// ============================================================================
// Register With OTP Tests
// ============================================================================

#[tokio::test]
async fn test_signup_code_works_once() {
    let state = TestAppState::new();
    let app = build_test_router(state.clone());
    let code = request_signup_code(&app, &state, "ann@example.com").await;

    let (status, body) = post_json(
        &app,
        "/api/auth/register-with-otp",
        &signup_body("ann@example.com", &code),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let body = body.unwrap();
    assert!(!body["token"].as_str().unwrap().is_empty());
    assert_eq!(body["user"]["email"], "ann@example.com");
    assert_eq!(state.otp_repo.count().await, 0);

    let (status, _) = post_json(
        &app,
        "/api/auth/register-with-otp",
        &signup_body("ann@example.com", &code),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(state.user_repo.count().await, 1);
}

#[tokio::test]
async fn test_signup_code_is_bound_to_its_address() {
    let state = TestAppState::new();
    let app = build_test_router(state.clone());
    let code = request_signup_code(&app, &state, "ann@example.com").await;

    let (status, body) = post_json(
        &app,
        "/api/auth/register-with-otp",
        &signup_body("bob@example.com", &code),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(message(&body), "OTP invalid or expired");
    assert_eq!(state.user_repo.count().await, 0);
}

#[tokio::test]
async fn test_wrong_code_does_not_burn_the_real_one() {
    let state = TestAppState::new();
    let app = build_test_router(state.clone());
    let code = request_signup_code(&app, &state, "ann@example.com").await;
    let wrong = if code == "1000" { "1001" } else { "1000" };

    let (status, body) = post_json(
        &app,
        "/api/auth/register-with-otp",
        &signup_body("ann@example.com", wrong),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(message(&body), "OTP invalid or expired");

    let (status, _) = post_json(
        &app,
        "/api/auth/register-with-otp",
        &signup_body("ann@example.com", &code),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_reissued_code_replaces_previous() {
    let state = TestAppState::new();
    let app = build_test_router(state.clone());
    let first = request_signup_code(&app, &state, "ann@example.com").await;
    let second = request_signup_code(&app, &state, "ann@example.com").await;

    assert_eq!(state.otp_repo.count().await, 1);

    if first != second {
        let (status, _) = post_json(
            &app,
            "/api/auth/register-with-otp",
            &signup_body("ann@example.com", &first),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    let (status, _) = post_json(
        &app,
        "/api/auth/register-with-otp",
        &signup_body("ann@example.com", &second),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_expired_code_is_rejected() {
    let state = TestAppState::new();
    let app = build_test_router(state.clone());
    let code = request_signup_code(&app, &state, "ann@example.com").await;
    state.otp_repo.expire_all().await;

    let (status, body) = post_json(
        &app,
        "/api/auth/register-with-otp",
        &signup_body("ann@example.com", &code),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(message(&body), "OTP invalid or expired");
    assert_eq!(state.user_repo.count().await, 0);
}

#[tokio::test]
async fn test_expired_codes_are_swept() {
    let state = TestAppState::new();
    let app = build_test_router(state.clone());
    request_signup_code(&app, &state, "ann@example.com").await;
    request_signup_code(&app, &state, "bob@example.com").await;
    state.otp_repo.expire_all().await;

    let removed = state
        .credential_service
        .otp_ledger()
        .sweep_expired()
        .await
        .unwrap();

    assert_eq!(removed, 2);
    assert_eq!(state.otp_repo.count().await, 0);
}

#[tokio::test]
async fn test_register_with_otp_missing_fields() {
    let app = build_test_router(TestAppState::new());

    let (status, body) = post_json(
        &app,
        "/api/auth/register-with-otp",
        &json!({ "email": "ann@example.com", "otp": "1234" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(message(&body), "All fields are required");
}

#[tokio::test]
async fn test_concurrent_signup_with_one_code_creates_one_account() {
    let state = TestAppState::new();
    let app = build_test_router(state.clone());
    let code = request_signup_code(&app, &state, "ann@example.com").await;

    let handles: Vec<_> = (0..3)
        .map(|_| {
            let app = app.clone();
            let body = signup_body("ann@example.com", &code);
            tokio::spawn(async move {
                post_json(&app, "/api/auth/register-with-otp", &body)
                    .await
                    .0
            })
        })
        .collect();

    let mut created = 0;
    for handle in handles {
        if handle.await.unwrap() == StatusCode::OK {
            created += 1;
        }
    }

    assert_eq!(created, 1);
    assert_eq!(state.user_repo.count().await, 1);
}
