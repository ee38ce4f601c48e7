//! HTTP API Handler Tests Infrastructure
//!
//! - `TestAppState` implements `HasCredentials` over the in-memory repositories
//! - Requests go through the production `build_router()`, middleware included
//! - Helpers return the status and the parsed JSON body

pub mod auth_http_test;
pub mod otp_http_test;

use crate::api::{CapturingProviderFactory, Outbox, TestOtpRepository, TestUserRepository};
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use storefront_auth::config::{Config, RecoveryConfig};
use storefront_auth::domain::EmailMessage;
use storefront_auth::email::{EmailProviderFactory, MailTransportSelector};
use storefront_auth::jwt::JwtManager;
use storefront_auth::repository::UserRepository;
use storefront_auth::server::build_router;
use storefront_auth::service::{CredentialService, Mailer};
use storefront_auth::state::HasCredentials;
use tokio::sync::Mutex;
use tower::ServiceExt;

// ============================================================================
// Test Configuration
// ============================================================================

/// Configuration built through the same loader as production
pub fn create_test_config(overrides: &[(&str, &str)]) -> Config {
    let mut vars: HashMap<String, String> = [
        ("DATABASE_URL", "mysql://localhost/storefront_test"),
        ("JWT_SECRET", "test-secret-key-for-api-testing-purposes"),
        ("APP_PUBLIC_URL", "https://shop.test"),
        ("EMAIL_FROM", "noreply@shop.test"),
        ("METRICS_ENABLED", "false"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    for (key, value) in overrides {
        vars.insert(key.to_string(), value.to_string());
    }

    Config::from_lookup(|key| vars.get(key).cloned()).unwrap()
}

// ============================================================================
// Test App State
// ============================================================================

#[derive(Clone)]
pub struct TestAppState {
    pub config: Arc<Config>,
    pub credential_service: Arc<CredentialService<TestUserRepository, TestOtpRepository>>,
    pub jwt_manager: Arc<JwtManager>,
    pub user_repo: Arc<TestUserRepository>,
    pub otp_repo: Arc<TestOtpRepository>,
    pub outbox: Outbox,
}

impl TestAppState {
    /// Development environment, link recovery, direct reset off
    pub fn new() -> Self {
        Self::with_config(&[])
    }

    pub fn with_config(overrides: &[(&str, &str)]) -> Self {
        let outbox: Outbox = Arc::new(Mutex::new(vec![]));
        let factory = Arc::new(CapturingProviderFactory::new(outbox.clone()));
        Self::build(create_test_config(overrides), outbox, factory)
    }

    /// Every send fails after the transport is built
    pub fn with_failing_mail(overrides: &[(&str, &str)]) -> Self {
        let outbox: Outbox = Arc::new(Mutex::new(vec![]));
        let factory = Arc::new(CapturingProviderFactory::failing(outbox.clone()));
        Self::build(create_test_config(overrides), outbox, factory)
    }

    fn build(config: Config, outbox: Outbox, factory: Arc<dyn EmailProviderFactory>) -> Self {
        let user_repo = Arc::new(TestUserRepository::new());
        let otp_repo = Arc::new(TestOtpRepository::new());

        let selector = Arc::new(MailTransportSelector::new(
            config.mail.clone(),
            config.app.environment,
            factory,
        ));
        let mailer = Arc::new(Mailer::new(selector, config.app.name.clone()));
        let jwt_manager = Arc::new(JwtManager::new(config.jwt.clone()));
        let credential_service = Arc::new(CredentialService::new(
            user_repo.clone(),
            otp_repo.clone(),
            mailer,
            jwt_manager.clone(),
            config.recovery.clone(),
            config.app.public_url.clone(),
        ));

        Self {
            config: Arc::new(config),
            credential_service,
            jwt_manager,
            user_repo,
            otp_repo,
            outbox,
        }
    }

    pub fn recovery(&self) -> &RecoveryConfig {
        &self.config.recovery
    }

    pub async fn sent_messages(&self) -> Vec<EmailMessage> {
        self.outbox.lock().await.clone()
    }

    pub async fn last_message_to(&self, email: &str) -> EmailMessage {
        let outbox = self.outbox.lock().await;
        outbox
            .iter()
            .rev()
            .find(|m| m.to.iter().any(|a| a.email == email))
            .cloned()
            .unwrap_or_else(|| panic!("no message sent to {}", email))
    }
}

impl HasCredentials for TestAppState {
    type UserRepo = TestUserRepository;
    type OtpRepo = TestOtpRepository;

    fn config(&self) -> &Config {
        &self.config
    }

    fn credential_service(&self) -> &CredentialService<Self::UserRepo, Self::OtpRepo> {
        &self.credential_service
    }

    fn jwt_manager(&self) -> &JwtManager {
        &self.jwt_manager
    }

    fn prometheus_handle(&self) -> Option<&PrometheusHandle> {
        None
    }

    async fn check_ready(&self) -> bool {
        self.user_repo.ping().await.is_ok()
    }
}

// ============================================================================
// Test Router Builder
// ============================================================================

/// The production router over `TestAppState`
pub fn build_test_router(state: TestAppState) -> Router {
    build_router(state)
}

// ============================================================================
// HTTP Test Helpers
// ============================================================================

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Option<Value>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();

    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap_or_default();

    if body_bytes.is_empty() {
        return (status, None);
    }

    (status, serde_json::from_slice(&body_bytes).ok())
}

/// Make a POST request with JSON body and parse JSON response
pub async fn post_json<T: Serialize>(
    app: &Router,
    path: &str,
    body: &T,
) -> (StatusCode, Option<Value>) {
    let request = Request::builder()
        .method(Method::POST)
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_string(body).unwrap()))
        .unwrap();

    send(app, request).await
}

/// POST with a bearer token
pub async fn post_json_with_auth<T: Serialize>(
    app: &Router,
    path: &str,
    body: &T,
    token: &str,
) -> (StatusCode, Option<Value>) {
    let request = Request::builder()
        .method(Method::POST)
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::from(serde_json::to_string(body).unwrap()))
        .unwrap();

    send(app, request).await
}

/// POST a raw body with the given content type
pub async fn post_raw(
    app: &Router,
    path: &str,
    content_type: &str,
    body: &'static str,
) -> (StatusCode, Option<Value>) {
    let request = Request::builder()
        .method(Method::POST)
        .uri(path)
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(body))
        .unwrap();

    send(app, request).await
}

/// GET and return the status with the raw body text
pub async fn get_text(app: &Router, path: &str) -> (StatusCode, String) {
    let request = Request::builder()
        .method(Method::GET)
        .uri(path)
        .body(Body::empty())
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap_or_default();
    (status, String::from_utf8_lossy(&body_bytes).into_owned())
}

/// Register through the API and return the session token
pub async fn register_user(app: &Router, name: &str, email: &str, password: &str) -> String {
    let (status, body) = post_json(
        app,
        "/api/auth/register",
        &serde_json::json!({ "name": name, "email": email, "password": password }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "register failed: {:?}", body);
    body.unwrap()["token"].as_str().unwrap().to_string()
}

pub fn message(body: &Option<Value>) -> &str {
    body.as_ref()
        .and_then(|b| b["msg"].as_str())
        .unwrap_or_default()
}

// ============================================================================
// Tests for the infrastructure itself
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use storefront_auth::domain::RecoveryStrategy;

    #[test]
    fn test_create_test_config_defaults() {
        let config = create_test_config(&[]);
        assert_eq!(config.app.public_url, "https://shop.test");
        assert_eq!(config.recovery.strategy, RecoveryStrategy::Link);
        assert!(!config.recovery.direct_reset_enabled);
        assert!(!config.telemetry.metrics_enabled);
    }

    #[test]
    fn test_create_test_config_overrides() {
        let config = create_test_config(&[("PASSWORD_RESET_STRATEGY", "otp")]);
        assert_eq!(config.recovery.strategy, RecoveryStrategy::Otp);
    }

    #[tokio::test]
    async fn test_health_and_ready() {
        let app = build_test_router(TestAppState::new());

        let (status, body) = get_text(&app, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("healthy"));

        let (status, body) = get_text(&app, "/ready").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "ready");
    }

    #[tokio::test]
    async fn test_ready_reports_store_outage() {
        let state = TestAppState::new();
        let app = build_test_router(state.clone());

        state.user_repo.set_reachable(false);
        let (status, body) = get_text(&app, "/ready").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body, "not_ready");

        state.user_repo.set_reachable(true);
        let (status, _) = get_text(&app, "/ready").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_metrics_disabled_returns_not_found() {
        let app = build_test_router(TestAppState::new());
        let (status, _) = get_text(&app, "/metrics").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
