//! Application state traits for dependency injection
//!
//! Handlers are generic over `HasCredentials` so the production `AppState`
//! and test states with in-memory repositories share one router.

use crate::config::Config;
use crate::jwt::JwtManager;
use crate::repository::{OtpRepository, UserRepository};
use crate::service::CredentialService;
use metrics_exporter_prometheus::PrometheusHandle;

pub trait HasCredentials: Clone + Send + Sync + 'static {
    type UserRepo: UserRepository;
    type OtpRepo: OtpRepository;

    fn config(&self) -> &Config;

    fn credential_service(&self) -> &CredentialService<Self::UserRepo, Self::OtpRepo>;

    fn jwt_manager(&self) -> &JwtManager;

    /// Prometheus renderer, present when metrics are enabled
    fn prometheus_handle(&self) -> Option<&PrometheusHandle>;

    /// Whether the backing store answers
    fn check_ready(&self) -> impl std::future::Future<Output = bool> + Send;
}
