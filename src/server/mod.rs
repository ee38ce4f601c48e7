//! Server initialization and routing

use crate::api;
use crate::config::Config;
use crate::email::{MailTransportSelector, SmtpProviderFactory};
use crate::jwt::JwtManager;
use crate::middleware::{normalize_error_response, ObservabilityLayer};
use crate::migration::run_migrations;
use crate::repository::{
    connect_with_retry, OtpRepository, OtpRepositoryImpl, UserRepository, UserRepositoryImpl,
};
use crate::service::{CredentialService, Mailer};
use crate::state::HasCredentials;
use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{debug, error, info, warn};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub user_repo: Arc<UserRepositoryImpl>,
    pub credential_service: Arc<CredentialService<UserRepositoryImpl, OtpRepositoryImpl>>,
    pub jwt_manager: Arc<JwtManager>,
    pub prometheus_handle: Option<PrometheusHandle>,
}

impl HasCredentials for AppState {
    type UserRepo = UserRepositoryImpl;
    type OtpRepo = OtpRepositoryImpl;

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
        self.prometheus_handle.as_ref()
    }

    async fn check_ready(&self) -> bool {
        self.user_repo.ping().await.is_ok()
    }
}

/// Connect, migrate, wire services and serve until a shutdown signal
pub async fn run(config: Config, prometheus_handle: Option<PrometheusHandle>) -> Result<()> {
    let db_pool = connect_with_retry(&config.database).await?;
    run_migrations(&db_pool).await?;

    let user_repo = Arc::new(UserRepositoryImpl::new(db_pool.clone()));
    let otp_repo = Arc::new(OtpRepositoryImpl::new(db_pool.clone()));

    let provider_factory = Arc::new(SmtpProviderFactory::new(
        config.mail.ethereal_api_url.clone(),
        Duration::from_secs(config.mail.timeout_secs),
    )?);
    let selector = Arc::new(MailTransportSelector::new(
        config.mail.clone(),
        config.app.environment,
        provider_factory,
    ));
    let mailer = Arc::new(Mailer::new(selector, config.app.name.clone()));

    let jwt_manager = Arc::new(JwtManager::new(config.jwt.clone()));
    let credential_service = Arc::new(CredentialService::new(
        user_repo.clone(),
        otp_repo,
        mailer,
        jwt_manager.clone(),
        config.recovery.clone(),
        config.app.public_url.clone(),
    ));

    let _sweeper = spawn_otp_sweep(
        credential_service.clone(),
        Duration::from_secs(config.recovery.otp_sweep_interval_secs),
    );

    let http_addr = config.http_addr();
    info!(
        environment = ?config.app.environment,
        strategy = ?config.recovery.strategy,
        direct_reset = config.recovery.direct_reset_enabled,
        "Starting storefront auth service"
    );

    let state = AppState {
        config: Arc::new(config),
        user_repo,
        credential_service,
        jwt_manager,
        prometheus_handle,
    };
    let app = build_router(state);

    let listener = TcpListener::bind(&http_addr).await?;
    info!("HTTP server started on {}", http_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("HTTP server stopped");
    Ok(())
}

/// Periodically delete expired OTP records. A zero interval disables the sweep.
pub fn spawn_otp_sweep<U, O>(
    service: Arc<CredentialService<U, O>>,
    every: Duration,
) -> Option<JoinHandle<()>>
where
    U: UserRepository + 'static,
    O: OtpRepository + 'static,
{
    if every.is_zero() {
        info!("OTP sweep disabled");
        return None;
    }

    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match service.otp_ledger().sweep_expired().await {
                Ok(0) => {}
                Ok(removed) => debug!(removed, "Swept expired OTP records"),
                Err(e) => warn!("OTP sweep failed: {}", e),
            }
        }
    }))
}

/// Build the HTTP router with generic state type
///
/// Works with the production `AppState` and with test states that implement
/// `HasCredentials` over in-memory repositories.
pub fn build_router<S: HasCredentials>(state: S) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut auth_routes = Router::new()
        .route("/register", post(api::auth::register::<S>))
        .route("/login", post(api::auth::login::<S>))
        .route("/send-signup-otp", post(api::auth::send_signup_otp::<S>))
        .route("/register-with-otp", post(api::auth::register_with_otp::<S>))
        .route("/forgotpassword", post(api::password::forgot_password::<S>))
        .route("/resetpassword", post(api::password::reset_password::<S>))
        .route("/resetpassword-me", post(api::password::reset_password_me::<S>));

    if state.config().recovery.direct_reset_enabled {
        auth_routes = auth_routes.route(
            "/resetpassword-direct",
            post(api::password::reset_password_direct::<S>),
        );
    }

    Router::new()
        .route("/health", get(api::health::health))
        .route("/ready", get(api::health::ready::<S>))
        .route("/metrics", get(api::health::metrics::<S>))
        .nest("/api/auth", auth_routes)
        .layer(axum::middleware::from_fn(normalize_error_response))
        .layer(ObservabilityLayer)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
