//! Configuration management for the credential service

use crate::domain::RecoveryStrategy;
use anyhow::{Context, Result};
use std::env;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server host
    pub http_host: String,
    /// HTTP server port
    pub http_port: u16,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Session token configuration
    pub jwt: JwtConfig,
    /// Outbound mail configuration
    pub mail: MailConfig,
    /// Application identity and deployment mode
    pub app: AppSettings,
    /// Password recovery behaviour
    pub recovery: RecoveryConfig,
    /// Logging and metrics
    pub telemetry: TelemetryConfig,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    /// Connection attempts before giving up at startup
    pub connect_max_retries: u32,
    /// Base delay; attempt `n` waits `n * connect_retry_delay_ms`
    pub connect_retry_delay_ms: u64,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub session_ttl_secs: i64,
}

/// Raw mail settings. Precedence between them is decided by
/// [`crate::email::resolve_transport_config`].
#[derive(Debug, Clone, Default)]
pub struct MailConfig {
    pub smtp_url: Option<String>,
    pub smtp_host: Option<String>,
    pub smtp_port: Option<u16>,
    pub smtp_secure: bool,
    pub smtp_user: Option<String>,
    pub smtp_pass: Option<String>,
    pub email_user: Option<String>,
    pub email_pass: Option<String>,
    pub gmail_app_password: Option<String>,
    pub email_service: Option<String>,
    pub email_from: Option<String>,
    pub smtp_from: Option<String>,
    pub ethereal_api_url: String,
    pub timeout_secs: u64,
}

impl MailConfig {
    /// First configured sender address, in `EMAIL_FROM`, `SMTP_FROM`,
    /// `SMTP_USER`, `EMAIL_USER` order
    pub fn configured_from(&self) -> Option<&str> {
        [
            &self.email_from,
            &self.smtp_from,
            &self.smtp_user,
            &self.email_user,
        ]
        .into_iter()
        .find_map(|v| v.as_deref())
    }
}

/// Deployment mode. Diagnostics and the test mailbox fallback only exist
/// outside production.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppEnvironment {
    #[default]
    Development,
    Production,
}

impl AppEnvironment {
    pub fn from_value(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_lowercase()) {
            Some(v) if v == "production" || v == "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, Clone)]
pub struct AppSettings {
    pub name: String,
    /// Base URL of the storefront, used to build reset links
    pub public_url: String,
    pub environment: AppEnvironment,
}

#[derive(Debug, Clone)]
pub struct RecoveryConfig {
    pub strategy: RecoveryStrategy,
    /// Answer the OTP forgot-password flow with the generic acknowledgment
    /// for unknown accounts instead of 404
    pub hide_account_existence: bool,
    /// Mount `resetpassword-direct`
    pub direct_reset_enabled: bool,
    pub otp_ttl_secs: i64,
    pub reset_token_ttl_secs: i64,
    /// Zero disables the background sweep
    pub otp_sweep_interval_secs: u64,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            strategy: RecoveryStrategy::Link,
            hide_account_existence: false,
            direct_reset_enabled: false,
            otp_ttl_secs: 300,
            reset_token_ttl_secs: 3600,
            otp_sweep_interval_secs: 600,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub metrics_enabled: bool,
    /// `json` or `text`
    pub log_format: String,
}

/// Accepts `true`, `1`, `yes` and `on`, case-insensitively
pub fn parse_bool(value: Option<&str>) -> bool {
    matches!(
        value.map(|v| v.trim().to_lowercase()).as_deref(),
        Some("true" | "1" | "yes" | "on")
    )
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| var(key).filter(|v| !v.trim().is_empty());

        let environment = AppEnvironment::from_value(
            non_empty("APP_ENV")
                .or_else(|| non_empty("NODE_ENV"))
                .as_deref(),
        );

        Ok(Self {
            http_host: var("HTTP_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            http_port: non_empty("HTTP_PORT")
                .or_else(|| non_empty("PORT"))
                .unwrap_or_else(|| "8080".to_string())
                .parse()
                .context("Invalid HTTP_PORT")?,
            database: DatabaseConfig {
                url: non_empty("DATABASE_URL").context("DATABASE_URL is required")?,
                max_connections: var("DATABASE_MAX_CONNECTIONS")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(10),
                min_connections: var("DATABASE_MIN_CONNECTIONS")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(2),
                connect_max_retries: var("DATABASE_CONNECT_MAX_RETRIES")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(5),
                connect_retry_delay_ms: var("DATABASE_CONNECT_RETRY_DELAY_MS")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(1000),
            },
            jwt: JwtConfig {
                secret: non_empty("JWT_SECRET").context("JWT_SECRET is required")?,
                issuer: var("JWT_ISSUER").unwrap_or_else(|| "storefront-auth".to_string()),
                session_ttl_secs: var("JWT_SESSION_TTL_SECS")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(30 * 24 * 3600),
            },
            mail: MailConfig {
                smtp_url: non_empty("SMTP_URL"),
                smtp_host: non_empty("SMTP_HOST"),
                smtp_port: non_empty("SMTP_PORT")
                    .map(|v| v.parse())
                    .transpose()
                    .context("Invalid SMTP_PORT")?,
                smtp_secure: parse_bool(var("SMTP_SECURE").as_deref()),
                smtp_user: non_empty("SMTP_USER"),
                smtp_pass: non_empty("SMTP_PASS"),
                email_user: non_empty("EMAIL_USER"),
                email_pass: non_empty("EMAIL_PASS"),
                gmail_app_password: non_empty("GMAIL_APP_PASSWORD"),
                email_service: non_empty("EMAIL_SERVICE"),
                email_from: non_empty("EMAIL_FROM"),
                smtp_from: non_empty("SMTP_FROM"),
                ethereal_api_url: non_empty("ETHEREAL_API_URL")
                    .unwrap_or_else(|| "https://api.nodemailer.com".to_string()),
                timeout_secs: var("SMTP_TIMEOUT_SECS")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(10),
            },
            app: AppSettings {
                name: non_empty("APP_NAME").unwrap_or_else(|| "Fight Wisdom".to_string()),
                public_url: non_empty("APP_PUBLIC_URL")
                    .unwrap_or_else(|| "http://localhost:3000".to_string()),
                environment,
            },
            recovery: {
                let defaults = RecoveryConfig::default();
                RecoveryConfig {
                    strategy: match non_empty("PASSWORD_RESET_STRATEGY") {
                        Some(v) => v
                            .parse()
                            .map_err(anyhow::Error::msg)
                            .context("Invalid PASSWORD_RESET_STRATEGY")?,
                        None => defaults.strategy,
                    },
                    hide_account_existence: parse_bool(
                        var("RECOVERY_HIDE_ACCOUNT_EXISTENCE").as_deref(),
                    ),
                    direct_reset_enabled: parse_bool(var("DIRECT_RESET_ENABLED").as_deref()),
                    otp_ttl_secs: var("OTP_TTL_SECS")
                        .and_then(|v| v.parse().ok())
                        .unwrap_or(defaults.otp_ttl_secs),
                    reset_token_ttl_secs: var("RESET_TOKEN_TTL_SECS")
                        .and_then(|v| v.parse().ok())
                        .unwrap_or(defaults.reset_token_ttl_secs),
                    otp_sweep_interval_secs: var("OTP_SWEEP_INTERVAL_SECS")
                        .and_then(|v| v.parse().ok())
                        .unwrap_or(defaults.otp_sweep_interval_secs),
                }
            },
            telemetry: TelemetryConfig {
                metrics_enabled: var("METRICS_ENABLED")
                    .map(|v| parse_bool(Some(&v)))
                    .unwrap_or(true),
                log_format: var("LOG_FORMAT").unwrap_or_else(|| "text".to_string()),
            },
        })
    }

    /// Get HTTP server address
    pub fn http_addr(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }
}
