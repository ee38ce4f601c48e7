//! Unified error handling for the credential service

use crate::domain::{SecretKind, SecretRejection};
use crate::email::EmailProviderError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Application-wide result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// A presented OTP or reset token was rejected. The reason is never
    /// returned to the client.
    #[error("Invalid {kind}: {reason}")]
    InvalidSecret {
        kind: SecretKind,
        reason: SecretRejection,
    },

    #[error("Email delivery is not configured")]
    MailNotConfigured,

    #[error("Email delivery failed: {0}")]
    Delivery(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn invalid_otp(reason: SecretRejection) -> Self {
        Self::InvalidSecret {
            kind: SecretKind::Otp,
            reason,
        }
    }

    pub fn invalid_reset_token(reason: SecretRejection) -> Self {
        Self::InvalidSecret {
            kind: SecretKind::ResetToken,
            reason,
        }
    }
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    msg: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg.clone()),
            AppError::Conflict(msg) => (StatusCode::BAD_REQUEST, "conflict", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "validation", msg.clone()),
            AppError::InvalidSecret { kind, reason } => {
                tracing::debug!(kind = %kind, reason = %reason, "Rejected secret");
                (
                    StatusCode::BAD_REQUEST,
                    "invalid_secret",
                    kind.public_message().to_string(),
                )
            }
            AppError::MailNotConfigured => {
                tracing::error!("Email delivery requested but no transport is configured");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "mail_not_configured",
                    "Email delivery is not configured".to_string(),
                )
            }
            AppError::Delivery(e) => {
                tracing::error!("Email delivery error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "delivery_error",
                    "Failed to deliver email".to_string(),
                )
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "database_error",
                    "A database error occurred".to_string(),
                )
            }
            AppError::Jwt(e) => {
                tracing::debug!("JWT error: {:?}", e);
                (
                    StatusCode::UNAUTHORIZED,
                    "jwt_error",
                    "Invalid or expired token".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_type.to_string(),
            msg: message,
        });

        (status, body).into_response()
    }
}

// Conversion from validation errors
impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        // Surface the first field message rather than the full error map
        let first = errors
            .field_errors()
            .into_values()
            .flat_map(|errs| errs.iter())
            .find_map(|e| e.message.as_ref().map(|m| m.to_string()));
        AppError::Validation(first.unwrap_or_else(|| errors.to_string()))
    }
}

impl From<EmailProviderError> for AppError {
    fn from(err: EmailProviderError) -> Self {
        match err {
            EmailProviderError::NotConfigured => AppError::MailNotConfigured,
            other => AppError::Delivery(other.to_string()),
        }
    }
}
