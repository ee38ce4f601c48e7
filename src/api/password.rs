//! Password recovery and change handlers

use crate::api::MessageResponse;
use crate::domain::{ChangePasswordInput, DirectResetInput, ForgotPasswordInput, ResetPasswordInput};
use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::state::HasCredentials;
use axum::{extract::State, Json};

pub async fn forgot_password<S: HasCredentials>(
    State(state): State<S>,
    Json(input): Json<ForgotPasswordInput>,
) -> Result<Json<MessageResponse>, AppError> {
    let ack = state.credential_service().forgot_password(input).await?;
    Ok(Json(MessageResponse::new(ack.message())))
}

/// Reset with either an emailed OTP or a reset-link token
pub async fn reset_password<S: HasCredentials>(
    State(state): State<S>,
    Json(input): Json<ResetPasswordInput>,
) -> Result<Json<MessageResponse>, AppError> {
    state.credential_service().reset_password(input).await?;
    Ok(Json(MessageResponse::new("Password reset successful")))
}

/// Reset by email alone; only routed when direct reset is enabled
pub async fn reset_password_direct<S: HasCredentials>(
    State(state): State<S>,
    Json(input): Json<DirectResetInput>,
) -> Result<Json<MessageResponse>, AppError> {
    state.credential_service().reset_password_direct(input).await?;
    Ok(Json(MessageResponse::new("Password updated successfully")))
}

pub async fn reset_password_me<S: HasCredentials>(
    State(state): State<S>,
    auth: AuthUser,
    Json(input): Json<ChangePasswordInput>,
) -> Result<Json<MessageResponse>, AppError> {
    state
        .credential_service()
        .change_password(auth.user_id, input)
        .await?;
    Ok(Json(MessageResponse::new("Password updated successfully")))
}
