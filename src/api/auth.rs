//! Account creation and login handlers

use crate::api::MessageResponse;
use crate::domain::{AuthSession, LoginInput, RegisterInput, RegisterWithOtpInput, SignupOtpInput};
use crate::error::AppError;
use crate::state::HasCredentials;
use axum::{extract::State, Json};

pub async fn register<S: HasCredentials>(
    State(state): State<S>,
    Json(input): Json<RegisterInput>,
) -> Result<Json<AuthSession>, AppError> {
    let session = state.credential_service().register(input).await?;
    Ok(Json(session))
}

pub async fn login<S: HasCredentials>(
    State(state): State<S>,
    Json(input): Json<LoginInput>,
) -> Result<Json<AuthSession>, AppError> {
    let session = state.credential_service().login(input).await?;
    Ok(Json(session))
}

/// Email a signup OTP to an unregistered address
pub async fn send_signup_otp<S: HasCredentials>(
    State(state): State<S>,
    Json(input): Json<SignupOtpInput>,
) -> Result<Json<MessageResponse>, AppError> {
    state.credential_service().request_signup_otp(input).await?;
    Ok(Json(MessageResponse::new(
        "OTP sent to email for signup verification",
    )))
}

pub async fn register_with_otp<S: HasCredentials>(
    State(state): State<S>,
    Json(input): Json<RegisterWithOtpInput>,
) -> Result<Json<AuthSession>, AppError> {
    let session = state.credential_service().complete_signup(input).await?;
    Ok(Json(session))
}
