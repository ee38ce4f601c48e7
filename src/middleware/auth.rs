//! Session token extractor

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::domain::StringUuid;
use crate::jwt::SessionClaims;
use crate::state::HasCredentials;

/// Account identified by a verified session token
#[derive(Debug, Clone, Serialize)]
pub struct AuthUser {
    pub user_id: StringUuid,
    pub email: String,
}

impl AuthUser {
    pub fn from_claims(claims: SessionClaims) -> Result<Self, AuthError> {
        let user_id = claims
            .user_id()
            .map_err(|_| AuthError::InvalidToken("Invalid user ID in token".to_string()))?;

        Ok(Self {
            user_id: user_id.into(),
            email: claims.email,
        })
    }
}

#[derive(Debug, Clone)]
pub enum AuthError {
    MissingToken,
    InvalidHeader(String),
    InvalidToken(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let message = match &self {
            AuthError::MissingToken => "Not authorized, no token",
            AuthError::InvalidHeader(_) => "Not authorized, invalid authorization header",
            AuthError::InvalidToken(reason) => {
                tracing::debug!("Rejected session token: {}", reason);
                "Not authorized, token failed"
            }
        };

        let body = serde_json::json!({
            "error": "unauthorized",
            "msg": message,
        });

        (StatusCode::UNAUTHORIZED, axum::Json(body)).into_response()
    }
}

fn extract_bearer_token(headers: &axum::http::HeaderMap) -> Result<&str, AuthError> {
    let auth_header = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?
        .to_str()
        .map_err(|_| AuthError::InvalidHeader("Invalid header encoding".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AuthError::InvalidHeader("Authorization header must use Bearer scheme".to_string()))?
        .trim();

    if token.is_empty() {
        return Err(AuthError::MissingToken);
    }

    Ok(token)
}

/// Rejects the request with 401 unless it carries a valid session token
impl<S> FromRequestParts<S> for AuthUser
where
    S: HasCredentials + Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = extract_bearer_token(&parts.headers)?;
        let claims = state
            .jwt_manager()
            .verify_session_token(token)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        AuthUser::from_claims(claims)
    }
}
