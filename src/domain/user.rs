//! User credential record and account-creation inputs

use super::common::{normalize_email, StringUuid};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Storefront account as seen by the credential subsystem.
///
/// `reset_token_hash` and `reset_token_expires_at` are always written and
/// cleared together.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: StringUuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[serde(rename = "isAdmin")]
    pub is_admin: bool,
    #[serde(skip_serializing)]
    pub reset_token_hash: Option<String>,
    #[serde(skip_serializing)]
    pub reset_token_expires_at: Option<DateTime<Utc>>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl Default for User {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: StringUuid::new_v4(),
            name: String::new(),
            email: String::new(),
            password_hash: String::new(),
            is_admin: false,
            reset_token_hash: None,
            reset_token_expires_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}

impl User {
    pub fn has_reset_token(&self) -> bool {
        self.reset_token_hash.is_some()
    }

    /// Strict deadline: a token is still live at exactly its expiry instant
    pub fn reset_token_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.reset_token_expires_at.is_some_and(|at| now > at)
    }
}

/// Row to insert for a new account. `email` must already be normalized.
#[derive(Debug, Clone)]
pub struct CreateUserInput {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

/// Reset-token material persisted on the user row
#[derive(Debug, Clone)]
pub struct StoreResetTokenInput {
    pub user_id: StringUuid,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
}

/// `POST register`
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct RegisterInput {
    #[serde(default)]
    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    pub name: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 255, message = "Email is required"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 128, message = "Password is required"))]
    pub password: String,
}

/// `POST login`
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct LoginInput {
    #[serde(default)]
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// `POST send-signup-otp`
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct SignupOtpInput {
    #[serde(default)]
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,
}

/// `POST register-with-otp`
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct RegisterWithOtpInput {
    #[serde(default)]
    #[validate(length(min = 1, max = 100, message = "All fields are required"))]
    pub name: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 255, message = "All fields are required"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 128, message = "All fields are required"))]
    pub password: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "All fields are required"))]
    pub otp: String,
}

impl RegisterInput {
    /// Canonical email and trimmed name, ready for validation
    pub fn normalized(mut self) -> Self {
        self.email = normalize_email(&self.email);
        self.name = self.name.trim().to_string();
        self
    }
}

impl LoginInput {
    pub fn normalized(mut self) -> Self {
        self.email = normalize_email(&self.email);
        self
    }
}

impl SignupOtpInput {
    pub fn normalized(mut self) -> Self {
        self.email = normalize_email(&self.email);
        self
    }
}

impl RegisterWithOtpInput {
    pub fn normalized(mut self) -> Self {
        self.email = normalize_email(&self.email);
        self.name = self.name.trim().to_string();
        self.otp = self.otp.trim().to_string();
        self
    }
}

/// Session token plus the account it identifies
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub token: String,
    pub user: User,
}
