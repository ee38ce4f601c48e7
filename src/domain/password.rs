//! Password recovery and change inputs

use super::common::normalize_email;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// How `forgotpassword` proves mailbox ownership
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RecoveryStrategy {
    /// Email a clickable reset link carrying an opaque token
    #[default]
    Link,
    /// Email a 4-digit one-time passcode
    Otp,
}

impl std::str::FromStr for RecoveryStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "link" | "token" => Ok(Self::Link),
            "otp" => Ok(Self::Otp),
            other => Err(format!("unknown password reset strategy '{}'", other)),
        }
    }
}

/// `POST forgotpassword`
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ForgotPasswordInput {
    #[serde(default)]
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,
}

/// `POST resetpassword`: exactly one of `otp` or `token` proves ownership
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordInput {
    #[serde(default)]
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,
    pub otp: Option<String>,
    pub token: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1, max = 128, message = "New password is required"))]
    pub password: String,
    #[serde(alias = "confirm_password")]
    pub confirm_password: Option<String>,
}

/// `POST resetpassword-direct`
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DirectResetInput {
    #[serde(default)]
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 128, message = "New password is required"))]
    pub password: String,
    #[serde(alias = "confirm_password")]
    pub confirm_password: Option<String>,
}

/// `POST resetpassword-me`; accepts `password` or `newPassword`
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordInput {
    #[serde(default, alias = "newPassword", alias = "new_password")]
    #[validate(length(min = 1, max = 128, message = "New password is required"))]
    pub password: String,
    #[serde(alias = "confirm_password")]
    pub confirm_password: Option<String>,
}

impl ForgotPasswordInput {
    pub fn normalized(mut self) -> Self {
        self.email = normalize_email(&self.email);
        self
    }
}

impl ResetPasswordInput {
    /// Canonical email; blank proofs become absent
    pub fn normalized(mut self) -> Self {
        self.email = normalize_email(&self.email);
        self.otp = non_blank(self.otp);
        self.token = non_blank(self.token);
        self
    }
}

impl DirectResetInput {
    pub fn normalized(mut self) -> Self {
        self.email = normalize_email(&self.email);
        self
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// What `forgotpassword` tells the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForgotPasswordAck {
    /// Same answer whether or not the account exists
    Generic,
    OtpSent,
}

impl ForgotPasswordAck {
    pub fn message(&self) -> &'static str {
        match self {
            Self::Generic => {
                "If an account exists for that email, password reset instructions have been sent"
            }
            Self::OtpSent => "OTP sent to email for password reset",
        }
    }
}

/// Outcome of a confirmation re-entry check
pub fn confirmation_matches(password: &str, confirm: Option<&str>) -> bool {
    matches!(confirm, Some(c) if c == password)
}
