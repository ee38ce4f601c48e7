//! One-time passcode records and verification outcomes

use super::common::StringUuid;
use super::secret::SecretRejection;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// What a one-time passcode authorizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OtpPurpose {
    Signup,
    Reset,
}

impl OtpPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Signup => "signup",
            Self::Reset => "reset",
        }
    }
}

impl std::fmt::Display for OtpPurpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for OtpPurpose {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "signup" => Ok(Self::Signup),
            "reset" => Ok(Self::Reset),
            other => Err(format!("unknown OTP purpose '{}'", other)),
        }
    }
}

/// Stored OTP, unique per (email, purpose)
#[derive(Debug, Clone, FromRow)]
pub struct OtpRecord {
    pub id: StringUuid,
    pub email: String,
    #[sqlx(try_from = "String")]
    pub purpose: OtpPurpose,
    pub code_hash: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OtpRecord {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// Values written by an OTP upsert
#[derive(Debug, Clone)]
pub struct UpsertOtpInput {
    pub email: String,
    pub purpose: OtpPurpose,
    pub code_hash: String,
    pub expires_at: DateTime<Utc>,
}

/// Plaintext code handed out exactly once for delivery
#[derive(Debug, Clone)]
pub struct IssuedOtp {
    pub code: String,
    pub expires_at: DateTime<Utc>,
}

/// Result of checking a submitted code against the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpOutcome {
    Verified,
    NotFound,
    Expired,
    Mismatch,
}

impl OtpOutcome {
    pub fn is_verified(&self) -> bool {
        matches!(self, Self::Verified)
    }

    pub fn rejection(&self) -> Option<SecretRejection> {
        match self {
            Self::Verified => None,
            Self::NotFound => Some(SecretRejection::NotFound),
            Self::Expired => Some(SecretRejection::Expired),
            Self::Mismatch => Some(SecretRejection::Mismatch),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Verified => "verified",
            Self::NotFound => "not_found",
            Self::Expired => "expired",
            Self::Mismatch => "mismatch",
        }
    }
}
