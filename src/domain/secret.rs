//! Ownership-proof secrets and why one was rejected

/// Which kind of emailed secret was presented
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretKind {
    Otp,
    ResetToken,
}

impl SecretKind {
    /// Message returned to clients regardless of the rejection reason
    pub fn public_message(&self) -> &'static str {
        match self {
            Self::Otp => "OTP invalid or expired",
            Self::ResetToken => "Reset link invalid or expired",
        }
    }
}

impl std::fmt::Display for SecretKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Otp => f.write_str("otp"),
            Self::ResetToken => f.write_str("reset_token"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretRejection {
    NotFound,
    Expired,
    Mismatch,
}

impl std::fmt::Display for SecretRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound => f.write_str("not found"),
            Self::Expired => f.write_str("expired"),
            Self::Mismatch => f.write_str("mismatch"),
        }
    }
}
