//! One-time passcode ledger

use crate::crypto::{generate_otp_code, hash_secret, verify_secret};
use crate::domain::{normalize_email, IssuedOtp, OtpOutcome, OtpPurpose, UpsertOtpInput};
use crate::error::Result;
use crate::repository::OtpRepository;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

/// Issues and consumes purpose-scoped 4-digit codes.
///
/// At most one live code exists per (email, purpose); issuing again replaces
/// it. A code verifies successfully at most once.
pub struct OtpLedger<O: OtpRepository> {
    otp_repo: Arc<O>,
    ttl: Duration,
}

impl<O: OtpRepository> OtpLedger<O> {
    pub fn new(otp_repo: Arc<O>, ttl_secs: i64) -> Self {
        Self {
            otp_repo,
            ttl: Duration::seconds(ttl_secs),
        }
    }

    pub fn ttl_minutes(&self) -> i64 {
        self.ttl.num_minutes().max(1)
    }

    /// Generate a code, persist its digest and return the plaintext once
    pub async fn issue(&self, email: &str, purpose: OtpPurpose) -> Result<IssuedOtp> {
        let email = normalize_email(email);
        let code = generate_otp_code();
        let expires_at = Utc::now() + self.ttl;

        self.otp_repo
            .upsert(&UpsertOtpInput {
                email: email.clone(),
                purpose,
                code_hash: hash_secret(&code),
                expires_at,
            })
            .await?;

        metrics::counter!("storefront_auth_otp_issued_total", "purpose" => purpose.as_str())
            .increment(1);
        tracing::debug!(email = %email, purpose = %purpose, "Issued OTP");

        Ok(IssuedOtp { code, expires_at })
    }

    pub async fn verify(&self, email: &str, purpose: OtpPurpose, code: &str) -> Result<OtpOutcome> {
        self.verify_at(email, purpose, code, Utc::now()).await
    }

    /// Check `code` as of `now`, consuming the record on success
    pub async fn verify_at(
        &self,
        email: &str,
        purpose: OtpPurpose,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<OtpOutcome> {
        let email = normalize_email(email);
        let outcome = self.check(&email, purpose, code.trim(), now).await?;

        metrics::counter!(
            "storefront_auth_otp_verify_total",
            "purpose" => purpose.as_str(),
            "outcome" => outcome.as_str()
        )
        .increment(1);

        Ok(outcome)
    }

    async fn check(
        &self,
        email: &str,
        purpose: OtpPurpose,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<OtpOutcome> {
        let Some(record) = self.otp_repo.find(email, purpose).await? else {
            return Ok(OtpOutcome::NotFound);
        };

        // Expired records stay until the sweep removes them
        if record.is_expired_at(now) {
            return Ok(OtpOutcome::Expired);
        }

        if !verify_secret(code, &record.code_hash) {
            return Ok(OtpOutcome::Mismatch);
        }

        // Lost a race with a concurrent verifier or a re-issue
        if !self
            .otp_repo
            .delete_matching(email, purpose, &record.code_hash)
            .await?
        {
            return Ok(OtpOutcome::NotFound);
        }

        Ok(OtpOutcome::Verified)
    }

    /// Delete codes that expired before now
    pub async fn sweep_expired(&self) -> Result<u64> {
        self.otp_repo.delete_expired(Utc::now()).await
    }
}
