//! Password-reset link tokens

use crate::crypto::{generate_reset_token, hash_secret, verify_secret};
use crate::domain::{SecretRejection, StoreResetTokenInput, User};
use crate::error::{AppError, Result};
use crate::repository::UserRepository;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use url::Url;

/// Freshly issued reset link. `token` is the only plaintext copy.
#[derive(Debug, Clone)]
pub struct ResetLink {
    pub token: String,
    pub url: String,
    pub expires_at: DateTime<Utc>,
}

/// Issues and consumes reset tokens stored hashed on the user row
pub struct ResetTokenLedger<U: UserRepository> {
    user_repo: Arc<U>,
    ttl: Duration,
    public_url: String,
}

impl<U: UserRepository> ResetTokenLedger<U> {
    pub fn new(user_repo: Arc<U>, ttl_secs: i64, public_url: impl Into<String>) -> Self {
        Self {
            user_repo,
            ttl: Duration::seconds(ttl_secs),
            public_url: public_url.into(),
        }
    }

    pub fn ttl_minutes(&self) -> i64 {
        self.ttl.num_minutes().max(1)
    }

    /// Replace any previous token for `user` and build the link to email
    pub async fn issue_link(&self, user: &User) -> Result<ResetLink> {
        let token = generate_reset_token();
        let expires_at = Utc::now() + self.ttl;

        self.user_repo
            .store_reset_token(&StoreResetTokenInput {
                user_id: user.id,
                token_hash: hash_secret(&token),
                expires_at,
            })
            .await?;

        let url = self.build_url(&token, &user.email)?;

        metrics::counter!("storefront_auth_reset_links_issued_total").increment(1);
        tracing::debug!(user_id = %user.id, "Issued password reset link");

        Ok(ResetLink {
            token,
            url,
            expires_at,
        })
    }

    fn build_url(&self, token: &str, email: &str) -> Result<String> {
        let base = format!("{}/reset-password", self.public_url.trim_end_matches('/'));
        let mut url = Url::parse(&base)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Invalid APP_PUBLIC_URL: {}", e)))?;
        url.query_pairs_mut()
            .append_pair("token", token)
            .append_pair("email", email);
        Ok(url.into())
    }

    /// Set `new_password_hash` if `token` matches the live token for `user`.
    /// The write clears the token, so a token works at most once.
    pub async fn consume(&self, user: &User, token: &str, new_password_hash: &str) -> Result<()> {
        self.consume_at(user, token, new_password_hash, Utc::now()).await
    }

    /// `consume` as of `now`
    pub async fn consume_at(
        &self,
        user: &User,
        token: &str,
        new_password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let (Some(stored_hash), Some(_)) = (&user.reset_token_hash, user.reset_token_expires_at)
        else {
            return Err(AppError::invalid_reset_token(SecretRejection::NotFound));
        };

        if !verify_secret(token, stored_hash) {
            return Err(AppError::invalid_reset_token(SecretRejection::Mismatch));
        }

        if user.reset_token_expired_at(now) {
            return Err(AppError::invalid_reset_token(SecretRejection::Expired));
        }

        let applied = self
            .user_repo
            .reset_password_with_token(user.id, stored_hash, new_password_hash, now)
            .await?;
        if !applied {
            // Consumed or replaced between our read and the write
            return Err(AppError::invalid_reset_token(SecretRejection::NotFound));
        }

        tracing::info!(user_id = %user.id, "Password reset via link");
        Ok(())
    }
}
