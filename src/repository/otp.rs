//! One-time passcode repository

use crate::domain::{OtpPurpose, OtpRecord, StringUuid, UpsertOtpInput};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::MySqlPool;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OtpRepository: Send + Sync {
    /// Insert or replace the code for `(email, purpose)` atomically
    async fn upsert(&self, input: &UpsertOtpInput) -> Result<()>;
    async fn find(&self, email: &str, purpose: OtpPurpose) -> Result<Option<OtpRecord>>;
    /// Delete the record only if it still holds `code_hash`. Returns whether
    /// this call removed it.
    async fn delete_matching(
        &self,
        email: &str,
        purpose: OtpPurpose,
        code_hash: &str,
    ) -> Result<bool>;
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64>;
}

pub struct OtpRepositoryImpl {
    pool: MySqlPool,
}

impl OtpRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OtpRepository for OtpRepositoryImpl {
    async fn upsert(&self, input: &UpsertOtpInput) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO otp_codes (id, email, purpose, code_hash, expires_at, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, NOW(), NOW())
            ON DUPLICATE KEY UPDATE
                code_hash = VALUES(code_hash),
                expires_at = VALUES(expires_at),
                updated_at = NOW()
            "#,
        )
        .bind(StringUuid::new_v4())
        .bind(&input.email)
        .bind(input.purpose.as_str())
        .bind(&input.code_hash)
        .bind(input.expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find(&self, email: &str, purpose: OtpPurpose) -> Result<Option<OtpRecord>> {
        let record = sqlx::query_as::<_, OtpRecord>(
            r#"
            SELECT id, email, purpose, code_hash, expires_at, created_at, updated_at
            FROM otp_codes
            WHERE email = ? AND purpose = ?
            "#,
        )
        .bind(email)
        .bind(purpose.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn delete_matching(
        &self,
        email: &str,
        purpose: OtpPurpose,
        code_hash: &str,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM otp_codes
            WHERE email = ? AND purpose = ? AND code_hash = ?
            "#,
        )
        .bind(email)
        .bind(purpose.as_str())
        .bind(code_hash)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM otp_codes
            WHERE expires_at < ?
            "#,
        )
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
