//! User credential repository

use crate::domain::{CreateUserInput, StoreResetTokenInput, StringUuid, User};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::MySqlPool;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new account. A duplicate email yields `AppError::Conflict`.
    async fn create(&self, input: &CreateUserInput) -> Result<User>;
    async fn find_by_id(&self, id: StringUuid) -> Result<Option<User>>;
    /// Lookup by normalized address
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;
    /// Overwrite any previous reset token with a new digest and expiry
    async fn store_reset_token(&self, input: &StoreResetTokenInput) -> Result<()>;
    /// Write a new password hash and clear any reset token in one statement
    async fn update_password(&self, id: StringUuid, password_hash: &str) -> Result<()>;
    /// Write the password only while `token_hash` is still stored and its
    /// expiry is not before `now`.
    /// Returns false when another request consumed or replaced the token first.
    async fn reset_password_with_token(
        &self,
        id: StringUuid,
        token_hash: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<bool>;
    async fn ping(&self) -> Result<()>;
}

pub struct UserRepositoryImpl {
    pool: MySqlPool,
}

impl UserRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

const USER_COLUMNS: &str = "id, name, email, password_hash, is_admin, reset_token_hash, \
                            reset_token_expires_at, created_at, updated_at";

/// Plain equality on the stored normalized address, served by `uk_users_email`
fn select_by_email_sql() -> String {
    format!("SELECT {} FROM users WHERE email = ?", USER_COLUMNS)
}

#[async_trait]
impl UserRepository for UserRepositoryImpl {
    async fn create(&self, input: &CreateUserInput) -> Result<User> {
        let id = StringUuid::new_v4();

        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, password_hash, is_admin, created_at, updated_at)
            VALUES (?, ?, ?, ?, false, NOW(), NOW())
            "#,
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.email)
        .bind(&input.password_hash)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict("User already exists".to_string())
            } else {
                AppError::Database(e)
            }
        })?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to create user")))
    }

    async fn find_by_id(&self, id: StringUuid) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = ?",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&select_by_email_sql())
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn store_reset_token(&self, input: &StoreResetTokenInput) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET reset_token_hash = ?, reset_token_expires_at = ?, updated_at = NOW()
            WHERE id = ?
            "#,
        )
        .bind(&input.token_hash)
        .bind(input.expires_at)
        .bind(input.user_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        Ok(())
    }

    async fn update_password(&self, id: StringUuid, password_hash: &str) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET password_hash = ?, reset_token_hash = NULL, reset_token_expires_at = NULL,
                updated_at = NOW()
            WHERE id = ?
            "#,
        )
        .bind(password_hash)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        Ok(())
    }

    async fn reset_password_with_token(
        &self,
        id: StringUuid,
        token_hash: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET password_hash = ?, reset_token_hash = NULL, reset_token_expires_at = NULL,
                updated_at = NOW()
            WHERE id = ? AND reset_token_hash = ? AND reset_token_expires_at >= ?
            "#,
        )
        .bind(password_hash)
        .bind(id)
        .bind(token_hash)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .map(|db| db.is_unique_violation())
        .unwrap_or(false)
}
