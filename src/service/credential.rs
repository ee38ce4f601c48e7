//! Account credential flows: registration, login, signup OTP and password recovery

use crate::config::RecoveryConfig;
use crate::crypto::{hash_password, verify_password};
use crate::domain::{
    confirmation_matches, AuthSession, ChangePasswordInput, CreateUserInput,
    DirectResetInput, ForgotPasswordAck, ForgotPasswordInput, LoginInput, OtpPurpose,
    RecoveryStrategy, RegisterInput, RegisterWithOtpInput, ResetPasswordInput, SecretRejection,
    SignupOtpInput, StringUuid, User,
};
use crate::error::{AppError, Result};
use crate::jwt::JwtManager;
use crate::repository::{OtpRepository, UserRepository};
use crate::service::mailer::Mailer;
use crate::service::otp::OtpLedger;
use crate::service::reset_token::ResetTokenLedger;
use std::sync::Arc;
use tracing::{info, warn};
use validator::Validate;

/// Proof of mailbox ownership presented to `resetpassword`
#[derive(Clone, Copy)]
enum ResetProof<'a> {
    Token(&'a str),
    Otp(&'a str),
}

pub struct CredentialService<U: UserRepository, O: OtpRepository> {
    user_repo: Arc<U>,
    otp_ledger: OtpLedger<O>,
    reset_links: ResetTokenLedger<U>,
    mailer: Arc<Mailer>,
    jwt: Arc<JwtManager>,
    recovery: RecoveryConfig,
}

impl<U: UserRepository, O: OtpRepository> CredentialService<U, O> {
    pub fn new(
        user_repo: Arc<U>,
        otp_repo: Arc<O>,
        mailer: Arc<Mailer>,
        jwt: Arc<JwtManager>,
        recovery: RecoveryConfig,
        public_url: impl Into<String>,
    ) -> Self {
        Self {
            otp_ledger: OtpLedger::new(otp_repo, recovery.otp_ttl_secs),
            reset_links: ResetTokenLedger::new(
                user_repo.clone(),
                recovery.reset_token_ttl_secs,
                public_url,
            ),
            user_repo,
            mailer,
            jwt,
            recovery,
        }
    }

    pub fn recovery(&self) -> &RecoveryConfig {
        &self.recovery
    }

    pub fn otp_ledger(&self) -> &OtpLedger<O> {
        &self.otp_ledger
    }

    /// Create an account from name, email and password
    pub async fn register(&self, input: RegisterInput) -> Result<AuthSession> {
        let input = input.normalized();
        input.validate()?;
        let email = input.email.clone();

        if self.user_repo.find_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict("User exists".to_string()));
        }

        let user = self
            .create_account(&input.name, &email, &input.password)
            .await?;
        info!(user_id = %user.id, "Account registered");
        self.start_session(user)
    }

    pub async fn login(&self, input: LoginInput) -> Result<AuthSession> {
        let input = input.normalized();
        input.validate()?;
        let email = input.email.clone();

        let user = match self.user_repo.find_by_email(&email).await? {
            Some(user) if verify_password(&input.password, &user.password_hash) => user,
            _ => {
                metrics::counter!("storefront_auth_login_total", "result" => "failure")
                    .increment(1);
                return Err(AppError::Unauthorized("Invalid credentials".to_string()));
            }
        };

        metrics::counter!("storefront_auth_login_total", "result" => "success").increment(1);
        self.start_session(user)
    }

    /// Step one of OTP-gated signup
    pub async fn request_signup_otp(&self, input: SignupOtpInput) -> Result<()> {
        let input = input.normalized();
        input.validate()?;
        let email = input.email.clone();

        if self.user_repo.find_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict(
                "User already registered with this email".to_string(),
            ));
        }

        self.mailer.ensure_configured().await?;
        let issued = self.otp_ledger.issue(&email, OtpPurpose::Signup).await?;
        self.mailer
            .send_otp_email(
                &email,
                &issued.code,
                OtpPurpose::Signup,
                self.otp_ledger.ttl_minutes(),
            )
            .await?;
        Ok(())
    }

    /// Step two of OTP-gated signup. The code is consumed before the account
    /// is written, so a code creates at most one account.
    pub async fn complete_signup(&self, input: RegisterWithOtpInput) -> Result<AuthSession> {
        let input = input.normalized();
        input.validate()?;
        let email = input.email.clone();

        if self.user_repo.find_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict("User already registered".to_string()));
        }

        let outcome = self
            .otp_ledger
            .verify(&email, OtpPurpose::Signup, &input.otp)
            .await?;
        if let Some(reason) = outcome.rejection() {
            return Err(AppError::invalid_otp(reason));
        }

        let user = self
            .create_account(&input.name, &email, &input.password)
            .await?;
        info!(user_id = %user.id, "Account registered with OTP");
        self.start_session(user)
    }

    pub async fn forgot_password(&self, input: ForgotPasswordInput) -> Result<ForgotPasswordAck> {
        let input = input.normalized();
        input.validate()?;
        let email = input.email.clone();

        match self.recovery.strategy {
            RecoveryStrategy::Link => self.forgot_password_link(&email).await,
            RecoveryStrategy::Otp => self.forgot_password_otp(&email).await,
        }
    }

    async fn forgot_password_link(&self, email: &str) -> Result<ForgotPasswordAck> {
        // Configuration errors surface the same way for every address
        self.mailer.ensure_configured().await?;

        let Some(user) = self.user_repo.find_by_email(email).await? else {
            return Ok(ForgotPasswordAck::Generic);
        };

        let link = self.reset_links.issue_link(&user).await?;
        if let Err(e) = self
            .mailer
            .send_password_reset_link(
                &user.email,
                &user.name,
                &link.url,
                self.reset_links.ttl_minutes(),
            )
            .await
        {
            warn!(user_id = %user.id, "Failed to send password reset link: {}", e);
        }

        Ok(ForgotPasswordAck::Generic)
    }

    async fn forgot_password_otp(&self, email: &str) -> Result<ForgotPasswordAck> {
        let hide = self.recovery.hide_account_existence;
        if hide {
            self.mailer.ensure_configured().await?;
        }

        if self.user_repo.find_by_email(email).await?.is_none() {
            if hide {
                return Ok(ForgotPasswordAck::Generic);
            }
            return Err(AppError::NotFound("User not found".to_string()));
        }

        let issued = self.otp_ledger.issue(email, OtpPurpose::Reset).await?;
        let sent = self
            .mailer
            .send_otp_email(
                email,
                &issued.code,
                OtpPurpose::Reset,
                self.otp_ledger.ttl_minutes(),
            )
            .await;

        if hide {
            if let Err(e) = sent {
                warn!(email = %email, "Failed to send password reset OTP: {}", e);
            }
            return Ok(ForgotPasswordAck::Generic);
        }

        sent?;
        Ok(ForgotPasswordAck::OtpSent)
    }

    /// Set a new password with an emailed OTP or reset-link token
    pub async fn reset_password(&self, input: ResetPasswordInput) -> Result<()> {
        let input = input.normalized();
        input.validate()?;

        let proof = match (input.token.as_deref(), input.otp.as_deref()) {
            (Some(token), None) => ResetProof::Token(token),
            (None, Some(code)) => ResetProof::Otp(code),
            _ => {
                return Err(AppError::Validation(
                    "Provide either an OTP or a reset token".to_string(),
                ))
            }
        };

        // Link clients always send the confirmation; OTP clients may omit it
        match proof {
            ResetProof::Token(_) => {
                ensure_confirmed(&input.password, input.confirm_password.as_deref())?
            }
            ResetProof::Otp(_) => {
                if input.confirm_password.is_some() {
                    ensure_confirmed(&input.password, input.confirm_password.as_deref())?;
                }
            }
        }

        let email = input.email.as_str();
        match proof {
            ResetProof::Token(token) => {
                let user = self
                    .user_repo
                    .find_by_email(email)
                    .await?
                    .ok_or_else(|| AppError::invalid_reset_token(SecretRejection::NotFound))?;
                let password_hash = hash_password(&input.password)?;
                self.reset_links.consume(&user, token, &password_hash).await
            }
            ResetProof::Otp(code) => {
                let user = self
                    .user_repo
                    .find_by_email(email)
                    .await?
                    .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
                let password_hash = hash_password(&input.password)?;

                let outcome = self
                    .otp_ledger
                    .verify(email, OtpPurpose::Reset, code)
                    .await?;
                if let Some(reason) = outcome.rejection() {
                    return Err(AppError::invalid_otp(reason));
                }

                self.user_repo.update_password(user.id, &password_hash).await?;
                info!(user_id = %user.id, "Password reset via OTP");
                Ok(())
            }
        }
    }

    /// Set a new password by email alone. Only reachable when enabled.
    pub async fn reset_password_direct(&self, input: DirectResetInput) -> Result<()> {
        let input = input.normalized();
        input.validate()?;
        ensure_confirmed(&input.password, input.confirm_password.as_deref())?;

        let user = self
            .user_repo
            .find_by_email(&input.email)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let password_hash = hash_password(&input.password)?;
        self.user_repo.update_password(user.id, &password_hash).await?;
        warn!(user_id = %user.id, "Password reset without proof of mailbox ownership");
        Ok(())
    }

    /// Set a new password for the session's own account
    pub async fn change_password(
        &self,
        user_id: StringUuid,
        input: ChangePasswordInput,
    ) -> Result<()> {
        input.validate()?;
        ensure_confirmed(&input.password, input.confirm_password.as_deref())?;

        let user = self
            .user_repo
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let password_hash = hash_password(&input.password)?;
        self.user_repo.update_password(user.id, &password_hash).await?;
        info!(user_id = %user.id, "Password changed");
        Ok(())
    }

    async fn create_account(&self, name: &str, email: &str, password: &str) -> Result<User> {
        let password_hash = hash_password(password)?;
        self.user_repo
            .create(&CreateUserInput {
                name: name.to_string(),
                email: email.to_string(),
                password_hash,
            })
            .await
    }

    fn start_session(&self, user: User) -> Result<AuthSession> {
        let token = self.jwt.create_session_token(user.id.into(), &user.email)?;
        Ok(AuthSession { token, user })
    }
}

fn ensure_confirmed(password: &str, confirm: Option<&str>) -> Result<()> {
    if confirmation_matches(password, confirm) {
        Ok(())
    } else {
        Err(AppError::Validation("Passwords do not match".to_string()))
    }
}
