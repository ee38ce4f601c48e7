//! Credential emails composed over the shared mail transport

use crate::domain::{EmailSendResult, OtpPurpose};
use crate::email::{EmailTemplate, MailTransportSelector, TemplateEngine};
use crate::error::Result;
use std::sync::Arc;

pub struct Mailer {
    selector: Arc<MailTransportSelector>,
    app_name: String,
}

impl Mailer {
    pub fn new(selector: Arc<MailTransportSelector>, app_name: impl Into<String>) -> Self {
        Self {
            selector,
            app_name: app_name.into(),
        }
    }

    /// Resolve the transport without sending. Fails with
    /// `MailNotConfigured` when no transport source applies.
    pub async fn ensure_configured(&self) -> Result<()> {
        self.selector.transport().await?;
        Ok(())
    }

    pub async fn send_otp_email(
        &self,
        to: &str,
        code: &str,
        purpose: OtpPurpose,
        valid_minutes: i64,
    ) -> Result<EmailSendResult> {
        let template = match purpose {
            OtpPurpose::Signup => EmailTemplate::SignupOtp,
            OtpPurpose::Reset => EmailTemplate::ResetOtp,
        };

        let mut engine = TemplateEngine::new();
        engine
            .set("app_name", self.app_name.as_str())
            .set("code", code)
            .set("expires_in_minutes", valid_minutes.to_string());

        self.deliver(to, engine, template).await
    }

    pub async fn send_password_reset_link(
        &self,
        to: &str,
        user_name: &str,
        link: &str,
        valid_minutes: i64,
    ) -> Result<EmailSendResult> {
        let mut engine = TemplateEngine::new();
        engine
            .set("app_name", self.app_name.as_str())
            .set("user_name", user_name)
            .set("reset_link", link)
            .set("expires_in_minutes", valid_minutes.to_string());

        self.deliver(to, engine, EmailTemplate::PasswordResetLink).await
    }

    async fn deliver(
        &self,
        to: &str,
        engine: TemplateEngine,
        template: EmailTemplate,
    ) -> Result<EmailSendResult> {
        let rendered = engine.render_template(template);
        let result = self
            .selector
            .send(to, &rendered.subject, &rendered.text_body, &rendered.html_body)
            .await;

        let outcome = if result.is_ok() { "sent" } else { "failed" };
        metrics::counter!("storefront_auth_mail_sent_total", "outcome" => outcome).increment(1);

        let receipt = result?;
        tracing::info!(to = %to, template = ?template, "Email sent");
        Ok(receipt)
    }
}
