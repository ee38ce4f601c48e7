//! Outbound mail transport selection.
//!
//! Resolution order:
//! 1. `SMTP_URL` connection string
//! 2. `SMTP_HOST` (+ `SMTP_PORT`, `SMTP_SECURE`, credentials)
//! 3. `EMAIL_USER` with a password, against a named service (`EMAIL_SERVICE`, default gmail)
//! 4. Ethereal test mailbox, outside production only
//!
//! The transport is built lazily on first use and cached for the process.
//! Connectivity is probed once; a failed probe is retried on the next send.

use super::provider::{EmailProvider, EmailProviderError, EmailProviderFactory};
use crate::config::{AppEnvironment, MailConfig};
use crate::domain::{EmailAddress, EmailMessage, EmailSendResult, MailTransportConfig, SmtpSettings};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, error, info, warn};

const DEFAULT_SMTP_PORT: u16 = 587;
const IMPLICIT_TLS_PORT: u16 = 465;
const DEFAULT_SERVICE: &str = "gmail";

/// Host and port for well-known mail services
fn service_endpoint(name: &str) -> Option<(&'static str, u16)> {
    match name {
        "gmail" | "googlemail" => Some(("smtp.gmail.com", 465)),
        "outlook" | "hotmail" | "outlook365" => Some(("smtp-mail.outlook.com", 587)),
        "office365" => Some(("smtp.office365.com", 587)),
        "yahoo" => Some(("smtp.mail.yahoo.com", 465)),
        "icloud" => Some(("smtp.mail.me.com", 587)),
        "sendgrid" => Some(("smtp.sendgrid.net", 587)),
        "mailgun" => Some(("smtp.mailgun.org", 587)),
        "zoho" => Some(("smtp.zoho.com", 465)),
        _ => None,
    }
}

/// Pick the transport configuration from raw settings
pub fn resolve_transport_config(
    config: &MailConfig,
    environment: AppEnvironment,
) -> Result<MailTransportConfig, EmailProviderError> {
    if let Some(url) = &config.smtp_url {
        return Ok(MailTransportConfig::Url(url.clone()));
    }

    if let Some(host) = &config.smtp_host {
        let port = config.smtp_port.unwrap_or(DEFAULT_SMTP_PORT);
        return Ok(MailTransportConfig::Smtp(SmtpSettings {
            host: host.clone(),
            port,
            secure: config.smtp_secure || port == IMPLICIT_TLS_PORT,
            username: config.smtp_user.clone().or_else(|| config.email_user.clone()),
            password: config.smtp_pass.clone().or_else(|| config.email_pass.clone()),
        }));
    }

    let service_password = config
        .email_pass
        .clone()
        .or_else(|| config.gmail_app_password.clone());
    if let (Some(user), Some(password)) = (&config.email_user, service_password) {
        let name = config
            .email_service
            .as_deref()
            .unwrap_or(DEFAULT_SERVICE)
            .trim()
            .to_lowercase();
        let (host, port) = service_endpoint(&name).ok_or_else(|| {
            EmailProviderError::InvalidConfiguration(format!("Unknown EMAIL_SERVICE '{}'", name))
        })?;
        return Ok(MailTransportConfig::Service {
            name,
            settings: SmtpSettings {
                host: host.to_string(),
                port,
                secure: port == IMPLICIT_TLS_PORT,
                username: Some(user.clone()),
                password: Some(password),
            },
        });
    }

    if !environment.is_production() {
        return Ok(MailTransportConfig::TestAccount);
    }

    Err(EmailProviderError::NotConfigured)
}

/// Process-wide mail transport, built once and shared
pub struct MailTransportSelector {
    config: MailConfig,
    environment: AppEnvironment,
    factory: Arc<dyn EmailProviderFactory>,
    transport: OnceCell<Arc<dyn EmailProvider>>,
    verified: OnceCell<()>,
}

impl MailTransportSelector {
    pub fn new(
        config: MailConfig,
        environment: AppEnvironment,
        factory: Arc<dyn EmailProviderFactory>,
    ) -> Self {
        Self {
            config,
            environment,
            factory,
            transport: OnceCell::new(),
            verified: OnceCell::new(),
        }
    }

    /// Resolve and build the transport. Concurrent first callers share one
    /// build; a failed build is attempted again by the next caller.
    pub async fn transport(&self) -> Result<Arc<dyn EmailProvider>, EmailProviderError> {
        let provider = self
            .transport
            .get_or_try_init(|| async {
                let resolved = resolve_transport_config(&self.config, self.environment)?;
                let provider = self.factory.create(&resolved).await?;
                info!(
                    transport = resolved.kind(),
                    provider = provider.provider_name(),
                    "Mail transport initialised"
                );
                Ok::<_, EmailProviderError>(Arc::from(provider))
            })
            .await?;
        Ok(Arc::clone(provider))
    }

    /// Probe connectivity. Succeeds at most once per process.
    pub async fn verify(&self) -> Result<(), EmailProviderError> {
        let provider = self.transport().await?;
        self.verified
            .get_or_try_init(|| async {
                match provider.test_connection().await {
                    Ok(()) => {
                        if !self.environment.is_production() {
                            info!(provider = provider.provider_name(), "Mail transport verified");
                        }
                        Ok(())
                    }
                    Err(e) => {
                        if self.environment.is_production() {
                            error!(provider = provider.provider_name(), "Mail transport verification failed: {}", e);
                        } else {
                            warn!(provider = provider.provider_name(), "Mail transport verification failed: {}", e);
                        }
                        Err(e)
                    }
                }
            })
            .await?;
        Ok(())
    }

    pub fn is_verified(&self) -> bool {
        self.verified.initialized()
    }

    /// Send one message with both text and HTML bodies
    pub async fn send(
        &self,
        to: &str,
        subject: &str,
        text: &str,
        html: &str,
    ) -> Result<EmailSendResult, EmailProviderError> {
        let provider = self.transport().await?;
        self.verify().await?;

        let from = self
            .config
            .configured_from()
            .map(str::to_string)
            .or_else(|| provider.default_sender());

        let mut message = EmailMessage::new(EmailAddress::new(to), subject, html).with_text_body(text);
        if let Some(from) = from {
            message = message.with_from(EmailAddress::new(from));
        }

        let result = provider.send(&message).await?;
        debug!(
            message_id = result.message_id.as_deref().unwrap_or_default(),
            "Email accepted by transport"
        );
        if !self.environment.is_production() {
            if let Some(preview) = &result.preview_url {
                info!(preview_url = %preview, "Email preview available");
            }
        }
        Ok(result)
    }
}
