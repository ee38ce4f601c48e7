//! SMTP email provider implementation using lettre

use super::provider::{EmailProvider, EmailProviderError, EmailProviderFactory};
use super::test_account;
use crate::domain::{EmailMessage, EmailSendResult, MailTransportConfig, SmtpSettings};
use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox, MultiPart, SinglePart},
    transport::smtp::{
        authentication::Credentials,
        client::{Tls, TlsParameters},
    },
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::time::Duration;

const ETHEREAL_PROVIDER: &str = "ethereal";

/// SMTP-based email provider
pub struct SmtpEmailProvider {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    username: Option<String>,
    provider_name: &'static str,
    /// Ethereal web root, set for test-account transports only
    preview_base: Option<String>,
}

impl SmtpEmailProvider {
    /// Build from an `smtp://` or `smtps://` connection string
    pub fn from_url(url: &str, timeout: Duration) -> Result<Self, EmailProviderError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::from_url(url)
            .map_err(|e| EmailProviderError::InvalidConfiguration(e.to_string()))?
            .timeout(Some(timeout))
            .build();

        Ok(Self {
            transport,
            username: url_username(url),
            provider_name: "smtp_url",
            preview_base: None,
        })
    }

    /// Build from explicit host settings. `secure` selects implicit TLS,
    /// otherwise STARTTLS is used when the server offers it.
    pub fn from_settings(
        settings: &SmtpSettings,
        timeout: Duration,
        provider_name: &'static str,
    ) -> Result<Self, EmailProviderError> {
        let tls_parameters = TlsParameters::new(settings.host.clone())
            .map_err(|e| EmailProviderError::InvalidConfiguration(e.to_string()))?;
        let tls = if settings.secure {
            Tls::Wrapper(tls_parameters)
        } else {
            Tls::Opportunistic(tls_parameters)
        };

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&settings.host)
            .port(settings.port)
            .tls(tls)
            .timeout(Some(timeout));

        // Add credentials if provided
        if let (Some(username), Some(password)) = (&settings.username, &settings.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            username: settings.username.clone(),
            provider_name,
            preview_base: None,
        })
    }

    fn with_preview_base(mut self, web_url: impl Into<String>) -> Self {
        self.preview_base = Some(web_url.into());
        self
    }

    fn build_from_mailbox(&self, message: &EmailMessage) -> Result<Mailbox, EmailProviderError> {
        let from = match (&message.from, &self.username) {
            (Some(from), _) => from.to_mailbox_string(),
            (None, Some(username)) => username.clone(),
            (None, None) => {
                return Err(EmailProviderError::InvalidConfiguration(
                    "No sender address configured".to_string(),
                ))
            }
        };

        from.parse().map_err(|e| {
            EmailProviderError::InvalidConfiguration(format!("Invalid from address: {}", e))
        })
    }

    fn build_message(&self, message: &EmailMessage) -> Result<Message, EmailProviderError> {
        let from = self.build_from_mailbox(message)?;

        if message.to.is_empty() {
            return Err(EmailProviderError::InvalidConfiguration(
                "No recipients specified".to_string(),
            ));
        }

        let mut email_builder = Message::builder().from(from).subject(&message.subject);
        for addr in &message.to {
            let mailbox: Mailbox = addr.to_mailbox_string().parse().map_err(|e| {
                EmailProviderError::InvalidConfiguration(format!("Invalid to address: {}", e))
            })?;
            email_builder = email_builder.to(mailbox);
        }

        // Multipart when a text body is provided
        match &message.text_body {
            Some(text_body) => email_builder.multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_body.clone()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(message.html_body.clone()),
                    ),
            ),
            None => email_builder
                .header(ContentType::TEXT_HTML)
                .body(message.html_body.clone()),
        }
        .map_err(|e| EmailProviderError::SendFailed(e.to_string()))
    }
}

#[async_trait]
impl EmailProvider for SmtpEmailProvider {
    async fn send(&self, message: &EmailMessage) -> Result<EmailSendResult, EmailProviderError> {
        let email = self.build_message(message)?;

        let response = self.transport.send(email).await.map_err(classify_error)?;
        let reply = response.message().collect::<Vec<_>>().join(" ");
        let message_id = response.message().next().map(|s| s.to_string());

        let mut result = EmailSendResult::sent(message_id);
        if let Some(web) = &self.preview_base {
            if let Some(url) = test_account::preview_url(web, &reply) {
                result = result.with_preview_url(url);
            }
        }
        Ok(result)
    }

    async fn test_connection(&self) -> Result<(), EmailProviderError> {
        match self.transport.test_connection().await {
            Ok(true) => Ok(()),
            Ok(false) => Err(EmailProviderError::ConnectionError(
                "SMTP server did not accept the connection".to_string(),
            )),
            Err(e) => Err(classify_error(e)),
        }
    }

    fn provider_name(&self) -> &'static str {
        self.provider_name
    }

    fn default_sender(&self) -> Option<String> {
        self.username.clone()
    }
}

fn classify_error(e: lettre::transport::smtp::Error) -> EmailProviderError {
    let error_msg = e.to_string();
    if error_msg.contains("authentication") || error_msg.contains("AUTH") {
        EmailProviderError::AuthenticationFailed(error_msg)
    } else if e.is_transient() || error_msg.contains("connection") || error_msg.contains("timeout")
    {
        EmailProviderError::ConnectionError(error_msg)
    } else {
        EmailProviderError::SendFailed(error_msg)
    }
}

/// Username embedded in a connection string, percent-decoded
fn url_username(raw: &str) -> Option<String> {
    let parsed = url::Url::parse(raw).ok()?;
    let encoded = parsed.username();
    if encoded.is_empty() {
        return None;
    }
    let decoded: String = url::form_urlencoded::parse(encoded.replace('+', "%2B").as_bytes())
        .map(|(k, _)| k.into_owned())
        .next()
        .unwrap_or_else(|| encoded.to_string());
    Some(decoded)
}

/// Production factory: lettre SMTP transports, plus Ethereal provisioning
/// for the test-account fallback
pub struct SmtpProviderFactory {
    http_client: reqwest::Client,
    ethereal_api_url: String,
    timeout: Duration,
}

impl SmtpProviderFactory {
    pub fn new(
        ethereal_api_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, EmailProviderError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                EmailProviderError::InvalidConfiguration(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            http_client,
            ethereal_api_url: ethereal_api_url.into(),
            timeout,
        })
    }
}

#[async_trait]
impl EmailProviderFactory for SmtpProviderFactory {
    async fn create(
        &self,
        config: &MailTransportConfig,
    ) -> Result<Box<dyn EmailProvider>, EmailProviderError> {
        let provider = match config {
            MailTransportConfig::Url(url) => SmtpEmailProvider::from_url(url, self.timeout)?,
            MailTransportConfig::Smtp(settings) => {
                SmtpEmailProvider::from_settings(settings, self.timeout, "smtp")?
            }
            MailTransportConfig::Service { settings, .. } => {
                SmtpEmailProvider::from_settings(settings, self.timeout, "service")?
            }
            MailTransportConfig::TestAccount => {
                let account =
                    test_account::provision(&self.http_client, &self.ethereal_api_url).await?;
                tracing::info!(
                    user = account.user().unwrap_or_default(),
                    "Provisioned Ethereal test mailbox"
                );
                SmtpEmailProvider::from_settings(&account.smtp, self.timeout, ETHEREAL_PROVIDER)?
                    .with_preview_base(account.web_url)
            }
        };
        Ok(Box::new(provider))
    }
}
