//! Outbound mail domain types

use serde::Serialize;

/// Resolved SMTP transport settings, produced by the selector's precedence rules
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MailTransportConfig {
    /// `SMTP_URL` connection string, handed to lettre as-is
    Url(String),
    /// Explicit host/port pair (`SMTP_HOST`)
    Smtp(SmtpSettings),
    /// Named well-known provider (`EMAIL_SERVICE`)
    Service {
        name: String,
        settings: SmtpSettings,
    },
    /// Ephemeral test mailbox, provisioned on first use outside production
    TestAccount,
}

impl MailTransportConfig {
    /// Label used in logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Url(_) => "url",
            Self::Smtp(_) => "smtp",
            Self::Service { .. } => "service",
            Self::TestAccount => "test_account",
        }
    }
}

/// SMTP connection parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    /// Implicit TLS (port 465 style); otherwise STARTTLS is attempted
    pub secure: bool,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Email address with optional display name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailAddress {
    pub email: String,
    pub name: Option<String>,
}

impl EmailAddress {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: None,
        }
    }

    pub fn with_name(email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: Some(name.into()),
        }
    }

    /// RFC 5322 mailbox form, e.g. `Fight Wisdom <noreply@x.com>`
    pub fn to_mailbox_string(&self) -> String {
        match &self.name {
            Some(name) => format!("{} <{}>", name, self.email),
            None => self.email.clone(),
        }
    }
}

/// Email message to be sent
#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub from: Option<EmailAddress>,
    pub to: Vec<EmailAddress>,
    pub subject: String,
    pub html_body: String,
    pub text_body: Option<String>,
}

impl EmailMessage {
    pub fn new(to: EmailAddress, subject: impl Into<String>, html_body: impl Into<String>) -> Self {
        Self {
            from: None,
            to: vec![to],
            subject: subject.into(),
            html_body: html_body.into(),
            text_body: None,
        }
    }

    pub fn with_text_body(mut self, text_body: impl Into<String>) -> Self {
        self.text_body = Some(text_body.into());
        self
    }

    pub fn with_from(mut self, from: EmailAddress) -> Self {
        self.from = Some(from);
        self
    }
}

/// Provider receipt for a sent message
#[derive(Debug, Clone, Default, Serialize)]
pub struct EmailSendResult {
    pub message_id: Option<String>,
    /// Web link to the rendered message, only for test-account transports
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_url: Option<String>,
}

impl EmailSendResult {
    pub fn sent(message_id: Option<String>) -> Self {
        Self {
            message_id,
            preview_url: None,
        }
    }

    pub fn with_preview_url(mut self, url: impl Into<String>) -> Self {
        self.preview_url = Some(url.into());
        self
    }
}
