//! Email provider trait and error types

use crate::domain::{EmailMessage, EmailSendResult, MailTransportConfig};
use async_trait::async_trait;
use thiserror::Error;

/// Email provider error types
#[derive(Error, Debug)]
pub enum EmailProviderError {
    #[error("Email provider not configured")]
    NotConfigured,

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Send failed: {0}")]
    SendFailed(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Test account provisioning failed: {0}")]
    Provisioning(String),
}

/// Trait for email providers
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmailProvider: Send + Sync {
    /// Send an email message
    async fn send(&self, message: &EmailMessage) -> Result<EmailSendResult, EmailProviderError>;

    /// Test connection to the email provider
    async fn test_connection(&self) -> Result<(), EmailProviderError>;

    /// Get the provider name
    fn provider_name(&self) -> &'static str;

    /// Authenticated account, used as the sender when nothing else is configured
    fn default_sender(&self) -> Option<String>;
}

/// Builds an [`EmailProvider`] for a resolved transport configuration.
///
/// Tests swap this out to capture mail without a network.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmailProviderFactory: Send + Sync {
    async fn create(
        &self,
        config: &MailTransportConfig,
    ) -> Result<Box<dyn EmailProvider>, EmailProviderError>;
}
