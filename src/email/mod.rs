//! Outbound mail for the credential service
//!
//! - `selector`: precedence-ordered transport resolution and the shared transport handle
//! - `smtp`: lettre-backed SMTP provider and the production provider factory
//! - `test_account`: Ethereal mailbox provisioning for development
//! - `templates`: OTP and reset-link message bodies

pub mod provider;
pub mod selector;
pub mod smtp;
pub mod templates;
pub mod test_account;

pub use provider::{EmailProvider, EmailProviderError, EmailProviderFactory};
pub use selector::{resolve_transport_config, MailTransportSelector};
pub use smtp::{SmtpEmailProvider, SmtpProviderFactory};
pub use templates::{EmailTemplate, TemplateEngine};
