//! Business logic layer

pub mod credential;
pub mod mailer;
pub mod otp;
pub mod reset_token;

pub use credential::CredentialService;
pub use mailer::Mailer;
pub use otp::OtpLedger;
pub use reset_token::{ResetLink, ResetTokenLedger};
