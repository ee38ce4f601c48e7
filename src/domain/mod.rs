//! Domain models for the storefront credential service

pub mod common;
pub mod email;
pub mod otp;
pub mod password;
pub mod secret;
pub mod user;

pub use common::*;
pub use email::*;
pub use otp::*;
pub use password::*;
pub use secret::*;
pub use user::*;
