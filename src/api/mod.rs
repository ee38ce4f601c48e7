//! REST API handlers and shared response types

pub mod auth;
pub mod health;
pub mod password;

use serde::{Deserialize, Serialize};

/// `{ "msg": ... }` acknowledgment body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub msg: String,
}

impl MessageResponse {
    pub fn new(msg: impl Into<String>) -> Self {
        Self { msg: msg.into() }
    }
}
