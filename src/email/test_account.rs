//! Ephemeral Ethereal mailbox provisioning for non-production environments

use super::provider::EmailProviderError;
use crate::domain::SmtpSettings;
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
struct ProvisionRequest<'a> {
    requestor: &'a str,
    version: &'a str,
}

#[derive(Deserialize)]
struct ProvisionResponse {
    status: String,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    user: String,
    #[serde(default)]
    pass: String,
    smtp: Option<ServerInfo>,
    #[serde(default)]
    web: String,
}

#[derive(Deserialize)]
struct ServerInfo {
    host: String,
    port: u16,
    #[serde(default)]
    secure: bool,
}

/// Credentials for a throwaway mailbox. Messages are never delivered; they can
/// be inspected at `{web_url}/message/{id}`.
#[derive(Debug, Clone)]
pub struct TestAccount {
    pub smtp: SmtpSettings,
    pub web_url: String,
}

impl TestAccount {
    pub fn user(&self) -> Option<&str> {
        self.smtp.username.as_deref()
    }
}

/// Create a fresh test mailbox through the Ethereal API at `api_url`
pub async fn provision(
    client: &reqwest::Client,
    api_url: &str,
) -> Result<TestAccount, EmailProviderError> {
    let endpoint = format!("{}/user", api_url.trim_end_matches('/'));

    let response = client
        .post(&endpoint)
        .json(&ProvisionRequest {
            requestor: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
        })
        .send()
        .await
        .map_err(|e| EmailProviderError::Provisioning(e.to_string()))?;

    if !response.status().is_success() {
        return Err(EmailProviderError::Provisioning(format!(
            "HTTP {} from {}",
            response.status(),
            endpoint
        )));
    }

    let body: ProvisionResponse = response
        .json()
        .await
        .map_err(|e| EmailProviderError::Provisioning(e.to_string()))?;

    if body.status != "success" {
        return Err(EmailProviderError::Provisioning(
            body.error.unwrap_or_else(|| format!("status '{}'", body.status)),
        ));
    }

    let smtp = body
        .smtp
        .ok_or_else(|| EmailProviderError::Provisioning("missing smtp settings".to_string()))?;

    Ok(TestAccount {
        smtp: SmtpSettings {
            host: smtp.host,
            port: smtp.port,
            secure: smtp.secure,
            username: Some(body.user),
            password: Some(body.pass),
        },
        web_url: body.web,
    })
}

/// Pull the message id out of an Ethereal SMTP reply such as
/// `Accepted [STATUS=new MSGID=Y2xA...]`
pub fn extract_msgid(reply: &str) -> Option<&str> {
    let start = reply.find("MSGID=")? + "MSGID=".len();
    let rest = &reply[start..];
    let end = rest
        .find(|c: char| c == ']' || c.is_whitespace())
        .unwrap_or(rest.len());
    let id = &rest[..end];
    (!id.is_empty()).then_some(id)
}

/// Web link for viewing a captured message
pub fn preview_url(web_url: &str, reply: &str) -> Option<String> {
    extract_msgid(reply).map(|id| format!("{}/message/{}", web_url.trim_end_matches('/'), id))
}
