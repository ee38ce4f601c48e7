//! Email template system
//!
//! Provides simple variable substitution for email templates.
//! Variables are specified using {{variable_name}} syntax.

use std::collections::HashMap;

/// Available email templates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailTemplate {
    /// Passcode proving mailbox ownership before account creation
    SignupOtp,
    /// Passcode authorizing a password reset
    ResetOtp,
    /// Clickable password reset link
    PasswordResetLink,
}

impl EmailTemplate {
    /// Get the subject line for this template
    pub fn subject(&self) -> &'static str {
        match self {
            Self::SignupOtp | Self::ResetOtp => "{{app_name}} OTP",
            Self::PasswordResetLink => "Reset your {{app_name}} password",
        }
    }

    /// Get the HTML body template
    pub fn html_body(&self) -> &'static str {
        match self {
            Self::SignupOtp => SIGNUP_OTP_TEMPLATE,
            Self::ResetOtp => RESET_OTP_TEMPLATE,
            Self::PasswordResetLink => PASSWORD_RESET_TEMPLATE,
        }
    }

    /// Get the plain text body template
    pub fn text_body(&self) -> &'static str {
        match self {
            Self::SignupOtp => SIGNUP_OTP_TEMPLATE_TEXT,
            Self::ResetOtp => RESET_OTP_TEMPLATE_TEXT,
            Self::PasswordResetLink => PASSWORD_RESET_TEMPLATE_TEXT,
        }
    }
}

/// Template rendering engine with variable substitution
#[derive(Debug, Default)]
pub struct TemplateEngine {
    variables: HashMap<String, String>,
}

impl TemplateEngine {
    /// Create a new template engine
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a variable value
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.variables.insert(key.into(), value.into());
        self
    }

    /// Render a template string, replacing {{variable}} with values
    pub fn render(&self, template: &str) -> String {
        let mut result = template.to_string();

        for (key, value) in &self.variables {
            let placeholder = format!("{{{{{}}}}}", key);
            result = result.replace(&placeholder, value);
        }

        result
    }

    /// Render a complete email template
    pub fn render_template(&self, template: EmailTemplate) -> RenderedEmail {
        RenderedEmail {
            subject: self.render(template.subject()),
            html_body: with_layout_style(&self.render(template.html_body())),
            text_body: self.render(template.text_body()),
        }
    }
}

/// Rendered email with all variables substituted
#[derive(Debug, Clone)]
pub struct RenderedEmail {
    pub subject: String,
    pub html_body: String,
    pub text_body: String,
}

// ============================================================================
// Email Templates
// ============================================================================

const LAYOUT_STYLE: &str = r#"body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, Helvetica, Arial, sans-serif; line-height: 1.6; color: #333; margin: 0; padding: 0; background-color: #f5f5f5; }"#;

const SIGNUP_OTP_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>{{app_name}} OTP</title>
    <style>
        .container { max-width: 480px; margin: 40px auto; padding: 32px; background: #ffffff; border-radius: 8px; }
        .code { font-size: 32px; letter-spacing: 8px; font-weight: 700; text-align: center; margin: 24px 0; }
    </style>
</head>
<body>
    <div class="container">
        <p>Welcome to <strong>{{app_name}}</strong>, your OTP is:</p>
        <p class="code">{{code}}</p>
        <p style="font-size: 14px; color: #666;">It is valid for {{expires_in_minutes}} minutes.</p>
    </div>
</body>
</html>"#;

const SIGNUP_OTP_TEMPLATE_TEXT: &str =
    "Welcome to {{app_name}}, your OTP is {{code}}. It is valid for {{expires_in_minutes}} minutes.";

const RESET_OTP_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>{{app_name}} OTP</title>
    <style>
        .container { max-width: 480px; margin: 40px auto; padding: 32px; background: #ffffff; border-radius: 8px; }
        .code { font-size: 32px; letter-spacing: 8px; font-weight: 700; text-align: center; margin: 24px 0; }
    </style>
</head>
<body>
    <div class="container">
        <p>We received a request to reset the password for your <strong>{{app_name}}</strong> account. Your OTP is:</p>
        <p class="code">{{code}}</p>
        <p style="font-size: 14px; color: #666;">It is valid for {{expires_in_minutes}} minutes. If you didn't request a password reset, you can ignore this email.</p>
    </div>
</body>
</html>"#;

const RESET_OTP_TEMPLATE_TEXT: &str = "We received a request to reset the password for your {{app_name}} account. \
Your OTP is {{code}}. It is valid for {{expires_in_minutes}} minutes.";

const PASSWORD_RESET_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Password Reset</title>
    <style>
        .container { max-width: 600px; margin: 40px auto; padding: 40px; background: #ffffff; border-radius: 8px; box-shadow: 0 2px 4px rgba(0,0,0,0.1); }
        .button { display: inline-block; background-color: #2563eb; color: #ffffff; padding: 14px 28px; text-decoration: none; border-radius: 6px; font-weight: 600; }
        .link { color: #2563eb; word-break: break-all; }
        .warning { background-color: #fef3c7; border: 1px solid #f59e0b; padding: 12px; border-radius: 6px; margin: 20px 0; }
    </style>
</head>
<body>
    <div class="container">
        <h1>Reset Your Password</h1>
        <p>Hi {{user_name}},</p>
        <p>We received a request to reset your password for your {{app_name}} account.</p>
        <p style="text-align: center; margin: 30px 0;">
            <a href="{{reset_link}}" class="button">Reset Password</a>
        </p>
        <p style="font-size: 14px; color: #666;">
            Or copy and paste this link into your browser:<br>
            <a href="{{reset_link}}" class="link">{{reset_link}}</a>
        </p>
        <div class="warning">
            This link will expire in {{expires_in_minutes}} minutes. If you didn't request a password reset, please ignore this email.
        </div>
    </div>
</body>
</html>"#;

const PASSWORD_RESET_TEMPLATE_TEXT: &str = r#"Reset Your Password

Hi {{user_name}},

We received a request to reset your password for your {{app_name}} account.

Open the link below to choose a new password:

{{reset_link}}

This link will expire in {{expires_in_minutes}} minutes.
If you didn't request a password reset, please ignore this email."#;

/// Inline the shared base style into an HTML body
fn with_layout_style(html: &str) -> String {
    html.replacen("<style>", &format!("<style>\n        {}", LAYOUT_STYLE), 1)
}
