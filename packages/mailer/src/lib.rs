//! Minimal client for the Resend transactional email API.
//!
//! ```rust,ignore
//! use mailer::{MailerOptions, MailerService};
//!
//! let mailer = MailerService::new(MailerOptions {
//!     api_key: "re_...".into(),
//!     from: "DREAMarket <no-reply@dreamarket.in>".into(),
//!     base_url: None,
//! });
//! mailer.send("buyer@example.com", "Welcome", "Your code is 123456").await?;
//! ```

pub mod models;

use reqwest::Client;

use crate::models::{SendEmailRequest, SendEmailResponse};

const DEFAULT_BASE_URL: &str = "https://api.resend.com";

#[derive(Debug, thiserror::Error)]
pub enum MailerError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Email API returned {status}: {message}")]
    Api { status: u16, message: String },
}

pub type Result<T> = std::result::Result<T, MailerError>;

#[derive(Debug, Clone)]
pub struct MailerOptions {
    pub api_key: String,
    /// Sender, e.g. `"DREAMarket <no-reply@dreamarket.in>"`.
    pub from: String,
    /// Override for tests or self-hosted relays.
    pub base_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MailerService {
    options: MailerOptions,
    client: Client,
}

impl MailerService {
    pub fn new(options: MailerOptions) -> Self {
        Self {
            options,
            client: Client::new(),
        }
    }

    fn endpoint(&self) -> String {
        let base = self
            .options
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/');
        format!("{}/emails", base)
    }

    /// Send a plain-text email to a single recipient.
    ///
    /// Returns the provider message id.
    pub async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<String> {
        let request = SendEmailRequest {
            from: self.options.from.clone(),
            to: vec![recipient.to_string()],
            subject: subject.to_string(),
            text: body.to_string(),
        };

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.options.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "Email API rejected message");
            return Err(MailerError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let sent: SendEmailResponse = response.json().await?;
        tracing::debug!(message_id = %sent.id, "Email accepted by provider");
        Ok(sent.id)
    }
}
