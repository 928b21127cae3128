//! Server dependencies for domain actions (using traits for testability)
//!
//! This module provides the central dependency container used by all domain
//! actions. All external services use trait abstractions to enable testing.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use cloudinary_client::CloudinaryClient;
use mailer::MailerService;
use tracing::{info, warn};
use typed_builder::TypedBuilder;

use crate::domains::auth::JwtService;
use crate::kernel::{
    BaseAccountStore, BaseClock, BaseEmailService, BaseFavoriteStore, BaseImageStorage,
    BaseListingStore,
};

pub const DEFAULT_EMAIL_TIMEOUT: Duration = Duration::from_secs(10);

// =============================================================================
// MailerService Adapter (implements BaseEmailService trait)
// =============================================================================

/// Wrapper around MailerService that implements BaseEmailService trait
pub struct MailerAdapter(pub Arc<MailerService>);

impl MailerAdapter {
    pub fn new(service: Arc<MailerService>) -> Self {
        Self(service)
    }
}

#[async_trait]
impl BaseEmailService for MailerAdapter {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<()> {
        self.0
            .send(recipient, subject, body)
            .await
            .map(|_| ())
            .map_err(|e| anyhow::anyhow!("{}", e))
    }
}

// =============================================================================
// CloudinaryClient Adapter (implements BaseImageStorage trait)
// =============================================================================

/// Wrapper around CloudinaryClient that implements BaseImageStorage trait
pub struct CloudinaryAdapter(pub Arc<CloudinaryClient>);

impl CloudinaryAdapter {
    pub fn new(client: Arc<CloudinaryClient>) -> Self {
        Self(client)
    }
}

#[async_trait]
impl BaseImageStorage for CloudinaryAdapter {
    async fn upload(&self, file_name: &str, content_type: &str, bytes: Vec<u8>) -> Result<String> {
        self.0
            .upload_image(file_name, content_type, bytes)
            .await
            .map(|image| image.secure_url)
            .map_err(|e| anyhow::anyhow!("{}", e))
    }
}

// =============================================================================
// ServerDeps
// =============================================================================

/// Server dependencies accessible to actions (using traits for testability)
#[derive(Clone, TypedBuilder)]
pub struct ServerDeps {
    pub accounts: Arc<dyn BaseAccountStore>,
    pub listings: Arc<dyn BaseListingStore>,
    pub favorites: Arc<dyn BaseFavoriteStore>,
    pub email: Arc<dyn BaseEmailService>,
    pub images: Arc<dyn BaseImageStorage>,
    pub clock: Arc<dyn BaseClock>,
    /// JWT service for session tokens
    pub jwt_service: Arc<JwtService>,
    /// Upper bound on a single email dispatch
    #[builder(default = DEFAULT_EMAIL_TIMEOUT)]
    pub email_timeout: Duration,
}

impl ServerDeps {
    /// Best-effort email dispatch.
    ///
    /// Waits at most `email_timeout`. Failures are logged and swallowed so the
    /// caller's state change stands.
    pub async fn notify(&self, recipient: &str, subject: &str, body: &str) {
        match tokio::time::timeout(self.email_timeout, self.email.send(recipient, subject, body))
            .await
        {
            Ok(Ok(())) => info!(recipient = %recipient, subject = %subject, "Email dispatched"),
            Ok(Err(e)) => warn!(
                recipient = %recipient,
                subject = %subject,
                error = %e,
                "Email dispatch failed"
            ),
            Err(_) => warn!(
                recipient = %recipient,
                subject = %subject,
                timeout_secs = self.email_timeout.as_secs(),
                "Email dispatch timed out"
            ),
        }
    }
}
