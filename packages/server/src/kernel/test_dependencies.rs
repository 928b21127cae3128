// TestDependencies - mock implementations for testing
//
// Provides mock services that can be injected into ServerDeps for tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{BaseClock, BaseEmailService, BaseImageStorage, MemoryStore, ServerDeps};
use crate::domains::auth::JwtService;

// =============================================================================
// Mock Email Service
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentEmail {
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

pub struct MockEmailService {
    sent: Arc<Mutex<Vec<SentEmail>>>,
    fail: bool,
    delay: Option<Duration>,
}

impl MockEmailService {
    pub fn new() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            fail: false,
            delay: None,
        }
    }

    /// Every send returns an error (after recording the attempt).
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    /// Every send sleeps first, for exercising the dispatch timeout.
    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::new()
        }
    }

    /// Get all emails that were sent
    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_to(&self, recipient: &str) -> Vec<SentEmail> {
        self.sent()
            .into_iter()
            .filter(|e| e.recipient == recipient)
            .collect()
    }

    /// The six-digit code in the most recent email to `recipient`.
    pub fn last_code_for(&self, recipient: &str) -> Option<String> {
        self.sent_to(recipient).last().and_then(|email| {
            email
                .body
                .split(|c: char| !c.is_ascii_digit())
                .find(|run| run.len() == 6)
                .map(str::to_string)
        })
    }
}

impl Default for MockEmailService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseEmailService for MockEmailService {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<()> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.sent.lock().unwrap().push(SentEmail {
            recipient: recipient.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        if self.fail {
            anyhow::bail!("mock email provider unavailable");
        }
        Ok(())
    }
}

// =============================================================================
// Mock Image Storage
// =============================================================================

/// Arguments captured from an upload call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadCall {
    pub file_name: String,
    pub content_type: String,
    pub size: usize,
}

pub struct MockImageStorage {
    uploads: Arc<Mutex<Vec<UploadCall>>>,
}

impl MockImageStorage {
    pub fn new() -> Self {
        Self {
            uploads: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn uploads(&self) -> Vec<UploadCall> {
        self.uploads.lock().unwrap().clone()
    }
}

impl Default for MockImageStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseImageStorage for MockImageStorage {
    async fn upload(&self, file_name: &str, content_type: &str, bytes: Vec<u8>) -> Result<String> {
        let mut uploads = self.uploads.lock().unwrap();
        uploads.push(UploadCall {
            file_name: file_name.to_string(),
            content_type: content_type.to_string(),
            size: bytes.len(),
        });
        Ok(format!(
            "https://images.test/marketplace/{}/{}",
            uploads.len(),
            file_name
        ))
    }
}

// =============================================================================
// Mock Clock
// =============================================================================

/// Settable clock for expiry tests.
pub struct MockClock {
    now: Mutex<DateTime<Utc>>,
}

impl MockClock {
    pub fn new() -> Self {
        Self::at(Utc::now())
    }

    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn advance(&self, by: chrono::Duration) {
        *self.now.lock().unwrap() += by;
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl BaseClock for MockClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

// =============================================================================
// TestDependencies - Builder for test dependencies
// =============================================================================

pub const TEST_JWT_SECRET: &str = "test_secret_key";
pub const TEST_JWT_ISSUER: &str = "marketplace-test";

#[derive(Clone)]
pub struct TestDependencies {
    pub email: Arc<MockEmailService>,
    pub images: Arc<MockImageStorage>,
    pub clock: Arc<MockClock>,
    pub store: Arc<MemoryStore>,
    pub jwt_service: Arc<JwtService>,
    pub email_timeout: Duration,
}

impl TestDependencies {
    pub fn new() -> Self {
        let clock = Arc::new(MockClock::new());
        Self {
            email: Arc::new(MockEmailService::new()),
            images: Arc::new(MockImageStorage::new()),
            store: Arc::new(MemoryStore::new(clock.clone())),
            clock,
            jwt_service: Arc::new(JwtService::new(TEST_JWT_SECRET, TEST_JWT_ISSUER.to_string())),
            email_timeout: Duration::from_secs(1),
        }
    }

    /// Set a mock email service
    pub fn mock_email(mut self, email: MockEmailService) -> Self {
        self.email = Arc::new(email);
        self
    }

    pub fn email_timeout(mut self, timeout: Duration) -> Self {
        self.email_timeout = timeout;
        self
    }

    /// Convert into ServerDeps backed by the in-memory store
    pub fn into_deps(self) -> Arc<ServerDeps> {
        Arc::new(
            ServerDeps::builder()
                .accounts(self.store.clone())
                .listings(self.store.clone())
                .favorites(self.store)
                .email(self.email)
                .images(self.images)
                .clock(self.clock)
                .jwt_service(self.jwt_service)
                .email_timeout(self.email_timeout)
                .build(),
        )
    }
}

impl Default for TestDependencies {
    fn default() -> Self {
        Self::new()
    }
}
