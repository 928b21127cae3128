use chrono::{DateTime, Duration, Utc};
use rand::rngs::OsRng;
use rand::Rng;

/// Codes are valid for ten minutes after issue.
pub const CODE_TTL_MINUTES: i64 = 10;

/// Six-digit code emailed to prove control of an address.
///
/// Used for both email verification and password reset. The code space is
/// only 10^6, so the short expiry is what makes guessing impractical.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OneTimeCode {
    pub code: String,
    pub expires_at: DateTime<Utc>,
}

impl OneTimeCode {
    /// Draw a fresh code from the OS CSPRNG.
    pub fn issue(now: DateTime<Utc>) -> Self {
        let n: u32 = OsRng.gen_range(0..1_000_000);
        Self {
            code: format!("{:06}", n),
            expires_at: now + Duration::minutes(CODE_TTL_MINUTES),
        }
    }

    /// `true` when `candidate` equals the code and `now` is strictly before expiry.
    pub fn accepts(&self, candidate: &str, now: DateTime<Utc>) -> bool {
        self.code == candidate && now < self.expires_at
    }
}
