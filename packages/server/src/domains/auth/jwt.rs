use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::AccountId;
use crate::domains::accounts::models::{Account, RoleKind};

/// Sessions last seven days.
pub const SESSION_TTL_DAYS: i64 = 7;

/// JWT Claims - data stored in the token
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,           // Subject (account_id as string)
    pub account_id: AccountId, // Account UUID
    pub role: RoleKind,        // Role at issue time (informational; live role is re-read)
    pub pwd_at: i64,           // password_changed_at in epoch millis
    pub exp: i64,              // Expiration timestamp
    pub iat: i64,              // Issued at timestamp
    pub iss: String,           // Issuer
    pub jti: String,           // JWT ID (unique token identifier)
}

/// JWT Service - creates and verifies session tokens
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
}

impl JwtService {
    /// Create new JWT service with secret and issuer
    pub fn new(secret: &str, issuer: String) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer,
        }
    }

    /// Create a session token for an account, valid for seven days from `now`.
    pub fn create_token(&self, account: &Account, now: DateTime<Utc>) -> Result<String> {
        let exp = now + Duration::days(SESSION_TTL_DAYS);

        let claims = Claims {
            sub: account.id.to_string(),
            account_id: account.id,
            role: account.role.kind(),
            pwd_at: account.password_changed_at.timestamp_millis(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            iss: self.issuer.clone(),
            jti: Uuid::new_v4().to_string(), // Unique token ID
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(Into::into)
    }

    /// Verify signature, issuer and expiry, and decode the claims.
    pub fn verify_token(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.issuer]);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::accounts::models::Role;

    fn account() -> Account {
        let now = Utc::now();
        Account {
            id: AccountId::new(),
            first_name: "Asha".to_string(),
            last_name: "Rao".to_string(),
            email: "asha@example.com".to_string(),
            password_hash: String::new(),
            role: Role::Admin,
            contact_number: "9876543210".to_string(),
            is_verified: true,
            verification: None,
            reset: None,
            password_changed_at: now,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_create_and_verify_token() {
        let service = JwtService::new("test_secret_key", "test_issuer".to_string());
        let account = account();

        let token = service.create_token(&account, Utc::now()).unwrap();

        let claims = service.verify_token(&token).unwrap();
        assert_eq!(claims.account_id, account.id);
        assert_eq!(claims.role, RoleKind::Admin);
        assert_eq!(claims.pwd_at, account.password_changed_at.timestamp_millis());
        assert_eq!(claims.iss, "test_issuer");
    }

    #[test]
    fn test_invalid_token() {
        let service = JwtService::new("test_secret_key", "test_issuer".to_string());
        let result = service.verify_token("invalid_token");
        assert!(result.is_err());
    }

    #[test]
    fn test_wrong_secret() {
        let service1 = JwtService::new("secret1", "test_issuer".to_string());
        let service2 = JwtService::new("secret2", "test_issuer".to_string());

        let token = service1.create_token(&account(), Utc::now()).unwrap();

        // Token created with secret1 should not verify with secret2
        let result = service2.verify_token(&token);
        assert!(result.is_err());
    }

    #[test]
    fn test_wrong_issuer() {
        let service1 = JwtService::new("secret", "issuer_a".to_string());
        let service2 = JwtService::new("secret", "issuer_b".to_string());

        let token = service1.create_token(&account(), Utc::now()).unwrap();
        assert!(service2.verify_token(&token).is_err());
    }

    #[test]
    fn test_expires_in_seven_days() {
        let service = JwtService::new("test_secret_key", "test_issuer".to_string());
        let token = service.create_token(&account(), Utc::now()).unwrap();
        let claims = service.verify_token(&token).unwrap();

        let expires_in = claims.exp - Utc::now().timestamp();
        assert!(expires_in > 7 * 24 * 3600 - 60);
        assert!(expires_in <= 7 * 24 * 3600);
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let service = JwtService::new("test_secret_key", "test_issuer".to_string());
        let issued = Utc::now() - Duration::days(8);
        let token = service.create_token(&account(), issued).unwrap();
        assert!(service.verify_token(&token).is_err());
    }
}
