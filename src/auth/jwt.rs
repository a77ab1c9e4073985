//! JWT Token Service
//!
//! Handles JWT creation, validation, revocation and claims management for
//! user authentication.

use anyhow::{Context, Result, bail};
use chrono::{Duration, Utc};
use dashmap::DashMap;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, TokenData, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::models::{AuthUser, UserType};
use crate::database::UserRecord;

const ISSUER: &str = "clinica-server";

/// JWT Claims structure containing user information and token metadata
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// User unique identifier
    pub sub: Uuid,
    pub email: String,
    pub name: String,
    #[serde(rename = "userType")]
    pub user_type: UserType,
    /// Token identifier, the key of the revocation list
    pub jti: Uuid,
    /// Token issued at timestamp
    pub iat: i64,
    /// Token expiration timestamp
    pub exp: i64,
    /// Token issuer
    pub iss: String,
}

impl Claims {
    pub fn to_auth_user(&self) -> AuthUser {
        AuthUser {
            id: self.sub.to_string(),
            email: Some(self.email.clone()),
            user_type: self.user_type,
            name: Some(self.name.clone()),
        }
    }
}

/// JWT Service for token operations
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
    /// Revoked `jti` → the token's own expiry
    revoked: DashMap<Uuid, i64>,
}

impl JwtService {
    /// Create a new JWT service with the provided secret
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        let encoding_key = EncodingKey::from_secret(secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(secret.as_bytes());

        let mut validation = Validation::default();
        validation.set_issuer(&[ISSUER]);

        Self {
            encoding_key,
            decoding_key,
            validation,
            ttl: Duration::hours(ttl_hours),
            revoked: DashMap::new(),
        }
    }

    /// Generate a JWT token for a user
    pub fn create_token(&self, user: &UserRecord) -> Result<String> {
        let now = Utc::now();
        let expiration = now + self.ttl;

        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            user_type: user.user_type,
            jti: Uuid::new_v4(),
            iat: now.timestamp(),
            exp: expiration.timestamp(),
            iss: ISSUER.to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .context("Failed to encode JWT token")
    }

    /// Validate and decode a JWT token. Revoked tokens fail validation.
    pub fn validate_token(&self, token: &str) -> Result<TokenData<Claims>> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .context("Failed to validate JWT token")?;
        if self.is_revoked(&data.claims.jti) {
            bail!("JWT token {} has been revoked", data.claims.jti);
        }
        Ok(data)
    }

    pub fn decode_claims(&self, token: &str) -> Result<Claims> {
        let token_data = self.validate_token(token)?;
        Ok(token_data.claims)
    }

    /// Revoke a token until it would have expired anyway.
    pub fn revoke(&self, claims: &Claims) {
        let now = Utc::now().timestamp();
        self.revoked.retain(|_, exp| *exp > now);
        self.revoked.insert(claims.jti, claims.exp);
        tracing::debug!("revoked token {} ({} on the list)", claims.jti, self.revoked.len());
    }

    pub fn is_revoked(&self, jti: &Uuid) -> bool {
        self.revoked.contains_key(jti)
    }

    #[cfg(test)]
    pub(crate) fn revoked_count(&self) -> usize {
        self.revoked.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> UserRecord {
        UserRecord {
            id: Uuid::new_v4(),
            email: "test@example.com".to_string(),
            cpf: "52998224725".to_string(),
            name: "Teste".to_string(),
            user_type: UserType::Medico,
            password_hash: String::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_jwt_roundtrip() {
        let jwt_service = JwtService::new("test_secret", 24);
        let user = record();

        let token = jwt_service.create_token(&user).unwrap();
        let claims = jwt_service.decode_claims(&token).unwrap();

        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.email, user.email);
        assert_eq!(claims.user_type, UserType::Medico);
        assert_eq!(claims.iss, ISSUER);
        assert_eq!(claims.to_auth_user(), user.to_auth_user());
    }

    #[test]
    fn expired_token_is_rejected() {
        let jwt_service = JwtService::new("test_secret", -2);
        let token = jwt_service.create_token(&record()).unwrap();
        assert!(jwt_service.validate_token(&token).is_err());
    }

    #[test]
    fn token_signed_with_another_secret_is_rejected() {
        let token = JwtService::new("one", 24).create_token(&record()).unwrap();
        assert!(JwtService::new("two", 24).validate_token(&token).is_err());
    }

    #[test]
    fn revoked_token_fails_validation() {
        let jwt_service = JwtService::new("test_secret", 24);
        let token = jwt_service.create_token(&record()).unwrap();
        let claims = jwt_service.decode_claims(&token).unwrap();

        jwt_service.revoke(&claims);

        assert!(jwt_service.is_revoked(&claims.jti));
        assert!(jwt_service.validate_token(&token).is_err());
    }

    #[test]
    fn revoking_purges_expired_entries() {
        let jwt_service = JwtService::new("test_secret", 24);
        let mut stale = jwt_service
            .decode_claims(&jwt_service.create_token(&record()).unwrap())
            .unwrap();
        stale.exp = Utc::now().timestamp() - 10;
        jwt_service.revoke(&stale);

        let fresh = jwt_service
            .decode_claims(&jwt_service.create_token(&record()).unwrap())
            .unwrap();
        jwt_service.revoke(&fresh);

        assert_eq!(jwt_service.revoked_count(), 1);
        assert!(jwt_service.is_revoked(&fresh.jti));
    }
}
