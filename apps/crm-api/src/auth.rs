//! JWT authentication module.
//!
//! Issues and validates HS256 access tokens. Each token carries a unique
//! `jti` so logout can revoke it through the [`TokenBlacklist`].
//!
//! [`TokenBlacklist`]: crate::blacklist::TokenBlacklist

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::ApiConfig;
use crm_core::{User, UserRole};

/// Authentication failures.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing bearer token")]
    MissingToken,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token has been invalidated")]
    TokenRevoked,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Failed to generate token: {0}")]
    TokenCreation(String),

    #[error("Failed to hash password: {0}")]
    PasswordHash(String),
}

/// JWT claims structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,

    pub email: String,

    pub name: String,

    /// `Regular` or `Admin`
    pub role: String,

    pub iss: String,

    pub aud: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,

    /// JWT ID (unique identifier for this token)
    pub jti: String,
}

impl Claims {
    pub fn user_id(&self) -> Result<i64, AuthError> {
        self.sub
            .parse()
            .map_err(|_| AuthError::InvalidToken("subject is not a user id".to_string()))
    }

    pub fn role(&self) -> Result<UserRole, AuthError> {
        self.role
            .parse()
            .map_err(|_| AuthError::InvalidToken("unknown role".to_string()))
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0)
            .single()
            .unwrap_or_else(Utc::now)
    }
}

/// A freshly signed token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub jti: String,
    pub expires_at: DateTime<Utc>,
}

/// JWT token manager.
pub struct JwtManager {
    secret: String,
    issuer: String,
    audience: String,
    lifetime: Duration,
}

impl JwtManager {
    pub fn new(
        secret: impl Into<String>,
        issuer: impl Into<String>,
        audience: impl Into<String>,
        lifetime_minutes: i64,
    ) -> Self {
        JwtManager {
            secret: secret.into(),
            issuer: issuer.into(),
            audience: audience.into(),
            lifetime: Duration::minutes(lifetime_minutes),
        }
    }

    pub fn from_config(config: &ApiConfig) -> Self {
        JwtManager::new(
            config.jwt_secret.clone(),
            config.jwt_issuer.clone(),
            config.jwt_audience.clone(),
            config.jwt_expiry_minutes,
        )
    }

    /// Generate an access token for `user`.
    pub fn issue(&self, user: &User) -> Result<IssuedToken, AuthError> {
        let now = Utc::now();
        let expires_at = now + self.lifetime;
        let jti = Uuid::new_v4().to_string();

        let claims = Claims {
            sub: user.id().to_string(),
            email: user.email().to_string(),
            name: user.name().to_string(),
            role: user.role().to_string(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            jti: jti.clone(),
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| AuthError::TokenCreation(e.to_string()))?;

        Ok(IssuedToken {
            token,
            jti,
            expires_at,
        })
    }

    /// Validate signature, expiry, issuer and audience, and decode the claims.
    pub fn validate(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // Blacklist entries live until `exp`, so expiry must be exact.
        validation.leeway = 0;
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);

        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        Ok(token_data.claims)
    }
}

/// Extract bearer token from authorization header.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-that-is-long-enough-for-hs256";

    fn manager() -> JwtManager {
        JwtManager::new(SECRET, "crm-api", "crm-clients", 60)
    }

    fn user() -> User {
        User::new("Jane Doe", "jane@example.com", "hash", UserRole::Admin)
            .unwrap()
            .with_id(42)
    }

    #[test]
    fn test_jwt_roundtrip() {
        let manager = manager();
        let issued = manager.issue(&user()).unwrap();

        let claims = manager.validate(&issued.token).unwrap();

        assert_eq!(claims.user_id().unwrap(), 42);
        assert_eq!(claims.email, "jane@example.com");
        assert_eq!(claims.role().unwrap(), UserRole::Admin);
        assert_eq!(claims.jti, issued.jti);
        assert_eq!(claims.exp, issued.expires_at.timestamp());
    }

    #[test]
    fn test_unique_jti_per_token() {
        let manager = manager();
        let a = manager.issue(&user()).unwrap();
        let b = manager.issue(&user()).unwrap();
        assert_ne!(a.jti, b.jti);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let issued = manager().issue(&user()).unwrap();
        let other = JwtManager::new("another-secret-that-is-long-enough!!", "crm-api", "crm-clients", 60);

        assert!(matches!(
            other.validate(&issued.token),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_wrong_issuer_or_audience_rejected() {
        let issued = manager().issue(&user()).unwrap();

        let wrong_issuer = JwtManager::new(SECRET, "someone-else", "crm-clients", 60);
        assert!(wrong_issuer.validate(&issued.token).is_err());

        let wrong_audience = JwtManager::new(SECRET, "crm-api", "other-clients", 60);
        assert!(wrong_audience.validate(&issued.token).is_err());
    }

    #[test]
    fn test_just_expired_token_rejected() {
        let manager = manager();
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: "42".to_string(),
            email: "jane@example.com".to_string(),
            name: "Jane Doe".to_string(),
            role: "Regular".to_string(),
            iss: "crm-api".to_string(),
            aud: "crm-clients".to_string(),
            iat: now - 10,
            exp: now - 2,
            jti: "jti".to_string(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert!(matches!(
            manager.validate(&token),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        let manager = JwtManager::new(SECRET, "crm-api", "crm-clients", -10);
        let issued = manager.issue(&user()).unwrap();

        assert!(manager.validate(&issued.token).is_err());
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(extract_bearer_token("Basic dXNlcjpwYXNz"), None);
        assert_eq!(extract_bearer_token("Bearer "), None);
    }
}
