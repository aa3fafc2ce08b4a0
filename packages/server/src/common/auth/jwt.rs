use anyhow::Result;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT Claims - data stored in the token
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,      // Subject (username)
    pub username: String, // Permanent username chosen at profile registration
    pub exp: i64,         // Expiration timestamp
    pub iat: i64,         // Issued at timestamp
    pub iss: String,      // Issuer
    pub jti: String,      // JWT ID (unique token identifier)
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

    /// Create a token for a username
    ///
    /// Token expires after 24 hours
    pub fn create_token(&self, username: &str) -> Result<String> {
        let now = chrono::Utc::now();
        let exp = now + chrono::Duration::hours(24);

        let claims = Claims {
            sub: username.to_string(),
            username: username.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            iss: self.issuer.clone(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(Into::into)
    }

    /// Verify and decode a token
    ///
    /// Returns claims if token is valid and not expired
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

    #[test]
    fn test_create_and_verify_token() {
        let service = JwtService::new("test_secret_key", "groops".to_string());

        let token = service.create_token("alice").unwrap();
        let claims = service.verify_token(&token).unwrap();

        assert_eq!(claims.username, "alice");
        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.iss, "groops");
    }

    #[test]
    fn test_token_from_other_issuer_is_rejected() {
        let issuer_a = JwtService::new("shared_secret", "issuer_a".to_string());
        let issuer_b = JwtService::new("shared_secret", "issuer_b".to_string());

        let token = issuer_a.create_token("alice").unwrap();
        assert!(issuer_b.verify_token(&token).is_err());
    }

    #[test]
    fn test_token_signed_with_other_secret_is_rejected() {
        let service = JwtService::new("secret_one", "groops".to_string());
        let other = JwtService::new("secret_two", "groops".to_string());

        let token = other.create_token("mallory").unwrap();
        assert!(service.verify_token(&token).is_err());
    }
}
