use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::config;
use crate::domain::rbac::Role;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(sub: Uuid, username: String, role: Role) -> Self {
        let now = Utc::now();
        let expiry_hours = config::config().security.jwt_expiry_hours;
        let exp = (now + Duration::hours(expiry_hours as i64)).timestamp();

        Self { sub, username, role, exp, iat: now.timestamp() }
    }

    pub fn expires_in_secs(&self) -> i64 {
        (self.exp - self.iat).max(0)
    }
}

#[derive(Debug)]
pub enum JwtError {
    TokenGeneration(String),
    InvalidToken(String),
    InvalidSecret,
}

impl std::fmt::Display for JwtError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JwtError::TokenGeneration(msg) => write!(f, "JWT generation error: {}", msg),
            JwtError::InvalidToken(msg) => write!(f, "Invalid JWT token: {}", msg),
            JwtError::InvalidSecret => write!(f, "Invalid JWT secret"),
        }
    }
}

impl std::error::Error for JwtError {}

pub fn generate_jwt(claims: &Claims) -> Result<String, JwtError> {
    let secret = &config::config().security.jwt_secret;

    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    let header = Header::default();

    encode(&header, claims, &encoding_key).map_err(|e| JwtError::TokenGeneration(e.to_string()))
}

/// Validate a token and extract claims. With `allow_expired` the expiry
/// check is skipped but the signature must still verify; used by the
/// refresh endpoint.
pub fn decode_jwt(token: &str, allow_expired: bool) -> Result<Claims, JwtError> {
    let secret = &config::config().security.jwt_secret;

    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let mut validation = Validation::default();
    if allow_expired {
        validation.validate_exp = false;
    }

    let token_data = decode::<Claims>(token, &decoding_key, &validation)
        .map_err(|e| JwtError::InvalidToken(e.to_string()))?;

    Ok(token_data.claims)
}

/// Generate a fresh random salt for a new password.
pub fn new_salt() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Salted SHA-256 digest, hex encoded.
pub fn hash_password(password: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

pub fn verify_password(password: &str, salt: &str, digest: &str) -> bool {
    hash_password(password, salt) == digest
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_roundtrip() {
        let salt = new_salt();
        let digest = hash_password("correct horse", &salt);
        assert!(verify_password("correct horse", &salt, &digest));
        assert!(!verify_password("wrong horse", &salt, &digest));
    }

    #[test]
    fn salts_are_unique() {
        assert_ne!(new_salt(), new_salt());
    }

    #[test]
    fn jwt_roundtrip() {
        // Development profile carries a fallback secret
        let user_id = Uuid::new_v4();
        let claims = Claims::new(user_id, "alice".to_string(), Role::Contributor);
        let token = generate_jwt(&claims).expect("token");
        let decoded = decode_jwt(&token, false).expect("decode");
        assert_eq!(decoded.sub, user_id);
        assert_eq!(decoded.username, "alice");
        assert_eq!(decoded.role, Role::Contributor);
        assert!(decoded.exp > decoded.iat);
    }

    #[test]
    fn tampered_tokens_are_rejected() {
        let claims = Claims::new(Uuid::new_v4(), "alice".to_string(), Role::Member);
        let mut token = generate_jwt(&claims).expect("token");
        token.push('x');
        assert!(decode_jwt(&token, false).is_err());
    }
}
