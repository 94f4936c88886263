//! Authentication and authorization for the back office

use chrono::{Duration, Utc};
use jsonwebtoken::{
    crypto, decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ApiConfig;

/// Role required for every `/api/v1/admin` route
pub const ADMIN_ROLE: &str = "admin";

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (admin username)
    pub sub: String,
    /// User's roles
    pub roles: Vec<String>,
    /// Expiration timestamp
    pub exp: i64,
    /// Issued at timestamp
    pub iat: i64,
}

/// Auth errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token expired")]
    TokenExpired,
    #[error("Invalid username or password")]
    InvalidCredentials,
    #[error("Missing permission: {0}")]
    MissingPermission(String),
    #[error("Could not sign token: {0}")]
    Signing(String),
}

/// Creates a new JWT token
///
/// # Arguments
///
/// * `user_id` - User identifier
/// * `roles` - User's roles
/// * `secret` - JWT secret key
/// * `expiration_secs` - Token validity in seconds
pub fn create_token(
    user_id: &str,
    roles: Vec<String>,
    secret: &str,
    expiration_secs: u64,
) -> Result<String, AuthError> {
    let now = Utc::now();
    let exp = now + Duration::seconds(expiration_secs as i64);

    let claims = Claims {
        sub: user_id.to_string(),
        roles,
        exp: exp.timestamp(),
        iat: now.timestamp(),
    };

    sign_claims(&claims, secret)
}

/// Signs already-built claims with HS256
pub fn sign_claims(claims: &Claims, secret: &str) -> Result<String, AuthError> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AuthError::Signing(e.to_string()))
}

/// Validates a JWT token
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, AuthError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::InvalidToken,
    })?;

    Ok(token_data.claims)
}

/// Checks if user has required role
pub fn has_role(claims: &Claims, required_role: &str) -> bool {
    claims.roles.iter().any(|r| r == required_role || r == ADMIN_ROLE)
}

/// Checks admin credentials against the configured account
///
/// Login is refused outright while no admin password is configured.
pub fn authenticate_admin(config: &ApiConfig, username: &str, password: &str) -> Result<Claims, AuthError> {
    if config.admin_password.is_empty() {
        return Err(AuthError::InvalidCredentials);
    }
    let key = EncodingKey::from_secret(config.jwt_secret.as_bytes());
    let user_ok = digests_match(&key, username, &config.admin_username);
    let password_ok = digests_match(&key, password, &config.admin_password);
    if !(user_ok & password_ok) {
        return Err(AuthError::InvalidCredentials);
    }

    let now = Utc::now();
    Ok(Claims {
        sub: config.admin_username.clone(),
        roles: vec![ADMIN_ROLE.to_string()],
        exp: (now + Duration::seconds(config.jwt_expiration_secs as i64)).timestamp(),
        iat: now.timestamp(),
    })
}

/// Compares HMAC-SHA256 digests of both values
///
/// Digests are always the same length, so neither the comparison time nor an
/// early exit reveals the length of the configured credential.
fn digests_match(key: &EncodingKey, given: &str, expected: &str) -> bool {
    match (
        crypto::sign(given.as_bytes(), key, Algorithm::HS256),
        crypto::sign(expected.as_bytes(), key, Algorithm::HS256),
    ) {
        (Ok(given), Ok(expected)) => constant_time_eq(given.as_bytes(), expected.as_bytes()),
        _ => false,
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn test_token_round_trip_keeps_roles() {
        let token = create_token("admin", vec![ADMIN_ROLE.to_string()], SECRET, 60).unwrap();
        let claims = validate_token(&token, SECRET).unwrap();
        assert_eq!(claims.sub, "admin");
        assert!(has_role(&claims, ADMIN_ROLE));
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = create_token("admin", vec![], SECRET, 60).unwrap();
        assert!(matches!(validate_token(&token, "other"), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_admin_login_requires_configured_password() {
        let mut config = ApiConfig::default();
        assert!(matches!(
            authenticate_admin(&config, "admin", ""),
            Err(AuthError::InvalidCredentials)
        ));

        config.admin_password = "s3cret".to_string();
        assert!(authenticate_admin(&config, "admin", "s3cret").is_ok());
        assert!(authenticate_admin(&config, "admin", "s3cre").is_err());
        assert!(authenticate_admin(&config, "root", "s3cret").is_err());
    }

    #[test]
    fn test_credentials_compare_through_fixed_length_digests() {
        let key = EncodingKey::from_secret(SECRET.as_bytes());
        let short = crypto::sign(b"a", &key, Algorithm::HS256).unwrap();
        let long = crypto::sign("a much longer admin password".as_bytes(), &key, Algorithm::HS256).unwrap();
        assert_eq!(short.len(), long.len());

        assert!(digests_match(&key, "s3cret", "s3cret"));
        assert!(!digests_match(&key, "s3cret", "s3cret-and-more"));
        assert!(!digests_match(&key, "", "s3cret"));
    }
}
