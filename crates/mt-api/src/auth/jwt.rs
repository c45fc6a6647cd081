//! JWT token generation and validation
//!
//! Access tokens are HMAC-SHA256 signed, self-contained and stateless: there
//! is no server-side session or revocation list. Expiry is checked against
//! the local clock with no leeway.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use mt_core::{AuthConfig, UserId};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// JWT Claims structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Token issuer
    pub iss: String,
    /// Subject - numeric user ID in decimal
    pub sub: String,
    /// Issued at (Unix seconds)
    pub iat: u64,
    /// Expiration (Unix seconds)
    pub exp: u64,
}

impl Claims {
    /// Numeric user ID carried in `sub`
    pub fn user_id(&self) -> Result<UserId, JwtError> {
        self.sub.parse().map_err(|_| JwtError::InvalidSubject)
    }
}

/// JWT token generation and validation errors
#[derive(Debug, Error)]
pub enum JwtError {
    #[error("Failed to encode JWT: {0}")]
    EncodingError(#[from] jsonwebtoken::errors::Error),

    #[error("Invalid token format")]
    InvalidToken,

    #[error("Token has expired")]
    ExpiredToken,

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Token subject is not a user ID")]
    InvalidSubject,

    #[error("System time error: {0}")]
    SystemTimeError(#[from] std::time::SystemTimeError),
}

/// JWT Configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Secret key for HMAC signing
    pub secret: String,
    /// Access token lifetime in seconds
    pub access_expiration_secs: u64,
    /// Token issuer identifier
    pub issuer: String,
}

impl From<&AuthConfig> for JwtConfig {
    fn from(config: &AuthConfig) -> Self {
        Self {
            secret: config.jwt_secret.clone(),
            access_expiration_secs: config.token_ttl_secs,
            issuer: config.issuer.clone(),
        }
    }
}

fn now_secs() -> Result<u64, JwtError> {
    Ok(SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs())
}

/// Issue an access token for `user_id`, valid for the configured lifetime
///
/// # Example
///
/// ```no_run
/// use mt_api::auth::jwt::{generate_access_token, validate_access_token, JwtConfig};
/// use mt_core::AuthConfig;
///
/// let config = JwtConfig::from(&AuthConfig::default());
/// let token = generate_access_token(&config, 42).expect("Failed to generate token");
/// let claims = validate_access_token(&config, &token).expect("Invalid token");
/// assert_eq!(claims.user_id().unwrap(), 42);
/// ```
pub fn generate_access_token(config: &JwtConfig, user_id: UserId) -> Result<String, JwtError> {
    generate_access_token_at(config, user_id, now_secs()?)
}

/// Issue an access token as if the current time were `now` (Unix seconds)
pub fn generate_access_token_at(
    config: &JwtConfig,
    user_id: UserId,
    now: u64,
) -> Result<String, JwtError> {
    let claims = Claims {
        iss: config.issuer.clone(),
        sub: user_id.to_string(),
        iat: now,
        exp: now.saturating_add(config.access_expiration_secs),
    };

    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )?;

    Ok(token)
}

/// Validate an access token and extract its claims
///
/// Fails on a bad signature, a tampered payload, a foreign issuer, a
/// non-numeric subject, or when the current time is past `exp`.
pub fn validate_access_token(config: &JwtConfig, token: &str) -> Result<Claims, JwtError> {
    validate_access_token_at(config, token, now_secs()?)
}

/// Validate an access token against an explicit clock reading
pub fn validate_access_token_at(
    config: &JwtConfig,
    token: &str,
    now: u64,
) -> Result<Claims, JwtError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[&config.issuer]);
    validation.set_required_spec_claims(&["exp", "iss", "sub"]);
    // Expiry is checked below against `now`.
    validation.validate_exp = false;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::InvalidSignature => JwtError::InvalidSignature,
        _ => JwtError::InvalidToken,
    })?;

    let claims = token_data.claims;
    if now > claims.exp {
        return Err(JwtError::ExpiredToken);
    }
    claims.user_id()?;

    Ok(claims)
}
