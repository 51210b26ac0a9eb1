//! Session Tokens
//!
//! JWT generation and validation for user sessions. Tokens are issued by
//! the account service at login; the coordinator only verifies them. Token
//! creation is kept here for tests and local tooling.

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user's email, the stable identity key
    pub sub: String,
    /// Email (mirrors `sub`; kept for compatibility with issued tokens)
    pub email: String,
    /// Display name (optional for backwards compatibility)
    #[serde(default)]
    pub username: Option<String>,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
    /// Issued at time (Unix timestamp)
    pub iat: u64,
}

/// Get JWT secret from environment
fn get_jwt_secret() -> String {
    std::env::var("JWT_SECRET").unwrap_or_else(|err| {
        tracing::warn!("Missing JWT_SECRET ({}), using development default", err);
        "your-secret-key-change-in-production".to_string()
    })
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Create a JWT token for a user
///
/// # Arguments
/// * `email` - User email (becomes the identity)
/// * `username` - Optional display name
///
/// # Returns
/// JWT token string
pub fn create_token(
    email: &str,
    username: Option<&str>,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = unix_now();

    // Token expires in 30 days
    let exp = now + (30 * 24 * 60 * 60);

    let claims = Claims {
        sub: email.to_string(),
        email: email.to_string(),
        username: username.map(String::from),
        exp,
        iat: now,
    };

    let secret = get_jwt_secret();
    let key = EncodingKey::from_secret(secret.as_ref());

    encode(&Header::default(), &claims, &key)
}

/// Verify and decode a JWT token
///
/// # Arguments
/// * `token` - JWT token string
///
/// # Returns
/// Decoded claims or error
pub fn verify_token(token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let secret = get_jwt_secret();
    let key = DecodingKey::from_secret(secret.as_ref());
    let validation = Validation::default();

    let token_data = decode::<Claims>(token, &key, &validation)?;
    Ok(token_data.claims)
}
