//! Auth Service Seam
//!
//! The coordinator never inspects credentials itself; it hands the token to
//! an [`AuthService`] and gets back a verified identity plus a display name
//! for the lock status projection. The trait is the substitution point for
//! a remote verifier if the account service ever moves out of process.

use async_trait::async_trait;

use crate::backend::auth::sessions::verify_token;
use crate::backend::error::CoordinatorError;
use crate::shared::command::UserIdentity;

/// The result of a successful credential verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthIdentity {
    /// Stable identity key (verified email)
    pub identity: UserIdentity,
    /// Human-readable name used in status strings
    pub display_name: String,
}

/// External credential verification.
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Verify a credential proof and return the identity it proves.
    async fn verify(&self, token: &str) -> Result<AuthIdentity, CoordinatorError>;
}

/// JWT-backed verification using the shared signing secret.
#[derive(Debug, Default, Clone)]
pub struct JwtAuthService;

impl JwtAuthService {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AuthService for JwtAuthService {
    async fn verify(&self, token: &str) -> Result<AuthIdentity, CoordinatorError> {
        let claims = verify_token(token)?;

        let display_name = claims
            .username
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| local_part(&claims.email).to_string());

        Ok(AuthIdentity {
            identity: UserIdentity::new(claims.email),
            display_name,
        })
    }
}

/// Everything before the `@`, used as a display-name fallback.
fn local_part(email: &str) -> &str {
    email.split('@').next().unwrap_or(email)
}
