//! Authentication
//!
//! Credential verification is an external concern; this module holds the
//! narrow client side of it: JWT decoding and the [`AuthService`] seam the
//! coordinator calls through. Signup, login, and password storage live in
//! the product's account service.

/// JWT token creation and validation
pub mod sessions;

/// The verification seam used by the coordinator
pub mod service;

pub use service::{AuthIdentity, AuthService, JwtAuthService};
pub use sessions::{create_token, verify_token, Claims};
