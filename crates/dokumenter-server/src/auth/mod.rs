//! Inbound bearer token validation.

pub mod config;
pub mod extract;
pub mod jwks;
pub mod validation;

use dokumenter_saf::BearerToken;

pub use config::{AuthConfig, JwksSettings};
pub use extract::Authenticated;
pub use jwks::JwksProvider;
pub use validation::{Claims, TokenValidator};

/// Why an inbound token was not accepted. Every variant is a 401.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("missing bearer token")]
    MissingToken,

    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("token rejected: {0}")]
    Rejected(String),

    #[error("signing key unavailable: {0}")]
    KeyUnavailable(String),
}

/// A validated caller: claims plus the raw token for the on-behalf-of exchange.
#[derive(Debug, Clone)]
pub struct IdentityContext {
    pub claims: Claims,
    pub token: BearerToken,
}
