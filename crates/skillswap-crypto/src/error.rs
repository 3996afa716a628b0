//! Errors raised by credential issuance and verification.

use skillswap_core::Timestamp;
use thiserror::Error;

/// Failure while issuing, verifying, or configuring tokens.
///
/// `Expired` and `Malformed` are the two verification outcomes callers must
/// tell apart: an expired token was genuine and the client can recover by
/// re-authenticating, a malformed one was never valid.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Signature verified but the embedded expiry has passed.
    #[error("token expired at {expired_at}")]
    Expired {
        /// The `exp` instant carried by the token.
        expired_at: Timestamp,
    },

    /// The credential could not be parsed or its signature does not match.
    #[error("malformed token: {0}")]
    Malformed(String),

    /// The signing key material is unusable.
    #[error("invalid signing key: {0}")]
    InvalidKey(String),

    /// A token lifetime string could not be parsed.
    #[error("invalid token ttl \"{value}\": {reason}")]
    InvalidTtl {
        /// The rejected input.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The expiry instant could not be computed or encoded.
    #[error("token issuance failed: {0}")]
    Issuance(String),
}

impl TokenError {
    /// Whether this is the recoverable expiry condition.
    pub fn is_expired(&self) -> bool {
        matches!(self, Self::Expired { .. })
    }
}
