//! # Identity Tokens
//!
//! Opaque, signed, time-limited credentials that bind a bearer to a
//! principal id.
//!
//! ## Format
//!
//! ```text
//! v1.<base64url(claims JSON)>.<base64url(Ed25519 signature)>
//! ```
//!
//! The signature covers the ASCII bytes `v1.<payload>`. Claims are
//! `{"sub": <uuid>, "iat": <unix secs>, "exp": <unix secs>}`.
//!
//! ## Verification order
//!
//! Structure and signature are checked before expiry. A token is reported
//! [`TokenError::Expired`] only if it is otherwise genuine; anything that
//! fails structure or signature is [`TokenError::Malformed`].

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Duration;
use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
use serde::{Deserialize, Serialize};
use skillswap_core::{Timestamp, UserId};
use zeroize::Zeroizing;

use crate::error::TokenError;

/// Version prefix of every token this service issues.
pub const TOKEN_VERSION: &str = "v1";

/// Claims embedded in a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Claims {
    /// Principal the token was issued to.
    pub sub: UserId,
    /// Issued-at, Unix seconds.
    pub iat: i64,
    /// Expiry, Unix seconds. The token is invalid at any instant `>= exp`.
    pub exp: i64,
}

/// A freshly issued token and the instant it stops verifying.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    /// The opaque bearer credential.
    pub token: String,
    /// Expiry instant.
    pub expires_at: Timestamp,
}

/// Issues and verifies identity tokens with a single Ed25519 key.
///
/// Custom `Debug` never prints key material.
pub struct TokenService {
    signing_key: SigningKey,
    verifying_key: VerifyingKey,
    ttl: Duration,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("signing_key", &"[REDACTED]")
            .field("ttl_secs", &self.ttl.num_seconds())
            .finish()
    }
}

impl TokenService {
    /// Build a service from a raw 32-byte Ed25519 seed.
    ///
    /// # Errors
    ///
    /// [`TokenError::InvalidTtl`] if `ttl` is shorter than one second.
    pub fn from_seed(seed: &[u8; 32], ttl: Duration) -> Result<Self, TokenError> {
        Ok(Self::from_signing_key(
            SigningKey::from_bytes(seed),
            checked_ttl(ttl)?,
        ))
    }

    fn from_signing_key(signing_key: SigningKey, ttl: Duration) -> Self {
        let verifying_key = signing_key.verifying_key();
        Self {
            signing_key,
            verifying_key,
            ttl,
        }
    }

    /// Build a service from a 64-character hex seed.
    ///
    /// # Errors
    ///
    /// [`TokenError::InvalidKey`] if the string is not hex or not 32 bytes,
    /// [`TokenError::InvalidTtl`] if `ttl` is shorter than one second.
    pub fn from_seed_hex(seed_hex: &str, ttl: Duration) -> Result<Self, TokenError> {
        let bytes = Zeroizing::new(
            hex::decode(seed_hex.trim())
                .map_err(|e| TokenError::InvalidKey(format!("seed is not valid hex: {e}")))?,
        );
        let seed: Zeroizing<[u8; 32]> =
            Zeroizing::new(bytes.as_slice().try_into().map_err(|_| {
                TokenError::InvalidKey(format!(
                    "seed must be 32 bytes (64 hex chars), got {} bytes",
                    bytes.len()
                ))
            })?);
        Self::from_seed(&seed, ttl)
    }

    /// Build a service with a freshly generated key.
    ///
    /// Tokens issued by this instance stop verifying once it is dropped.
    ///
    /// # Errors
    ///
    /// [`TokenError::InvalidTtl`] if `ttl` is shorter than one second.
    pub fn generate(ttl: Duration) -> Result<Self, TokenError> {
        let ttl = checked_ttl(ttl)?;
        Ok(Self::from_signing_key(
            SigningKey::generate(&mut rand_core::OsRng),
            ttl,
        ))
    }

    /// Generate a new random seed rendered as hex, for operator key setup.
    pub fn generate_seed_hex() -> String {
        let key = SigningKey::generate(&mut rand_core::OsRng);
        hex::encode(key.to_bytes())
    }

    /// Configured lifetime of issued tokens.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Hex-encoded public key, for diagnostics.
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.verifying_key.as_bytes())
    }

    /// Issue a token for `principal` valid from now for the configured TTL.
    ///
    /// # Errors
    ///
    /// [`TokenError::Issuance`] if the expiry overflows or claims fail to encode.
    pub fn issue(&self, principal: UserId) -> Result<IssuedToken, TokenError> {
        self.issue_at(principal, Timestamp::now())
    }

    /// Issue a token as if the current instant were `now`.
    ///
    /// # Errors
    ///
    /// Same as [`TokenService::issue`].
    pub fn issue_at(&self, principal: UserId, now: Timestamp) -> Result<IssuedToken, TokenError> {
        let expires_at = now
            .checked_add(self.ttl)
            .ok_or_else(|| TokenError::Issuance("expiry overflows".to_string()))?;
        let claims = Claims {
            sub: principal,
            iat: now.unix_secs(),
            exp: expires_at.unix_secs(),
        };
        let json = serde_json::to_vec(&claims)
            .map_err(|e| TokenError::Issuance(format!("claims encoding failed: {e}")))?;

        let signing_input = format!("{TOKEN_VERSION}.{}", URL_SAFE_NO_PAD.encode(json));
        let signature = self.signing_key.sign(signing_input.as_bytes());
        let token = format!(
            "{signing_input}.{}",
            URL_SAFE_NO_PAD.encode(signature.to_bytes())
        );

        Ok(IssuedToken { token, expires_at })
    }

    /// Verify a token and return the principal it was issued to.
    ///
    /// # Errors
    ///
    /// [`TokenError::Expired`] or [`TokenError::Malformed`].
    pub fn verify(&self, token: &str) -> Result<UserId, TokenError> {
        self.verify_at(token, Timestamp::now()).map(|c| c.sub)
    }

    /// Verify a token as if the current instant were `now`, returning its claims.
    ///
    /// # Errors
    ///
    /// [`TokenError::Expired`] or [`TokenError::Malformed`].
    pub fn verify_at(&self, token: &str, now: Timestamp) -> Result<Claims, TokenError> {
        let malformed = |reason: &str| TokenError::Malformed(reason.to_string());

        let mut segments = token.split('.');
        let (Some(version), Some(payload), Some(signature), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return Err(malformed("expected three dot-separated segments"));
        };

        if version != TOKEN_VERSION {
            return Err(malformed("unsupported token version"));
        }

        let sig_bytes = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| malformed("signature is not base64url"))?;
        let sig_array: [u8; 64] = sig_bytes
            .as_slice()
            .try_into()
            .map_err(|_| malformed("signature has wrong length"))?;
        let sig = Signature::from_bytes(&sig_array);

        let signing_input = &token[..version.len() + 1 + payload.len()];
        self.verifying_key
            .verify_strict(signing_input.as_bytes(), &sig)
            .map_err(|_| malformed("signature does not match"))?;

        let json = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| malformed("payload is not base64url"))?;
        let claims: Claims =
            serde_json::from_slice(&json).map_err(|_| malformed("payload is not valid claims"))?;

        // Every issued token lives at least one second.
        if claims.exp <= claims.iat {
            return Err(malformed("expiry precedes issuance"));
        }

        if now.unix_secs() >= claims.exp {
            let expired_at = Timestamp::from_unix_secs(claims.exp)
                .map_err(|_| malformed("expiry out of range"))?;
            return Err(TokenError::Expired { expired_at });
        }

        Ok(claims)
    }
}

/// Reject lifetimes that would issue a token already expired at `iat`.
///
/// Claims carry whole seconds, so anything under one second collapses to
/// `exp == iat`.
fn checked_ttl(ttl: Duration) -> Result<Duration, TokenError> {
    if ttl.num_seconds() < 1 {
        return Err(TokenError::InvalidTtl {
            value: format!("{}s", ttl.num_seconds()),
            reason: "must be at least one second".to_string(),
        });
    }
    Ok(ttl)
}
