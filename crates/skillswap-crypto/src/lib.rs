//! # skillswap-crypto: Credential Primitives
//!
//! - **Token Service** ([`TokenService`]): issues and verifies opaque,
//!   Ed25519-signed identity tokens that embed a principal id and an expiry.
//! - **TTL parsing** ([`parse_ttl`]): `7d` / `12h` / `30m` / `45s` duration
//!   strings used to configure token lifetime.
//!
//! ## Crate Policy
//!
//! - Depends only on `skillswap-core` internally.
//! - Signing keys are never serialized or logged; `Debug` output is redacted.
//! - All tests use real Ed25519 keys. Nothing is mocked.

pub mod error;
pub mod token;
pub mod ttl;

pub use error::TokenError;
pub use token::{Claims, IssuedToken, TokenService, TOKEN_VERSION};
pub use ttl::{parse_ttl, DEFAULT_TTL};
