//! # skillswap-cli: Operator CLI
//!
//! Provides the `skillswap` command-line interface for the credentials the
//! API verifies.
//!
//! ## Subcommands
//!
//! - `skillswap keygen`: Print a fresh signing seed for `TOKEN_SIGNING_KEY_HEX`.
//! - `skillswap token issue`: Issue a token for a principal.
//! - `skillswap token verify`: Check a token and print its claims.
//!
//! ```bash
//! export TOKEN_SIGNING_KEY_HEX=$(skillswap keygen --quiet)
//! skillswap token issue --user 550e8400-e29b-41d4-a716-446655440000 --ttl 12h
//! ```

pub mod token;
