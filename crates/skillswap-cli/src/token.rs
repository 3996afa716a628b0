//! # Key and Token Subcommands
//!
//! Wraps `skillswap-crypto` so operators can mint a signing seed and issue
//! or inspect tokens with the same key the API is configured with.
//!
//! The key is read from `--key-hex` or `TOKEN_SIGNING_KEY_HEX` and is never
//! echoed back.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use skillswap_core::{Timestamp, UserId};
use skillswap_crypto::{parse_ttl, Claims, IssuedToken, TokenError, TokenService, DEFAULT_TTL};

/// Exit code when `token verify` rejects a token.
pub const EXIT_REJECTED: u8 = 2;

/// Arguments for `skillswap keygen`.
#[derive(Args, Debug)]
pub struct KeygenArgs {
    /// Print only the seed, for use in shell substitution.
    #[arg(long, short)]
    pub quiet: bool,
}

/// The signing key shared with the API.
#[derive(Args, Debug)]
pub struct KeyArgs {
    /// Hex-encoded 32-byte Ed25519 seed.
    #[arg(long = "key-hex", env = "TOKEN_SIGNING_KEY_HEX", hide_env_values = true)]
    pub key_hex: String,
}

/// Arguments for `skillswap token`.
#[derive(Args, Debug)]
pub struct TokenArgs {
    #[command(subcommand)]
    pub command: TokenCommand,
}

/// Token subcommands.
#[derive(Subcommand, Debug)]
pub enum TokenCommand {
    /// Issue a token for a principal.
    Issue {
        /// Principal id (UUID) the token is issued to.
        #[arg(long)]
        user: String,
        /// Token lifetime, e.g. `7d`, `12h`, `30m`.
        #[arg(long, env = "TOKEN_TTL", default_value = DEFAULT_TTL)]
        ttl: String,
        #[command(flatten)]
        key: KeyArgs,
    },

    /// Verify a token and print its claims.
    Verify {
        /// The bearer token.
        #[arg(value_name = "TOKEN")]
        token: String,
        #[command(flatten)]
        key: KeyArgs,
    },
}

/// Execute `skillswap keygen`.
pub fn run_keygen(args: &KeygenArgs) -> Result<u8> {
    let seed_hex = TokenService::generate_seed_hex();
    if args.quiet {
        println!("{seed_hex}");
        return Ok(0);
    }

    let service = TokenService::from_seed_hex(&seed_hex, chrono::Duration::days(7))
        .context("generated seed was rejected")?;
    println!("OK: generated Ed25519 signing seed");
    println!("  TOKEN_SIGNING_KEY_HEX={seed_hex}");
    println!("  Public key (hex): {}", service.public_key_hex());
    Ok(0)
}

/// Execute `skillswap token`.
pub fn run_token(args: &TokenArgs) -> Result<u8> {
    match &args.command {
        TokenCommand::Issue { user, ttl, key } => {
            let issued = issue(&key.key_hex, user, ttl, Timestamp::now())?;
            tracing::info!(user = %user, expires_at = %issued.expires_at, "token issued");
            println!("{}", issued.token);
            Ok(0)
        }
        TokenCommand::Verify { token, key } => {
            let service = load_service(&key.key_hex, chrono::Duration::days(7))?;
            match service.verify_at(token, Timestamp::now()) {
                Ok(claims) => {
                    for line in describe(&claims) {
                        println!("{line}");
                    }
                    Ok(0)
                }
                Err(err) => {
                    println!("{}", rejection_line(&err));
                    Ok(EXIT_REJECTED)
                }
            }
        }
    }
}

fn load_service(key_hex: &str, ttl: chrono::Duration) -> Result<TokenService> {
    TokenService::from_seed_hex(key_hex.trim(), ttl).context("invalid signing key")
}

/// Issue a token for `user` valid for `ttl` from `now`.
pub fn issue(key_hex: &str, user: &str, ttl: &str, now: Timestamp) -> Result<IssuedToken> {
    let ttl = parse_ttl(ttl).context("invalid --ttl")?;
    let user = UserId::parse(user).context("invalid --user")?;
    let service = load_service(key_hex, ttl)?;
    Ok(service.issue_at(user, now)?)
}

/// Human-readable claims of a verified token.
pub fn describe(claims: &Claims) -> Vec<String> {
    let fmt = |secs: i64| {
        Timestamp::from_unix_secs(secs)
            .map(|t| t.to_iso8601())
            .unwrap_or_else(|_| secs.to_string())
    };
    vec![
        "OK: token valid".to_string(),
        format!("  Subject: {}", claims.sub),
        format!("  Issued:  {}", fmt(claims.iat)),
        format!("  Expires: {}", fmt(claims.exp)),
    ]
}

/// One-line verdict for a rejected token.
pub fn rejection_line(err: &TokenError) -> String {
    if err.is_expired() {
        format!("EXPIRED: {err}")
    } else {
        format!("INVALID: {err}")
    }
}
