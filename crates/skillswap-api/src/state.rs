//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers via
//! the `State` extractor, plus the configuration it is built from.
//!
//! The composition root picks the adapters: PostgreSQL when a pool is
//! available, in-memory otherwise. Nothing below the router reaches for a
//! global.

use std::sync::Arc;

use chrono::Duration;
use skillswap_core::UserId;
use skillswap_crypto::{parse_ttl, TokenError, TokenService, DEFAULT_TTL};
use sqlx::PgPool;
use thiserror::Error;

use crate::db::principals::PgPrincipalDirectory;
use crate::db::swap_requests::PgSwapRequestRepository;
use crate::directory::{MemoryDirectory, Principal, PrincipalDirectory};
use crate::repository::{MemoryRepository, SwapRequestRepository};
use crate::service::SwapService;

// -- Configuration ------------------------------------------------------------

/// Log output format for the binary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

/// Invalid configuration value.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("PORT must be a number between 1 and 65535, got \"{0}\"")]
    InvalidPort(String),

    #[error("LOG_FORMAT must be \"json\" or \"pretty\", got \"{0}\"")]
    InvalidLogFormat(String),

    #[error("TOKEN_TTL: {0}")]
    InvalidTtl(#[source] TokenError),

    #[error("TOKEN_SIGNING_KEY_HEX: {0}")]
    InvalidKey(#[source] TokenError),

    #[error("SEED_PRINCIPALS entry \"{entry}\": {reason}")]
    InvalidSeedPrincipal { entry: String, reason: String },
}

/// Application configuration.
///
/// Custom `Debug` redacts the signing key and database URL.
#[derive(Clone)]
pub struct AppConfig {
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Lifetime of issued tokens.
    pub token_ttl: Duration,
    /// Hex-encoded Ed25519 seed. `None` generates an ephemeral key.
    pub signing_key_hex: Option<String>,
    /// PostgreSQL URL. `None` selects the in-memory adapters.
    pub database_url: Option<String>,
    /// Log output format.
    pub log_format: LogFormat,
    /// Principals preloaded into the in-memory directory. Ignored when a
    /// database is configured.
    pub seed_principals: Vec<Principal>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field("token_ttl_secs", &self.token_ttl.num_seconds())
            .field(
                "signing_key_hex",
                &self.signing_key_hex.as_ref().map(|_| "[REDACTED]"),
            )
            .field(
                "database_url",
                &self.database_url.as_ref().map(|_| "[REDACTED]"),
            )
            .field("log_format", &self.log_format)
            .field("seed_principals", &self.seed_principals.len())
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            token_ttl: Duration::days(7),
            signing_key_hex: None,
            database_url: None,
            log_format: LogFormat::default(),
            seed_principals: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Build configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a variable is set but unparseable.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match get("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .ok()
                .filter(|p| *p != 0)
                .ok_or(ConfigError::InvalidPort(raw))?,
            None => 8080,
        };

        let token_ttl = parse_ttl(&get("TOKEN_TTL").unwrap_or_else(|| DEFAULT_TTL.to_string()))
            .map_err(ConfigError::InvalidTtl)?;

        let log_format = match get("LOG_FORMAT").as_deref().map(str::trim) {
            None | Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => return Err(ConfigError::InvalidLogFormat(other.to_string())),
        };

        let seed_principals = match get("SEED_PRINCIPALS") {
            Some(raw) => parse_seed_principals(&raw)?,
            None => Vec::new(),
        };

        Ok(Self {
            port,
            token_ttl,
            signing_key_hex: get("TOKEN_SIGNING_KEY_HEX"),
            database_url: get("DATABASE_URL"),
            log_format,
            seed_principals,
        })
    }

    /// Load the token signing key, or generate one for development.
    ///
    /// Returns `Err` if a key is configured but invalid, rather than falling
    /// back to an ephemeral key.
    pub fn token_service(&self) -> Result<TokenService, ConfigError> {
        match &self.signing_key_hex {
            Some(hex) => TokenService::from_seed_hex(hex, self.token_ttl).map_err(config_error),
            None => {
                tracing::warn!(
                    "TOKEN_SIGNING_KEY_HEX not set; generating ephemeral key. \
                     Tokens issued by this process will not verify after restart."
                );
                TokenService::generate(self.token_ttl).map_err(config_error)
            }
        }
    }
}

/// Parse `SEED_PRINCIPALS`: `;`-separated `<uuid>:<name>:<email>` entries.
fn parse_seed_principals(raw: &str) -> Result<Vec<Principal>, ConfigError> {
    raw.split(';')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let invalid = |reason: &str| ConfigError::InvalidSeedPrincipal {
                entry: entry.to_string(),
                reason: reason.to_string(),
            };
            let mut fields = entry.splitn(3, ':').map(str::trim);
            let (Some(id), Some(name), Some(email)) = (fields.next(), fields.next(), fields.next())
            else {
                return Err(invalid("expected <uuid>:<name>:<email>"));
            };
            let id = UserId::parse(id).map_err(|e| invalid(&e.to_string()))?;
            if name.is_empty() || email.is_empty() {
                return Err(invalid("name and email must not be blank"));
            }
            Ok(Principal {
                id,
                email: email.to_string(),
                name: name.to_string(),
                active: true,
            })
        })
        .collect()
}

fn config_error(err: TokenError) -> ConfigError {
    match err {
        TokenError::InvalidTtl { .. } => ConfigError::InvalidTtl(err),
        other => ConfigError::InvalidKey(other),
    }
}

// -- Application State --------------------------------------------------------

/// Shared application state accessible to all route handlers.
///
/// Clone-friendly: every field is an `Arc` or a cheap handle.
#[derive(Clone)]
pub struct AppState {
    /// Swap request operations over the configured repository.
    pub swaps: SwapService,
    /// Identity store used by the guard.
    pub directory: Arc<dyn PrincipalDirectory>,
    /// Token issuance and verification.
    pub tokens: Arc<TokenService>,
    /// PostgreSQL pool, when running against a database.
    pub db_pool: Option<PgPool>,
    pub config: AppConfig,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("tokens", &self.tokens)
            .field("db_pool", &self.db_pool.is_some())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Assemble state from explicit adapters.
    pub fn new(
        config: AppConfig,
        repo: Arc<dyn SwapRequestRepository>,
        directory: Arc<dyn PrincipalDirectory>,
        tokens: Arc<TokenService>,
    ) -> Self {
        Self {
            swaps: SwapService::new(repo, Arc::clone(&directory)),
            directory,
            tokens,
            db_pool: None,
            config,
        }
    }

    /// State on the in-memory adapters, preloaded with
    /// [`AppConfig::seed_principals`]. Returns the directory handle so callers
    /// can add more.
    pub fn in_memory(config: AppConfig) -> Result<(Self, MemoryDirectory), ConfigError> {
        let tokens = Arc::new(config.token_service()?);
        let directory = MemoryDirectory::new();
        for principal in &config.seed_principals {
            directory.upsert(principal.clone());
        }
        let state = Self::new(
            config,
            Arc::new(MemoryRepository::new()),
            Arc::new(directory.clone()),
            tokens,
        );
        Ok((state, directory))
    }

    /// State on the PostgreSQL adapters.
    pub fn with_pool(config: AppConfig, pool: PgPool) -> Result<Self, ConfigError> {
        let tokens = Arc::new(config.token_service()?);
        let mut state = Self::new(
            config,
            Arc::new(PgSwapRequestRepository::new(pool.clone())),
            Arc::new(PgPrincipalDirectory::new(pool.clone())),
            tokens,
        );
        state.db_pool = Some(pool);
        Ok(state)
    }
}
