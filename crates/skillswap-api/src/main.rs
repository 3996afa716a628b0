//! # skillswap-api: Binary Entry Point
//!
//! Starts the Axum HTTP server. Configuration comes from the environment;
//! see [`AppConfig::from_env`].

use skillswap_api::state::{AppConfig, AppState, LogFormat};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env()?;

    // Initialize structured tracing.
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
    tracing::info!(?config, "configuration loaded");

    // Database is optional; absent means in-memory adapters.
    let db_pool = skillswap_api::db::init_pool(config.database_url.as_deref())
        .await
        .map_err(|e| {
            tracing::error!("Database initialization failed: {e}");
            e
        })?;

    let port = config.port;
    let state = match db_pool {
        Some(pool) => AppState::with_pool(config, pool)?,
        None => {
            let (state, directory) = AppState::in_memory(config)?;
            if directory.is_empty() {
                tracing::warn!(
                    "DATABASE_URL and SEED_PRINCIPALS not set; the in-memory directory is empty \
                     and every protected route will answer 401 until principals are added."
                );
            } else {
                tracing::info!(principals = directory.len(), "in-memory directory seeded");
            }
            state
        }
    };
    tracing::info!(public_key = %state.tokens.public_key_hex(), "token service ready");

    let app = skillswap_api::app(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("SkillSwap API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
