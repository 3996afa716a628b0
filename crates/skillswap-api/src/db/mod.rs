//! # Database Persistence Layer
//!
//! PostgreSQL adapters for the swap request repository and the principal
//! directory, via SQLx.
//!
//! The database is **optional**. When `DATABASE_URL` is set the API stores
//! swap requests in Postgres and resolves principals from the `users` table.
//! When absent it runs on the in-memory adapters, which is how the test suite
//! and local development run.

pub mod principals;
pub mod swap_requests;

use sqlx::postgres::{PgPool, PgPoolOptions};

/// Connect to Postgres and run embedded migrations.
///
/// Returns `None` if no URL is configured (in-memory mode).
/// Returns `Err` if the URL is set but the connection or migration fails.
pub async fn init_pool(database_url: Option<&str>) -> Result<Option<PgPool>, sqlx::Error> {
    let Some(url) = database_url else {
        tracing::warn!(
            "DATABASE_URL not set; running with in-memory storage. \
             Swap requests will not survive restarts."
        );
        return Ok(None);
    };

    let pool = PgPoolOptions::new()
        .max_connections(20)
        .min_connections(2)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect(url)
        .await?;

    tracing::info!("Connected to PostgreSQL");

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    Ok(Some(pool))
}
