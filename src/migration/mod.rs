//! Embedded schema migrations

use anyhow::{Context, Result};
use sqlx::MySqlPool;
use tracing::info;

/// Apply pending migrations from `migrations/`
pub async fn run_migrations(pool: &MySqlPool) -> Result<()> {
    info!("Running database migrations...");

    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("Failed to run migrations")?;

    info!("Database migrations completed");
    Ok(())
}
