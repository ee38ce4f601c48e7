//! Data access layer (Repository pattern)

pub mod otp;
pub mod user;

pub use otp::{OtpRepository, OtpRepositoryImpl};
pub use user::{UserRepository, UserRepositoryImpl};

use crate::config::DatabaseConfig;
use anyhow::{Context, Result};
use sqlx::{mysql::MySqlPoolOptions, MySqlPool};
use std::future::Future;
use std::time::Duration;
use tracing::{info, warn};

/// Open the connection pool, retrying with a linearly growing delay.
///
/// Attempt `n` (1-based) that fails waits `n * connect_retry_delay_ms` before
/// the next one. After `connect_max_retries` failures the last error is returned.
pub async fn connect_with_retry(config: &DatabaseConfig) -> Result<MySqlPool> {
    retry_linear(
        config.connect_max_retries,
        Duration::from_millis(config.connect_retry_delay_ms),
        || {
            MySqlPoolOptions::new()
                .max_connections(config.max_connections)
                .min_connections(config.min_connections)
                .connect(&config.url)
        },
    )
    .await
    .context("Failed to connect to database")
}

/// Run `op` up to `max_attempts` times, sleeping `attempt * base_delay` between failures
pub(crate) async fn retry_linear<T, E, F, Fut>(
    max_attempts: u32,
    base_delay: Duration,
    mut op: F,
) -> std::result::Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<T, E>>,
    E: std::fmt::Display,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => {
                if attempt > 1 {
                    info!(attempt, "Database connection established after retry");
                }
                return Ok(value);
            }
            Err(e) if attempt < max_attempts => {
                let delay = base_delay * attempt;
                warn!(
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    "Database connection failed: {}",
                    e
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
