pub(crate) mod models;
pub(crate) mod types;

use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{ConnectOptions, PgPool};

use crate::core::config::Settings;

pub(crate) async fn init_pool(settings: &Settings) -> Result<PgPool, sqlx::Error> {
    let database_url = settings.database().database_url();
    let mut connect_options: PgConnectOptions = database_url.parse()?;

    connect_options = connect_options
        .application_name("elamid-api")
        .log_statements(tracing::log::LevelFilter::Off);

    PgPoolOptions::new()
        .max_connections(settings.database().max_connections)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(30))
        .test_before_acquire(true)
        .connect_with(connect_options)
        .await
}

/// Opens the pool, retrying with a doubling delay while the database is still coming up.
pub(crate) async fn connect_with_retry(settings: &Settings) -> Result<PgPool, sqlx::Error> {
    let attempts = settings.database().connect_retries.max(1);
    let mut delay = Duration::from_secs(settings.database().connect_retry_delay_seconds);
    let mut attempt = 1;

    loop {
        match init_pool(settings).await {
            Ok(pool) => {
                tracing::info!(attempt, "Database connected");
                return Ok(pool);
            }
            Err(err) if attempt < attempts => {
                tracing::warn!(
                    error = %err,
                    attempt,
                    max_attempts = attempts,
                    retry_in_seconds = delay.as_secs(),
                    "Database connection failed, retrying"
                );
                tokio::time::sleep(delay).await;
                delay = delay.saturating_mul(2);
                attempt += 1;
            }
            Err(err) => {
                tracing::error!(error = %err, attempt, "Database connection failed, giving up");
                return Err(err);
            }
        }
    }
}

pub(crate) async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}
