use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;

pub type DbPool = sqlx::PgPool;

/// Connects to Postgres and applies pending migrations.
pub async fn connect(database_url: &str) -> Result<DbPool> {
    tracing::debug!("Connecting to Postgres...");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .context("Failed to connect to Postgres")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;

    Ok(pool)
}
