use anyhow::{Context, Result, bail};
use sportshub::{
    config::{AppConfig, DatabaseBackend},
    repository::PgStore,
};
use sqlx::postgres::PgPoolOptions;

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::from_env().context("failed to read configuration")?;

    if config.database_backend != DatabaseBackend::Postgres {
        bail!("migrations only apply to DATABASE_BACKEND=postgres");
    }

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(&config.database_url)
        .await
        .context("failed to connect to PostgreSQL")?;

    PgStore::new(pool)
        .migrate()
        .await
        .context("failed to run migrations")?;

    println!("Migrations applied successfully");
    Ok(())
}
