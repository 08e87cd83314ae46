use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;
use sportshub::{
    auth::{Authenticator, SessionIssuer, SystemClock},
    config::{AppConfig, DatabaseBackend},
    repository::{PgStore, Repositories},
};
use sqlx::postgres::PgPoolOptions;

#[derive(Parser)]
#[command(name = "create-admin")]
#[command(about = "Create a back-office administrator account")]
struct Cli {
    /// Login id of the new account
    #[arg(long)]
    user_id: String,

    /// Password; read from ADMIN_PASSWORD when omitted
    #[arg(long, env = "ADMIN_PASSWORD", hide_env_values = true)]
    password: String,

    /// Display name
    #[arg(long)]
    name: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::from_env().context("failed to read configuration")?;

    if config.database_backend != DatabaseBackend::Postgres {
        bail!("accounts created against the memory backend would vanish on exit; use postgres");
    }

    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&config.database_url)
        .await
        .context("failed to connect to PostgreSQL")?;
    let repos = Repositories::postgres(PgStore::new(pool));

    let sessions = SessionIssuer::new(
        &config.session_secret,
        config.session_ttl_secs,
        Arc::new(SystemClock),
    );
    let auth = Authenticator::new(repos.admins, sessions, config.bcrypt_cost);

    let account = auth
        .create_admin(&cli.user_id, &cli.password, cli.name)
        .await
        .with_context(|| format!("failed to create admin '{}'", cli.user_id))?;

    println!("Created admin '{}' (id {})", account.user_id, account.id);
    Ok(())
}
