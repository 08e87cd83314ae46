use std::sync::Arc;

use anyhow::{Context, Result};
use sportshub::{
    auth::{Authenticator, SessionIssuer, SystemClock},
    build_router,
    config::{AppConfig, DatabaseBackend},
    repository::{PgStore, Repositories},
    state::AppState,
};
use sqlx::postgres::PgPoolOptions;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = AppConfig::from_env().context("failed to load application configuration")?;

    let repos = match config.database_backend {
        DatabaseBackend::Postgres => {
            info!("database backend: postgres");
            let pool = PgPoolOptions::new()
                .max_connections(config.db_max_connections)
                .connect(&config.database_url)
                .await
                .context("failed to connect to PostgreSQL")?;
            let store = PgStore::new(pool);
            store.migrate().await.context("failed to run migrations")?;
            Repositories::postgres(store)
        }
        DatabaseBackend::Memory => {
            info!("database backend: memory (data is lost on restart)");
            Repositories::memory()
        }
    };

    let sessions = SessionIssuer::new(
        &config.session_secret,
        config.session_ttl_secs,
        Arc::new(SystemClock),
    );
    let auth = Authenticator::new(repos.admins.clone(), sessions, config.bcrypt_cost)
        .with_secure_cookie(config.cookie_secure);

    if let Some(bootstrap) = &config.bootstrap_admin {
        let created = auth
            .bootstrap(&bootstrap.user_id, &bootstrap.password)
            .await
            .context("failed to bootstrap admin account")?;
        if created {
            info!(user_id = %bootstrap.user_id, "bootstrap admin created");
        }
    }

    let app = build_router(
        AppState::new(repos, auth),
        config.frontend_origin.as_deref(),
    );

    let addr = config.address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    info!(address = %addr, "sportshub started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("sportshub=debug,tower_http=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "unable to install Ctrl+C signal handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(error = %err, "unable to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
