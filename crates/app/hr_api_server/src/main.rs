//! HR suite authentication API server binary.
//!
//! Connects to PostgreSQL, runs migrations, and serves the `hr_api` router.
//! Settings come from the environment (see `hr_api::config::ApiConfig`);
//! command-line flags override the bind address and pool size.

use std::sync::Arc;

use clap::Parser;
use hr_core::auth::queries::PgAuthStore;
use hr_core::clock::SystemClock;
use hr_core::notify::{LogNotifier, Notifier, RelayNotifier};
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};

/// CLI arguments for the API server.
#[derive(Parser, Debug)]
#[command(name = "hr_api_server", about = "HR suite authentication API server")]
struct Args {
    /// Address to listen on; overrides `BIND_ADDR`.
    #[arg(long)]
    bind_addr: Option<String>,

    /// PostgreSQL connection URL; overrides `DATABASE_URL`.
    #[arg(long)]
    database_url: Option<String>,

    /// Maximum number of database connections in the pool.
    #[arg(long, env = "DB_MAX_CONNECTIONS", default_value_t = 5)]
    max_connections: u32,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new("info,hr_api=debug,hr_core=debug")
            }),
        )
        .init();

    let args = Args::parse();

    // A missing signing secret is fatal here, before anything binds.
    let mut config = hr_api::config::ApiConfig::from_env()?;
    if let Some(addr) = args.bind_addr {
        config.bind_addr = addr;
    }
    if let Some(url) = args.database_url {
        config.pg_connection_url = url;
    }

    info!(
        bind_addr = %config.bind_addr,
        max_connections = args.max_connections,
        otp_match_policy = %config.auth.otp_match_policy,
        "starting hr_api_server"
    );

    let pool = PgPoolOptions::new()
        .max_connections(args.max_connections)
        .acquire_timeout(std::time::Duration::from_secs(30))
        .connect(&config.pg_connection_url)
        .await?;

    info!("running database migrations");
    hr_api::migrate(&pool).await?;

    let notifier: Arc<dyn Notifier> = match &config.mail_relay_url {
        Some(url) => {
            info!(endpoint = %url, "delivering mail through relay");
            Arc::new(RelayNotifier::new(url.clone(), config.mail_sender.clone()))
        }
        None => {
            warn!("MAIL_RELAY_URL not set; reset codes will only be logged as sent");
            Arc::new(LogNotifier)
        }
    };

    let store = Arc::new(PgAuthStore::new(pool.clone()));
    let state = hr_api::AppState::new(
        config.clone(),
        store.clone(),
        store,
        notifier,
        Arc::new(SystemClock),
    )
    .with_pool(pool);

    let app = hr_api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %listener.local_addr()?, "REST API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await?;

    Ok(())
}
