// Import and re-export the `error` module
pub use self::error::{Error, Result};
mod error;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{Duration, Utc};
use clap::Parser;
use cli::{Cli, Commands, DbCommands};
use hr_core::auth::config::DEFAULT_MIN_PASSWORD_LENGTH;
use hr_core::auth::jwt;
use hr_core::auth::password;
use hr_core::auth::queries::PgAuthStore;
use rand::RngCore;

mod cli;
mod logging;

fn main() -> Result<()> {
    if let Err(e) = run() {
        log::error!("{}", e);
        std::process::exit(1);
    }
    Ok(())
}

fn run() -> Result<()> {
    logging::init()?;

    let args = Cli::parse();

    match args.command {
        Commands::Version => {
            println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
        }
        Commands::GenerateSecret { bytes } => {
            if bytes < 16 {
                return Err(Error::Custom("a secret needs at least 16 bytes".into()));
            }
            let mut buf = vec![0u8; bytes];
            rand::rng().fill_bytes(&mut buf);
            println!("{}", URL_SAFE_NO_PAD.encode(&buf));
        }
        Commands::HashPassword { password } => {
            println!("{}", password::hash_password(&password)?);
        }
        Commands::IssueToken {
            kind,
            subject,
            lifetime_secs,
            secret,
        } => {
            if lifetime_secs <= 0 {
                return Err(Error::Custom("lifetime must be positive".into()));
            }
            let token = jwt::issue_token(
                &subject,
                kind,
                non_empty_secret(&secret)?,
                Utc::now(),
                Duration::seconds(lifetime_secs),
            )?;
            log::info!("issued {kind} token for {subject}, valid {lifetime_secs}s");
            println!("{token}");
        }
        Commands::VerifyToken { token, secret } => {
            let claims = jwt::verify_token(&token, non_empty_secret(&secret)?, Utc::now())?;
            println!("{}", serde_json::to_string_pretty(&claims)?);
        }
        Commands::Db {
            database_url,
            action,
        } => {
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(run_db(&database_url, action))?;
        }
    }

    Ok(())
}

async fn run_db(database_url: &str, action: DbCommands) -> Result<()> {
    let pool = sqlx::PgPool::connect(database_url).await?;
    hr_core::migrate::migrate(&pool).await?;

    match action {
        DbCommands::Migrate => {
            log::info!("migrations applied");
        }
        DbCommands::CreatePrincipal {
            kind,
            username,
            email,
            password,
        } => {
            password::validate_new_password(&password, DEFAULT_MIN_PASSWORD_LENGTH)?;
            let hash = password::hash_password(&password)?;
            let principal = PgAuthStore::new(pool)
                .create_principal(kind, &username, &email, &hash)
                .await?;
            println!("{}", principal.id);
        }
    }
    Ok(())
}

fn non_empty_secret(secret: &str) -> Result<&[u8]> {
    if secret.is_empty() {
        return Err(hr_core::auth::config::ConfigError::MissingSecret.into());
    }
    Ok(secret.as_bytes())
}
