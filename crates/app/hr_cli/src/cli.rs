use clap::{Parser, Subcommand};
use hr_core::models::auth::PrincipalKind;

#[derive(Parser, Debug)]
#[command(name = "hr_cli", about = "Operator tools for HR suite authentication")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the CLI version
    Version,

    /// Generate a random signing secret suitable for JWT_SECRET
    GenerateSecret {
        /// Number of random bytes before encoding
        #[arg(long, default_value_t = 32)]
        bytes: usize,
    },

    /// Hash a password with bcrypt
    HashPassword {
        /// Plain-text password
        password: String,
    },

    /// Issue a signed session token
    IssueToken {
        /// Principal kind: admin or employee
        #[arg(long)]
        kind: PrincipalKind,

        /// Principal username (token subject)
        #[arg(long)]
        subject: String,

        /// Token lifetime in seconds
        #[arg(long, default_value_t = hr_core::auth::config::DEFAULT_TOKEN_LIFETIME_SECS)]
        lifetime_secs: i64,

        /// Signing secret
        #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
        secret: String,
    },

    /// Verify a session token and print its claims as JSON
    VerifyToken {
        token: String,

        /// Signing secret
        #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
        secret: String,
    },

    /// Database operations
    Db {
        /// PostgreSQL connection URL
        #[arg(long, env = "DATABASE_URL")]
        database_url: String,

        #[command(subcommand)]
        action: DbCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum DbCommands {
    /// Run pending migrations
    Migrate,

    /// Create a principal with the given password
    CreatePrincipal {
        /// Principal kind: admin or employee
        #[arg(long)]
        kind: PrincipalKind,

        #[arg(long)]
        username: String,

        #[arg(long)]
        email: String,

        /// Plain-text initial password
        #[arg(long, env = "HR_INITIAL_PASSWORD", hide_env_values = true)]
        password: String,
    },
}
