//! # hr_api
//!
//! HTTP API library for HR suite authentication.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use hr_core::auth::reset::OtpResetService;
use hr_core::auth::service::AuthService;
use hr_core::clock::Clock;
use hr_core::notify::Notifier;
use hr_core::store::{OtpStore, PrincipalStore};
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};

use crate::config::ApiConfig;
use crate::handlers::{auth, health};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// API configuration.
    pub config: ApiConfig,
    pub auth: Arc<AuthService>,
    pub reset: Arc<OtpResetService>,
    pub clock: Arc<dyn Clock>,
    /// PostgreSQL pool, used by the health check. `None` for in-memory stores.
    pub pool: Option<PgPool>,
}

impl AppState {
    /// Build both core services over the given stores.
    pub fn new(
        config: ApiConfig,
        principals: Arc<dyn PrincipalStore>,
        otps: Arc<dyn OtpStore>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let auth = AuthService::new(
            principals.clone(),
            notifier.clone(),
            clock.clone(),
            config.auth.clone(),
        );
        let reset = OtpResetService::new(
            principals,
            otps,
            notifier,
            clock.clone(),
            config.auth.clone(),
        );
        Self {
            config,
            auth: Arc::new(auth),
            reset: Arc::new(reset),
            clock,
            pool: None,
        }
    }

    pub fn with_pool(mut self, pool: PgPool) -> Self {
        self.pool = Some(pool);
        self
    }
}

/// Run embedded database migrations.
///
/// Delegates to `hr_core::migrate::migrate()` which owns the migration files.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    hr_core::migrate::migrate(pool).await
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Public routes (no auth required)
    let public = Router::new()
        .route("/health", get(health::health_handler))
        .route("/auth/{kind}/login", post(auth::login_handler))
        .route(
            "/auth/{kind}/forgot-password",
            post(auth::forgot_password_handler),
        )
        .route(
            "/auth/{kind}/reset-password",
            post(auth::reset_password_handler),
        )
        .route("/auth/logout", post(auth::logout_handler));

    // Protected routes (require auth)
    let protected = Router::new()
        .route("/auth/me", get(auth::me_handler))
        .route(
            "/auth/{kind}/change-password",
            post(auth::change_password_handler),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_auth,
        ));

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(cors)
        .with_state(state)
}
