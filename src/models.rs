//! Shared application state.
//!
//! Holds the SQLx Postgres connection pool and the auth configuration. The
//! pool is injected into handlers through `web::Data<AppState>` with an
//! explicit startup lifecycle; nothing here is process-global.

use std::{env, sync::Arc};

use crate::db;

/// Fallback secret for local development only.
const DEV_JWT_SECRET: &str = "change-this-secret-in-production";

/// Shared application state for all handlers.
#[derive(Clone)]
pub struct AppState {
    /// SQLx Postgres connection pool
    pub db: Arc<sqlx::PgPool>,
    /// HMAC secret for signing and verifying admin tokens
    pub jwt_secret: String,
    /// The single valid admin username
    pub admin_username: String,
    /// The single valid admin password
    pub admin_password: String,
}

impl AppState {
    /// Connects the database pool and reads the auth configuration from the
    /// environment.
    ///
    /// # Environment Variables
    /// - `DATABASE_URL`: Postgres connection string (required)
    /// - `JWT_SECRET`: token signing secret (falls back to a dev default)
    /// - `ADMIN_USERNAME` / `ADMIN_PASSWORD`: the fixed credential pair
    pub async fn new() -> anyhow::Result<Self> {
        let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| DEV_JWT_SECRET.to_string());
        let admin_username = env::var("ADMIN_USERNAME").unwrap_or_else(|_| "admin".to_string());
        let admin_password = env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "admin123".to_string());
        let db = db::connect_pg_pool().await;
        db::run_migrations(&db).await?;

        Ok(Self {
            db: Arc::new(db),
            jwt_secret,
            admin_username,
            admin_password,
        })
    }
}
