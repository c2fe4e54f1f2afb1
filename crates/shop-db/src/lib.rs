//! # shop-db
//!
//! PostgreSQL backend for the credential and order stores.
//!
//! ## Tables
//!
//! - `users` - credential store, unique index on `email`
//! - `orders` - order store, items kept as JSONB
//!
//! Migrations live in `crates/shop-db/migrations/` and are applied by
//! [`Database::migrate`] at startup.

pub mod orders;
pub mod users;

pub use orders::PgOrderStore;
pub use users::PgCredentialStore;

use secrecy::{ExposeSecret, SecretString};
use shop_core::{ShopError, ShopResult};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::env;
use std::time::Duration;
use tracing::info;

/// Database connection settings
#[derive(Debug)]
pub struct DatabaseConfig {
    /// PostgreSQL connection string
    pub url: SecretString,
    pub max_connections: u32,
}

impl DatabaseConfig {
    /// Load from environment variables.
    ///
    /// Returns `Ok(None)` when `DATABASE_URL` is unset.
    pub fn from_env() -> ShopResult<Option<Self>> {
        dotenvy::dotenv().ok();

        let Ok(url) = env::var("DATABASE_URL") else {
            return Ok(None);
        };

        let max_connections = match env::var("DATABASE_MAX_CONNECTIONS") {
            Ok(raw) => raw.parse().map_err(|_| {
                ShopError::Configuration(format!(
                    "DATABASE_MAX_CONNECTIONS is not a number: {}",
                    raw
                ))
            })?,
            Err(_) => 10,
        };

        Ok(Some(Self {
            url: SecretString::from(url),
            max_connections,
        }))
    }
}

/// Shared connection pool. Opened once at boot, closed at shutdown.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Open the pool.
    pub async fn connect(config: &DatabaseConfig) -> ShopResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(10))
            .connect(config.url.expose_secret())
            .await
            .map_err(|e| ShopError::Storage(format!("Failed to connect to database: {}", e)))?;

        info!("Connected to PostgreSQL (max_connections={})", config.max_connections);
        Ok(Self { pool })
    }

    /// Apply pending migrations.
    pub async fn migrate(&self) -> ShopResult<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| ShopError::Storage(format!("Migration failed: {}", e)))?;
        info!("Database migrations applied");
        Ok(())
    }

    pub fn credential_store(&self) -> PgCredentialStore {
        PgCredentialStore::new(self.pool.clone())
    }

    pub fn order_store(&self) -> PgOrderStore {
        PgOrderStore::new(self.pool.clone())
    }

    /// Close the pool, waiting for checked-out connections to return.
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Database pool closed");
    }
}

/// Map a sqlx error, turning unique violations into conflicts.
pub(crate) fn map_sqlx_error(e: sqlx::Error, conflict_message: &str) -> ShopError {
    if let sqlx::Error::Database(ref db_err) = e {
        if db_err.is_unique_violation() {
            return ShopError::Conflict(conflict_message.to_string());
        }
    }
    ShopError::Storage(e.to_string())
}

/// Pool for tests that need PostgreSQL. `None` (test skipped) when
/// `DATABASE_URL` is unset.
#[cfg(test)]
pub(crate) async fn test_database() -> Option<Database> {
    let Ok(url) = env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping PostgreSQL test");
        return None;
    };

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&url)
        .await
        .expect("connect to DATABASE_URL");
    let database = Database { pool };
    database.migrate().await.expect("apply migrations");
    Some(database)
}
