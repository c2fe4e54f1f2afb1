//! # Application State
//!
//! Shared state for the Axum application.
//! Services are built once at startup and injected here; nothing lives
//! in module-level globals.

use cookie::time::Duration as CookieDuration;
use shop_auth::{AuthConfig, AuthService};
use shop_core::{
    CredentialStore, MemoryCredentialStore, MemoryOrderStore, OrderService, OrderStore,
    PaymentService,
};
use shop_db::{Database, DatabaseConfig};
use shop_stripe::StripePaymentGateway;
use std::sync::Arc;
use tracing::{info, warn};

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Environment (development, staging, production)
    pub environment: String,
    /// Origins allowed to call the API with credentials
    pub allowed_origins: Vec<String>,
    /// Metadata label attached to payment intents
    pub payment_metadata_label: String,
}

impl AppConfig {
    /// Load from environment variables
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(4000),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            allowed_origins: std::env::var("FRONTEND_URLS")
                .map(|raw| parse_origins(&raw))
                .unwrap_or_default(),
            payment_metadata_label: std::env::var("PAYMENT_METADATA_LABEL")
                .unwrap_or_else(|_| shop_core::payment::DEFAULT_METADATA_LABEL.to_string()),
        }
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> Result<std::net::SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 4000,
            environment: "development".to_string(),
            allowed_origins: Vec::new(),
            payment_metadata_label: shop_core::payment::DEFAULT_METADATA_LABEL.to_string(),
        }
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|o| o.trim().trim_end_matches('/'))
        .filter(|o| !o.is_empty())
        .map(String::from)
        .collect()
}

/// Auth cookie settings
#[derive(Debug, Clone)]
pub struct CookieSettings {
    pub name: String,
    pub max_age: CookieDuration,
    /// Only send over HTTPS
    pub secure: bool,
}

impl CookieSettings {
    pub fn from_auth_config(config: &AuthConfig, secure: bool) -> Self {
        Self {
            name: config.cookie_name.clone(),
            max_age: CookieDuration::seconds(config.cookie_max_age.num_seconds()),
            secure,
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Login/registration and token authentication
    pub auth: Arc<AuthService>,
    /// Order creation
    pub orders: Arc<OrderService>,
    /// Payment intent creation
    pub payments: Arc<PaymentService>,
    /// Auth cookie settings
    pub cookie: CookieSettings,
    /// Application config
    pub config: AppConfig,
    database: Option<Database>,
}

impl AppState {
    /// Build the state from the environment.
    ///
    /// Connects to PostgreSQL when `DATABASE_URL` is set, otherwise falls
    /// back to in-memory stores.
    pub async fn new() -> anyhow::Result<Self> {
        let config = AppConfig::from_env();
        let auth_config = AuthConfig::from_env()?;

        let database = match DatabaseConfig::from_env()? {
            Some(db_config) => {
                let database = Database::connect(&db_config).await?;
                database.migrate().await?;
                Some(database)
            }
            None => {
                warn!("DATABASE_URL not set, using in-memory stores (data is lost on restart)");
                None
            }
        };

        let users: Arc<dyn CredentialStore> = match &database {
            Some(db) => Arc::new(db.credential_store()),
            None => Arc::new(MemoryCredentialStore::new()),
        };
        let orders: Arc<dyn OrderStore> = match &database {
            Some(db) => Arc::new(db.order_store()),
            None => Arc::new(MemoryOrderStore::new()),
        };

        let gateway = StripePaymentGateway::from_env()
            .map_err(|e| anyhow::anyhow!("Failed to initialize Stripe: {}", e))?;
        if gateway.config().is_live_mode() {
            info!("Stripe running in live mode");
        }

        let payments = PaymentService::new(Arc::new(gateway))
            .with_metadata_label(config.payment_metadata_label.clone());
        let cookie = CookieSettings::from_auth_config(&auth_config, config.is_production());

        let mut state = Self::from_parts(
            config,
            AuthService::from_config(users, &auth_config),
            OrderService::new(orders),
            payments,
            cookie,
        );
        state.database = database;
        Ok(state)
    }

    /// Assemble state from already-built services
    pub fn from_parts(
        config: AppConfig,
        auth: AuthService,
        orders: OrderService,
        payments: PaymentService,
        cookie: CookieSettings,
    ) -> Self {
        Self {
            auth: Arc::new(auth),
            orders: Arc::new(orders),
            payments: Arc::new(payments),
            cookie,
            config,
            database: None,
        }
    }

    /// Name of the active store backend (for logging)
    pub fn store_backend(&self) -> &'static str {
        if self.database.is_some() {
            "postgres"
        } else {
            "memory"
        }
    }

    /// Release external resources. Call once after the server stops.
    pub async fn close(&self) {
        if let Some(database) = &self.database {
            database.close().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_socket_addr() {
        let config = AppConfig {
            host: "0.0.0.0".to_string(),
            port: 3000,
            ..AppConfig::default()
        };

        let addr = config.socket_addr().unwrap();
        assert_eq!(addr.to_string(), "0.0.0.0:3000");
    }

    #[test]
    fn test_bad_host_is_error() {
        let config = AppConfig {
            host: "not a host".to_string(),
            ..AppConfig::default()
        };
        assert!(config.socket_addr().is_err());
    }

    #[test]
    fn test_parse_origins() {
        assert_eq!(
            parse_origins(" https://shop.example.com/ ,http://localhost:5173,,"),
            vec!["https://shop.example.com", "http://localhost:5173"]
        );
    }

    #[test]
    fn test_cookie_settings() {
        let auth = AuthConfig::new("secret", chrono::Duration::hours(1));
        let cookie = CookieSettings::from_auth_config(&auth, true);
        assert_eq!(cookie.name, "authToken");
        assert_eq!(cookie.max_age, CookieDuration::days(7));
        assert!(cookie.secure);
    }
}
