//! # Auth Configuration
//!
//! Token and cookie settings. Secrets are loaded from environment
//! variables once at startup.

use chrono::Duration;
use secrecy::{ExposeSecret, SecretString};
use shop_core::{ShopError, ShopResult};
use std::env;

/// Default token lifetime when `JWT_EXPIRES` is unset
pub const DEFAULT_TOKEN_TTL: &str = "7d";

/// Default name of the auth cookie
pub const DEFAULT_COOKIE_NAME: &str = "authToken";

/// Authentication configuration
#[derive(Debug)]
pub struct AuthConfig {
    /// HMAC signing secret
    pub jwt_secret: SecretString,

    /// Token lifetime
    pub token_ttl: Duration,

    /// Name of the http-only cookie carrying the token
    pub cookie_name: String,

    /// Cookie lifetime (independent of the token lifetime)
    pub cookie_max_age: Duration,
}

impl AuthConfig {
    /// Load configuration from environment variables.
    ///
    /// Required env vars:
    /// - `JWT_SECRET_KEY`
    ///
    /// Optional:
    /// - `JWT_EXPIRES` (`30s`, `15m`, `12h`, `7d` or bare seconds)
    /// - `AUTH_COOKIE_NAME`
    pub fn from_env() -> ShopResult<Self> {
        dotenvy::dotenv().ok();

        let secret = env::var("JWT_SECRET_KEY")
            .map_err(|_| ShopError::Configuration("JWT_SECRET_KEY not set".to_string()))?;
        if secret.trim().is_empty() {
            return Err(ShopError::Configuration(
                "JWT_SECRET_KEY must not be empty".to_string(),
            ));
        }

        let ttl_raw = env::var("JWT_EXPIRES").unwrap_or_else(|_| DEFAULT_TOKEN_TTL.to_string());
        let token_ttl = parse_duration(&ttl_raw).ok_or_else(|| {
            ShopError::Configuration(format!(
                "JWT_EXPIRES is not a valid duration: {} (expected a whole number with an \
                 optional s/m/h/d/w/y unit, e.g. 7d)",
                ttl_raw
            ))
        })?;

        let cookie_name =
            env::var("AUTH_COOKIE_NAME").unwrap_or_else(|_| DEFAULT_COOKIE_NAME.to_string());

        Ok(Self {
            jwt_secret: SecretString::from(secret),
            token_ttl,
            cookie_name,
            cookie_max_age: Duration::days(7),
        })
    }

    /// Create config with explicit values (for testing)
    pub fn new(secret: impl Into<String>, token_ttl: Duration) -> Self {
        Self {
            jwt_secret: SecretString::from(secret.into()),
            token_ttl,
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
            cookie_max_age: Duration::days(7),
        }
    }

    /// Raw secret bytes for the token issuer
    pub fn secret_bytes(&self) -> &[u8] {
        self.jwt_secret.expose_secret().as_bytes()
    }
}

/// Parse `<n><unit>` where unit is s, m, h, d, w or y, optionally spelled
/// out (`7 days`, `2 weeks`). A bare number is seconds.
pub fn parse_duration(raw: &str) -> Option<Duration> {
    let raw = raw.trim();
    let split = raw
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(raw.len());
    let (digits, unit) = raw.split_at(split);

    let n: i64 = digits.parse().ok()?;
    if n <= 0 {
        return None;
    }

    let unit_secs: i64 = match unit.trim().to_ascii_lowercase().as_str() {
        "" | "s" | "sec" | "secs" | "second" | "seconds" => 1,
        "m" | "min" | "mins" | "minute" | "minutes" => 60,
        "h" | "hr" | "hrs" | "hour" | "hours" => 60 * 60,
        "d" | "day" | "days" => 24 * 60 * 60,
        "w" | "week" | "weeks" => 7 * 24 * 60 * 60,
        // 365.25 days
        "y" | "yr" | "yrs" | "year" | "years" => 31_557_600,
        _ => return None,
    };

    Duration::try_seconds(n.checked_mul(unit_secs)?)
}
