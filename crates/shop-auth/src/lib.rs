//! # shop-auth
//!
//! Authentication for the storefront backend.
//!
//! 1. **PasswordHasher** - argon2id digests, verified with the primitive's
//!    own constant-time check
//! 2. **TokenIssuer** - HS256 JWTs carrying the user id and an expiry
//! 3. **AuthService** - the combined login-or-register flow plus staff
//!    creation and token authentication
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use shop_auth::{AuthConfig, AuthService, LoginOrRegister};
//!
//! let config = AuthConfig::from_env()?;
//! let auth = AuthService::from_config(users, &config);
//!
//! let outcome = auth.login_or_register(request).await?;
//! // outcome.created tells registration from login
//! ```

pub mod config;
pub mod password;
pub mod service;
pub mod token;

// Re-exports
pub use config::AuthConfig;
pub use password::PasswordHasher;
pub use service::{AuthOutcome, AuthService, LoginOrRegister, Registration};
pub use token::{Claims, TokenIssuer};
