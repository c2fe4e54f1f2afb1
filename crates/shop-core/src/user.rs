//! # User Types
//!
//! User records owned by the credential store.
//!
//! A user is read through two projections: [`User`] is the public view
//! that handlers serialize, [`UserCredentials`] additionally carries the
//! password digest and is only produced by explicit credential lookups.

use crate::error::{ShopError, ShopResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Minimum length of a clear-text password at registration.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Unique user identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    /// Generate a fresh random id
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for UserId {
    type Err = ShopError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| ShopError::validation(format!("Invalid user id: {}", s)))
    }
}

/// A case-normalized email address
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Trim, lower-case and sanity-check an address.
    pub fn parse(raw: &str) -> ShopResult<Self> {
        let normalized = raw.trim().to_lowercase();

        let valid = match normalized.split_once('@') {
            Some((local, domain)) => {
                !local.is_empty()
                    && !domain.contains('@')
                    && domain.contains('.')
                    && !domain.starts_with('.')
                    && !domain.ends_with('.')
                    && !normalized.chars().any(char::is_whitespace)
            }
            None => false,
        };

        if !valid {
            return Err(ShopError::validation("Provide a valid email!"));
        }

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Email {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// User role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Self-registered shopper
    Customer,
    /// Back-office administrator
    Admin,
    /// Staff record created by an admin
    Doctor,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "Customer",
            Role::Admin => "Admin",
            Role::Doctor => "Doctor",
        }
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::Customer
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = ShopError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Customer" => Ok(Role::Customer),
            "Admin" => Ok(Role::Admin),
            "Doctor" => Ok(Role::Doctor),
            other => Err(ShopError::validation(format!("Unknown role: {}", other))),
        }
    }
}

/// Public view of a user (no password digest)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn has_role(&self, role: Role) -> bool {
        self.role == role
    }
}

/// Internal view of a user, including the stored password digest
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: User,
    pub password_hash: String,
}

/// A user about to be inserted. The password has already been hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub password_hash: String,
    pub role: Role,
}

impl NewUser {
    /// Materialize the stored record with a fresh id and timestamp.
    pub fn into_credentials(self) -> UserCredentials {
        UserCredentials {
            user: User {
                id: UserId::new(),
                first_name: self.first_name,
                last_name: self.last_name,
                email: self.email,
                role: self.role,
                created_at: Utc::now(),
            },
            password_hash: self.password_hash,
        }
    }
}

/// Trim a required name field, rejecting blanks.
pub fn required_name(field: &str, value: Option<&str>) -> ShopResult<String> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(ShopError::validation(format!("{} is required!", field))),
    }
}

/// Enforce the registration password policy.
pub fn validate_password(password: &str) -> ShopResult<()> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ShopError::validation(format!(
            "Password must be at least {} characters!",
            MIN_PASSWORD_LENGTH
        )));
    }
    Ok(())
}
