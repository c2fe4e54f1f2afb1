//! # Store Traits
//!
//! Persistence seams for users and orders. The HTTP layer only ever sees
//! `Arc<dyn CredentialStore>` / `Arc<dyn OrderStore>`, so the PostgreSQL
//! backend and the in-memory one are interchangeable at startup.

use crate::error::ShopResult;
use crate::order::Order;
use crate::user::{Email, NewUser, Role, User, UserCredentials, UserId};
use async_trait::async_trait;

/// Persistence layer for user records.
///
/// Implementations must enforce email uniqueness and report a duplicate
/// as [`ShopError::Conflict`](crate::ShopError::Conflict).
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Look up the public projection of a user by email.
    async fn find_by_email(&self, email: &Email) -> ShopResult<Option<User>>;

    /// Look up a user together with the password digest.
    async fn find_credentials(&self, email: &Email) -> ShopResult<Option<UserCredentials>>;

    /// Look up a user by id.
    async fn find_by_id(&self, id: UserId) -> ShopResult<Option<User>>;

    /// Insert a new user, returning the public projection.
    async fn insert(&self, user: NewUser) -> ShopResult<User>;

    /// All users holding `role`, oldest first.
    async fn list_by_role(&self, role: Role) -> ShopResult<Vec<User>>;
}

/// Persistence layer for orders.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persist a fully-built order.
    async fn insert(&self, order: Order) -> ShopResult<Order>;
}
