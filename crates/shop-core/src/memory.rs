//! # In-Memory Stores
//!
//! Process-local implementations of [`CredentialStore`] and [`OrderStore`].
//! Used by tests and by the server when no `DATABASE_URL` is configured.
//! Email uniqueness is checked under the write lock.

use crate::error::{ShopError, ShopResult};
use crate::order::{Order, OrderId};
use crate::store::{CredentialStore, OrderStore};
use crate::user::{Email, NewUser, Role, User, UserCredentials, UserId};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

fn poisoned<T>(_: T) -> ShopError {
    ShopError::Internal("store lock poisoned".to_string())
}

#[derive(Default)]
struct UserTable {
    by_id: HashMap<UserId, UserCredentials>,
    by_email: HashMap<Email, UserId>,
}

/// In-memory user store
#[derive(Default)]
pub struct MemoryCredentialStore {
    inner: RwLock<UserTable>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users
    pub fn len(&self) -> usize {
        self.inner.read().map(|t| t.by_id.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn find_by_email(&self, email: &Email) -> ShopResult<Option<User>> {
        Ok(self.find_credentials(email).await?.map(|c| c.user))
    }

    async fn find_credentials(&self, email: &Email) -> ShopResult<Option<UserCredentials>> {
        let table = self.inner.read().map_err(poisoned)?;
        Ok(table
            .by_email
            .get(email)
            .and_then(|id| table.by_id.get(id))
            .cloned())
    }

    async fn find_by_id(&self, id: UserId) -> ShopResult<Option<User>> {
        let table = self.inner.read().map_err(poisoned)?;
        Ok(table.by_id.get(&id).map(|c| c.user.clone()))
    }

    async fn insert(&self, user: NewUser) -> ShopResult<User> {
        let mut table = self.inner.write().map_err(poisoned)?;
        if table.by_email.contains_key(&user.email) {
            return Err(ShopError::Conflict("User already registered!".to_string()));
        }

        let credentials = user.into_credentials();
        let public = credentials.user.clone();
        table.by_email.insert(public.email.clone(), public.id);
        table.by_id.insert(public.id, credentials);
        Ok(public)
    }

    async fn list_by_role(&self, role: Role) -> ShopResult<Vec<User>> {
        let table = self.inner.read().map_err(poisoned)?;
        let mut users: Vec<User> = table
            .by_id
            .values()
            .filter(|c| c.user.role == role)
            .map(|c| c.user.clone())
            .collect();
        users.sort_by_key(|u| u.created_at);
        Ok(users)
    }
}

/// In-memory order store
#[derive(Default)]
pub struct MemoryOrderStore {
    orders: RwLock<HashMap<OrderId, Order>>,
}

impl MemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored orders
    pub fn len(&self) -> usize {
        self.orders.read().map(|o| o.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the orders placed by `user_id`
    pub fn orders_for(&self, user_id: UserId) -> Vec<Order> {
        self.orders
            .read()
            .map(|o| o.values().filter(|o| o.user_id == user_id).cloned().collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    async fn insert(&self, order: Order) -> ShopResult<Order> {
        let mut orders = self.orders.write().map_err(poisoned)?;
        orders.insert(order.id, order.clone());
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str, role: Role) -> NewUser {
        NewUser {
            first_name: "Grace".into(),
            last_name: "Hopper".into(),
            email: Email::parse(email).unwrap(),
            password_hash: "digest".into(),
            role,
        }
    }

    #[tokio::test]
    async fn test_insert_and_lookup() {
        let store = MemoryCredentialStore::new();
        let user = store.insert(new_user("grace@navy.mil", Role::Customer)).await.unwrap();

        let by_email = store
            .find_by_email(&Email::parse("GRACE@navy.mil").unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_email.id, user.id);

        let creds = store.find_credentials(&user.email).await.unwrap().unwrap();
        assert_eq!(creds.password_hash, "digest");

        assert_eq!(store.find_by_id(user.id).await.unwrap(), Some(user));
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let store = MemoryCredentialStore::new();
        store.insert(new_user("dup@example.com", Role::Customer)).await.unwrap();

        let err = store
            .insert(new_user("dup@example.com", Role::Doctor))
            .await
            .unwrap_err();
        assert!(matches!(err, ShopError::Conflict(_)));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_list_by_role() {
        let store = MemoryCredentialStore::new();
        store.insert(new_user("a@example.com", Role::Doctor)).await.unwrap();
        store.insert(new_user("b@example.com", Role::Customer)).await.unwrap();
        store.insert(new_user("c@example.com", Role::Doctor)).await.unwrap();

        let doctors = store.list_by_role(Role::Doctor).await.unwrap();
        assert_eq!(doctors.len(), 2);
        assert!(doctors.iter().all(|u| u.role == Role::Doctor));
    }
}
