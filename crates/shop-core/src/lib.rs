//! # shop-core
//!
//! Core types and traits for the storefront backend.
//!
//! This crate provides:
//! - `User`, `UserCredentials` and `Role` for the credential store
//! - `Order`, `OrderItem` and `OrderStatus` plus the `OrderService` flow
//! - `PaymentGateway` trait and the validating `PaymentService`
//! - `CredentialStore` / `OrderStore` traits with in-memory implementations
//! - `ShopError` for typed error handling
//!
//! ## Example
//!
//! ```rust,ignore
//! use shop_core::{MemoryOrderStore, OrderService, NewOrderRequest};
//!
//! let orders = OrderService::new(Arc::new(MemoryOrderStore::new()));
//! let order = orders.create_order(user.id, request).await?;
//! assert_eq!(order.status, OrderStatus::Paid);
//! ```

pub mod error;
pub mod memory;
pub mod order;
pub mod payment;
pub mod store;
pub mod user;

// Re-exports for convenience
pub use error::{ShopError, ShopResult};
pub use memory::{MemoryCredentialStore, MemoryOrderStore};
pub use order::{NewOrderRequest, Order, OrderId, OrderItem, OrderService, OrderStatus};
pub use payment::{
    BoxedPaymentGateway, Currency, PaymentGateway, PaymentIntent, PaymentIntentRequest,
    PaymentService,
};
pub use store::{CredentialStore, OrderStore};
pub use user::{Email, NewUser, Role, User, UserCredentials, UserId};
