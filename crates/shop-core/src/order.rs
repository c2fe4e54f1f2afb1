//! # Order Types
//!
//! Orders, their line items, the status state machine and the order
//! creation flow.
//!
//! Amounts are integers in the smallest currency unit (cents for USD).
//! Orders reference their owner by [`UserId`] only.

use crate::error::{ShopError, ShopResult};
use crate::store::OrderStore;
use crate::user::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

const MISSING_ORDER_DETAILS: &str = "Please provide order details and payment info";

/// Unique order identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(Uuid);

impl OrderId {
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

impl Default for OrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A line item in an order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    /// Product name as shown to the customer
    pub name: String,

    /// Quantity
    pub quantity: u32,

    /// Unit price in smallest currency unit
    #[serde(rename = "price", alias = "unitPrice")]
    pub unit_price: i64,
}

impl OrderItem {
    /// Line total (unit price times quantity), saturating at `i64::MAX`
    pub fn total(&self) -> i64 {
        self.unit_price.saturating_mul(i64::from(self.quantity))
    }

    fn validate(&self, index: usize) -> ShopResult<()> {
        if self.name.trim().is_empty() {
            return Err(ShopError::validation(format!(
                "Item {} is missing a name",
                index + 1
            )));
        }
        if self.quantity == 0 {
            return Err(ShopError::validation(format!(
                "Item {} must have a quantity of at least 1",
                index + 1
            )));
        }
        if self.unit_price < 0 {
            return Err(ShopError::validation(format!(
                "Item {} has a negative price",
                index + 1
            )));
        }
        Ok(())
    }
}

/// Order lifecycle. Forward-only: Pending → Paid → Shipped → Delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Paid,
    Shipped,
    Delivered,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Paid => "Paid",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::Delivered => "Delivered",
        }
    }

    /// The next status, or `None` once delivered
    pub fn next(&self) -> Option<OrderStatus> {
        match self {
            OrderStatus::Pending => Some(OrderStatus::Paid),
            OrderStatus::Paid => Some(OrderStatus::Shipped),
            OrderStatus::Shipped => Some(OrderStatus::Delivered),
            OrderStatus::Delivered => None,
        }
    }

    /// True if `to` is exactly one step ahead
    pub fn can_transition_to(&self, to: OrderStatus) -> bool {
        self.next() == Some(to)
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Pending
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = ShopError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(OrderStatus::Pending),
            "Paid" => Ok(OrderStatus::Paid),
            "Shipped" => Ok(OrderStatus::Shipped),
            "Delivered" => Ok(OrderStatus::Delivered),
            other => Err(ShopError::validation(format!("Unknown order status: {}", other))),
        }
    }
}

/// A persisted order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,

    /// Owning user
    #[serde(rename = "user")]
    pub user_id: UserId,

    pub items: Vec<OrderItem>,

    /// Client-supplied total, not reconciled against `items`
    pub total_amount: i64,

    pub status: OrderStatus,

    /// Payment processor reference (Stripe payment intent id)
    pub payment_intent_id: String,

    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Sum of the line totals, for callers that want to compare against `total_amount`
    pub fn items_total(&self) -> i64 {
        self.items
            .iter()
            .map(OrderItem::total)
            .fold(0i64, i64::saturating_add)
    }

    /// Move the order one step forward.
    pub fn advance_to(&mut self, to: OrderStatus) -> ShopResult<()> {
        if !self.status.can_transition_to(to) {
            return Err(ShopError::validation(format!(
                "Cannot move order from {} to {}",
                self.status, to
            )));
        }
        self.status = to;
        Ok(())
    }
}

/// Order creation payload as received from the client.
///
/// Every field is optional at the type level so that a missing field is
/// reported through [`ShopError::Validation`] rather than a parse failure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderRequest {
    #[serde(default)]
    pub items: Option<Vec<OrderItem>>,
    #[serde(default)]
    pub total_amount: Option<i64>,
    #[serde(default)]
    pub payment_intent_id: Option<String>,
}

/// Order creation flow.
///
/// Orders are recorded as `Paid` on the client's word: the payment intent
/// is not looked up at the processor and `total_amount` is not compared
/// with the items or with the captured amount.
pub struct OrderService {
    orders: Arc<dyn OrderStore>,
}

impl OrderService {
    pub fn new(orders: Arc<dyn OrderStore>) -> Self {
        Self { orders }
    }

    /// Validate and persist an order for `user_id`.
    #[instrument(skip(self, request), fields(user_id = %user_id))]
    pub async fn create_order(
        &self,
        user_id: UserId,
        request: NewOrderRequest,
    ) -> ShopResult<Order> {
        let items = match request.items {
            Some(items) if !items.is_empty() => items,
            _ => return Err(ShopError::validation(MISSING_ORDER_DETAILS)),
        };
        let total_amount = match request.total_amount {
            Some(total) if total != 0 => total,
            _ => return Err(ShopError::validation(MISSING_ORDER_DETAILS)),
        };
        let payment_intent_id = match request.payment_intent_id {
            Some(id) if !id.trim().is_empty() => id.trim().to_string(),
            _ => return Err(ShopError::validation(MISSING_ORDER_DETAILS)),
        };

        if total_amount < 0 {
            return Err(ShopError::validation("Total amount must be positive"));
        }
        for (i, item) in items.iter().enumerate() {
            item.validate(i)?;
        }

        let order = Order {
            id: OrderId::new(),
            user_id,
            items,
            total_amount,
            status: OrderStatus::Paid,
            payment_intent_id,
            created_at: Utc::now(),
        };

        let order = self.orders.insert(order).await?;

        info!(
            "Order placed: id={}, items={}, total={}, items_total={}, payment_intent={}",
            order.id,
            order.items.len(),
            order.total_amount,
            order.items_total(),
            order.payment_intent_id
        );

        Ok(order)
    }
}
