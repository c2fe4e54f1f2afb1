//! PostgreSQL order store.

use async_trait::async_trait;
use shop_core::{Order, OrderStore, ShopError, ShopResult};
use sqlx::types::Json;
use sqlx::PgPool;

/// Order store backed by the `orders` table
#[derive(Clone)]
pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn insert(&self, order: Order) -> ShopResult<Order> {
        sqlx::query(
            r#"
            INSERT INTO orders (id, user_id, items, total_amount, status, payment_intent_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.user_id.as_uuid())
        .bind(Json(&order.items))
        .bind(order.total_amount)
        .bind(order.status.as_str())
        .bind(&order.payment_intent_id)
        .bind(order.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| ShopError::Storage(format!("Failed to insert order: {}", e)))?;

        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shop_core::{
        CredentialStore, Email, NewOrderRequest, NewUser, OrderItem, OrderService, OrderStatus,
        Role,
    };
    use std::sync::Arc;

    #[tokio::test]
    async fn test_insert_order() {
        let Some(db) = crate::test_database().await else {
            return;
        };
        let email = Email::parse(&format!("pg-{}@example.com", uuid::Uuid::new_v4().simple()))
            .unwrap();
        let user = db
            .credential_store()
            .insert(NewUser {
                first_name: "Ada".into(),
                last_name: "Lovelace".into(),
                email,
                password_hash: "digest".into(),
                role: Role::Customer,
            })
            .await
            .unwrap();

        let orders = OrderService::new(Arc::new(db.order_store()));
        let order = orders
            .create_order(
                user.id,
                NewOrderRequest {
                    items: Some(vec![OrderItem {
                        name: "Widget".into(),
                        quantity: 2,
                        unit_price: 1000,
                    }]),
                    total_amount: Some(2000),
                    payment_intent_id: Some("pi_pg_test".into()),
                },
            )
            .await
            .unwrap();
        assert_eq!(order.status, OrderStatus::Paid);

        let (status, items): (String, Json<Vec<OrderItem>>) =
            sqlx::query_as("SELECT status, items FROM orders WHERE id = $1")
                .bind(order.id.as_uuid())
                .fetch_one(&db.pool)
                .await
                .unwrap();
        assert_eq!(status, "Paid");
        assert_eq!(items.0, order.items);
    }
}
