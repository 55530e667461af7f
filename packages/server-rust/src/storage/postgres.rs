//! `PostgreSQL` [`OrderStore`] backed by a `sqlx` connection pool.
//!
//! All orders live in the single `orders` table. Queries are checked at
//! runtime (no compile-time database connection is needed to build).

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use orders_core::{NewOrder, Order, OrderId, ParseStatusError};
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::debug;

use crate::traits::OrderStore;

const CREATE_ORDERS_TABLE: &str = "\
CREATE TABLE IF NOT EXISTS orders (
    id BIGSERIAL PRIMARY KEY,
    user_id BIGINT NOT NULL,
    product_id BIGINT NOT NULL,
    quantity BIGINT NOT NULL,
    status TEXT NOT NULL
)";

const SELECT_ALL: &str =
    "SELECT id, user_id, product_id, quantity, status FROM orders ORDER BY id";

const SELECT_BY_ID: &str =
    "SELECT id, user_id, product_id, quantity, status FROM orders WHERE id = $1";

const INSERT: &str = "\
INSERT INTO orders (user_id, product_id, quantity, status)
VALUES ($1, $2, $3, $4)
RETURNING id, user_id, product_id, quantity, status";

/// Raw `orders` row. The `status` column is free text in the table and is
/// parsed into [`OrderStatus`](orders_core::OrderStatus) on the way out.
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i64,
    user_id: i64,
    product_id: i64,
    quantity: i64,
    status: String,
}

/// A stored row that does not fit the [`Order`] shape.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
enum RowError {
    #[error(transparent)]
    Status(#[from] ParseStatusError),
    #[error("column {column} holds out-of-range reference {value}")]
    Reference { column: &'static str, value: i64 },
}

fn reference(column: &'static str, value: i64) -> Result<u32, RowError> {
    u32::try_from(value).map_err(|_| RowError::Reference { column, value })
}

impl TryFrom<OrderRow> for Order {
    type Error = RowError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        Ok(Order {
            id: OrderId(row.id),
            user_id: reference("user_id", row.user_id)?,
            product_id: reference("product_id", row.product_id)?,
            quantity: row.quantity,
            status: row.status.parse()?,
        })
    }
}

/// Order store on a pooled `PostgreSQL` connection.
#[derive(Debug, Clone)]
pub struct PostgresOrderStore {
    pool: PgPool,
}

impl PostgresOrderStore {
    /// Opens a connection pool and verifies that one connection succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the server is unreachable
    /// within `acquire_timeout`.
    pub async fn connect(
        url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect(url)
            .await?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl OrderStore for PostgresOrderStore {
    async fn initialize(&self) -> anyhow::Result<()> {
        sqlx::query(CREATE_ORDERS_TABLE)
            .execute(&self.pool)
            .await
            .context("failed to create orders table")?;
        debug!("orders table present");
        Ok(())
    }

    async fn list(&self) -> anyhow::Result<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>(SELECT_ALL)
            .fetch_all(&self.pool)
            .await
            .context("failed to list orders")?;
        let orders = rows
            .into_iter()
            .map(Order::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(orders)
    }

    async fn insert(&self, order: NewOrder) -> anyhow::Result<Order> {
        let pending = order.into_order(OrderId(0));
        let row = sqlx::query_as::<_, OrderRow>(INSERT)
            .bind(i64::from(pending.user_id))
            .bind(i64::from(pending.product_id))
            .bind(pending.quantity)
            .bind(pending.status.as_str())
            .fetch_one(&self.pool)
            .await
            .context("failed to insert order")?;
        Ok(Order::try_from(row)?)
    }

    async fn get(&self, id: OrderId) -> anyhow::Result<Option<Order>> {
        let row = sqlx::query_as::<_, OrderRow>(SELECT_BY_ID)
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("failed to load order {id}"))?;
        Ok(row.map(Order::try_from).transpose()?)
    }

    async fn ping(&self) -> anyhow::Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn close(&self) -> anyhow::Result<()> {
        self.pool.close().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orders_core::OrderStatus;

    fn row(status: &str) -> OrderRow {
        OrderRow {
            id: 9,
            user_id: 1,
            product_id: 42,
            quantity: 3,
            status: status.to_string(),
        }
    }

    #[test]
    fn row_converts_to_order() {
        let order = Order::try_from(row("pending")).unwrap();
        assert_eq!(order.id, OrderId(9));
        assert_eq!(order.product_id, 42);
        assert_eq!(order.status, OrderStatus::Pending);
    }

    #[test]
    fn row_with_unknown_status_is_rejected() {
        let err = Order::try_from(row("teleported")).unwrap_err();
        assert_eq!(
            err,
            RowError::Status(ParseStatusError("teleported".to_string()))
        );
    }

    #[test]
    fn row_with_negative_reference_is_rejected() {
        let negative = OrderRow {
            user_id: -5,
            ..row("pending")
        };
        let err = Order::try_from(negative).unwrap_err();
        assert_eq!(
            err,
            RowError::Reference {
                column: "user_id",
                value: -5
            }
        );
    }

    async fn test_store() -> PostgresOrderStore {
        let url = std::env::var("TEST_DATABASE_URL")
            .expect("TEST_DATABASE_URL must point at a disposable database");
        let store = PostgresOrderStore::connect(&url, 2, Duration::from_secs(5))
            .await
            .expect("connect");
        store.initialize().await.expect("initialize");
        store
    }

    #[tokio::test]
    #[ignore = "requires TEST_DATABASE_URL"]
    async fn insert_then_get_round_trips_through_table() {
        let store = test_store().await;
        store.initialize().await.expect("second initialize is a no-op");

        let created = store
            .insert(NewOrder {
                user_id: 1,
                product_id: 42,
                quantity: 3,
            })
            .await
            .unwrap();
        assert_eq!(created.status, OrderStatus::Pending);

        let loaded = store.get(created.id).await.unwrap();
        assert_eq!(loaded, Some(created.clone()));

        let all = store.list().await.unwrap();
        assert!(all.contains(&created));
        assert!(all.windows(2).all(|w| w[0].id < w[1].id));
    }

    #[tokio::test]
    #[ignore = "requires TEST_DATABASE_URL"]
    async fn get_missing_id_returns_none() {
        let store = test_store().await;
        assert_eq!(store.get(OrderId(i64::MAX)).await.unwrap(), None);
        store.ping().await.unwrap();
        store.close().await.unwrap();
    }
}
