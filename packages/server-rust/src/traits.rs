use async_trait::async_trait;
use orders_core::{NewOrder, Order, OrderId};

/// Pluggable persistence backend for orders.
/// Implementations: `PostgreSQL` (production), memory (tests, local runs).
///
/// The store exclusively owns the canonical records; callers hold no copies
/// beyond the value returned from a single call.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// One-time initialization: ensure the `orders` table exists.
    ///
    /// Must be idempotent. Called once before the server accepts traffic.
    async fn initialize(&self) -> anyhow::Result<()>;

    /// Load every order, ascending by id.
    async fn list(&self) -> anyhow::Result<Vec<Order>>;

    /// Persist a new order with status `pending` and a store-assigned id.
    async fn insert(&self, order: NewOrder) -> anyhow::Result<Order>;

    /// Load a single order by id. `None` if no such record exists.
    async fn get(&self, id: OrderId) -> anyhow::Result<Option<Order>>;

    /// Cheap round-trip to check that the store is reachable.
    async fn ping(&self) -> anyhow::Result<()>;

    /// Release resources and close connections.
    async fn close(&self) -> anyhow::Result<()>;
}
