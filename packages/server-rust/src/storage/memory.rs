//! In-process [`OrderStore`] implementation.
//!
//! [`MemoryOrderStore`] keeps orders in a [`BTreeMap`] keyed by id, so
//! listing returns ascending id order exactly like the `PostgreSQL` store.
//! Nothing survives a restart.

use std::collections::BTreeMap;

use async_trait::async_trait;
use orders_core::{NewOrder, Order, OrderId};
use parking_lot::RwLock;

use crate::traits::OrderStore;

/// Order store held entirely in memory.
///
/// Ids start at 1 and increase by one per insert. Id allocation and the
/// insert happen under the same write lock, so concurrent creates never
/// observe or assign the same id.
#[derive(Debug, Default)]
pub struct MemoryOrderStore {
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    orders: BTreeMap<OrderId, Order>,
    last_id: i64,
}

impl MemoryOrderStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored orders.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().orders.len()
    }

    /// Returns `true` if no order has been stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.read().orders.is_empty()
    }
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    async fn initialize(&self) -> anyhow::Result<()> {
        Ok(())
    }

    async fn list(&self) -> anyhow::Result<Vec<Order>> {
        Ok(self.inner.read().orders.values().cloned().collect())
    }

    async fn insert(&self, order: NewOrder) -> anyhow::Result<Order> {
        let mut inner = self.inner.write();
        inner.last_id += 1;
        let order = order.into_order(OrderId(inner.last_id));
        inner.orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn get(&self, id: OrderId) -> anyhow::Result<Option<Order>> {
        Ok(self.inner.read().orders.get(&id).cloned())
    }

    async fn ping(&self) -> anyhow::Result<()> {
        Ok(())
    }

    async fn close(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orders_core::OrderStatus;
    use std::collections::HashSet;
    use std::sync::Arc;

    fn new_order(user_id: u32, product_id: u32, quantity: i64) -> NewOrder {
        NewOrder {
            user_id,
            product_id,
            quantity,
        }
    }

    #[tokio::test]
    async fn insert_assigns_sequential_ids_from_one() {
        let store = MemoryOrderStore::new();
        let first = store.insert(new_order(1, 42, 3)).await.unwrap();
        let second = store.insert(new_order(2, 7, 1)).await.unwrap();

        assert_eq!(first.id, OrderId(1));
        assert_eq!(second.id, OrderId(2));
        assert_eq!(first.status, OrderStatus::Pending);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn get_returns_inserted_order() {
        let store = MemoryOrderStore::new();
        let created = store.insert(new_order(1, 42, 3)).await.unwrap();

        let loaded = store.get(created.id).await.unwrap();
        assert_eq!(loaded, Some(created));
    }

    #[tokio::test]
    async fn get_missing_returns_none() {
        let store = MemoryOrderStore::new();
        assert_eq!(store.get(OrderId(999)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn list_is_ascending_and_repeatable() {
        let store = MemoryOrderStore::new();
        for i in 0..5 {
            store.insert(new_order(i, i * 10, 1)).await.unwrap();
        }

        let first = store.list().await.unwrap();
        let second = store.list().await.unwrap();
        assert_eq!(first, second);

        let ids: Vec<i64> = first.iter().map(|o| o.id.0).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn initialize_is_idempotent() {
        let store = MemoryOrderStore::new();
        store.insert(new_order(1, 1, 1)).await.unwrap();
        store.initialize().await.unwrap();
        store.initialize().await.unwrap();
        assert_eq!(store.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_inserts_get_unique_ids() {
        let store = Arc::new(MemoryOrderStore::new());
        let mut tasks = Vec::new();
        for i in 0..64 {
            let store = Arc::clone(&store);
            tasks.push(tokio::spawn(async move {
                store.insert(new_order(i, i, 1)).await.unwrap().id
            }));
        }

        let mut ids = HashSet::new();
        for task in tasks {
            assert!(ids.insert(task.await.unwrap()));
        }
        assert_eq!(ids.len(), 64);
        assert_eq!(store.len(), 64);
    }
}
