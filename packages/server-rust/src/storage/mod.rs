//! Order persistence backends.
//!
//! [`OrderStore`](crate::traits::OrderStore) has two implementations:
//!
//! - [`PostgresOrderStore`]: the `orders` table in `PostgreSQL` (feature `postgres`)
//! - [`MemoryOrderStore`]: process-local map, used by tests and local runs
//!
//! [`connect_store`] builds the configured backend and runs its schema
//! initialization before handing it to the server.

mod memory;
#[cfg(feature = "postgres")]
mod postgres;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::info;

pub use memory::MemoryOrderStore;
#[cfg(feature = "postgres")]
pub use postgres::PostgresOrderStore;

use crate::secret_string::SecretString;
use crate::traits::OrderStore;

/// Which backend holds the orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum StoreKind {
    /// `PostgreSQL` via a connection pool.
    #[default]
    Postgres,
    /// In-process map; contents are lost on exit.
    Memory,
}

/// Connection settings for the order store.
///
/// There is no default database URL: a `Postgres` store without one fails
/// to connect.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Selected backend.
    pub kind: StoreKind,
    /// Connection string for the relational store. Carries credentials.
    pub database_url: Option<SecretString>,
    /// Upper bound on pooled connections.
    pub max_connections: u32,
    /// How long a request waits for a pooled connection before failing.
    pub acquire_timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            kind: StoreKind::Postgres,
            database_url: None,
            max_connections: 10,
            acquire_timeout: Duration::from_secs(5),
        }
    }
}

/// Builds the configured store and ensures its schema exists.
///
/// # Errors
///
/// Returns an error if the store cannot be reached, if no database URL was
/// configured for `Postgres`, or if schema creation fails. Callers treat any
/// error as fatal.
pub async fn connect_store(config: &StoreConfig) -> anyhow::Result<Arc<dyn OrderStore>> {
    let store: Arc<dyn OrderStore> = match config.kind {
        StoreKind::Memory => Arc::new(MemoryOrderStore::new()),
        StoreKind::Postgres => connect_postgres(config).await?,
    };

    store
        .initialize()
        .await
        .context("failed to initialize order schema")?;

    info!(kind = ?config.kind, "Order store ready");
    Ok(store)
}

#[cfg(feature = "postgres")]
async fn connect_postgres(config: &StoreConfig) -> anyhow::Result<Arc<dyn OrderStore>> {
    let url = config
        .database_url
        .as_ref()
        .map(SecretString::expose_secret)
        .context("DATABASE_URL must be set for the postgres store")?;
    let store = PostgresOrderStore::connect(url, config.max_connections, config.acquire_timeout)
        .await
        .context("failed to connect to PostgreSQL")?;
    Ok(Arc::new(store))
}

#[cfg(not(feature = "postgres"))]
async fn connect_postgres(_config: &StoreConfig) -> anyhow::Result<Arc<dyn OrderStore>> {
    anyhow::bail!("orders-server was built without the `postgres` feature")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_config_defaults() {
        let config = StoreConfig::default();
        assert_eq!(config.kind, StoreKind::Postgres);
        assert!(config.database_url.is_none());
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.acquire_timeout, Duration::from_secs(5));
    }

    #[test]
    fn debug_redacts_database_url() {
        let config = StoreConfig {
            database_url: Some(SecretString::from("postgres://app:hunter2@db/orders")),
            ..StoreConfig::default()
        };
        let printed = format!("{config:?}");
        assert!(!printed.contains("hunter2"));
        assert!(printed.contains("redacted"));
    }

    #[tokio::test]
    async fn connect_memory_store_initializes() {
        let config = StoreConfig {
            kind: StoreKind::Memory,
            ..StoreConfig::default()
        };
        let store = connect_store(&config).await.expect("memory store connects");
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn postgres_without_url_fails_fast() {
        let config = StoreConfig::default();
        assert!(connect_store(&config).await.is_err());
    }
}
