//! Order service -- HTTP API for creating and reading orders backed by `PostgreSQL`.

pub mod network;
pub mod secret_string;
pub mod storage;
pub mod telemetry;
pub mod traits;

pub use network::{NetworkConfig, OrderServer};
pub use secret_string::SecretString;
pub use storage::{connect_store, MemoryOrderStore, StoreConfig, StoreKind};
pub use traits::OrderStore;
