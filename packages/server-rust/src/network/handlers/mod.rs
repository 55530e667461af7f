//! HTTP handler definitions for the order service.
//!
//! This module defines `AppState` (the shared state carried through axum
//! extractors) and re-exports the handler functions used by the router.

pub mod error;
pub mod health;
pub mod orders;

pub use error::ApiError;
pub use health::{health_handler, liveness_handler, readiness_handler};
pub use orders::{create_order_handler, get_order_handler, list_orders_handler};

use std::sync::Arc;

use super::Lifecycle;
use crate::traits::OrderStore;

/// Shared application state passed to all axum handlers via `State` extraction.
///
/// The store handle is injected here rather than held globally, so tests
/// substitute [`MemoryOrderStore`](crate::storage::MemoryOrderStore) or a
/// failing fake.
#[derive(Clone)]
pub struct AppState {
    /// Canonical owner of all order records.
    pub store: Arc<dyn OrderStore>,
    /// Serving state and in-flight tracking.
    pub lifecycle: Arc<Lifecycle>,
}

impl AppState {
    #[must_use]
    pub fn new(store: Arc<dyn OrderStore>, lifecycle: Arc<Lifecycle>) -> Self {
        Self { store, lifecycle }
    }
}
