//! Order endpoints: list, create, and fetch by id.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use orders_core::{NewOrder, Order, OrderId};
use tracing::{debug, info};

use super::{ApiError, AppState};

/// `GET /orders` -- every order, ascending by id.
///
/// # Errors
///
/// [`ApiError::Store`] if the store cannot be read. An outage is never
/// reported as an empty list.
pub async fn list_orders_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<Order>>, ApiError> {
    let orders = state.store.list().await?;
    debug!(count = orders.len(), "listed orders");
    Ok(Json(orders))
}

/// `POST /orders` -- persist a new order and return it with `201 Created`.
///
/// The returned record carries the store-assigned id and status `pending`,
/// whatever the client put in those fields. The body is parsed as JSON
/// regardless of its `Content-Type`.
///
/// # Errors
///
/// [`ApiError::BadRequest`] if the body does not deserialize into
/// [`NewOrder`]; nothing is written in that case. [`ApiError::Store`] if
/// the insert fails.
pub async fn create_order_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    let new_order: NewOrder =
        serde_json::from_slice(&body).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let order = state.store.insert(new_order).await?;

    metrics::counter!("orders_created_total").increment(1);
    info!(
        order_id = %order.id,
        user_id = order.user_id,
        product_id = order.product_id,
        quantity = order.quantity,
        "order created"
    );

    Ok((StatusCode::CREATED, Json(order)))
}

/// `GET /orders/{id}` -- a single order.
///
/// # Errors
///
/// [`ApiError::NotFound`] when the id is not an integer or no such order
/// exists. [`ApiError::Store`] if the lookup itself fails.
pub async fn get_order_handler(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<Order>, ApiError> {
    let id: OrderId = raw_id.parse().map_err(|_| ApiError::NotFound)?;
    state
        .store
        .get(id)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound)
}
