//! Request-level error type and its HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

/// Failure of a single request. Every variant renders as
/// `{"error": <message>}` with a matching status code.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Body could not be read as the expected shape. 400.
    #[error("{0}")]
    BadRequest(String),
    /// No order under the requested id, or the id is not an integer. 404.
    #[error("Order not found")]
    NotFound,
    /// The store failed or was unreachable. 500.
    #[error("order store failure: {0:#}")]
    Store(#[from] anyhow::Error),
}

impl ApiError {
    /// Status code this error is reported with.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Self::Store(err) => {
                error!(error = %format!("{err:#}"), "order store failure");
                metrics::counter!("orders_store_errors_total").increment(1);
                "Internal server error".to_string()
            }
            Self::NotFound => {
                metrics::counter!("orders_not_found_total").increment(1);
                self.to_string()
            }
            Self::BadRequest(_) => self.to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
