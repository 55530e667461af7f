//! HTTP middleware stack for the order service.
//!
//! Layers are listed outermost first: the first one sees the request first
//! and the response last.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::HeaderName;
use axum::http::{Method, StatusCode};
use axum::middleware::{from_fn_with_state, Next};
use axum::response::Response;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use super::config::NetworkConfig;
use super::shutdown::Lifecycle;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Wraps `router` in the transport middleware.
///
/// **Ordering (outermost to innermost):**
/// 1. `SetRequestId` -- UUID v4 `x-request-id` unless the client sent one
/// 2. `Trace` -- one INFO span per request, response status and latency
/// 3. `Compression` -- gzip when the client accepts it
/// 4. `CORS` -- configured origins, GET/POST only
/// 5. `Timeout` -- 408 once `request_timeout` elapses
/// 6. `PropagateRequestId` -- echoes `x-request-id` on the response
/// 7. in-flight tracking -- holds a [`Lifecycle`] guard for the handler's duration
pub fn apply_http_layers(
    router: Router,
    config: &NetworkConfig,
    lifecycle: Arc<Lifecycle>,
) -> Router {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    let layers = ServiceBuilder::new()
        .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(CompressionLayer::new())
        .layer(build_cors_layer(&config.cors_origins))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            config.request_timeout,
        ))
        .layer(PropagateRequestIdLayer::new(request_id))
        .layer(from_fn_with_state(lifecycle, track_in_flight));

    router.layer(layers)
}

/// Holds an in-flight guard while the inner service runs.
async fn track_in_flight(
    State(lifecycle): State<Arc<Lifecycle>>,
    request: Request,
    next: Next,
) -> Response {
    let _guard = lifecycle.in_flight_guard();
    next.run(request).await
}

/// `"*"` anywhere in the list allows every origin; otherwise each entry is
/// parsed as an origin and unparseable entries are skipped.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(origins.iter().filter_map(|o| o.parse().ok()))
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any)
}
