//! Order server with deferred startup lifecycle.
//!
//! `new()` takes an already-initialized store, `start()` binds the TCP
//! listener, and `serve()` accepts connections until the shutdown future
//! resolves. Binding before serving lets callers learn the real port when
//! port 0 is configured.

use std::future::Future;
use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tracing::{info, warn};

use super::config::{NetworkConfig, TlsConfig};
use super::handlers::{
    create_order_handler, get_order_handler, health_handler, list_orders_handler,
    liveness_handler, readiness_handler, AppState,
};
use super::middleware::apply_http_layers;
use super::shutdown::Lifecycle;
use crate::traits::OrderStore;

/// Serves the order API over one TCP listener.
pub struct OrderServer {
    config: NetworkConfig,
    listener: Option<TcpListener>,
    store: Arc<dyn OrderStore>,
    lifecycle: Arc<Lifecycle>,
}

impl OrderServer {
    /// Creates a server around `store` without binding any port.
    ///
    /// `store` must already be initialized (see
    /// [`connect_store`](crate::storage::connect_store)).
    #[must_use]
    pub fn new(config: NetworkConfig, store: Arc<dyn OrderStore>) -> Self {
        Self {
            config,
            listener: None,
            store,
            lifecycle: Arc::new(Lifecycle::new()),
        }
    }

    /// Shared handle to the serving lifecycle.
    #[must_use]
    pub fn lifecycle(&self) -> Arc<Lifecycle> {
        Arc::clone(&self.lifecycle)
    }

    /// Assembles the axum router with all routes and middleware.
    ///
    /// Routes:
    /// - `GET /health` -- fixed `{"status":"healthy"}`
    /// - `GET /health/live` -- liveness probe
    /// - `GET /health/ready` -- readiness probe (serving state + store ping)
    /// - `GET /orders` -- list all orders
    /// - `POST /orders` -- create an order
    /// - `GET /orders/{id}` -- fetch one order
    pub fn build_router(&self) -> Router {
        build_router(&self.config, &self.store, &self.lifecycle)
    }

    /// Binds the TCP listener to the configured host and port.
    ///
    /// Returns the bound port, which differs from the configured one when
    /// port 0 is used.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound (e.g., port in use).
    pub async fn start(&mut self) -> anyhow::Result<u16> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = TcpListener::bind(&addr).await?;
        let port = listener.local_addr()?.port();

        info!("TCP listener bound to {}:{}", self.config.host, port);

        self.listener = Some(listener);
        Ok(port)
    }

    /// Serves requests until `shutdown` resolves, then drains and closes
    /// the store.
    ///
    /// After the shutdown signal the lifecycle moves to `Draining`, waits up
    /// to `drain_timeout` for in-flight requests, and moves to `Stopped`.
    ///
    /// # Errors
    ///
    /// Returns an error if `start()` was not called, if TLS material cannot
    /// be loaded, or if the server hits a fatal I/O error.
    pub async fn serve(
        self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> anyhow::Result<()> {
        let router = self.build_router();
        let Self {
            config,
            listener,
            store,
            lifecycle,
        } = self;
        let listener =
            listener.ok_or_else(|| anyhow::anyhow!("start() must be called before serve()"))?;

        lifecycle.set_ready();

        let served = if let Some(ref tls) = config.tls {
            serve_tls(listener, router, tls, shutdown).await
        } else {
            serve_plain(listener, router, shutdown).await
        };

        lifecycle.begin_drain();
        if lifecycle.wait_for_drain(config.drain_timeout).await {
            info!("All in-flight requests drained");
        } else {
            warn!(
                in_flight = lifecycle.in_flight_count(),
                "Drain timeout expired with requests still in flight"
            );
        }

        if let Err(e) = store.close().await {
            warn!(error = %e, "failed to close order store");
        }

        served
    }
}

fn build_router(
    config: &NetworkConfig,
    store: &Arc<dyn OrderStore>,
    lifecycle: &Arc<Lifecycle>,
) -> Router {
    let state = AppState::new(Arc::clone(store), Arc::clone(lifecycle));

    let router = Router::new()
        .route("/health", get(health_handler))
        .route("/health/live", get(liveness_handler))
        .route("/health/ready", get(readiness_handler))
        .route("/orders", get(list_orders_handler).post(create_order_handler))
        .route("/orders/{id}", get(get_order_handler))
        .with_state(state);

    apply_http_layers(router, config, Arc::clone(lifecycle))
}

async fn serve_plain(
    listener: TcpListener,
    router: Router,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    info!("Serving plain HTTP");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

/// Serves TLS with `axum-server` and rustls on the pre-bound listener.
async fn serve_tls(
    listener: TcpListener,
    router: Router,
    tls: &TlsConfig,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    use axum_server::tls_rustls::RustlsConfig;

    let rustls_config = RustlsConfig::from_pem_file(&tls.cert_path, &tls.key_path)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to load TLS certificates: {e}"))?;

    let addr = listener.local_addr()?;
    let std_listener = listener.into_std()?;
    let handle = axum_server::Handle::new();
    let shutdown_handle = handle.clone();

    tokio::spawn(async move {
        shutdown.await;
        shutdown_handle.graceful_shutdown(None);
    });

    info!("Serving HTTPS on {}", addr);

    axum_server::from_tcp_rustls(std_listener, rustls_config)
        .handle(handle)
        .serve(router.into_make_service())
        .await?;
    Ok(())
}
