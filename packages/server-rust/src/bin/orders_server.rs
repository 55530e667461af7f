//! `orders-server` -- runs the order API against the configured store.

use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use orders_server::network::{TlsConfig, DEFAULT_PORT};
use orders_server::telemetry::{init_logging, install_metrics_exporter, LogFormat};
use orders_server::{
    connect_store, NetworkConfig, OrderServer, SecretString, StoreConfig, StoreKind,
};
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "orders-server", version, about = "Order management HTTP service")]
struct Cli {
    /// Backing store for orders.
    #[arg(long, env = "ORDER_STORE", value_enum, default_value_t = StoreKind::Postgres)]
    store: StoreKind,

    /// `PostgreSQL` connection string. Required for the postgres store.
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: Option<String>,

    /// Maximum pooled database connections.
    #[arg(long, env = "DATABASE_MAX_CONNECTIONS", default_value_t = 10)]
    db_max_connections: u32,

    /// Seconds to wait for a pooled connection.
    #[arg(long, env = "DATABASE_ACQUIRE_TIMEOUT_SECS", default_value_t = 5)]
    db_acquire_timeout_secs: u64,

    /// Address to bind.
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to bind.
    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Per-request timeout in seconds.
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value_t = 30)]
    request_timeout_secs: u64,

    /// Allowed CORS origins, comma separated. `*` allows any.
    #[arg(long, env = "CORS_ORIGINS", value_delimiter = ',', default_value = "*")]
    cors_origins: Vec<String>,

    /// PEM certificate chain; enables HTTPS together with `--tls-key`.
    #[arg(long, env = "TLS_CERT_PATH", requires = "tls_key")]
    tls_cert: Option<PathBuf>,

    /// PEM private key for `--tls-cert`.
    #[arg(long, env = "TLS_KEY_PATH", requires = "tls_cert")]
    tls_key: Option<PathBuf>,

    /// Port for the Prometheus scrape endpoint. Disabled when unset.
    #[arg(long, env = "METRICS_PORT")]
    metrics_port: Option<u16>,

    /// Log output format.
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,
}

impl Cli {
    fn store_config(&self) -> StoreConfig {
        StoreConfig {
            kind: self.store,
            database_url: self.database_url.clone().map(SecretString::from),
            max_connections: self.db_max_connections,
            acquire_timeout: Duration::from_secs(self.db_acquire_timeout_secs),
        }
    }

    fn network_config(&self) -> NetworkConfig {
        let tls = match (&self.tls_cert, &self.tls_key) {
            (Some(cert_path), Some(key_path)) => Some(TlsConfig {
                cert_path: cert_path.clone(),
                key_path: key_path.clone(),
            }),
            _ => None,
        };

        NetworkConfig {
            host: self.host.clone(),
            port: self.port,
            tls,
            cors_origins: self.cors_origins.clone(),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            ..NetworkConfig::default()
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_format, "info")?;

    if let Some(port) = cli.metrics_port {
        install_metrics_exporter(SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)))?;
    }

    let store_config = cli.store_config();
    info!(config = ?store_config, "Connecting order store");
    let store = connect_store(&store_config)
        .await
        .context("order store unavailable, refusing to start")?;

    let mut server = OrderServer::new(cli.network_config(), store);
    let port = server.start().await?;
    info!(port, "Order service listening");

    server.serve(shutdown_signal()).await
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_is_well_formed() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults_match_documented_values() {
        let cli = Cli::try_parse_from(["orders-server", "--store", "memory"]).unwrap();
        let network = cli.network_config();
        assert_eq!(network.port, 5002);
        assert!(network.tls.is_none());

        let store = cli.store_config();
        assert_eq!(store.kind, StoreKind::Memory);
        assert_eq!(store.max_connections, 10);
    }

    #[test]
    fn cors_origins_split_on_commas() {
        let cli = Cli::try_parse_from([
            "orders-server",
            "--cors-origins",
            "http://a.example,http://b.example",
        ])
        .unwrap();
        assert_eq!(
            cli.cors_origins,
            vec!["http://a.example".to_string(), "http://b.example".to_string()]
        );
    }

    #[test]
    fn tls_cert_without_key_is_rejected() {
        let result = Cli::try_parse_from(["orders-server", "--tls-cert", "/tmp/cert.pem"]);
        assert!(result.is_err());
    }
}
