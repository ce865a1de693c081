//! API server entry point.

use api::config::Config;
use axum::Router;
use ledger_client::{HttpPointsLedger, LedgerConfig};
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

async fn serve(app: Router, addr: &str) {
    tracing::info!(%addr, "starting API server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("server shut down gracefully");
}

#[tokio::main]
async fn main() {
    let config = Config::from_env();

    // 1. Initialize tracing
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 2. Install Prometheus metrics recorder
    let prometheus_builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    let metrics_handle = prometheus_builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // 3. Build state and serve. The backend is in-memory; the ledger is the
    //    real HTTP client when LEDGER_BASE_URL is set, the simulator
    //    otherwise.
    if config.ledger_base_url.is_some() {
        let ledger =
            HttpPointsLedger::new(LedgerConfig::from_env()).expect("failed to build ledger client");
        let store = store::InMemoryStore::new();
        let state = api::create_state(store, ledger);
        let app = api::create_app(state, metrics_handle);
        serve(app, &config.addr()).await;
    } else {
        tracing::info!("LEDGER_BASE_URL not set, using simulated points ledger");
        let state = api::create_default_state().await;
        let app = api::create_app(state, metrics_handle);
        serve(app, &config.addr()).await;
    }
}
