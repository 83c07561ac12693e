use std::net::SocketAddr;
use std::path::PathBuf;

use axum::routing::get;
use tokio::net::TcpListener;
use userbase::config::Configuration;
use userbase::telemetry;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    telemetry::setup_logging();

    let path = std::env::var("CONFIG_PATH").map(PathBuf::from).unwrap_or_default();
    let config = Configuration::default().path(path).read()?;

    let metrics = telemetry::setup_metrics_recorder()?;
    let state = userbase::initialize_state(&config).await?;

    let app = userbase::app(state)
        // `GET /metrics` exposes Prometheus metrics.
        .route("/metrics", get(move || std::future::ready(metrics.render())));

    let addr = SocketAddr::new(config.address, config.port);
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(
        name = %config.name,
        version = %config.version(),
        backend = ?config.store.backend,
        %addr,
        "server started"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "cannot listen for Ctrl+C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(err) => {
                tracing::error!(error = %err, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
