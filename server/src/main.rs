use std::{fs::OpenOptions, net::SocketAddr, sync::Arc, time::Duration};

use anyhow::{anyhow, Context};
use axum_server::{tls_rustls::RustlsConfig, Handle};
use histoury_data_management::DataManager;
use server::{app, config::Config, server_state::ServerState};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // The log file lives in the configured data directory, so configuration is read before the global subscriber exists
    let config = tracing::subscriber::with_default(tracing_subscriber::fmt().finish(), Config::load)?;

    let log_dir = config.data_dir.join("log");
    std::fs::create_dir_all(&log_dir).with_context(|| format!("Failed to create log directory {log_dir:?}"))?;

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("server.log"))
        .context("Failed to open log file")?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| format!("{}=trace,histoury_data_management=debug", env!("CARGO_CRATE_NAME")).into())
        )
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(file))
        .init();

    tracing::info!("Starting server...");

    let data_manager = DataManager::start(&config.data_dir).await
        .map_err(|err| anyhow!("Failed to start data manager: {err:?}"))?;

    let addr = SocketAddr::new(config.host, config.port);
    let server_state = Arc::new(ServerState::new(config, data_manager)?);
    let app = app(server_state.clone());

    match &server_state.config.tls {
        Some(tls) => {
            let rustls = RustlsConfig::from_pem_file(&tls.cert, &tls.key).await
                .context("Failed to load TLS certificate and key")?;

            let handle = Handle::new();
            let shutdown_handle = handle.clone();
            tokio::spawn(async move {
                shutdown_signal().await;
                shutdown_handle.graceful_shutdown(Some(SHUTDOWN_GRACE));
            });

            tracing::info!("Listening on https://{addr}");
            axum_server::bind_rustls(addr, rustls)
                .handle(handle)
                .serve(app.into_make_service())
                .await?;
        }
        None => {
            let listener = TcpListener::bind(addr).await
                .with_context(|| format!("Failed to bind {addr}"))?;
            tracing::info!("Listening on http://{}", listener.local_addr()?);

            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await?;
        }
    }

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                terminate.recv().await;
            }
            Err(err) => {
                tracing::error!("Failed to listen for SIGTERM: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutting down");
}
