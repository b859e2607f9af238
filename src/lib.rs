pub mod config;
pub mod db;
pub mod error;
pub mod origin;
pub mod routes;

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use axum_server::tls_rustls::RustlsConfig;
use axum_server::Handle;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::level_filters::LevelFilter;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::db::ClipStore;
use crate::error::{AppError, AppResult};
use crate::origin::OriginResolver;
use crate::routes::AppState;

const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

fn init_tracing() {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!("failed to listen for Ctrl+C: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!("failed to listen for SIGTERM: {err}");
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
    info!("shutting down");
}

/// Chooses the listen host: every interface inside a container, otherwise
/// the LAN address. A host without a LAN address cannot serve.
fn bind_host(config: &Config, origin: &OriginResolver) -> AppResult<IpAddr> {
    if config.dockerised {
        return Ok(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
    }
    Ok(IpAddr::V4(origin.resolve_local_address()?))
}

pub async fn run() -> AppResult<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = Config::load()?;
    let origin = OriginResolver::system();
    let host = bind_host(&config, &origin)?;
    let https_port = config.https_port()?;
    let https_addr = SocketAddr::new(host, https_port);
    let http_addr = SocketAddr::new(host, config.port()?);

    let store = Arc::new(ClipStore::new(&config.db_path)?);
    info!(path = %config.db_path.display(), "clip store ready");

    let tls = RustlsConfig::from_pem_file(&config.tls_cert_path, &config.tls_key_path)
        .await
        .map_err(AppError::Tls)?;

    let app = routes::app(AppState::new(store, origin), &config.static_dir);
    let redirect = routes::redirect::redirect_router(https_port);

    let handle = Handle::new();
    let https = axum_server::bind_rustls(https_addr, tls)
        .handle(handle.clone())
        .serve(app.into_make_service_with_connect_info::<SocketAddr>());

    let listener = TcpListener::bind(http_addr).await?;
    let http = axum::serve(listener, redirect).with_graceful_shutdown(async move {
        shutdown_signal().await;
        handle.graceful_shutdown(Some(SHUTDOWN_GRACE));
    });

    info!("server started at https://{https_addr}, redirecting http://{http_addr}");
    tokio::try_join!(https, async move { http.await })?;

    Ok(())
}
