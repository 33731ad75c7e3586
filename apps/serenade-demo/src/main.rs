//! Serenade demo server.
//!
//! A small site built on `serenade-core` and served through the
//! `serenade-http` hyper adapter. In development the whole site definition
//! is replayed before every request, so `src/site.rs` can be edited while
//! the server runs.
//!
//! # Usage
//!
//! ```text
//! SERENADE_PORT=4567 serenade-demo
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `SERENADE_ENV` | `development` | Environment name |
//! | `SERENADE_HOST` | `0.0.0.0` | Bind host |
//! | `SERENADE_PORT` | `4567` | Bind port |
//! | `SERENADE_RAISE_ERRORS` | `false` | Surface faults to the host instead of error pages |
//! | `SERENADE_RELOAD` | per env | Replay the site definition before each request |
//! | `SERENADE_LOCK` | `false` | Serialize dispatch even without reloading |
//! | `RUST_LOG` | *(unset)* | Tracing filter (falls back to `info`) |

mod site;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as HttpConnBuilder;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use serenade_core::{App, AppConfig, Reloader};
use serenade_http::service::AppService;

/// Server version reported at startup.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the tracing subscriber from `RUST_LOG`, defaulting to `info`.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

/// Build the service: a reload-guarded app when the configuration wants
/// reloading or serialized dispatch, a lock-free shared app otherwise.
fn build_service(config: AppConfig) -> Result<AppService> {
    if config.reload_enabled() || config.lock {
        let reloader = Reloader::new(config, site::define)?;
        Ok(AppService::new(reloader))
    } else {
        let mut app = App::new(config);
        site::define(&mut app)?;
        Ok(AppService::new(Arc::new(app)))
    }
}

/// Run the accept loop, serving connections until a shutdown signal is
/// received.
async fn serve(listener: TcpListener, service: AppService) -> Result<()> {
    let graceful = hyper_util::server::graceful::GracefulShutdown::new();
    let http = HttpConnBuilder::new(TokioExecutor::new());

    let shutdown = async {
        tokio::signal::ctrl_c().await.ok();
        info!("received shutdown signal, draining connections");
    };

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = listener.accept() => {
                let (stream, peer_addr) = match result {
                    Ok(conn) => conn,
                    Err(e) => {
                        warn!(error = %e, "failed to accept connection");
                        continue;
                    }
                };

                let svc = service.clone();
                let conn = http.serve_connection(TokioIo::new(stream), svc);
                let conn = graceful.watch(conn.into_owned());

                tokio::spawn(async move {
                    if let Err(e) = conn.await {
                        error!(peer_addr = %peer_addr, error = %e, "connection error");
                    }
                });
            }

            () = &mut shutdown => {
                info!("shutting down gracefully");
                break;
            }
        }
    }

    // Wait for in-flight requests to complete.
    graceful.shutdown().await;
    info!("all connections drained, exiting");

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = AppConfig::from_env();
    let addr: SocketAddr = config
        .listen_addr()
        .parse()
        .with_context(|| format!("invalid bind address: {}", config.listen_addr()))?;

    info!(
        env = %config.env,
        reload = config.reload_enabled(),
        raise_errors = config.raise_errors,
        version = VERSION,
        "starting Serenade demo server",
    );

    let service = build_service(config)?;

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    info!(%addr, "listening for connections");

    serve(listener, service).await
}
