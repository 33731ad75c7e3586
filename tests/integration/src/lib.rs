//! End-to-end tests for the Serenade framework.
//!
//! These build whole applications through the public API and drive them
//! two ways: straight into the core dispatch pipeline, and through the
//! hyper-facing service adapter with buffered request bodies. No network
//! listener is involved, so the suite runs under plain `cargo test`.

use std::sync::Once;

use bytes::Bytes;
use http::{Method, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper::service::Service;

use serenade_core::{App, AppConfig, Env, SetupResult};
use serenade_http::AppService;

static INIT: Once = Once::new();

/// Initialize tracing (once).
fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// Configuration for a test-environment application: plain error pages,
/// no reloading.
#[must_use]
pub fn test_config() -> AppConfig {
    AppConfig {
        env: Env::Test,
        ..AppConfig::default()
    }
}

/// Configuration for a development-environment application with reloading
/// pinned off, for exercising the verbose error pages in isolation.
#[must_use]
pub fn dev_config() -> AppConfig {
    AppConfig {
        env: Env::Development,
        reload: Some(false),
        ..AppConfig::default()
    }
}

/// Build a test-environment application from a definition block.
pub fn build_app(define: impl FnOnce(&mut App) -> SetupResult<()>) -> App {
    build_app_with(test_config(), define)
}

/// Build an application with explicit configuration.
pub fn build_app_with(config: AppConfig, define: impl FnOnce(&mut App) -> SetupResult<()>) -> App {
    init_tracing();
    let mut app = App::new(config);
    define(&mut app).expect("definition should succeed");
    app
}

/// Wrap a definition block in a ready-to-call service.
pub fn build_service(define: impl FnOnce(&mut App) -> SetupResult<()>) -> AppService {
    AppService::new(build_app(define))
}

/// A bodyless request for the service layer.
#[must_use]
pub fn http_request(method: Method, path: &str) -> http::Request<Full<Bytes>> {
    http::Request::builder()
        .method(method)
        .uri(path)
        .body(Full::new(Bytes::new()))
        .expect("request should build")
}

/// A GET request for the service layer.
#[must_use]
pub fn http_get(path: &str) -> http::Request<Full<Bytes>> {
    http_request(Method::GET, path)
}

/// A POST request with a form-encoded body, for the service layer.
#[must_use]
pub fn http_form_post(path: &str, body: &'static str) -> http::Request<Full<Bytes>> {
    http::Request::builder()
        .method(Method::POST)
        .uri(path)
        .header(
            http::header::CONTENT_TYPE,
            "application/x-www-form-urlencoded",
        )
        .body(Full::new(Bytes::from_static(body.as_bytes())))
        .expect("request should build")
}

/// Drive one request through the service and collect the whole response.
pub async fn send(
    service: &AppService,
    request: http::Request<Full<Bytes>>,
) -> (StatusCode, http::HeaderMap, String) {
    let response = service.call(request).await.expect("service is infallible");
    let (parts, body) = response.into_parts();
    let bytes = body.collect().await.expect("collect body").to_bytes();
    let text = String::from_utf8(bytes.to_vec()).expect("body should be UTF-8");
    (parts.status, parts.headers, text)
}

mod test_errors;
mod test_reload;
mod test_routing;
mod test_service;
