//! The hyper `Service` bridging HTTP connections to the dispatch pipeline.
//!
//! [`AppService`] does the host-side work around [`App::dispatch`]:
//!
//! 1. Request body collection
//! 2. Translation of hyper request parts into the abstract [`Request`]
//! 3. Dispatch through a fixed app or a reload guard ([`AppHost`])
//! 4. Translation of the dispatch result back to an `http::Response`
//! 5. Common response headers (`x-request-id`, `Server`, default
//!    `Content-Type`)
//!
//! The service is generic over the inbound body type so tests can drive it
//! with `Full<Bytes>` while production uses hyper's `Incoming`.

use std::convert::Infallible;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use http::header::{self, HeaderValue};
use http::StatusCode;
use http_body_util::BodyExt;
use hyper::service::Service;
use tracing::{debug, error, info};
use uuid::Uuid;

use serenade_core::{App, Fault, Reloader, Request, Response};

use crate::body::ResponseBody;

/// How the service reaches the application.
///
/// `Direct` shares a fixed app lock-free; `Guarded` goes through a
/// [`Reloader`], which serializes requests and optionally rebuilds the app
/// before each one.
#[derive(Clone)]
pub enum AppHost {
    /// A fixed application, dispatched without locking.
    Direct(Arc<App>),
    /// An application behind the reload guard.
    Guarded(Arc<Reloader>),
}

impl AppHost {
    fn dispatch(&self, request: Request) -> Result<Response, Fault> {
        match self {
            Self::Direct(app) => app.dispatch(request),
            Self::Guarded(reloader) => reloader.dispatch(request),
        }
    }
}

impl From<App> for AppHost {
    fn from(app: App) -> Self {
        Self::Direct(Arc::new(app))
    }
}

impl From<Arc<App>> for AppHost {
    fn from(app: Arc<App>) -> Self {
        Self::Direct(app)
    }
}

impl From<Reloader> for AppHost {
    fn from(reloader: Reloader) -> Self {
        Self::Guarded(Arc::new(reloader))
    }
}

impl From<Arc<Reloader>> for AppHost {
    fn from(reloader: Arc<Reloader>) -> Self {
        Self::Guarded(reloader)
    }
}

impl fmt::Debug for AppHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct(app) => f.debug_tuple("Direct").field(app).finish(),
            Self::Guarded(_) => f.debug_tuple("Guarded").finish_non_exhaustive(),
        }
    }
}

/// The Serenade HTTP service implementing hyper's `Service` trait.
#[derive(Clone, Debug)]
pub struct AppService {
    host: AppHost,
}

impl AppService {
    /// Wrap an app or reloader as a hyper service.
    pub fn new(host: impl Into<AppHost>) -> Self {
        Self { host: host.into() }
    }
}

impl<B> Service<http::Request<B>> for AppService
where
    B: http_body::Body + Send + 'static,
    B::Data: Send,
    B::Error: fmt::Display,
{
    type Response = http::Response<ResponseBody>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: http::Request<B>) -> Self::Future {
        let host = self.host.clone();

        Box::pin(async move {
            let request_id = Uuid::new_v4().to_string();
            let response = process_request(req, &host, &request_id).await;
            let response = add_common_headers(response, &request_id);
            Ok(response)
        })
    }
}

/// Collect the body, translate, dispatch, and translate back.
async fn process_request<B>(
    req: http::Request<B>,
    host: &AppHost,
    request_id: &str,
) -> http::Response<ResponseBody>
where
    B: http_body::Body,
    B::Error: fmt::Display,
{
    let (parts, body) = req.into_parts();
    debug!(method = %parts.method, uri = %parts.uri, request_id, "processing request");

    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(err) => {
            error!(error = %err, request_id, "failed to collect request body");
            return plain_response(StatusCode::BAD_REQUEST, "<h1>Bad Request</h1>");
        }
    };

    let request = Request::from_parts(&parts, &body);
    match host.dispatch(request) {
        Ok(response) => {
            info!(
                method = %parts.method,
                path = %parts.uri.path(),
                status = %response.status(),
                request_id,
                "request served"
            );
            core_to_http(response)
        }
        Err(fault) => {
            error!(kind = %fault.kind(), error = %fault, request_id, "dispatch fault surfaced");
            plain_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "<h1>Internal Server Error</h1>",
            )
        }
    }
}

/// Translate a finalized dispatch response into a hyper-compatible one.
fn core_to_http(response: Response) -> http::Response<ResponseBody> {
    let (status, headers, body) = response.into_parts();
    let body = if body.is_empty() {
        ResponseBody::empty()
    } else {
        ResponseBody::from_bytes(body)
    };
    let mut out = http::Response::new(body);
    *out.status_mut() = status;
    *out.headers_mut() = headers;
    out
}

/// A minimal response used when dispatch itself failed (propagated faults,
/// unreadable request bodies).
fn plain_response(status: StatusCode, body: &str) -> http::Response<ResponseBody> {
    http::Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "text/html; charset=utf-8")
        .header(header::CONTENT_LENGTH, body.len())
        .body(ResponseBody::from_string(body))
        .expect("static response should be valid")
}

/// Add common response headers to every response.
fn add_common_headers(
    mut response: http::Response<ResponseBody>,
    request_id: &str,
) -> http::Response<ResponseBody> {
    let headers = response.headers_mut();

    if let Ok(value) = HeaderValue::from_str(request_id) {
        headers.insert("x-request-id", value);
    }
    headers.insert(header::SERVER, HeaderValue::from_static("Serenade"));

    // Coerced outcomes are text; HTML is the default for handlers that
    // never picked a type.
    if !headers.contains_key(header::CONTENT_TYPE) {
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/html; charset=utf-8"),
        );
    }

    response
}
