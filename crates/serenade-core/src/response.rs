//! The in-progress response scaffold and the finalized response.

use bytes::Bytes;
use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, StatusCode};

/// The response under construction while a request dispatches.
///
/// The body field is a placeholder: handlers may set it explicitly, and the
/// pipeline decides at the end whether it or the coerced outcome text wins.
#[derive(Debug, Clone, Default)]
pub struct ResponseScaffold {
    status: StatusCode,
    headers: HeaderMap,
    body: Option<String>,
}

impl ResponseScaffold {
    /// A fresh scaffold: status 200, no headers, no body.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current status.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Replace the status.
    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    /// Headers set so far.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Mutable header access.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Insert or replace a header.
    pub fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.insert(name, value);
    }

    /// The explicitly-set body, if any.
    #[must_use]
    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    /// Explicitly set the body.
    pub fn set_body(&mut self, body: impl Into<String>) {
        self.body = Some(body.into());
    }

    /// Take the explicitly-set body, leaving the placeholder empty.
    pub fn take_body(&mut self) -> Option<String> {
        self.body.take()
    }

    /// Package the scaffold with the final body text.
    #[must_use]
    pub fn finish(self, body: String) -> Response {
        Response {
            status: self.status,
            headers: self.headers,
            body: Bytes::from(body),
        }
    }
}

/// A finalized response: what the host adapter writes to the wire.
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl Response {
    /// Final status.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Final headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Final body bytes.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// The body as text (lossy).
    #[must_use]
    pub fn text(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Split into status, headers, and body.
    #[must_use]
    pub fn into_parts(self) -> (StatusCode, HeaderMap, Bytes) {
        (self.status, self.headers, self.body)
    }
}
