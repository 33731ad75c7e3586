//! The abstract request the dispatch pipeline consumes.
//!
//! Wire concerns stay with the host adapter; this type only carries what
//! routing and handlers need: the method (with POST tunneling), the raw and
//! collapsed-slash paths, headers, the decoded query/body parameter pairs,
//! and a slot where the pipeline records a fault for error handlers to
//! inspect.

use http::header::{self, HeaderName, HeaderValue};
use http::{HeaderMap, Method};

use crate::error::Fault;

/// Methods a POST request may tunnel to via the `_method` parameter.
/// RFC 2616 verbs minus TRACE and CONNECT (and the two that need no
/// tunneling).
const TUNNEL_METHODS: [Method; 4] = [
    Method::PUT,
    Method::DELETE,
    Method::OPTIONS,
    Method::HEAD,
];

/// An incoming request, abstracted away from the wire.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    path: String,
    headers: HeaderMap,
    params: Vec<(String, String)>,
    fault: Option<Fault>,
}

impl Request {
    /// Start building a request by hand (mostly useful in tests).
    #[must_use]
    pub fn builder() -> RequestBuilder {
        RequestBuilder::default()
    }

    /// Build a request from `http` parts plus the buffered body.
    ///
    /// The query string always contributes parameters; the body contributes
    /// only when the content type is `application/x-www-form-urlencoded`.
    #[must_use]
    pub fn from_parts(parts: &http::request::Parts, body: &[u8]) -> Self {
        let mut params: Vec<(String, String)> = Vec::new();
        if let Some(query) = parts.uri.query() {
            params.extend(form_urlencoded::parse(query.as_bytes()).into_owned());
        }
        if !body.is_empty() && is_form_request(&parts.headers) {
            params.extend(form_urlencoded::parse(body).into_owned());
        }
        Self {
            method: parts.method.clone(),
            path: parts.uri.path().to_owned(),
            headers: parts.headers.clone(),
            params,
            fault: None,
        }
    }

    /// The physical request method as received.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The effective request method.
    ///
    /// A POST carrying a `_method` parameter naming one of PUT, DELETE,
    /// OPTIONS, or HEAD (case-insensitive) is treated as that method;
    /// anything else keeps the physical method.
    #[must_use]
    pub fn effective_method(&self) -> Method {
        if self.method == Method::POST {
            if let Some(tunneled) = self.param("_method") {
                let name = tunneled.to_ascii_uppercase();
                if let Ok(method) = Method::from_bytes(name.as_bytes()) {
                    if TUNNEL_METHODS.contains(&method) {
                        return method;
                    }
                }
            }
        }
        self.method.clone()
    }

    /// The raw request path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Replace the request path. Before-filters use this to rewrite a
    /// request ahead of route lookup.
    pub fn set_path(&mut self, path: impl Into<String>) {
        self.path = path.into();
    }

    /// The path with runs of `/` collapsed to one, as used for matching.
    #[must_use]
    pub fn normalized_path(&self) -> String {
        let mut out = String::with_capacity(self.path.len());
        let mut previous_was_slash = false;
        for ch in self.path.chars() {
            if ch == '/' {
                if !previous_was_slash {
                    out.push(ch);
                }
                previous_was_slash = true;
            } else {
                previous_was_slash = false;
                out.push(ch);
            }
        }
        out
    }

    /// The decoded query/body parameter pairs, in arrival order.
    #[must_use]
    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// Look up a query/body parameter; the last occurrence wins.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .rev()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// The request headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// A header as a string, if present and valid UTF-8.
    #[must_use]
    pub fn header_str(&self, name: HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// The `User-Agent` header.
    #[must_use]
    pub fn user_agent(&self) -> Option<&str> {
        self.header_str(header::USER_AGENT)
    }

    /// The `Host` header with any trailing `:port` removed.
    #[must_use]
    pub fn host(&self) -> Option<&str> {
        self.header_str(header::HOST).map(strip_port)
    }

    /// Record the fault the pipeline caught, for error handlers to read.
    pub fn set_fault(&mut self, fault: Fault) {
        self.fault = Some(fault);
    }

    /// The fault recorded by the pipeline, if any.
    #[must_use]
    pub fn fault(&self) -> Option<&Fault> {
        self.fault.as_ref()
    }
}

/// Builder for [`Request`] values.
#[derive(Debug)]
pub struct RequestBuilder {
    method: Method,
    path: String,
    headers: HeaderMap,
    params: Vec<(String, String)>,
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self {
            method: Method::GET,
            path: "/".to_owned(),
            headers: HeaderMap::new(),
            params: Vec::new(),
        }
    }
}

impl RequestBuilder {
    /// Set the physical method (default GET).
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Set the raw path (default `/`).
    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Append a header.
    #[must_use]
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Append a decoded query/body parameter pair.
    #[must_use]
    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    /// Finish the request.
    #[must_use]
    pub fn build(self) -> Request {
        Request {
            method: self.method,
            path: self.path,
            headers: self.headers,
            params: self.params,
            fault: None,
        }
    }
}

fn is_form_request(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<mime::Mime>().ok())
        .is_some_and(|m| m.essence_str() == mime::APPLICATION_WWW_FORM_URLENCODED.essence_str())
}

fn strip_port(host: &str) -> &str {
    match host.rfind(':') {
        Some(idx)
            if !host[idx + 1..].is_empty()
                && host[idx + 1..].bytes().all(|b| b.is_ascii_digit()) =>
        {
            &host[..idx]
        }
        _ => host,
    }
}
