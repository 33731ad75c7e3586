//! The per-request context handler bodies run against.
//!
//! A [`Context`] bundles the request, the response scaffold, the route
//! captures bound by lookup, and a reference back to the owning
//! application (for template and option lookup). It also carries the helper
//! surface handlers use to shape responses: status/body/header access, the
//! merged parameter view, halting, redirects, and conditional-GET helpers.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use http::header::{self, HeaderName, HeaderValue};
use http::{Method, StatusCode};
use mime::Mime;

use crate::app::App;
use crate::error::{Fault, Interrupt};
use crate::outcome::{Action, ActionKind, Outcome};
use crate::params::Params;
use crate::request::Request;
use crate::response::ResponseScaffold;

/// A route or error handler body.
pub type HandlerFn = Arc<dyn Fn(&mut Context<'_>) -> Result<Outcome, Interrupt> + Send + Sync>;

/// A before-filter body. `Ok(())` proceeds; an interrupt halts or faults.
pub type FilterFn = Arc<dyn Fn(&mut Context<'_>) -> Result<(), Interrupt> + Send + Sync>;

/// Strength of an entity tag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EtagStrength {
    /// A strong validator: `"value"`.
    #[default]
    Strong,
    /// A weak validator: `W/"value"`.
    Weak,
}

/// The evaluation context of one dispatch.
#[derive(Debug)]
pub struct Context<'app> {
    app: &'app App,
    request: Request,
    response: ResponseScaffold,
    route_params: Params,
    merged: Option<Params>,
}

impl<'app> Context<'app> {
    pub(crate) fn new(app: &'app App, request: Request) -> Self {
        Self {
            app,
            request,
            response: ResponseScaffold::new(),
            route_params: Params::new(),
            merged: None,
        }
    }

    /// The owning application.
    #[must_use]
    pub fn app(&self) -> &App {
        self.app
    }

    /// The request being dispatched.
    #[must_use]
    pub fn request(&self) -> &Request {
        &self.request
    }

    /// Mutable request access (the pipeline uses this to record faults).
    pub fn request_mut(&mut self) -> &mut Request {
        &mut self.request
    }

    /// The response scaffold.
    #[must_use]
    pub fn response(&self) -> &ResponseScaffold {
        &self.response
    }

    /// Mutable scaffold access.
    pub fn response_mut(&mut self) -> &mut ResponseScaffold {
        &mut self.response
    }

    /// Current response status.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.response.status()
    }

    /// Set the response status.
    pub fn set_status(&mut self, status: StatusCode) {
        self.response.set_status(status);
    }

    /// The explicitly-set response body, if any.
    #[must_use]
    pub fn body(&self) -> Option<&str> {
        self.response.body()
    }

    /// Explicitly set the response body. For a normal handler return this
    /// takes precedence over the returned outcome's text.
    pub fn set_body(&mut self, body: impl Into<String>) {
        self.response.set_body(body);
    }

    /// Insert or replace a response header.
    pub fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.response.set_header(name, value);
    }

    /// A response header already set on the scaffold.
    #[must_use]
    pub fn header(&self, name: HeaderName) -> Option<&HeaderValue> {
        self.response.headers().get(name)
    }

    // --- parameters ---

    /// The merged parameter view: query/body parameters with the bound
    /// route captures layered on top (captures win). Computed lazily and
    /// cached until [`Context::reset`].
    pub fn params(&mut self) -> &Params {
        let request = &self.request;
        let route_params = &self.route_params;
        self.merged.get_or_insert_with(|| {
            let mut merged: Params = request.params().iter().cloned().collect();
            merged.merge(route_params);
            merged
        })
    }

    /// A scalar parameter from the merged view, cloned out.
    #[must_use]
    pub fn param(&mut self, name: &str) -> Option<String> {
        self.params().get_str(name).map(str::to_owned)
    }

    /// A list parameter from the merged view, cloned out.
    #[must_use]
    pub fn param_all(&mut self, name: &str) -> Option<Vec<String>> {
        self.params().get_all(name).map(<[String]>::to_vec)
    }

    /// Invalidate the merged parameter view. Called whenever route
    /// parameters are rebound, including the normal-to-error transition.
    pub fn reset(&mut self) {
        self.merged = None;
    }

    pub(crate) fn bind_route(&mut self, params: Params) {
        self.route_params = params;
        self.reset();
    }

    pub(crate) fn into_scaffold(self) -> ResponseScaffold {
        self.response
    }

    // --- response helpers ---

    /// Redirect to `location` with status 302 and halt with an empty body.
    ///
    /// The `Location` header is set verbatim; no rewriting happens. Use the
    /// returned interrupt as the handler's error value:
    ///
    /// `return Err(cx.redirect("/elsewhere"));`
    pub fn redirect(&mut self, location: &str) -> Interrupt {
        self.redirect_with(location, Outcome::Empty)
    }

    /// Redirect like [`Context::redirect`], but halt with the given
    /// outcome, such as a `Status(301)` to make the redirect permanent.
    pub fn redirect_with(&mut self, location: &str, outcome: impl Into<Outcome>) -> Interrupt {
        match HeaderValue::from_str(location) {
            Ok(value) => {
                self.set_status(StatusCode::FOUND);
                self.set_header(header::LOCATION, value);
                Interrupt::Halt(outcome.into())
            }
            Err(_) => Interrupt::Fault(Fault::server_error(format!(
                "invalid redirect location: {location}"
            ))),
        }
    }

    /// Set the `Content-Type` header.
    pub fn content_type(&mut self, mime: &Mime) {
        if let Ok(value) = HeaderValue::from_str(mime.as_ref()) {
            self.set_header(header::CONTENT_TYPE, value);
        }
    }

    /// Set the `Last-Modified` header and halt with 304 when the request's
    /// `If-Modified-Since` names exactly that instant.
    ///
    /// # Errors
    ///
    /// Returns `Interrupt::Halt(304)` on a conditional match, so handlers
    /// can simply write `cx.last_modified(stamp)?;`.
    pub fn last_modified(&mut self, time: DateTime<Utc>) -> Result<(), Interrupt> {
        let stamp = format_http_date(time);
        if let Ok(value) = HeaderValue::from_str(&stamp) {
            self.set_header(header::LAST_MODIFIED, value);
        }
        if self.request.header_str(header::IF_MODIFIED_SINCE) == Some(stamp.as_str()) {
            return Err(Interrupt::halt(StatusCode::NOT_MODIFIED));
        }
        Ok(())
    }

    /// Set the `ETag` header and halt when the request's `If-None-Match`
    /// lists the tag (or `*`): 304 for GET/HEAD, 412 for anything else.
    ///
    /// # Errors
    ///
    /// Returns the conditional halt, so handlers can `?` it.
    pub fn etag(&mut self, value: &str, strength: EtagStrength) -> Result<(), Interrupt> {
        let tag = match strength {
            EtagStrength::Strong => format!("\"{value}\""),
            EtagStrength::Weak => format!("W/\"{value}\""),
        };
        if let Ok(header_value) = HeaderValue::from_str(&tag) {
            self.set_header(header::ETAG, header_value);
        }

        let matched = self
            .request
            .header_str(header::IF_NONE_MATCH)
            .is_some_and(|etags| etags.split(',').map(str::trim).any(|t| t == tag || t == "*"));
        if matched {
            let method = self.request.effective_method();
            let status = if method == Method::GET || method == Method::HEAD {
                StatusCode::NOT_MODIFIED
            } else {
                StatusCode::PRECONDITION_FAILED
            };
            return Err(Interrupt::halt(status));
        }
        Ok(())
    }

    // --- fixed action registry ---

    pub(crate) fn run_action(&mut self, action: &Action) -> Result<String, Fault> {
        match action.kind() {
            ActionKind::Complete => Ok(self
                .response
                .body()
                .map(str::to_owned)
                .or_else(|| action.args().first().cloned())
                .unwrap_or_default()),
            ActionKind::Body => {
                let text = action.args().first().cloned().unwrap_or_default();
                self.response.set_body(text.clone());
                Ok(text)
            }
            ActionKind::Template => {
                let name = action.args().first().map_or("", String::as_str);
                match self.app.find_template(name) {
                    Some(template) => Ok(template()),
                    None => Err(Fault::template_missing(name)),
                }
            }
        }
    }
}

/// Format an instant as an RFC 7231 IMF-fixdate, e.g.
/// `Sun, 06 Nov 1994 08:49:37 GMT`.
#[must_use]
pub fn format_http_date(time: DateTime<Utc>) -> String {
    time.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Media type for a well-known file extension.
///
/// ```
/// assert!(serenade_core::media_type("json").is_some());
/// assert!(serenade_core::media_type("exe").is_none());
/// ```
#[must_use]
pub fn media_type(ext: &str) -> Option<Mime> {
    match ext {
        "html" | "htm" => Some(mime::TEXT_HTML),
        "txt" => Some(mime::TEXT_PLAIN),
        "css" => Some(mime::TEXT_CSS),
        "js" => Some(mime::APPLICATION_JAVASCRIPT),
        "json" => Some(mime::APPLICATION_JSON),
        "xml" => "application/xml".parse().ok(),
        "png" => Some(mime::IMAGE_PNG),
        _ => None,
    }
}
