//! Ordered route tables keyed by HTTP method.

use std::collections::HashMap;
use std::fmt;

use http::{Method, StatusCode};
use tracing::debug;

use crate::context::HandlerFn;
use crate::params::Params;
use crate::request::Request;
use crate::route::Route;

/// The result of a lookup: the handler to invoke, the parameters bound from
/// the match, and the status the response scaffold starts from.
pub struct Resolved {
    handler: HandlerFn,
    params: Params,
    status: StatusCode,
}

impl Resolved {
    pub(crate) fn new(handler: HandlerFn, params: Params, status: StatusCode) -> Self {
        Self {
            handler,
            params,
            status,
        }
    }

    /// The status the scaffold is set to before invoking.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Parameters bound by the match.
    #[must_use]
    pub fn params(&self) -> &Params {
        &self.params
    }

    pub(crate) fn into_parts(self) -> (HandlerFn, Params, StatusCode) {
        (self.handler, self.params, self.status)
    }
}

impl fmt::Debug for Resolved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolved")
            .field("params", &self.params)
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

/// Routes grouped by method, tried in definition order.
#[derive(Debug, Default)]
pub struct Router {
    routes: HashMap<Method, Vec<Route>>,
}

impl Router {
    /// An empty router.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a route to the table for `method`.
    pub fn add(&mut self, method: Method, route: Route) {
        self.routes.entry(method).or_default().push(route);
    }

    /// Routes registered for `method`, in definition order.
    #[must_use]
    pub fn routes_for(&self, method: &Method) -> &[Route] {
        self.routes.get(method).map_or(&[], Vec::as_slice)
    }

    /// Total number of registered routes across all methods.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.values().map(Vec::len).sum()
    }

    /// Whether no routes are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.values().all(Vec::is_empty)
    }

    /// Drop every registered route.
    pub fn clear(&mut self) {
        self.routes.clear();
    }

    /// Find the first route matching `request` under its effective method.
    ///
    /// A HEAD request with no HEAD route falls back to the GET table; the
    /// matched handler runs as usual and post-processing strips the body.
    pub(crate) fn find(&self, request: &Request) -> Option<Resolved> {
        let method = request.effective_method();
        if let Some(resolved) = self.find_for_method(&method, request) {
            return Some(resolved);
        }
        if method == Method::HEAD {
            return self.find_for_method(&Method::GET, request);
        }
        None
    }

    fn find_for_method(&self, method: &Method, request: &Request) -> Option<Resolved> {
        for route in self.routes_for(method) {
            if let Some(params) = route.matches(request) {
                debug!(
                    method = %method,
                    path = request.path(),
                    template = route.template(),
                    "route matched"
                );
                return Some(Resolved::new(route.handler(), params, StatusCode::OK));
            }
        }
        None
    }
}
