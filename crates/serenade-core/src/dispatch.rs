//! The dispatch pipeline: filters, lookup, invocation, coercion, recovery.
//!
//! One call to [`App::dispatch`] carries a request through the whole state
//! machine on the calling thread, with no internal suspension. Interrupts
//! raised anywhere in the normal phase converge here: halts jump straight
//! to coercion, faults divert into the error chain.

use http::header::{self, HeaderValue};
use http::{Method, StatusCode};
use tracing::{debug, debug_span, warn};

use crate::app::App;
use crate::context::Context;
use crate::error::{Fault, FaultKind, Interrupt};
use crate::outcome::{Outcome, coerce};
use crate::request::Request;
use crate::response::Response;
use crate::router::Resolved;

impl App {
    /// Dispatch one request to a response.
    ///
    /// The pipeline never fails for a request that merely matches no route;
    /// lookup always resolves to a handler, falling back to the not-found
    /// entry of the error chain.
    ///
    /// # Errors
    ///
    /// Returns the fault itself in two cases: the `raise_errors` setting is
    /// on and a non-not-found fault was caught, or an error handler faulted
    /// while recovering (there is no handler-of-handler fallback).
    pub fn dispatch(&self, request: Request) -> Result<Response, Fault> {
        let span = debug_span!("dispatch", method = %request.method(), path = request.path());
        let _guard = span.enter();

        let mut cx = Context::new(self, request);
        let body = match self.attempt(&mut cx) {
            Ok(body) => body,
            Err(fault) => self.recover(&mut cx, fault)?,
        };
        Ok(finalize(cx, body))
    }

    /// The normal phase: filters, lookup, invocation, coercion.
    fn attempt(&self, cx: &mut Context<'_>) -> Result<String, Fault> {
        let invoked = self.run_normal(cx);
        settle(cx, invoked)
    }

    fn run_normal(&self, cx: &mut Context<'_>) -> Result<Outcome, Interrupt> {
        for filter in self.filters() {
            filter(cx)?;
        }
        let resolved = self.lookup(cx.request());
        let (handler, params, status) = resolved.into_parts();
        cx.set_status(status);
        cx.bind_route(params);
        handler(cx)
    }

    /// Resolve a handler for the request. Never fails: a miss yields the
    /// not-found entry with its declared status and empty parameters.
    fn lookup(&self, request: &Request) -> Resolved {
        match self.router().find(request) {
            Some(resolved) => resolved,
            None => {
                debug!(path = request.path(), "no route matched");
                self.errors().resolve(FaultKind::NotFound).to_resolved()
            }
        }
    }

    /// The error phase. Records the fault on the request, forces 500,
    /// applies the propagation policy, then re-invokes with the resolved
    /// error entry under its own trap and coercion pass.
    fn recover(&self, cx: &mut Context<'_>, fault: Fault) -> Result<String, Fault> {
        warn!(kind = %fault.kind(), message = fault.message(), "dispatch fault");
        cx.request_mut().set_fault(fault.clone());
        cx.set_status(StatusCode::INTERNAL_SERVER_ERROR);
        if self.config().raise_errors && fault.kind() != FaultKind::NotFound {
            return Err(fault);
        }

        let resolved = self.errors().resolve(fault.kind()).to_resolved();
        let (handler, params, status) = resolved.into_parts();
        cx.set_status(status);
        cx.bind_route(params);
        let invoked = handler(cx);
        settle(cx, invoked)
    }
}

/// Reduce an invocation result to body text.
///
/// A normal return is coerced and then yields to an explicitly-set scaffold
/// body; a halt payload is coerced as-is and wins unconditionally.
fn settle(cx: &mut Context<'_>, invoked: Result<Outcome, Interrupt>) -> Result<String, Fault> {
    match invoked {
        Ok(outcome) => {
            let text = coerce(outcome, cx)?;
            Ok(cx.body().map_or(text, str::to_owned))
        }
        Err(Interrupt::Halt(outcome)) => coerce(outcome, cx),
        Err(Interrupt::Fault(fault)) => Err(fault),
    }
}

/// Post-processing: strip bodies for HEAD (by effective method) and set
/// `Content-Length` when no handler did.
fn finalize(cx: Context<'_>, mut body: String) -> Response {
    if cx.request().effective_method() == Method::HEAD {
        body.clear();
    }
    let mut scaffold = cx.into_scaffold();
    if !scaffold.headers().contains_key(header::CONTENT_LENGTH) {
        scaffold
            .headers_mut()
            .insert(header::CONTENT_LENGTH, HeaderValue::from(body.len()));
    }
    scaffold.finish(body)
}
