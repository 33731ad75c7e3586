//! Request routing and dispatch for Serenade.
//!
//! This crate is the host-independent core: route templates compiled to
//! anchored patterns, ordered per-method route tables, the per-request
//! dispatch pipeline with its halt/fault interrupt channel, the outcome
//! coercion chain, the error chain with its default pages, and the
//! reload-between-requests guard used in development.

mod app;
mod config;
mod context;
mod dispatch;
mod error;
mod outcome;
mod params;
mod reload;
mod request;
mod response;
mod route;
mod router;

pub use app::{App, TemplateFn, escape_html};
pub use config::{AppConfig, Env};
pub use context::{
    Context, EtagStrength, FilterFn, HandlerFn, format_http_date, media_type,
};
pub use error::{
    ErrorEntry, ErrorTable, Fault, FaultKind, Interrupt, SetupError, SetupResult,
};
pub use outcome::{Action, ActionKind, Outcome, StepFn, coerce};
pub use params::{ParamValue, Params};
pub use reload::{DefineFn, Reloader};
pub use request::{Request, RequestBuilder};
pub use response::{Response, ResponseScaffold};
pub use route::{HostGuard, Route, RouteOptions};
pub use router::{Resolved, Router};
