//! HTTP hosting for Serenade applications.
//!
//! This crate is the bridge between hyper and the host-independent dispatch
//! core in `serenade-core`:
//!
//! - **Service** ([`service`]): [`AppService`](service::AppService)
//!   implements hyper's `Service` trait, collecting the request body,
//!   translating to the abstract request, dispatching through a fixed app
//!   or the reload guard, and stamping common response headers.
//!
//! - **Body** ([`body`]): [`ResponseBody`](body::ResponseBody) supporting
//!   buffered and empty response modes.
//!
//! # Architecture
//!
//! ```text
//! HTTP Request
//!   -> AppService (hyper Service)
//!     -> Body collection
//!     -> abstract Request translation
//!     -> AppHost (Arc<App> or Reloader) -> App::dispatch
//!     -> Response translation
//!     -> Common headers (x-request-id, Server, Content-Type default)
//!   <- HTTP Response
//! ```

pub mod body;
pub mod service;

// Re-export key types for convenience.
pub use body::ResponseBody;
pub use service::{AppHost, AppService};
