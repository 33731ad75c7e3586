//! Faults, the dispatch interrupt, and the error chain.
//!
//! A [`Fault`] is the value form of "an exception escaped the handler". Its
//! [`FaultKind`] is the identity the error chain resolves on, the way the
//! original exception-class hierarchy keyed recovery handlers. Handler and
//! filter bodies return `Result<_, Interrupt>` so both early halts and
//! faults travel up the call stack through one channel.

use http::StatusCode;

use crate::context::{Context, HandlerFn};
use crate::outcome::Outcome;
use crate::params::Params;
use crate::router::Resolved;

/// Identity of a fault, used to select a recovery handler.
///
/// `Custom` covers application-defined fault classes; identity is the
/// (static) name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultKind {
    /// No route matched, or a handler decided the resource does not exist.
    NotFound,
    /// The generic failure class; also the fallback entry of the chain.
    ServerError,
    /// A named template was requested but is not registered.
    TemplateMissing,
    /// An application-defined fault class.
    Custom(&'static str),
}

impl FaultKind {
    /// Canonical name of the kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "NotFound",
            Self::ServerError => "ServerError",
            Self::TemplateMissing => "TemplateMissing",
            Self::Custom(name) => name,
        }
    }

    /// Status code an error entry for this kind declares by default.
    #[must_use]
    pub fn default_status(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::fmt::Display for FaultKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fault raised from a filter, handler, or coercion step.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct Fault {
    kind: FaultKind,
    message: String,
}

impl Fault {
    /// Create a fault of the given kind.
    #[must_use]
    pub fn new(kind: FaultKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// A not-found fault.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(FaultKind::NotFound, message)
    }

    /// A generic server-error fault.
    #[must_use]
    pub fn server_error(message: impl Into<String>) -> Self {
        Self::new(FaultKind::ServerError, message)
    }

    /// A missing-template fault naming the template.
    #[must_use]
    pub fn template_missing(name: &str) -> Self {
        Self::new(FaultKind::TemplateMissing, format!("no such template: {name}"))
    }

    /// An application-defined fault.
    #[must_use]
    pub fn custom(name: &'static str, message: impl Into<String>) -> Self {
        Self::new(FaultKind::Custom(name), message)
    }

    /// The fault's identity.
    #[must_use]
    pub fn kind(&self) -> FaultKind {
        self.kind
    }

    /// The human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// The early-exit channel of the dispatch pipeline.
///
/// `Halt` carries an [`Outcome`] that short-circuits straight to coercion;
/// `Fault` diverts dispatch into the error chain. Filters and handlers
/// return `Result<_, Interrupt>` and the `?` operator propagates faults via
/// the `From<Fault>` impl.
#[derive(Debug)]
pub enum Interrupt {
    /// Stop normal processing and coerce this outcome instead.
    Halt(Outcome),
    /// Divert into the error chain.
    Fault(Fault),
}

impl Interrupt {
    /// Halt with the given outcome.
    #[must_use]
    pub fn halt(outcome: impl Into<Outcome>) -> Self {
        Self::Halt(outcome.into())
    }
}

impl From<Fault> for Interrupt {
    fn from(fault: Fault) -> Self {
        Self::Fault(fault)
    }
}

/// Errors raised while defining an application (not while serving one).
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    /// A route template did not compile to a valid pattern.
    #[error("invalid route template {template:?}: {source}")]
    Pattern {
        /// The offending template.
        template: String,
        /// The regex compile error.
        #[source]
        source: regex::Error,
    },

    /// An agent guard pattern did not compile.
    #[error("invalid agent pattern {pattern:?}: {source}")]
    AgentPattern {
        /// The offending pattern.
        pattern: String,
        /// The regex compile error.
        #[source]
        source: regex::Error,
    },

    /// A host guard pattern did not compile.
    #[error("invalid host pattern {pattern:?}: {source}")]
    HostPattern {
        /// The offending pattern.
        pattern: String,
        /// The regex compile error.
        #[source]
        source: regex::Error,
    },

    /// Any other failure inside a definition block.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Convenience result type for definition-time operations.
pub type SetupResult<T> = Result<T, SetupError>;

/// A registered recovery handler for one fault kind.
pub struct ErrorEntry {
    kind: FaultKind,
    status: StatusCode,
    handler: HandlerFn,
}

impl ErrorEntry {
    /// Entry with the kind's default status.
    #[must_use]
    pub fn new(kind: FaultKind, handler: HandlerFn) -> Self {
        Self::with_status(kind, kind.default_status(), handler)
    }

    /// Entry with an explicit declared status.
    #[must_use]
    pub fn with_status(kind: FaultKind, status: StatusCode, handler: HandlerFn) -> Self {
        Self {
            kind,
            status,
            handler,
        }
    }

    /// The kind this entry recovers.
    #[must_use]
    pub fn kind(&self) -> FaultKind {
        self.kind
    }

    /// The declared status bound when this entry is produced by lookup.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Package this entry as a resolved handler with empty parameters.
    #[must_use]
    pub fn to_resolved(&self) -> Resolved {
        Resolved::new(self.handler.clone(), Params::new(), self.status)
    }
}

impl std::fmt::Debug for ErrorEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorEntry")
            .field("kind", &self.kind)
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

/// The error chain: fault kinds mapped to recovery entries.
///
/// A server-error entry exists from construction on, so [`ErrorTable::resolve`]
/// is total. Registration replaces any previous entry for the same kind.
pub struct ErrorTable {
    entries: std::collections::HashMap<FaultKind, ErrorEntry>,
    server_error: ErrorEntry,
}

impl ErrorTable {
    /// Register an entry; the last registration per kind wins.
    pub fn register(&mut self, entry: ErrorEntry) {
        if entry.kind() == FaultKind::ServerError {
            self.server_error = entry;
        } else {
            self.entries.insert(entry.kind(), entry);
        }
    }

    /// Resolve a kind to its entry, falling back to the server-error entry.
    #[must_use]
    pub fn resolve(&self, kind: FaultKind) -> &ErrorEntry {
        if kind != FaultKind::ServerError {
            if let Some(entry) = self.entries.get(&kind) {
                return entry;
            }
        }
        &self.server_error
    }

    /// True when an entry for the exact kind is registered.
    #[must_use]
    pub fn contains(&self, kind: FaultKind) -> bool {
        kind == FaultKind::ServerError || self.entries.contains_key(&kind)
    }

    /// Drop every registration and restore the built-in server-error entry.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.server_error = builtin_server_error();
    }
}

impl Default for ErrorTable {
    fn default() -> Self {
        Self {
            entries: std::collections::HashMap::new(),
            server_error: builtin_server_error(),
        }
    }
}

impl std::fmt::Debug for ErrorTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorTable")
            .field("kinds", &self.entries.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

fn builtin_server_error() -> ErrorEntry {
    let handler: HandlerFn = std::sync::Arc::new(|_cx: &mut Context<'_>| {
        Ok(Outcome::text("<h1>Internal Server Error</h1>"))
    });
    ErrorEntry::new(FaultKind::ServerError, handler)
}
