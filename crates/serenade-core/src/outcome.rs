//! Handler outcomes and the coercion chain.
//!
//! A handler body does not build a response directly; it produces an
//! [`Outcome`], and [`coerce`] reduces that value against the request
//! context into the final body text:
//!
//! 1. `Empty` and `Text` terminate the reduction.
//! 2. `Status` and `Step` mutate the context, then continue with the
//!    trailing tail.
//! 3. `Seq` feeds its head back into the reduction and threads the
//!    unconsumed rest through as the new tail.
//! 4. `Action` dispatches into the fixed registry of context operations and
//!    terminates with that operation's return value.
//!
//! The same chain serves a handler's normal return value and every halt
//! payload, so `Err(Interrupt::halt((StatusCode::GONE, "bye")))` and a plain
//! `Ok("bye".into())` travel the same road.

use std::collections::VecDeque;
use std::sync::Arc;

use http::StatusCode;

use crate::context::Context;
use crate::error::Fault;

/// A side-effecting coercion step. The return value is discarded; faults
/// propagate.
pub type StepFn = Arc<dyn Fn(&mut Context<'_>) -> Result<(), Fault> + Send + Sync>;

/// What a handler produced.
#[derive(Clone)]
pub enum Outcome {
    /// Nothing: coerces to an empty body.
    Empty,
    /// Literal body text.
    Text(String),
    /// Set the response status, then continue with the tail.
    Status(StatusCode),
    /// Run a side effect against the context, then continue with the tail.
    Step(StepFn),
    /// Invoke a fixed context action; its return value is the body.
    Action(Action),
    /// The first element decides, the rest threads through as the tail.
    Seq(Vec<Outcome>),
}

impl Outcome {
    /// Literal text outcome.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Status-setting outcome.
    #[must_use]
    pub fn status(code: StatusCode) -> Self {
        Self::Status(code)
    }

    /// Side-effecting outcome.
    #[must_use]
    pub fn step(step: impl Fn(&mut Context<'_>) -> Result<(), Fault> + Send + Sync + 'static) -> Self {
        Self::Step(Arc::new(step))
    }

    /// Sequence outcome.
    #[must_use]
    pub fn seq(items: impl IntoIterator<Item = Outcome>) -> Self {
        Self::Seq(items.into_iter().collect())
    }
}

impl std::fmt::Debug for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => f.write_str("Empty"),
            Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Self::Status(code) => f.debug_tuple("Status").field(code).finish(),
            Self::Step(_) => f.write_str("Step(..)"),
            Self::Action(action) => f.debug_tuple("Action").field(action).finish(),
            Self::Seq(items) => f.debug_tuple("Seq").field(items).finish(),
        }
    }
}

impl From<&str> for Outcome {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<String> for Outcome {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<StatusCode> for Outcome {
    fn from(code: StatusCode) -> Self {
        Self::Status(code)
    }
}

impl From<()> for Outcome {
    fn from((): ()) -> Self {
        Self::Empty
    }
}

impl From<Action> for Outcome {
    fn from(action: Action) -> Self {
        Self::Action(action)
    }
}

impl<T: Into<Outcome>> From<(StatusCode, T)> for Outcome {
    fn from((code, rest): (StatusCode, T)) -> Self {
        Self::Seq(vec![Self::Status(code), rest.into()])
    }
}

/// The closed registry of context operations addressable from an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    /// Explicitly-set scaffold body if present, else the first argument.
    Complete,
    /// Store the first argument as the scaffold body and return it.
    Body,
    /// Resolve the named template and return its deferred content.
    Template,
}

impl ActionKind {
    /// Parse a registry name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "complete" => Some(Self::Complete),
            "body" => Some(Self::Body),
            "template" => Some(Self::Template),
            _ => None,
        }
    }

    /// Canonical registry name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Complete => "complete",
            Self::Body => "body",
            Self::Template => "template",
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named context operation plus its argument list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    kind: ActionKind,
    args: Vec<String>,
}

impl Action {
    /// Build an action.
    #[must_use]
    pub fn new(kind: ActionKind, args: Vec<String>) -> Self {
        Self { kind, args }
    }

    /// The `complete` action with no argument.
    #[must_use]
    pub fn complete() -> Self {
        Self::new(ActionKind::Complete, Vec::new())
    }

    /// The `body` action storing the given text.
    #[must_use]
    pub fn body(text: impl Into<String>) -> Self {
        Self::new(ActionKind::Body, vec![text.into()])
    }

    /// The `template` action rendering the named template.
    #[must_use]
    pub fn template(name: impl Into<String>) -> Self {
        Self::new(ActionKind::Template, vec![name.into()])
    }

    /// The operation to invoke.
    #[must_use]
    pub fn kind(&self) -> ActionKind {
        self.kind
    }

    /// The argument list.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }
}

/// Reduce an outcome against the context into the final body text.
///
/// Runs as an iterative right fold: a work-list tail holds the unconsumed
/// trailing outcomes, and non-terminal variants pull their continuation from
/// its front.
///
/// # Errors
///
/// Propagates faults raised by `Step` bodies or by the `Template` action.
pub fn coerce(outcome: Outcome, cx: &mut Context<'_>) -> Result<String, Fault> {
    let mut tail: VecDeque<Outcome> = VecDeque::new();
    let mut current = outcome;
    loop {
        current = match current {
            Outcome::Empty => return Ok(String::new()),
            Outcome::Text(text) => return Ok(text),
            Outcome::Status(code) => {
                cx.set_status(code);
                tail.pop_front().unwrap_or(Outcome::Empty)
            }
            Outcome::Step(step) => {
                step(cx)?;
                tail.pop_front().unwrap_or(Outcome::Empty)
            }
            Outcome::Action(action) => return cx.run_action(&action),
            Outcome::Seq(items) => {
                let mut items = items.into_iter();
                let head = items.next().unwrap_or(Outcome::Empty);
                for item in items.rev() {
                    tail.push_front(item);
                }
                head
            }
        };
    }
}
