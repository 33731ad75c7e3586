//! Route templates: compilation and per-request matching.
//!
//! A template mixes literal path text with two capture tokens:
//!
//! - `:name` captures one path segment's worth of characters (anything
//!   outside `/ ? : , & # .`) into the parameter `name`;
//! - `*` captures lazily across segment boundaries; each splat lands in the
//!   ordered `splat` parameter list.
//!
//! Everything else passes through as literal regex text (deliberately not
//! re-escaped, so a template may embed its own regex fragments), and the
//! whole pattern is anchored at both ends. Templates are assumed to be
//! percent-escaped already; captured values are percent-decoded on match.

use std::sync::Arc;

use percent_encoding::percent_decode_str;
use regex::Regex;

use crate::context::HandlerFn;
use crate::error::{SetupError, SetupResult};
use crate::params::{ParamValue, Params};
use crate::request::Request;

/// Character class a `:name` capture (and the name itself) draws from.
const URI_CHAR_CLASS: &str = "[^/?:,&#.]";

/// Host guard of a route: exact header value or a pattern.
#[derive(Debug, Clone)]
pub enum HostGuard {
    /// Match the host header exactly (ASCII case-insensitive).
    Exact(String),
    /// Match the host header against a regex.
    Pattern(Regex),
}

impl HostGuard {
    /// Exact-match guard.
    #[must_use]
    pub fn exact(host: impl Into<String>) -> Self {
        Self::Exact(host.into())
    }

    /// Pattern guard from a compiled regex.
    #[must_use]
    pub fn pattern(pattern: Regex) -> Self {
        Self::Pattern(pattern)
    }

    /// Pattern guard compiled from source text.
    pub fn pattern_str(pattern: &str) -> SetupResult<Self> {
        let compiled = Regex::new(pattern).map_err(|source| SetupError::HostPattern {
            pattern: pattern.to_owned(),
            source,
        })?;
        Ok(Self::Pattern(compiled))
    }

    fn matches(&self, host: &str) -> bool {
        match self {
            Self::Exact(expected) => expected.eq_ignore_ascii_case(host),
            Self::Pattern(pattern) => pattern.is_match(host),
        }
    }
}

/// Optional guards evaluated before the path pattern.
#[derive(Debug, Clone, Default)]
pub struct RouteOptions {
    agent: Option<Regex>,
    host: Option<HostGuard>,
}

impl RouteOptions {
    /// No guards.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Require the `User-Agent` header to match the pattern. Sub-captures
    /// are exposed as the ordered `agent` parameter.
    #[must_use]
    pub fn with_agent(mut self, pattern: Regex) -> Self {
        self.agent = Some(pattern);
        self
    }

    /// Agent guard compiled from source text.
    pub fn with_agent_str(self, pattern: &str) -> SetupResult<Self> {
        let compiled = Regex::new(pattern).map_err(|source| SetupError::AgentPattern {
            pattern: pattern.to_owned(),
            source,
        })?;
        Ok(self.with_agent(compiled))
    }

    /// Require the `Host` header to satisfy the guard.
    #[must_use]
    pub fn with_host(mut self, guard: HostGuard) -> Self {
        self.host = Some(guard);
        self
    }
}

/// A compiled route: anchored pattern, ordered capture names, guards, and
/// the handler body.
pub struct Route {
    template: String,
    pattern: Regex,
    param_keys: Vec<String>,
    options: RouteOptions,
    handler: HandlerFn,
}

impl Route {
    /// Compile a template.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError::Pattern`] when the assembled pattern does not
    /// compile (possible because literal text is not escaped).
    pub fn new(
        template: impl Into<String>,
        options: RouteOptions,
        handler: HandlerFn,
    ) -> SetupResult<Self> {
        let template = template.into();
        let (source, param_keys) = compile_template(&template);
        let pattern = Regex::new(&source).map_err(|source| SetupError::Pattern {
            template: template.clone(),
            source,
        })?;
        Ok(Self {
            template,
            pattern,
            param_keys,
            options,
            handler,
        })
    }

    /// The template this route was compiled from.
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Ordered capture names, including synthetic `_splat_N` entries.
    #[must_use]
    pub fn param_keys(&self) -> &[String] {
        &self.param_keys
    }

    /// Match a request against this route.
    ///
    /// Guards run first: a configured agent pattern must match the
    /// `User-Agent` header (absence rejects), and a configured host guard
    /// must accept the `Host` header. The path pattern then runs against
    /// the collapsed-slash form of the request path. On success the
    /// captures are percent-decoded and zipped with the capture names;
    /// splat captures collapse into one ordered `splat` list.
    #[must_use]
    pub fn matches(&self, request: &Request) -> Option<Params> {
        let mut params = Params::new();

        if let Some(agent_pattern) = &self.options.agent {
            let agent = request.user_agent()?;
            let caps = agent_pattern.captures(agent)?;
            let groups: Vec<String> = caps
                .iter()
                .skip(1)
                .flatten()
                .map(|m| m.as_str().to_owned())
                .collect();
            params.insert("agent", ParamValue::Many(groups));
        }

        if let Some(host_guard) = &self.options.host {
            let host = request.host()?;
            if !host_guard.matches(host) {
                return None;
            }
        }

        let path = request.normalized_path();
        let caps = self.pattern.captures(&path)?;

        let mut splats: Vec<String> = Vec::new();
        for (index, key) in self.param_keys.iter().enumerate() {
            let Some(capture) = caps.get(index + 1) else {
                continue;
            };
            let value = decode_uri_component(capture.as_str());
            if is_splat_key(key) {
                splats.push(value);
            } else {
                params.insert(key.clone(), ParamValue::One(value));
            }
        }
        if !splats.is_empty() {
            params.insert("splat", ParamValue::Many(splats));
        }

        Some(params)
    }

    pub(crate) fn handler(&self) -> HandlerFn {
        Arc::clone(&self.handler)
    }
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("template", &self.template)
            .field("pattern", &self.pattern.as_str())
            .field("param_keys", &self.param_keys)
            .finish_non_exhaustive()
    }
}

/// Scan a template into anchored regex source plus ordered capture names.
fn compile_template(template: &str) -> (String, Vec<String>) {
    let mut source = String::with_capacity(template.len() + 16);
    source.push('^');
    let mut keys = Vec::new();
    let mut splats = 0usize;

    let mut chars = template.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '*' => {
                keys.push(format!("_splat_{splats}"));
                splats += 1;
                source.push_str("(.*?)");
            }
            ':' => {
                let mut name = String::new();
                while let Some(&next) = chars.peek() {
                    if is_name_char(next) {
                        name.push(next);
                        chars.next();
                    } else {
                        break;
                    }
                }
                if name.is_empty() {
                    // A lone colon is literal path text.
                    source.push(':');
                } else {
                    keys.push(name);
                    source.push('(');
                    source.push_str(URI_CHAR_CLASS);
                    source.push_str("+)");
                }
            }
            other => source.push(other),
        }
    }

    source.push('$');
    (source, keys)
}

fn is_name_char(ch: char) -> bool {
    !matches!(ch, '/' | '?' | ':' | ',' | '&' | '#' | '.')
}

fn is_splat_key(key: &str) -> bool {
    key.strip_prefix("_splat_")
        .is_some_and(|rest| !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()))
}

/// Percent-decode one captured path component.
pub(crate) fn decode_uri_component(value: &str) -> String {
    percent_decode_str(value).decode_utf8_lossy().into_owned()
}
