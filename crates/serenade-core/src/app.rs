//! The application: route tables, filters, error chain, and templates.
//!
//! An [`App`] is built once by a definition function, then serves requests
//! through [`App::dispatch`] without further mutation.
//! Reload support wraps the whole value and rebuilds it between requests
//! instead of mutating it concurrently.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use http::Method;

use crate::config::{AppConfig, Env};
use crate::context::{Context, FilterFn, HandlerFn};
use crate::error::{ErrorEntry, ErrorTable, FaultKind, Interrupt, SetupResult};
use crate::outcome::Outcome;
use crate::route::{Route, RouteOptions};
use crate::router::Router;

/// A registered named template body.
pub type TemplateFn = Arc<dyn Fn() -> String + Send + Sync>;

/// A routing application: configuration plus the four definition tables
/// (routes, before-filters, error entries, templates).
pub struct App {
    config: AppConfig,
    router: Router,
    filters: Vec<FilterFn>,
    errors: ErrorTable,
    templates: HashMap<String, TemplateFn>,
    reloading: bool,
}

impl App {
    /// An application with empty tables and the default error entries
    /// installed (styled pages in development, plain fragments otherwise).
    #[must_use]
    pub fn new(config: AppConfig) -> Self {
        let mut app = Self {
            config,
            router: Router::new(),
            filters: Vec::new(),
            errors: ErrorTable::default(),
            templates: HashMap::new(),
            reloading: false,
        };
        app.install_defaults();
        app
    }

    /// The application's configuration.
    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// The route tables.
    #[must_use]
    pub fn router(&self) -> &Router {
        &self.router
    }

    pub(crate) fn filters(&self) -> &[FilterFn] {
        &self.filters
    }

    pub(crate) fn errors(&self) -> &ErrorTable {
        &self.errors
    }

    pub(crate) fn set_reloading(&mut self, reloading: bool) {
        self.reloading = reloading;
    }

    // --- registration ---

    /// Register a route for an arbitrary method.
    ///
    /// # Errors
    ///
    /// Fails when the template does not compile to a valid pattern.
    pub fn route<F>(&mut self, method: Method, template: &str, handler: F) -> SetupResult<()>
    where
        F: Fn(&mut Context<'_>) -> Result<Outcome, Interrupt> + Send + Sync + 'static,
    {
        self.route_with(method, template, RouteOptions::new(), handler)
    }

    /// Register a route with matching options (agent and host guards).
    ///
    /// # Errors
    ///
    /// Fails when the template does not compile to a valid pattern.
    pub fn route_with<F>(
        &mut self,
        method: Method,
        template: &str,
        options: RouteOptions,
        handler: F,
    ) -> SetupResult<()>
    where
        F: Fn(&mut Context<'_>) -> Result<Outcome, Interrupt> + Send + Sync + 'static,
    {
        let handler: HandlerFn = Arc::new(handler);
        let route = Route::new(template, options, handler)?;
        self.router.add(method, route);
        Ok(())
    }

    /// Register a GET route.
    ///
    /// # Errors
    ///
    /// Fails when the template does not compile to a valid pattern.
    pub fn get<F>(&mut self, template: &str, handler: F) -> SetupResult<()>
    where
        F: Fn(&mut Context<'_>) -> Result<Outcome, Interrupt> + Send + Sync + 'static,
    {
        self.route(Method::GET, template, handler)
    }

    /// Register a POST route.
    ///
    /// # Errors
    ///
    /// Fails when the template does not compile to a valid pattern.
    pub fn post<F>(&mut self, template: &str, handler: F) -> SetupResult<()>
    where
        F: Fn(&mut Context<'_>) -> Result<Outcome, Interrupt> + Send + Sync + 'static,
    {
        self.route(Method::POST, template, handler)
    }

    /// Register a PUT route.
    ///
    /// # Errors
    ///
    /// Fails when the template does not compile to a valid pattern.
    pub fn put<F>(&mut self, template: &str, handler: F) -> SetupResult<()>
    where
        F: Fn(&mut Context<'_>) -> Result<Outcome, Interrupt> + Send + Sync + 'static,
    {
        self.route(Method::PUT, template, handler)
    }

    /// Register a DELETE route.
    ///
    /// # Errors
    ///
    /// Fails when the template does not compile to a valid pattern.
    pub fn delete<F>(&mut self, template: &str, handler: F) -> SetupResult<()>
    where
        F: Fn(&mut Context<'_>) -> Result<Outcome, Interrupt> + Send + Sync + 'static,
    {
        self.route(Method::DELETE, template, handler)
    }

    /// Register a HEAD route. Without one, HEAD requests fall back to the
    /// GET table and the body is stripped at finalize time.
    ///
    /// # Errors
    ///
    /// Fails when the template does not compile to a valid pattern.
    pub fn head<F>(&mut self, template: &str, handler: F) -> SetupResult<()>
    where
        F: Fn(&mut Context<'_>) -> Result<Outcome, Interrupt> + Send + Sync + 'static,
    {
        self.route(Method::HEAD, template, handler)
    }

    /// Append a before-filter. Filters run in registration order on every
    /// request, ahead of route lookup.
    pub fn before<F>(&mut self, filter: F)
    where
        F: Fn(&mut Context<'_>) -> Result<(), Interrupt> + Send + Sync + 'static,
    {
        let filter: FilterFn = Arc::new(filter);
        self.filters.push(filter);
    }

    /// Register a recovery handler for a fault kind, with the kind's
    /// default status (404 for not-found, 500 otherwise).
    pub fn error<F>(&mut self, kind: FaultKind, handler: F)
    where
        F: Fn(&mut Context<'_>) -> Result<Outcome, Interrupt> + Send + Sync + 'static,
    {
        let handler: HandlerFn = Arc::new(handler);
        self.errors.register(ErrorEntry::new(kind, handler));
    }

    /// Register a recovery handler with an explicit declared status.
    pub fn error_with_status<F>(&mut self, kind: FaultKind, status: http::StatusCode, handler: F)
    where
        F: Fn(&mut Context<'_>) -> Result<Outcome, Interrupt> + Send + Sync + 'static,
    {
        let handler: HandlerFn = Arc::new(handler);
        self.errors.register(ErrorEntry::with_status(kind, status, handler));
    }

    /// Register the not-found handler (status 404).
    pub fn not_found<F>(&mut self, handler: F)
    where
        F: Fn(&mut Context<'_>) -> Result<Outcome, Interrupt> + Send + Sync + 'static,
    {
        self.error(FaultKind::NotFound, handler);
    }

    /// Register a named template body.
    pub fn template<F>(&mut self, name: impl Into<String>, body: F)
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        self.templates.insert(name.into(), Arc::new(body));
    }

    /// Register the layout template, stored under the name `"layout"`.
    pub fn layout<F>(&mut self, body: F)
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        self.template("layout", body);
    }

    /// Look up a registered template by name.
    #[must_use]
    pub fn find_template(&self, name: &str) -> Option<&TemplateFn> {
        self.templates.get(name)
    }

    /// Run a setup block when the current environment is in `envs` (an
    /// empty list means every environment). Blocks are skipped entirely
    /// while a reload is replaying the definition function, so they behave
    /// as run-once setup.
    ///
    /// # Errors
    ///
    /// Propagates whatever the block returns.
    pub fn configure<F>(&mut self, envs: &[Env], block: F) -> SetupResult<()>
    where
        F: FnOnce(&mut Self) -> SetupResult<()>,
    {
        if self.reloading {
            return Ok(());
        }
        if envs.is_empty() || envs.contains(&self.config.env) {
            return block(self);
        }
        Ok(())
    }

    /// Clear routes, filters, error entries, and templates, then reinstall
    /// the default error entries. Used between reload cycles.
    pub fn reset(&mut self) {
        self.router.clear();
        self.filters.clear();
        self.errors.clear();
        self.templates.clear();
        self.install_defaults();
    }

    fn install_defaults(&mut self) {
        self.errors
            .register(ErrorEntry::new(FaultKind::NotFound, plain_not_found()));
        self.errors
            .register(ErrorEntry::new(FaultKind::ServerError, plain_server_error()));
        if self.config.env.is_development() {
            self.errors
                .register(ErrorEntry::new(FaultKind::NotFound, dev_not_found()));
            self.errors
                .register(ErrorEntry::new(FaultKind::ServerError, dev_server_error()));
        }
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}

impl fmt::Debug for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("App")
            .field("config", &self.config)
            .field("routes", &self.router.len())
            .field("filters", &self.filters.len())
            .field("templates", &self.templates.len())
            .finish_non_exhaustive()
    }
}

// --- default error pages ---

fn plain_not_found() -> HandlerFn {
    Arc::new(|_cx: &mut Context<'_>| Ok(Outcome::text("<h1>Not Found</h1>")))
}

fn plain_server_error() -> HandlerFn {
    Arc::new(|_cx: &mut Context<'_>| Ok(Outcome::text("<h1>Internal Server Error</h1>")))
}

fn dev_not_found() -> HandlerFn {
    Arc::new(|cx: &mut Context<'_>| {
        let verb = cx.request().effective_method().as_str().to_ascii_lowercase();
        let path = escape_html(cx.request().path());
        Ok(Outcome::text(format!(
            "<!DOCTYPE html>\n\
             <html>\n\
             <head>\n\
             <style type=\"text/css\">\n\
             body {{text-align:center;color:#888;font-family:arial;font-size:22px;margin:20px;}}\n\
             #content {{margin:0 auto;width:500px;text-align:left}}\n\
             </style>\n\
             </head>\n\
             <body>\n\
             <h2>Serenade doesn't know this tune.</h2>\n\
             <div id=\"content\">\n\
             Try this:\n\
             <pre>app.{verb}(\"{path}\", |_cx| Ok(\"Hello World\".into()))?;</pre>\n\
             </div>\n\
             </body>\n\
             </html>\n"
        )))
    })
}

fn dev_server_error() -> HandlerFn {
    Arc::new(|cx: &mut Context<'_>| {
        let heading = match cx.request().fault() {
            Some(fault) => escape_html(&format!("{} - {}", fault.kind(), fault.message())),
            None => "unknown error".to_owned(),
        };
        let params = escape_html(&format!("{:?}", cx.params()));
        Ok(Outcome::text(format!(
            "<!DOCTYPE html>\n\
             <html>\n\
             <head>\n\
             <style type=\"text/css\" media=\"screen\">\n\
             body {{font-family:verdana;color:#333}}\n\
             #content {{width:700px;margin-left:20px}}\n\
             #content h1 {{width:99%;color:#1D6B8D;font-weight:bold}}\n\
             </style>\n\
             <title>Serenade error</title>\n\
             </head>\n\
             <body>\n\
             <div id=\"content\">\n\
             <div class=\"info\">\n\
             Params: <pre>{params}</pre>\n\
             </div>\n\
             <h1>{heading}</h1>\n\
             </div>\n\
             </body>\n\
             </html>\n"
        )))
    })
}

/// Escape `&`, `<`, `>`, `"`, and `'` for safe interpolation into HTML
/// text.
#[must_use]
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
