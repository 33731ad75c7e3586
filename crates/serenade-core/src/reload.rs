//! Reload-between-requests support.
//!
//! Dispatch itself never mutates an [`App`], so a fixed application can be
//! shared behind a plain `Arc` with no locking. Development mode instead
//! wants the definition function replayed before every request. A
//! [`Reloader`] owns the app behind a mutex and rebuilds it from scratch on
//! each dispatch when reloading is enabled; with reloading disabled it
//! degrades to a serialization guard, the `lock` setting's behavior.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::info;

use crate::app::App;
use crate::config::AppConfig;
use crate::error::{Fault, SetupResult};
use crate::request::Request;
use crate::response::Response;

/// The application definition function, replayed on every reload cycle.
pub type DefineFn = Arc<dyn Fn(&mut App) -> SetupResult<()> + Send + Sync>;

/// Owns an [`App`] and its definition function behind a mutex.
pub struct Reloader {
    app: Mutex<App>,
    define: DefineFn,
}

impl Reloader {
    /// Build the application and run the definition function once.
    ///
    /// # Errors
    ///
    /// Propagates definition failures (e.g. an invalid route template).
    pub fn new<F>(config: AppConfig, define: F) -> SetupResult<Self>
    where
        F: Fn(&mut App) -> SetupResult<()> + Send + Sync + 'static,
    {
        let define: DefineFn = Arc::new(define);
        let mut app = App::new(config);
        define(&mut app)?;
        Ok(Self {
            app: Mutex::new(app),
            define,
        })
    }

    /// Dispatch one request under the lock, reloading first when the
    /// configuration asks for it.
    ///
    /// # Errors
    ///
    /// A failed reload surfaces as a server-error fault; dispatch faults
    /// propagate as from [`App::dispatch`].
    pub fn dispatch(&self, request: Request) -> Result<Response, Fault> {
        let mut app = self.app.lock();
        if app.config().reload_enabled() {
            if let Err(err) = self.reload(&mut app) {
                return Err(Fault::server_error(format!("reload failed: {err}")));
            }
        }
        app.dispatch(request)
    }

    /// Run `f` against the current application under the lock.
    pub fn with_app<R>(&self, f: impl FnOnce(&App) -> R) -> R {
        f(&self.app.lock())
    }

    /// Clear the tables and replay the definition function. Defaults are
    /// reinstalled before the replay, and configure blocks see the
    /// reloading flag for its whole duration.
    fn reload(&self, app: &mut App) -> SetupResult<()> {
        info!("reloading application");
        app.reset();
        app.set_reloading(true);
        let result = (self.define)(app);
        app.set_reloading(false);
        result
    }
}

impl fmt::Debug for Reloader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reloader").finish_non_exhaustive()
    }
}
