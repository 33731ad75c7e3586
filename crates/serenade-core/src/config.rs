//! Application configuration.
//!
//! All options can be overridden from the environment (`SERENADE_*`
//! variables), so a deployed application needs no configuration files.

/// Runtime environment the application believes it is running in.
///
/// The environment selects defaults: development enables per-request
/// reloading and verbose error pages, production and test keep the plain
/// built-in pages and leave reloading off.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Env {
    /// Local development: reload on, verbose error pages.
    #[default]
    Development,
    /// Test runs: plain pages, no reload.
    Test,
    /// Production deployments: plain pages, no reload.
    Production,
}

impl Env {
    /// Parse an environment name, case-insensitively.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "development" => Some(Self::Development),
            "test" => Some(Self::Test),
            "production" => Some(Self::Production),
            _ => None,
        }
    }

    /// Canonical lowercase name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Test => "test",
            Self::Production => "production",
        }
    }

    /// True when the environment is [`Env::Development`].
    #[must_use]
    pub fn is_development(self) -> bool {
        self == Self::Development
    }

    /// True when the environment is [`Env::Test`].
    #[must_use]
    pub fn is_test(self) -> bool {
        self == Self::Test
    }

    /// True when the environment is [`Env::Production`].
    #[must_use]
    pub fn is_production(self) -> bool {
        self == Self::Production
    }
}

impl std::fmt::Display for Env {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Application options.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    /// Runtime environment.
    pub env: Env,
    /// Bind host for the demo server.
    pub host: String,
    /// Bind port for the demo server.
    pub port: u16,
    /// Rethrow faults (other than not-found) to the host instead of
    /// rendering them through the error chain.
    pub raise_errors: bool,
    /// Rebuild the application from its definition before every request.
    /// `None` resolves to "on in development, off elsewhere".
    pub reload: Option<bool>,
    /// Serialize every dispatch behind the application mutex even when
    /// reloading is off.
    pub lock: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            env: Env::default(),
            host: "0.0.0.0".to_owned(),
            port: 4567,
            raise_errors: false,
            reload: None,
            lock: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from `SERENADE_*` environment variables, falling
    /// back to the defaults for anything unset or unparsable.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("SERENADE_ENV") {
            if let Some(env) = Env::from_name(&v) {
                config.env = env;
            }
        }
        if let Ok(v) = std::env::var("SERENADE_HOST") {
            config.host = v;
        }
        if let Ok(v) = std::env::var("SERENADE_PORT") {
            if let Ok(port) = v.parse() {
                config.port = port;
            }
        }
        if let Ok(v) = std::env::var("SERENADE_RAISE_ERRORS") {
            config.raise_errors = parse_flag(&v);
        }
        if let Ok(v) = std::env::var("SERENADE_RELOAD") {
            config.reload = Some(parse_flag(&v));
        }
        if let Ok(v) = std::env::var("SERENADE_LOCK") {
            config.lock = parse_flag(&v);
        }

        config
    }

    /// Whether per-request reloading is in effect for this configuration.
    #[must_use]
    pub fn reload_enabled(&self) -> bool {
        self.reload.unwrap_or_else(|| self.env.is_development())
    }

    /// `host:port` string suitable for a listener bind.
    #[must_use]
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_flag(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}
