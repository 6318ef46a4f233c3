//! Server configuration - environment loading
//!
//! Configuration is loaded from environment variables:
//! - `DATABASE_URL`: Postgres connection string
//! - `HOST` / `PORT`: listen address (default 0.0.0.0:4000)
//! - `FRONTEND_URL`: allowed CORS origin (default: any)
//! - `APP_ENV`: deployment environment (default: development)
//! - `DB_CONNECT_TIMEOUT_SECS`, `DB_MAX_RETRIES`, `DB_RETRY_DELAY_MS`,
//!   `DB_RETRY_COOLDOWN_SECS`, `DB_MAX_CONNECTIONS`: connection policy
//! - `REQUEST_TIMEOUT_SECS`: per-request timeout

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_PORT: u16 = 4000;
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Deployment environment name (`development`, `production`, ...)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppEnv(String);

impl AppEnv {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Internal error details are withheld from clients in production.
    pub fn is_production(&self) -> bool {
        self.0.eq_ignore_ascii_case("production")
    }
}

impl Default for AppEnv {
    fn default() -> Self {
        Self::new("development")
    }
}

impl fmt::Display for AppEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Bounds for establishing the database connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Upper bound for a single connect attempt
    pub connect_timeout: Duration,
    /// Failed attempts tolerated before the store is declared unavailable
    pub max_retries: u32,
    /// Base delay between attempts, multiplied by the attempt number
    pub retry_delay: Duration,
    /// How long the store stays unavailable before attempts resume
    pub cooldown: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            max_retries: 3,
            retry_delay: Duration::from_millis(250),
            cooldown: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Load the policy from `DB_*` environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            connect_timeout: Duration::from_secs(env_or(
                "DB_CONNECT_TIMEOUT_SECS",
                defaults.connect_timeout.as_secs(),
            )),
            max_retries: env_or("DB_MAX_RETRIES", defaults.max_retries),
            retry_delay: Duration::from_millis(env_or(
                "DB_RETRY_DELAY_MS",
                defaults.retry_delay.as_millis() as u64,
            )),
            cooldown: Duration::from_secs(env_or(
                "DB_RETRY_COOLDOWN_SECS",
                defaults.cooldown.as_secs(),
            )),
        }
    }
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to (default: 0.0.0.0:4000)
    pub bind_addr: SocketAddr,

    /// Postgres connection string
    pub database_url: String,

    /// Single allowed CORS origin. `None` allows any origin without credentials.
    pub frontend_url: Option<String>,

    pub env: AppEnv,

    pub retry: RetryPolicy,

    /// Pool size for the cached handle
    pub max_connections: u32,

    pub request_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), DEFAULT_PORT),
            database_url: "postgres://localhost/unireg".to_string(),
            frontend_url: None,
            env: AppEnv::default(),
            retry: RetryPolicy::default(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

impl ServerConfig {
    /// Create config from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let host: IpAddr = env_or("HOST", defaults.bind_addr.ip());
        let port: u16 = env_or("PORT", defaults.bind_addr.port());

        Self {
            bind_addr: SocketAddr::new(host, port),
            database_url: std::env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            frontend_url: std::env::var("FRONTEND_URL")
                .ok()
                .filter(|url| !url.trim().is_empty()),
            env: std::env::var("APP_ENV")
                .map(AppEnv::new)
                .unwrap_or_default(),
            retry: RetryPolicy::from_env(),
            max_connections: env_or("DB_MAX_CONNECTIONS", defaults.max_connections),
            request_timeout: Duration::from_secs(env_or(
                "REQUEST_TIMEOUT_SECS",
                defaults.request_timeout.as_secs(),
            )),
        }
    }
}

impl ServerConfig {
    /// Longest a request waits on a database connect attempt.
    ///
    /// A fifth of the request timeout is left for the fallback answer, so a
    /// slow connect ends in fallback data or a 503 instead of a 408.
    pub fn connect_wait(&self) -> Duration {
        self.request_timeout - self.request_timeout / 5
    }
}

/// Parse an environment variable, keeping the default when unset or invalid.
fn env_or<T>(name: &str, default: T) -> T
where
    T: FromStr + fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(var = name, value = %raw, fallback = %default, "ignoring invalid value");
            default
        }),
        Err(_) => default,
    }
}
