use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};

/// How the gateway reaches the user, event and auth services.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ServiceMode {
    /// Call the in-process implementations directly.
    Local,
    /// Call independently deployed services over HTTP.
    Remote {
        user_url: String,
        event_url: String,
        auth_url: String,
    },
}

/// The gateway's configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// The address the gateway listens on.
    pub bind_addr: SocketAddr,
    /// The single origin allowed by CORS.
    pub main_host: String,
    /// Whether cookies are marked `Secure`.
    pub secure_cookies: bool,
    /// The Redis URL holding sessions. `None` keeps sessions in memory.
    pub session_redis_url: Option<String>,
    /// The Redis URL holding CSRF tokens. `None` keeps tokens in memory.
    pub csrf_redis_url: Option<String>,
    /// How long a session lives.
    pub session_ttl: Duration,
    /// How long a CSRF token lives.
    pub csrf_ttl: Duration,
    /// Whether a CSRF token is revoked after its first successful use.
    pub csrf_single_use: bool,
    /// The upper bound for every store and downstream call.
    pub request_deadline: Duration,
    /// Where the domain services live.
    pub service_mode: ServiceMode,
    /// The geocoding endpoint used to enrich events.
    pub geocoder_url: Option<String>,
    /// The geocoding API token.
    pub geocoder_token: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            main_host: "http://localhost:3000".to_string(),
            secure_cookies: false,
            session_redis_url: None,
            csrf_redis_url: None,
            session_ttl: Duration::from_secs(24 * 3600),
            csrf_ttl: Duration::from_secs(3600),
            csrf_single_use: false,
            request_deadline: Duration::from_millis(5000),
            service_mode: ServiceMode::Local,
            geocoder_url: None,
            geocoder_token: None,
        }
    }
}

fn optional(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_or<T: std::str::FromStr>(name: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional(name) {
        Some(raw) => raw.parse().with_context(|| format!("Invalid {}", name)),
        None => Ok(default),
    }
}

/// Converts `count` units of `unit_secs` seconds, rejecting values that overflow.
fn duration_in(name: &str, count: u64, unit_secs: u64) -> Result<Duration> {
    count
        .checked_mul(unit_secs)
        .map(Duration::from_secs)
        .with_context(|| format!("{} is too large", name))
}

impl Config {
    /// Creates a new `Config` from environment variables.
    ///
    /// Every variable is optional; unset values fall back to [`Config::default`].
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let service_mode = match optional("SERVICE_MODE").as_deref() {
            None | Some("local") => ServiceMode::Local,
            Some("remote") => ServiceMode::Remote {
                user_url: env::var("USER_SERVICE_URL")
                    .context("USER_SERVICE_URL must be set when SERVICE_MODE=remote")?,
                event_url: env::var("EVENT_SERVICE_URL")
                    .context("EVENT_SERVICE_URL must be set when SERVICE_MODE=remote")?,
                auth_url: env::var("AUTH_SERVICE_URL")
                    .context("AUTH_SERVICE_URL must be set when SERVICE_MODE=remote")?,
            },
            Some(other) => anyhow::bail!("SERVICE_MODE must be `local` or `remote`, got `{}`", other),
        };

        let session_redis_url = optional("SESSION_REDIS_URL");
        let csrf_redis_url = optional("CSRF_REDIS_URL");
        if session_redis_url.is_some() != csrf_redis_url.is_some() {
            anyhow::bail!("SESSION_REDIS_URL and CSRF_REDIS_URL must be set together");
        }

        Ok(Self {
            bind_addr: parse_or("BIND_ADDR", defaults.bind_addr)?,
            main_host: optional("MAIN_HOST").unwrap_or(defaults.main_host),
            secure_cookies: optional("APP_ENV").as_deref() == Some("production"),
            session_redis_url,
            csrf_redis_url,
            session_ttl: duration_in(
                "SESSION_TTL_HOURS",
                parse_or("SESSION_TTL_HOURS", 24u64)?,
                3600,
            )?,
            csrf_ttl: duration_in("CSRF_TTL_MINUTES", parse_or("CSRF_TTL_MINUTES", 60u64)?, 60)?,
            csrf_single_use: parse_or("CSRF_SINGLE_USE", false)?,
            request_deadline: Duration::from_millis(parse_or("REQUEST_DEADLINE_MS", 5000u64)?),
            service_mode,
            geocoder_url: optional("GEOCODER_URL"),
            geocoder_token: optional("GEOCODER_TOKEN"),
        })
    }
}

/// The configuration of the `domain-services` process.
#[derive(Clone, Debug)]
pub struct ServicesConfig {
    /// The address the RPC server listens on.
    pub bind_addr: SocketAddr,
}

impl ServicesConfig {
    /// Creates a new `ServicesConfig` from environment variables.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            bind_addr: parse_or("SERVICES_BIND_ADDR", SocketAddr::from(([127, 0, 0, 1], 8081)))?,
        })
    }
}
