//! Client configuration: transport tuning, retry policy and API endpoints.

use crate::error::{MoneyButtonError, MoneyButtonResult};
use bon::Builder;
use std::time::Duration;
use url::Url;

/// Production REST API base URL
pub const DEFAULT_API_URL: &str = "https://www.moneybutton.com/api/v1/";

/// Production OAuth2 base URL
pub const DEFAULT_OAUTH_URL: &str = "https://www.moneybutton.com/oauth/v1/";

/// OAuth2 permission scopes understood by the API.
pub mod scopes {
    pub const BALANCE: &str = "users.balance:read";
    pub const IDENTITY: &str = "auth.user_identity:read";
    pub const PROFILE: &str = "users.profiles:read";
}

/// User agent sent with every request unless overridden
pub fn default_user_agent() -> String {
    format!("moneybutton-client: v{}", env!("CARGO_PKG_VERSION"))
}

/// Base URLs for the REST and OAuth2 halves of the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub api_url: String,
    pub oauth_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            oauth_url: DEFAULT_OAUTH_URL.to_string(),
        }
    }
}

impl Endpoints {
    pub fn new(api_url: impl Into<String>, oauth_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            oauth_url: oauth_url.into(),
        }
    }

    /// Point both halves of the API at a single host, e.g. a local mock server.
    pub fn with_base(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        Self::new(format!("{}/api/v1/", base), format!("{}/oauth/v1/", base))
    }

    /// Token endpoint, shared by code exchange and refresh
    pub fn token_url(&self) -> MoneyButtonResult<String> {
        join_segments(&self.oauth_url, &["token"])
    }

    /// Authorization page the user is redirected to
    pub fn authorize_url(&self) -> MoneyButtonResult<String> {
        join_segments(&self.oauth_url, &["authorize"])
    }

    pub fn user_identity_url(&self) -> MoneyButtonResult<String> {
        join_segments(&self.api_url, &["auth", "user_identity"])
    }

    /// Profile endpoint for a user. The id is percent-encoded as a single path segment.
    pub fn user_profile_url(&self, user_id: &str) -> MoneyButtonResult<String> {
        join_segments(&self.api_url, &["users", user_id, "profile"])
    }

    fn validate(&self) -> MoneyButtonResult<()> {
        for base in [&self.api_url, &self.oauth_url] {
            parse_base(base)?;
        }
        Ok(())
    }
}

fn parse_base(base: &str) -> MoneyButtonResult<Url> {
    let url = Url::parse(base).map_err(|e| {
        MoneyButtonError::configuration(format!("Invalid endpoint URL '{}': {}", base, e))
    })?;

    if url.cannot_be_a_base() {
        return Err(MoneyButtonError::configuration(format!(
            "Endpoint URL '{}' cannot be used as a base",
            base
        )));
    }

    Ok(url)
}

fn join_segments(base: &str, segments: &[&str]) -> MoneyButtonResult<String> {
    let mut url = parse_base(base)?;
    url.path_segments_mut()
        .map_err(|_| {
            MoneyButtonError::configuration(format!("Endpoint URL '{}' cannot be a base", base))
        })?
        .pop_if_empty()
        .extend(segments);
    Ok(url.to_string())
}

/// Retry policy applied by the HTTP transport, never by the request executor
#[derive(Debug, Clone, Builder)]
pub struct RetryConfig {
    /// Number of retries after the first attempt (0 = no retries)
    #[builder(default = 2)]
    pub retry_count: u32,

    /// Delay before the first retry
    #[builder(default = Duration::from_millis(2))]
    pub initial_backoff: Duration,

    /// Upper bound for the exponential part of the delay
    #[builder(default = Duration::from_millis(10))]
    pub max_backoff: Duration,

    /// Exponential backoff multiplier
    #[builder(default = 2.0)]
    pub exponent_factor: f64,

    /// Maximum random jitter added on top of each delay
    #[builder(default = Duration::from_millis(2))]
    pub max_jitter: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            retry_count: 2,
            initial_backoff: Duration::from_millis(2),
            max_backoff: Duration::from_millis(10),
            exponent_factor: 2.0,
            max_jitter: Duration::from_millis(2),
        }
    }
}

impl RetryConfig {
    /// Policy that performs exactly one attempt
    pub fn disabled() -> Self {
        Self {
            retry_count: 0,
            ..Self::default()
        }
    }

    /// Total attempts including the initial one
    pub fn max_attempts(&self) -> u32 {
        self.retry_count.saturating_add(1)
    }

    /// Delay before the given retry (1 = first retry)
    pub fn calculate_delay(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(16) as i32;
        let backoff_secs = self.initial_backoff.as_secs_f64() * self.exponent_factor.powi(exponent);
        let backoff = Duration::try_from_secs_f64(backoff_secs.max(0.0))
            .unwrap_or(self.max_backoff)
            .min(self.max_backoff);

        let jitter_secs = self.max_jitter.as_secs_f64() * rand::random::<f64>();
        let jitter = Duration::try_from_secs_f64(jitter_secs).unwrap_or(self.max_jitter);

        backoff.saturating_add(jitter)
    }
}

/// Options used to construct a [`crate::MoneyButtonClient`]
#[derive(Debug, Clone, Builder)]
pub struct ClientOptions {
    /// User-Agent header sent with every request
    #[builder(into, default = default_user_agent())]
    pub user_agent: String,

    /// Deadline for a single request, including reading the body
    #[builder(default = Duration::from_secs(10))]
    pub request_timeout: Duration,

    /// TCP connect timeout
    #[builder(default = Duration::from_secs(5))]
    pub dialer_timeout: Duration,

    /// TCP keep-alive interval
    #[builder(default = Duration::from_secs(20))]
    pub dialer_keep_alive: Duration,

    /// How long idle pooled connections are kept
    #[builder(default = Duration::from_secs(20))]
    pub idle_timeout: Duration,

    /// Idle connections kept per host
    #[builder(default = 10)]
    pub max_idle_connections: usize,

    /// TLS handshake timeout, folded into the connect timeout
    #[builder(default = Duration::from_secs(5))]
    pub tls_handshake_timeout: Duration,

    #[builder(default)]
    pub retry: RetryConfig,

    #[builder(default)]
    pub endpoints: Endpoints,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            request_timeout: Duration::from_secs(10),
            dialer_timeout: Duration::from_secs(5),
            dialer_keep_alive: Duration::from_secs(20),
            idle_timeout: Duration::from_secs(20),
            max_idle_connections: 10,
            tls_handshake_timeout: Duration::from_secs(5),
            retry: RetryConfig::default(),
            endpoints: Endpoints::default(),
        }
    }
}

impl ClientOptions {
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Connect timeout handed to the HTTP client
    pub fn connect_timeout(&self) -> Duration {
        self.dialer_timeout.max(self.tls_handshake_timeout)
    }

    /// Validate the configuration
    pub fn validate(&self) -> MoneyButtonResult<()> {
        if self.user_agent.trim().is_empty() {
            return Err(MoneyButtonError::configuration(
                "User agent must not be empty",
            ));
        }

        if self.request_timeout.is_zero() {
            return Err(MoneyButtonError::configuration(
                "Request timeout must be greater than zero",
            ));
        }

        if self.dialer_timeout.is_zero() {
            return Err(MoneyButtonError::configuration(
                "Dialer timeout must be greater than zero",
            ));
        }

        if !self.retry.exponent_factor.is_finite() || self.retry.exponent_factor <= 0.0 {
            return Err(MoneyButtonError::configuration(
                "Backoff exponent factor must be a finite number greater than zero",
            ));
        }

        self.endpoints.validate()
    }
}
