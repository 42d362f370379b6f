//! Configuration module for the generation client.
//!
//! Provides the provider endpoint, optional API token, model parameters,
//! timeouts, and the retry, cache, probe and progress settings.

use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;

use crate::auth::key_hint;
use crate::cache::CacheConfig;
use crate::connectivity::ProbeConfig;
use crate::errors::{CoachError, CoachResult};
use crate::progress::ProgressConfig;
use crate::resilience::RetryConfig;

/// Default base URL of the chat-completions provider.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default model.
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// Default sampling temperature.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Default completion token limit.
pub const DEFAULT_MAX_TOKENS: u32 = 1000;

/// Default per-request timeout (30 seconds).
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default resource timeout (60 seconds).
pub const DEFAULT_RESOURCE_TIMEOUT: Duration = Duration::from_secs(60);

/// Configuration for the generation client.
#[derive(Clone)]
pub struct CoachConfig {
    /// API token. Without one, every generation uses offline templates.
    pub(crate) api_key: Option<SecretString>,
    /// Base URL for API requests.
    pub base_url: String,
    /// Model identifier.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Completion token limit.
    pub max_tokens: u32,
    /// Presence penalty.
    pub presence_penalty: f32,
    /// Frequency penalty.
    pub frequency_penalty: f32,
    /// Timeout applied to each request.
    pub request_timeout: Duration,
    /// Ceiling for connection setup and the whole exchange.
    pub resource_timeout: Duration,
    /// Retry settings.
    pub retry: RetryConfig,
    /// Cache limits.
    pub cache: CacheConfig,
    /// Active probe settings.
    pub probe: ProbeConfig,
    /// Progress ticker settings.
    pub progress: ProgressConfig,
}

impl CoachConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> CoachConfigBuilder {
        CoachConfigBuilder::new()
    }

    /// Creates a configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `COACHGEN_API_KEY` (optional): API token; offline-only when absent
    /// - `COACHGEN_BASE_URL` (optional): Custom base URL
    /// - `COACHGEN_MODEL` (optional): Model identifier
    /// - `COACHGEN_TIMEOUT` (optional): Request timeout in seconds
    /// - `COACHGEN_MAX_ATTEMPTS` (optional): Total attempts per generation
    pub fn from_env() -> CoachResult<Self> {
        let mut builder = CoachConfigBuilder::new();

        if let Ok(api_key) = std::env::var("COACHGEN_API_KEY") {
            builder = builder.api_key(api_key);
        }

        if let Ok(base_url) = std::env::var("COACHGEN_BASE_URL") {
            builder = builder.base_url(base_url);
        }

        if let Ok(model) = std::env::var("COACHGEN_MODEL") {
            builder = builder.model(model);
        }

        if let Ok(timeout_str) = std::env::var("COACHGEN_TIMEOUT") {
            if let Ok(timeout_secs) = timeout_str.parse::<u64>() {
                builder = builder.request_timeout(Duration::from_secs(timeout_secs));
            }
        }

        if let Ok(attempts_str) = std::env::var("COACHGEN_MAX_ATTEMPTS") {
            if let Ok(attempts) = attempts_str.parse::<u32>() {
                builder = builder.max_attempts(attempts);
            }
        }

        builder.build()
    }

    /// Returns the API token (exposing the secret), if one was supplied.
    pub(crate) fn api_key(&self) -> Option<&str> {
        self.api_key.as_ref().map(|key| key.expose_secret().as_str())
    }

    /// Returns true if an API token was supplied.
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Returns the API token hint (last 4 characters) for debugging.
    pub fn api_key_hint(&self) -> Option<String> {
        self.api_key().map(key_hint)
    }

    /// Returns the full URL for an endpoint.
    pub fn endpoint_url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

impl Default for CoachConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            presence_penalty: 0.0,
            frequency_penalty: 0.0,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            resource_timeout: DEFAULT_RESOURCE_TIMEOUT,
            retry: RetryConfig::default(),
            cache: CacheConfig::default(),
            probe: ProbeConfig::default(),
            progress: ProgressConfig::default(),
        }
    }
}

impl std::fmt::Debug for CoachConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoachConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("request_timeout", &self.request_timeout)
            .field("retry", &self.retry)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

/// Builder for `CoachConfig`.
#[derive(Default)]
pub struct CoachConfigBuilder {
    config: CoachConfig,
    api_key: Option<String>,
}

impl CoachConfigBuilder {
    /// Creates a new configuration builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API token.
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Sets the base URL.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = base_url.into();
        self
    }

    /// Sets the model identifier.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    /// Sets the sampling temperature.
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.config.temperature = temperature;
        self
    }

    /// Sets the completion token limit.
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.config.max_tokens = max_tokens;
        self
    }

    /// Sets the per-request timeout.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Sets the resource timeout.
    pub fn resource_timeout(mut self, timeout: Duration) -> Self {
        self.config.resource_timeout = timeout;
        self
    }

    /// Sets the total attempts per generation.
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.config.retry.max_attempts = attempts;
        self
    }

    /// Sets the retry settings.
    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.config.retry = retry;
        self
    }

    /// Sets the cache limits.
    pub fn cache(mut self, cache: CacheConfig) -> Self {
        self.config.cache = cache;
        self
    }

    /// Sets the probe settings.
    pub fn probe(mut self, probe: ProbeConfig) -> Self {
        self.config.probe = probe;
        self
    }

    /// Sets the progress ticker settings.
    pub fn progress(mut self, progress: ProgressConfig) -> Self {
        self.config.progress = progress;
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> CoachResult<CoachConfig> {
        let mut config = self.config;

        config.api_key = self
            .api_key
            .filter(|key| !key.trim().is_empty())
            .map(SecretString::new);
        if config.api_key.is_none() {
            tracing::warn!("No API token configured, generations will use offline templates");
        }

        config.base_url = config.base_url.trim_end_matches('/').to_string();
        validate_base_url(&config.base_url)?;

        if !(0.0..=2.0).contains(&config.temperature) {
            return Err(CoachError::configuration(
                "Temperature must be between 0.0 and 2.0",
            ));
        }

        if config.max_tokens == 0 {
            return Err(CoachError::configuration("max_tokens must be positive"));
        }

        Ok(config)
    }
}

/// Base URLs must use HTTPS, except on loopback hosts.
fn validate_base_url(base_url: &str) -> CoachResult<()> {
    let url = url::Url::parse(base_url)?;
    let loopback = matches!(url.host_str(), Some("localhost" | "127.0.0.1" | "[::1]"));

    match url.scheme() {
        "https" => Ok(()),
        "http" if loopback => Ok(()),
        _ => Err(CoachError::configuration("Base URL must use HTTPS")),
    }
}
