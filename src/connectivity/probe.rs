//! Active reachability probe.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::instrument;

use crate::errors::{CoachError, CoachResult};

/// Endpoints tried in order by default.
pub const DEFAULT_PROBE_ENDPOINTS: [&str; 3] = [
    "https://www.apple.com/library/test/success.html",
    "https://www.google.com/generate_204",
    "https://www.cloudflare.com/cdn-cgi/trace",
];

/// Probe configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeConfig {
    /// Endpoints tried in order.
    pub endpoints: Vec<String>,
    /// Hard timeout for a single endpoint.
    pub endpoint_timeout: Duration,
    /// Hard timeout for the whole probe.
    pub overall_timeout: Duration,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            endpoints: DEFAULT_PROBE_ENDPOINTS.iter().map(|s| (*s).to_string()).collect(),
            endpoint_timeout: Duration::from_secs(3),
            overall_timeout: Duration::from_secs(10),
        }
    }
}

/// Confirms or refutes passive connectivity with real requests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReachabilityProbe: Send + Sync {
    /// Returns true if any endpoint answered with a 2xx status.
    async fn probe(&self) -> bool;
}

/// Probe issuing GET requests with reqwest.
///
/// Endpoints are tried one after another and the first 2xx answer ends the
/// probe. Failures and timeouts are not errors, only a `false` answer.
pub struct HttpProbe {
    client: Client,
    config: ProbeConfig,
}

impl HttpProbe {
    /// Creates a probe, validating every endpoint URL.
    pub fn new(config: ProbeConfig) -> CoachResult<Self> {
        for endpoint in &config.endpoints {
            let url = url::Url::parse(endpoint)?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(CoachError::configuration(format!(
                    "Probe endpoint must be http(s): {endpoint}"
                )));
            }
        }

        let client = Client::builder()
            .timeout(config.endpoint_timeout)
            .connect_timeout(config.endpoint_timeout)
            .build()
            .map_err(|e| CoachError::configuration(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    async fn probe_endpoints(&self) -> bool {
        for endpoint in &self.config.endpoints {
            let result = self
                .client
                .get(endpoint)
                .timeout(self.config.endpoint_timeout)
                .send()
                .await;

            match result {
                Ok(response) if response.status().is_success() => {
                    tracing::debug!(%endpoint, "Probe succeeded");
                    return true;
                }
                Ok(response) => {
                    tracing::debug!(%endpoint, status = response.status().as_u16(), "Probe rejected");
                }
                Err(err) => {
                    tracing::debug!(%endpoint, error = %err, "Probe failed");
                }
            }
        }
        false
    }
}

#[async_trait]
impl ReachabilityProbe for HttpProbe {
    #[instrument(skip(self), fields(endpoints = self.config.endpoints.len()))]
    async fn probe(&self) -> bool {
        let reachable = tokio::time::timeout(self.config.overall_timeout, self.probe_endpoints())
            .await
            .unwrap_or(false);

        if !reachable {
            tracing::warn!("No probe endpoint reachable");
        }
        reachable
    }
}

impl std::fmt::Debug for HttpProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpProbe")
            .field("config", &self.config)
            .finish()
    }
}
