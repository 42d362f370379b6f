//! Generation client.
//!
//! Orchestrates one generation: cache lookup, the connectivity decision,
//! request construction, bounded retry with error classification, progress
//! reporting and the final parse.

use secrecy::SecretString;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::instrument;
use uuid::Uuid;

use crate::auth::{AuthProvider, BearerTokenAuth};
use crate::cache::ResponseCache;
use crate::config::CoachConfig;
use crate::connectivity::{
    ConnectivityMonitor, HttpProbe, PathSource, ReachabilityProbe, SysfsPathSource,
};
use crate::errors::{ApiErrorResponse, CoachError, CoachResult};
use crate::observability::{body_excerpt, redact, GenerationMetrics};
use crate::offline::{classify, OfflineTemplateProvider};
use crate::parser::{ContentParser, StructuredDocument};
use crate::progress::ProgressReporter;
use crate::resilience::RetryPolicy;
use crate::transport::{HttpRequest, HttpResponse, HttpTransport, HttpTransportImpl};
use crate::types::{ChatMessage, ChatRequest, ChatResponse};

/// Path of the chat completions endpoint, relative to the base URL.
pub const CHAT_COMPLETIONS_PATH: &str = "chat/completions";

const ERROR_EXCERPT_LEN: usize = 200;

type ProgressObserver = Arc<dyn Fn(f64) + Send + Sync>;

/// Turns prompts into structured training documents.
///
/// Prompts are answered from the cache when possible, from the remote
/// provider when the network is reachable, and from built-in templates
/// otherwise. Distinct prompts may be generated concurrently through a shared
/// reference; nothing serializes them.
///
/// # Example
///
/// ```rust,no_run
/// use coachgen_client::GenerationClient;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = GenerationClient::builder()
///         .api_key("sk-your-api-key")
///         .build()?;
///
///     let document = client.generate("4 week 800m plan").await?;
///     for section in &document {
///         println!("{:?}: {}", section.kind, section.text);
///     }
///
///     client.shutdown().await;
///     Ok(())
/// }
/// ```
pub struct GenerationClient {
    config: CoachConfig,
    transport: Arc<dyn HttpTransport>,
    auth: Option<Arc<dyn AuthProvider>>,
    probe: Arc<dyn ReachabilityProbe>,
    monitor: ConnectivityMonitor,
    cache: ResponseCache,
    retry: RetryPolicy,
    progress: ProgressReporter,
    offline: watch::Sender<bool>,
    metrics: GenerationMetrics,
    templates: OfflineTemplateProvider,
    parser: ContentParser,
}

impl GenerationClient {
    /// Creates a new client builder.
    pub fn builder() -> GenerationClientBuilder {
        GenerationClientBuilder::new()
    }

    /// Creates a client from environment variables.
    ///
    /// See [`CoachConfig::from_env`] for the variables read.
    pub fn from_env() -> CoachResult<Self> {
        GenerationClientBuilder::new()
            .config(CoachConfig::from_env()?)
            .build()
    }

    /// Generates a document for `prompt`, reporting through the client-wide
    /// progress observable.
    ///
    /// Being offline is not an error: the built-in template for the prompt's
    /// category is returned instead.
    pub async fn generate(&self, prompt: &str) -> CoachResult<StructuredDocument> {
        self.run(prompt, &self.progress).await
    }

    /// Like [`generate`](Self::generate), reporting through `reporter`
    /// instead of the client-wide observable.
    pub async fn generate_with_progress(
        &self,
        prompt: &str,
        reporter: &ProgressReporter,
    ) -> CoachResult<StructuredDocument> {
        self.run(prompt, reporter).await
    }

    #[instrument(
        name = "generate",
        skip(self, prompt, reporter),
        fields(generation_id = %Uuid::new_v4(), prompt_len = prompt.len())
    )]
    async fn run(&self, prompt: &str, reporter: &ProgressReporter) -> CoachResult<StructuredDocument> {
        self.metrics.record_call();
        // Dropped on every return path, which stops the ticker and completes
        // this call on the reporter.
        let progress = reporter.begin();

        if let Some(text) = self.cache.get(prompt) {
            tracing::debug!("Cache hit");
            self.metrics.record_cache_hit();
            self.metrics.record_outcome(true);
            return Ok(self.parser.parse(&text));
        }

        let Some(auth) = self.auth.as_deref() else {
            return Ok(self.offline_document(prompt, "no API token"));
        };

        if !self.is_reachable().await {
            return Ok(self.offline_document(prompt, "network unreachable"));
        }
        self.set_offline(false);

        progress.start_ticking();

        let result = match self.request_body(prompt) {
            Ok(body) => {
                let body = body.as_slice();
                self.retry
                    .execute(move |attempt| self.dispatch(auth, body, attempt))
                    .await
            }
            Err(err) => Err(err),
        };

        match result {
            Ok(text) => {
                self.cache.put(prompt, text.as_str());
                self.metrics.record_outcome(true);
                tracing::info!(chars = text.len(), "Generation succeeded");
                Ok(self.parser.parse(&text))
            }
            Err(err) => {
                self.metrics.record_outcome(false);
                tracing::warn!(error = %err, kind = err.kind(), "Generation failed");
                Err(err)
            }
        }
    }

    /// Passive state first; the active probe only runs when it says offline.
    async fn is_reachable(&self) -> bool {
        if self.monitor.is_online() {
            return true;
        }
        tracing::debug!("Passive state offline, probing");
        self.probe.probe().await
    }

    fn offline_document(&self, prompt: &str, reason: &str) -> StructuredDocument {
        let category = classify(prompt);
        tracing::warn!(reason, %category, "Using offline template");

        self.set_offline(true);
        self.metrics.record_offline_fallback();
        self.metrics.record_outcome(true);
        self.parser.parse(self.templates.template(category))
    }

    fn set_offline(&self, offline: bool) {
        self.offline.send_if_modified(|current| {
            let changed = *current != offline;
            *current = offline;
            changed
        });
    }

    fn request_body(&self, prompt: &str) -> CoachResult<Vec<u8>> {
        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage::system(classify(prompt).system_prompt()),
                ChatMessage::user(prompt),
            ],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            presence_penalty: self.config.presence_penalty,
            frequency_penalty: self.config.frequency_penalty,
        };

        serde_json::to_vec(&request).map_err(|e| CoachError::Serialization {
            message: e.to_string(),
        })
    }

    async fn dispatch(
        &self,
        auth: &dyn AuthProvider,
        body: &[u8],
        attempt: u32,
    ) -> CoachResult<String> {
        self.metrics.record_attempt(attempt);

        let mut request = HttpRequest::post(CHAT_COMPLETIONS_PATH)
            .with_header("Content-Type", "application/json")
            .with_body(body.to_vec())
            .with_timeout(self.config.request_timeout);
        auth.apply_auth(&mut request.headers);

        let response = self.transport.send(request).await?;
        tracing::debug!(attempt, status = response.status, "Response received");
        classify_response(&response)
    }

    /// Subscribes to the client-wide progress observable.
    pub fn progress(&self) -> watch::Receiver<f64> {
        self.progress.subscribe()
    }

    /// Returns true if the last generation was routed to offline templates.
    pub fn is_offline(&self) -> bool {
        *self.offline.borrow()
    }

    /// Subscribes to the offline flag.
    pub fn offline_status(&self) -> watch::Receiver<bool> {
        self.offline.subscribe()
    }

    /// Returns true if an auth provider is configured.
    pub fn has_credentials(&self) -> bool {
        self.auth.is_some()
    }

    /// Returns the passive connectivity monitor.
    pub fn connectivity(&self) -> &ConnectivityMonitor {
        &self.monitor
    }

    /// Returns the response cache.
    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    /// Returns the generation counters.
    pub fn metrics(&self) -> &GenerationMetrics {
        &self.metrics
    }

    /// Returns the configuration.
    pub fn config(&self) -> &CoachConfig {
        &self.config
    }

    /// Stops the connectivity watchers and waits for them to exit.
    ///
    /// Generations started afterwards rely on the active probe alone.
    pub async fn shutdown(&self) {
        self.monitor.shutdown().await;
        tracing::debug!("Generation client shut down");
    }
}

impl std::fmt::Debug for GenerationClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationClient")
            .field("config", &self.config)
            .field("connectivity", &self.monitor)
            .field("offline", &self.is_offline())
            .field("cached", &self.cache.len())
            .finish_non_exhaustive()
    }
}

/// Maps an HTTP response to generated text or a classified error.
fn classify_response(response: &HttpResponse) -> CoachResult<String> {
    match response.status {
        200..=299 => {
            let decoded: ChatResponse = response
                .json()
                .map_err(|e| CoachError::invalid_response(format!("Undecodable body: {e}")))?;
            decoded
                .content()
                .map(str::to_string)
                .ok_or_else(|| CoachError::invalid_response("Response held no message content"))
        }
        401 => Err(CoachError::Authentication {
            message: error_message(response, "Invalid or missing API token"),
        }),
        429 => Err(CoachError::RateLimit {
            message: error_message(response, "Too many requests"),
            retry_after: retry_after(response),
        }),
        500..=599 => Err(CoachError::Server {
            message: error_message(response, "Server error"),
            status_code: response.status,
        }),
        status => Err(CoachError::UnexpectedStatus {
            status,
            message: error_message(response, "Unexpected response"),
        }),
    }
}

fn error_message(response: &HttpResponse, fallback: &str) -> String {
    if let Ok(envelope) = response.json::<ApiErrorResponse>() {
        return redact(&envelope.error.message);
    }
    let excerpt = body_excerpt(&response.body, ERROR_EXCERPT_LEN);
    if excerpt.trim().is_empty() {
        fallback.to_string()
    } else {
        excerpt
    }
}

fn retry_after(response: &HttpResponse) -> Option<Duration> {
    response
        .headers
        .get("retry-after")
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// Builder for the generation client.
///
/// Every collaborator has a production default: the reqwest transport, a
/// bearer token from the configured API key, the HTTP probe and the sysfs
/// path source.
#[derive(Default)]
pub struct GenerationClientBuilder {
    config: CoachConfig,
    api_key: Option<String>,
    transport: Option<Arc<dyn HttpTransport>>,
    auth: Option<Arc<dyn AuthProvider>>,
    probe: Option<Arc<dyn ReachabilityProbe>>,
    path_source: Option<Arc<dyn PathSource>>,
    progress_observer: Option<ProgressObserver>,
}

impl GenerationClientBuilder {
    /// Creates a new client builder with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the configuration.
    pub fn config(mut self, config: CoachConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the API token, overriding the configured one.
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Sets a custom transport.
    pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Sets a custom auth provider.
    pub fn auth(mut self, auth: Arc<dyn AuthProvider>) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Sets a custom reachability probe.
    pub fn probe(mut self, probe: Arc<dyn ReachabilityProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    /// Sets the source of passive path updates.
    pub fn path_source(mut self, source: Arc<dyn PathSource>) -> Self {
        self.path_source = Some(source);
        self
    }

    /// Registers a callback for the client-wide progress observable.
    pub fn progress_observer<F>(mut self, observer: F) -> Self
    where
        F: Fn(f64) + Send + Sync + 'static,
    {
        self.progress_observer = Some(Arc::new(observer));
        self
    }

    /// Builds the client and starts the connectivity watchers.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn build(self) -> CoachResult<GenerationClient> {
        if tokio::runtime::Handle::try_current().is_err() {
            return Err(CoachError::configuration(
                "GenerationClient must be built inside a Tokio runtime",
            ));
        }

        let mut config = self.config;
        if let Some(key) = self.api_key {
            if key.trim().is_empty() {
                tracing::warn!("Ignoring empty API token");
            } else {
                config.api_key = Some(SecretString::new(key));
            }
        }

        let transport: Arc<dyn HttpTransport> = match self.transport {
            Some(t) => t,
            None => Arc::new(
                HttpTransportImpl::new(
                    &config.base_url,
                    config.request_timeout,
                    config.resource_timeout,
                )
                .map_err(|e| CoachError::configuration(e.to_string()))?,
            ),
        };

        let auth = self
            .auth
            .or_else(|| {
                config
                    .api_key()
                    .map(|key| Arc::new(BearerTokenAuth::from_string(key)) as Arc<dyn AuthProvider>)
            })
            .filter(|auth| match auth.validate() {
                Ok(()) => true,
                Err(err) => {
                    tracing::warn!(error = %err, "Discarding unusable credentials");
                    false
                }
            });
        if auth.is_none() {
            tracing::info!("No API token configured, generations will use offline templates");
        }

        let probe: Arc<dyn ReachabilityProbe> = match self.probe {
            Some(p) => p,
            None => Arc::new(HttpProbe::new(config.probe.clone())?),
        };

        let path_source = self
            .path_source
            .unwrap_or_else(|| Arc::new(SysfsPathSource::new()));

        let mut progress = ProgressReporter::new(config.progress.clone());
        if let Some(observer) = self.progress_observer {
            progress = progress.with_observer(move |value| observer(value));
        }

        let (offline, _) = watch::channel(false);

        Ok(GenerationClient {
            cache: ResponseCache::new(config.cache.clone()),
            retry: RetryPolicy::new(config.retry.clone()),
            monitor: ConnectivityMonitor::start(path_source),
            config,
            transport,
            auth,
            probe,
            progress,
            offline,
            metrics: GenerationMetrics::new(),
            templates: OfflineTemplateProvider::new(),
            parser: ContentParser::new(),
        })
    }
}
