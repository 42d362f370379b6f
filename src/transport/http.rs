//! HTTP transport implementation.

use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use std::collections::HashMap;
use std::time::Duration;
use tracing::instrument;

use super::TransportError;

/// POST request representation.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// Request path, relative to the transport's base URL.
    pub path: String,
    /// Request headers.
    pub headers: HashMap<String, String>,
    /// Request body.
    pub body: Option<Vec<u8>>,
    /// Request timeout override.
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    /// Creates a new POST request.
    pub fn post(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            headers: HashMap::new(),
            body: None,
            timeout: None,
        }
    }

    /// Sets the request body.
    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    /// Sets a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// HTTP response representation.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers, with lower-cased names.
    pub headers: HashMap<String, String>,
    /// Response body.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Returns true if the status indicates success (2xx).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Parses the body as JSON.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

/// HTTP transport trait.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send an HTTP request.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// HTTP transport implementation using reqwest.
pub struct HttpTransportImpl {
    client: Client,
    base_url: String,
    request_timeout: Duration,
}

impl HttpTransportImpl {
    /// Creates a new HTTP transport.
    ///
    /// `resource_timeout` bounds the whole exchange and connection setup;
    /// `request_timeout` is applied to each request unless it carries its own.
    pub fn new(
        base_url: impl Into<String>,
        request_timeout: Duration,
        resource_timeout: Duration,
    ) -> Result<Self, TransportError> {
        let client = ClientBuilder::new()
            .timeout(resource_timeout)
            .connect_timeout(resource_timeout)
            .pool_max_idle_per_host(4)
            .tcp_keepalive(Duration::from_secs(60))
            .build()
            .map_err(|e| TransportError::Connection {
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            request_timeout,
        })
    }

    /// Builds the full URL for a path.
    fn build_url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[async_trait]
impl HttpTransport for HttpTransportImpl {
    #[instrument(skip(self, request), fields(path = %request.path))]
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let url = self.build_url(&request.path);
        let timeout = request.timeout.unwrap_or(self.request_timeout);

        let mut req_builder = self.client.post(&url);

        for (name, value) in &request.headers {
            req_builder = req_builder.header(name, value);
        }

        if let Some(body) = request.body {
            req_builder = req_builder.body(body);
        }

        let response = req_builder
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify_reqwest_error(&e, timeout))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(k, v)| {
                (
                    k.as_str().to_ascii_lowercase(),
                    v.to_str().unwrap_or_default().to_string(),
                )
            })
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(|e| classify_reqwest_error(&e, timeout))?
            .to_vec();

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn classify_reqwest_error(err: &reqwest::Error, timeout: Duration) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout { timeout }
    } else if err.is_connect() || err.is_request() {
        TransportError::Connection {
            message: err.to_string(),
        }
    } else {
        TransportError::InvalidResponse {
            message: err.to_string(),
        }
    }
}

impl std::fmt::Debug for HttpTransportImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransportImpl")
            .field("base_url", &self.base_url)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_url_joins_segments() {
        let transport = HttpTransportImpl::new(
            "https://api.example.com/v1/",
            Duration::from_secs(30),
            Duration::from_secs(60),
        )
        .unwrap();

        assert_eq!(
            transport.build_url("/chat/completions"),
            "https://api.example.com/v1/chat/completions"
        );
    }

    #[test]
    fn test_response_success_range() {
        let ok = HttpResponse {
            status: 204,
            headers: HashMap::new(),
            body: Vec::new(),
        };
        let limited = HttpResponse {
            status: 429,
            ..ok.clone()
        };

        assert!(ok.is_success());
        assert!(!limited.is_success());
    }

    #[test]
    fn test_request_builder_helpers() {
        let request = HttpRequest::post("chat/completions")
            .with_header("Content-Type", "application/json")
            .with_body(b"{}".to_vec())
            .with_timeout(Duration::from_secs(5));

        assert_eq!(request.path, "chat/completions");
        assert_eq!(request.headers.get("Content-Type").unwrap(), "application/json");
        assert_eq!(request.timeout, Some(Duration::from_secs(5)));
    }
}
