//! Coachgen Client Library
//!
//! A resilient client that turns free-form training prompts into structured
//! workout documents. Generated text comes from an OpenAI-compatible chat
//! completions endpoint; when the network is unavailable, or no API token is
//! configured, built-in templates are used instead.
//!
//! # Features
//!
//! - **Caching**: prompt-keyed responses with entry and age limits
//! - **Connectivity**: passive interface watchers confirmed by an active probe
//! - **Offline fallback**: category templates selected by prompt keywords
//! - **Resilience**: bounded retries with a fixed backoff for transient errors
//! - **Progress**: a monotonic `[0, 1]` observable that always ends at 1.0
//! - **Structured output**: day headers, focus lines, subheadings and details
//! - **Observability**: `tracing` spans and events, plus generation counters
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use coachgen_client::{GenerationClient, SectionKind};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = GenerationClient::builder()
//!         .api_key("sk-your-api-key")
//!         .build()?;
//!
//!     let mut progress = client.progress();
//!     tokio::spawn(async move {
//!         while progress.changed().await.is_ok() {
//!             println!("{:.0}%", *progress.borrow() * 100.0);
//!         }
//!     });
//!
//!     let document = client.generate("Six week 1500m build").await?;
//!     for day in document.days() {
//!         println!("{day}");
//!     }
//!     if client.is_offline() {
//!         println!("(offline template)");
//!     }
//!
//!     client.shutdown().await;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod auth;
pub mod cache;
pub mod client;
pub mod config;
pub mod connectivity;
pub mod errors;
pub mod observability;
pub mod offline;
pub mod parser;
pub mod progress;
pub mod resilience;
pub mod transport;
pub mod types;

// Re-exports for convenience
pub use client::{GenerationClient, GenerationClientBuilder};
pub use config::{CoachConfig, CoachConfigBuilder};
pub use errors::{CoachError, CoachResult};

pub use cache::{CacheConfig, ResponseCache};
pub use connectivity::{
    ConnectivityMonitor, ConnectivityState, HttpProbe, InterfaceClass, ManualPathSource,
    PathSource, PathStatus, ProbeConfig, ReachabilityProbe, SysfsPathSource,
};
pub use offline::{Category, OfflineTemplateProvider};
pub use parser::{ContentParser, Section, SectionKind, StructuredDocument};
pub use progress::{ProgressConfig, ProgressGuard, ProgressReporter};
pub use resilience::{RetryConfig, RetryPolicy};

/// Mock implementations for testing.
#[cfg(any(test, feature = "mocks"))]
pub mod mocks;
