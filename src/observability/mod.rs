//! Observability: logging setup, secret redaction and generation counters.
//!
//! The client itself only emits `tracing` events; installing a subscriber is
//! left to the application, optionally through [`init_logging`].

mod logging;
mod metrics;

pub(crate) use logging::body_excerpt;
pub use logging::{init_logging, redact, LogFormat, LogLevel, LoggingConfig};
pub use metrics::{GenerationMetrics, MetricsSnapshot};
