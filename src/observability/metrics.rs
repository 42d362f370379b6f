//! Generation counters.

use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time copy of [`GenerationMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Calls to `generate`.
    pub generate_calls: u64,
    /// Calls served from the cache.
    pub cache_hits: u64,
    /// Calls answered with offline template content.
    pub offline_fallbacks: u64,
    /// HTTP attempts, including retries.
    pub network_attempts: u64,
    /// Attempts that were retries of an earlier one.
    pub retries: u64,
    /// Calls that returned a document.
    pub successes: u64,
    /// Calls that returned an error.
    pub failures: u64,
}

impl MetricsSnapshot {
    /// Share of calls served without the network (cache or offline), in percent.
    pub fn local_rate(&self) -> f64 {
        if self.generate_calls == 0 {
            0.0
        } else {
            #[allow(clippy::cast_precision_loss)]
            let rate = (self.cache_hits + self.offline_fallbacks) as f64
                / self.generate_calls as f64;
            rate * 100.0
        }
    }
}

/// Lock-free counters recorded by the client.
#[derive(Debug, Default)]
pub struct GenerationMetrics {
    generate_calls: AtomicU64,
    cache_hits: AtomicU64,
    offline_fallbacks: AtomicU64,
    network_attempts: AtomicU64,
    retries: AtomicU64,
    successes: AtomicU64,
    failures: AtomicU64,
}

impl GenerationMetrics {
    /// Creates zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_call(&self) {
        self.generate_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_offline_fallback(&self) {
        self.offline_fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_attempt(&self, attempt: u32) {
        self.network_attempts.fetch_add(1, Ordering::Relaxed);
        if attempt > 0 {
            self.retries.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_outcome(&self, success: bool) {
        if success {
            self.successes.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Reads every counter.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            generate_calls: self.generate_calls.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            offline_fallbacks: self.offline_fallbacks.load(Ordering::Relaxed),
            network_attempts: self.network_attempts.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
            successes: self.successes.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }

    /// Zeroes every counter.
    pub fn reset(&self) {
        for counter in [
            &self.generate_calls,
            &self.cache_hits,
            &self.offline_fallbacks,
            &self.network_attempts,
            &self.retries,
            &self.successes,
            &self.failures,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attempts_and_retries() {
        let metrics = GenerationMetrics::new();

        metrics.record_attempt(0);
        metrics.record_attempt(1);
        metrics.record_attempt(2);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.network_attempts, 3);
        assert_eq!(snapshot.retries, 2);
    }

    #[test]
    fn test_local_rate() {
        let metrics = GenerationMetrics::new();
        assert!(metrics.snapshot().local_rate().abs() < f64::EPSILON);

        for _ in 0..4 {
            metrics.record_call();
        }
        metrics.record_cache_hit();
        metrics.record_offline_fallback();

        assert!((metrics.snapshot().local_rate() - 50.0).abs() < 0.1);
    }

    #[test]
    fn test_reset() {
        let metrics = GenerationMetrics::new();
        metrics.record_call();
        metrics.record_outcome(true);
        metrics.record_outcome(false);

        metrics.reset();

        assert_eq!(metrics.snapshot(), MetricsSnapshot::default());
    }
}
