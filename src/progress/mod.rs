//! Progress reporting for in-flight generations.
//!
//! A [`ProgressReporter`] publishes a value in `[0.0, 1.0]` through a
//! `watch` channel and an optional observer callback. Each call to
//! [`ProgressReporter::begin`] registers a generation and returns a
//! [`ProgressGuard`]; the guard may start a ticker that raises that
//! generation's own value by a fixed step on a fixed interval up to a cap.
//!
//! Generations sharing a reporter are aggregated: the first one to begin
//! resets the published value to 0.0, the published value follows the
//! slowest generation still in flight and never decreases, and 1.0 is
//! published once the last guard is dropped.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Progress ticker settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressConfig {
    /// Amount added on every tick.
    pub step: f64,
    /// Time between ticks.
    pub interval: Duration,
    /// Highest value reached while waiting.
    pub cap: f64,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            step: 0.05,
            interval: Duration::from_millis(200),
            cap: 0.95,
        }
    }
}

type Observer = Arc<dyn Fn(f64) + Send + Sync>;

/// Generations currently holding a guard, with their own progress.
#[derive(Debug, Default)]
struct InFlight {
    next_id: u64,
    calls: Vec<(u64, f64)>,
}

impl InFlight {
    fn slowest(&self) -> Option<f64> {
        self.calls.iter().map(|(_, value)| *value).reduce(f64::min)
    }
}

#[derive(Debug)]
struct Shared {
    tx: watch::Sender<f64>,
    // Publication happens under this lock, never under the channel's, so
    // observers may read the channel.
    in_flight: Mutex<InFlight>,
}

/// Publishes aggregated progress for the generations using it.
#[derive(Clone)]
pub struct ProgressReporter {
    shared: Arc<Shared>,
    observer: Option<Observer>,
    config: ProgressConfig,
}

impl ProgressReporter {
    /// Creates a reporter starting at 0.0.
    pub fn new(config: ProgressConfig) -> Self {
        let (tx, _) = watch::channel(0.0);
        Self {
            shared: Arc::new(Shared {
                tx,
                in_flight: Mutex::new(InFlight::default()),
            }),
            observer: None,
            config,
        }
    }

    /// Registers a callback invoked with every value this reporter publishes.
    ///
    /// The callback may read the observable. It must not start or finish a
    /// generation on the same reporter.
    pub fn with_observer<F>(mut self, observer: F) -> Self
    where
        F: Fn(f64) + Send + Sync + 'static,
    {
        self.observer = Some(Arc::new(observer));
        self
    }

    /// Subscribes to published values.
    pub fn subscribe(&self) -> watch::Receiver<f64> {
        self.shared.tx.subscribe()
    }

    /// Current value.
    pub fn current(&self) -> f64 {
        *self.shared.tx.borrow()
    }

    /// Number of generations currently holding a guard.
    pub fn in_flight(&self) -> usize {
        self.shared.in_flight.lock().calls.len()
    }

    /// Registers a generation and returns its guard.
    ///
    /// Resets the published value to 0.0 when no other generation is in
    /// flight.
    pub fn begin(&self) -> ProgressGuard {
        let mut in_flight = self.shared.in_flight.lock();
        if in_flight.calls.is_empty() {
            self.publish(0.0);
        }
        let id = in_flight.next_id;
        in_flight.next_id += 1;
        in_flight.calls.push((id, 0.0));
        drop(in_flight);

        ProgressGuard {
            reporter: self.clone(),
            id,
            cancel: CancellationToken::new(),
        }
    }

    /// Adds one step to generation `id`, never exceeding the cap.
    fn tick(&self, id: u64) {
        let ProgressConfig { step, cap, .. } = self.config;
        let mut in_flight = self.shared.in_flight.lock();
        let Some((_, value)) = in_flight.calls.iter_mut().find(|(call, _)| *call == id) else {
            return;
        };
        if *value >= cap {
            return;
        }
        *value = (*value + step).min(cap);
        self.raise_to_slowest(&in_flight);
    }

    fn finish(&self, id: u64) {
        let mut in_flight = self.shared.in_flight.lock();
        in_flight.calls.retain(|(call, _)| *call != id);
        if in_flight.calls.is_empty() {
            if self.current() < 1.0 {
                self.publish(1.0);
            }
        } else {
            self.raise_to_slowest(&in_flight);
        }
    }

    fn raise_to_slowest(&self, in_flight: &InFlight) {
        if let Some(slowest) = in_flight.slowest() {
            if slowest > self.current() {
                self.publish(slowest);
            }
        }
    }

    // Callers hold the in-flight lock, so observers see values in
    // publication order.
    fn publish(&self, value: f64) {
        let value = value.clamp(0.0, 1.0);
        self.shared.tx.send_replace(value);
        if let Some(observer) = &self.observer {
            observer(value);
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new(ProgressConfig::default())
    }
}

impl std::fmt::Debug for ProgressReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressReporter")
            .field("current", &self.current())
            .field("in_flight", &self.in_flight())
            .field("config", &self.config)
            .finish()
    }
}

/// Scope of one generation's progress. Dropping it completes the generation.
#[derive(Debug)]
pub struct ProgressGuard {
    reporter: ProgressReporter,
    id: u64,
    cancel: CancellationToken,
}

impl ProgressGuard {
    /// Spawns this generation's ticker. It stops when the guard is dropped.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start_ticking(&self) {
        let reporter = self.reporter.clone();
        let id = self.id;
        let cancel = self.cancel.clone();
        let interval = reporter.config.interval;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                tokio::select! {
                    () = cancel.cancelled() => break,
                    _ = ticker.tick() => reporter.tick(id),
                }
            }
        });
    }
}

impl Drop for ProgressGuard {
    fn drop(&mut self) {
        self.cancel.cancel();
        self.reporter.finish(self.id);
    }
}
