//! Passive connectivity monitor.

use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::{ConnectivityState, InterfaceClass, PathReporter, PathSource};

/// Runs one watcher per [`InterfaceClass`] over a [`PathSource`] and keeps
/// the aggregated [`ConnectivityState`] current.
///
/// Watchers stop on [`shutdown`](Self::shutdown) or when the monitor is
/// dropped.
pub struct ConnectivityMonitor {
    state: Arc<watch::Sender<ConnectivityState>>,
    cancel: CancellationToken,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl ConnectivityMonitor {
    /// Starts the watchers. Must be called from within a Tokio runtime.
    pub fn start(source: Arc<dyn PathSource>) -> Self {
        let (tx, _) = watch::channel(ConnectivityState::default());
        let state = Arc::new(tx);
        let cancel = CancellationToken::new();

        let handles = InterfaceClass::ALL
            .into_iter()
            .map(|class| {
                let source = Arc::clone(&source);
                let reporter = PathReporter::new(class, Arc::clone(&state));
                let cancel = cancel.child_token();
                tokio::spawn(async move {
                    source.run(reporter, cancel).await;
                    tracing::debug!(%class, "Path watcher stopped");
                })
            })
            .collect();

        Self {
            state,
            cancel,
            handles: Mutex::new(handles),
        }
    }

    /// Current aggregated state.
    pub fn state(&self) -> ConnectivityState {
        *self.state.borrow()
    }

    /// Passive online flag.
    pub fn is_online(&self) -> bool {
        self.state().online()
    }

    /// Subscribes to state changes.
    pub fn subscribe(&self) -> watch::Receiver<ConnectivityState> {
        self.state.subscribe()
    }

    /// Returns true until the monitor has been shut down.
    pub fn is_running(&self) -> bool {
        !self.cancel.is_cancelled()
    }

    /// Stops every watcher and waits for them to finish.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        let handles = std::mem::take(&mut *self.handles.lock());
        for handle in handles {
            if let Err(err) = handle.await {
                tracing::warn!(error = %err, "Path watcher ended abnormally");
            }
        }
    }
}

impl Drop for ConnectivityMonitor {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl std::fmt::Debug for ConnectivityMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectivityMonitor")
            .field("state", &self.state())
            .field("running", &self.is_running())
            .finish()
    }
}
