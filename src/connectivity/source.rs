//! Passive path sources.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use super::{ConnectivityState, InterfaceClass, PathStatus};

/// Handle a watcher uses to publish the status of its interface class.
#[derive(Debug, Clone)]
pub struct PathReporter {
    class: InterfaceClass,
    state: Arc<watch::Sender<ConnectivityState>>,
}

impl PathReporter {
    pub(crate) fn new(class: InterfaceClass, state: Arc<watch::Sender<ConnectivityState>>) -> Self {
        Self { class, state }
    }

    /// Interface class this reporter updates.
    pub fn class(&self) -> InterfaceClass {
        self.class
    }

    /// Publishes a status. Repeated identical reports are not re-broadcast.
    pub fn report(&self, status: PathStatus) {
        let class = self.class;
        let changed = self.state.send_if_modified(|state| state.apply(class, status));
        if changed {
            tracing::info!(%class, ?status, online = self.state.borrow().online(), "Path status changed");
        }
    }
}

/// Source of passive, interface-level path status.
///
/// `run` is started once per [`InterfaceClass`] and must keep reporting
/// transitions for that class until `cancel` fires.
#[async_trait]
pub trait PathSource: Send + Sync {
    /// Reports status transitions for `reporter.class()` until cancelled.
    async fn run(&self, reporter: PathReporter, cancel: CancellationToken);
}

/// In-process source whose statuses are set explicitly, e.g. from platform
/// callbacks delivered to the embedding application.
#[derive(Debug, Clone)]
pub struct ManualPathSource {
    primary: Arc<watch::Sender<PathStatus>>,
    secondary: Arc<watch::Sender<PathStatus>>,
    any: Arc<watch::Sender<PathStatus>>,
}

impl ManualPathSource {
    /// Creates a source with every class unsatisfied.
    pub fn new() -> Self {
        Self {
            primary: Arc::new(watch::channel(PathStatus::Unsatisfied).0),
            secondary: Arc::new(watch::channel(PathStatus::Unsatisfied).0),
            any: Arc::new(watch::channel(PathStatus::Unsatisfied).0),
        }
    }

    /// Creates a source reporting a satisfied primary path.
    pub fn online() -> Self {
        let source = Self::new();
        source.set(InterfaceClass::Primary, PathStatus::Satisfied);
        source.set(InterfaceClass::Any, PathStatus::Satisfied);
        source
    }

    /// Creates a source reporting no usable path.
    pub fn offline() -> Self {
        Self::new()
    }

    /// Sets the status of one class.
    pub fn set(&self, class: InterfaceClass, status: PathStatus) {
        self.channel(class).send_replace(status);
    }

    /// Current status of one class.
    pub fn status(&self, class: InterfaceClass) -> PathStatus {
        *self.channel(class).borrow()
    }

    fn channel(&self, class: InterfaceClass) -> &watch::Sender<PathStatus> {
        match class {
            InterfaceClass::Primary => &self.primary,
            InterfaceClass::Secondary => &self.secondary,
            InterfaceClass::Any => &self.any,
        }
    }
}

impl Default for ManualPathSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PathSource for ManualPathSource {
    async fn run(&self, reporter: PathReporter, cancel: CancellationToken) {
        let mut rx = self.channel(reporter.class()).subscribe();
        loop {
            let status = *rx.borrow_and_update();
            reporter.report(status);

            tokio::select! {
                () = cancel.cancelled() => break,
                changed = rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
    }
}

/// Default sysfs directory listing network interfaces.
pub const DEFAULT_SYSFS_NET: &str = "/sys/class/net";

/// Linux source polling `operstate` files under `/sys/class/net`.
///
/// `wl*` (wireless) and wired `en*`/`eth*` interfaces count as primary,
/// `ww*`/`rmnet*` as secondary, and every non-loopback interface as any.
/// If the directory cannot be read every class is unsatisfied.
#[derive(Debug, Clone)]
pub struct SysfsPathSource {
    root: PathBuf,
    poll_interval: Duration,
}

impl SysfsPathSource {
    /// Creates a source reading `/sys/class/net` every two seconds.
    pub fn new() -> Self {
        Self::with_root(DEFAULT_SYSFS_NET, Duration::from_secs(2))
    }

    /// Creates a source reading `root` every `poll_interval`.
    pub fn with_root(root: impl Into<PathBuf>, poll_interval: Duration) -> Self {
        Self {
            root: root.into(),
            poll_interval,
        }
    }

    /// Reads the status of one interface class.
    pub async fn read_status(&self, class: InterfaceClass) -> PathStatus {
        match read_interfaces(&self.root).await {
            Ok(interfaces) => status_for(class, &interfaces),
            Err(err) => {
                tracing::debug!(root = %self.root.display(), error = %err, "Cannot read interfaces");
                PathStatus::Unsatisfied
            }
        }
    }
}

impl Default for SysfsPathSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PathSource for SysfsPathSource {
    async fn run(&self, reporter: PathReporter, cancel: CancellationToken) {
        loop {
            reporter.report(self.read_status(reporter.class()).await);

            tokio::select! {
                () = cancel.cancelled() => break,
                () = tokio::time::sleep(self.poll_interval) => {}
            }
        }
    }
}

async fn read_interfaces(root: &Path) -> std::io::Result<Vec<(String, String)>> {
    let mut interfaces = Vec::new();
    let mut entries = tokio::fs::read_dir(root).await?;

    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        let operstate = tokio::fs::read_to_string(entry.path().join("operstate"))
            .await
            .unwrap_or_default();
        interfaces.push((name, operstate.trim().to_string()));
    }

    Ok(interfaces)
}

fn belongs_to(class: InterfaceClass, name: &str) -> bool {
    if name == "lo" {
        return false;
    }
    match class {
        InterfaceClass::Primary => ["wl", "en", "eth"].iter().any(|p| name.starts_with(p)),
        InterfaceClass::Secondary => ["ww", "rmnet"].iter().any(|p| name.starts_with(p)),
        InterfaceClass::Any => true,
    }
}

fn status_for(class: InterfaceClass, interfaces: &[(String, String)]) -> PathStatus {
    let states: Vec<&str> = interfaces
        .iter()
        .filter(|(name, _)| belongs_to(class, name))
        .map(|(_, state)| state.as_str())
        .collect();

    if states.contains(&"up") {
        PathStatus::Satisfied
    } else if states.contains(&"dormant") {
        PathStatus::RequiresConnection
    } else {
        PathStatus::Unsatisfied
    }
}
