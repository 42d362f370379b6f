//! Network reachability.
//!
//! Passive state comes from [`PathSource`]s watched by a
//! [`ConnectivityMonitor`]; when that state says offline, a
//! [`ReachabilityProbe`] issues real requests before the client commits to
//! offline behaviour.

mod monitor;
mod probe;
mod source;

pub use monitor::ConnectivityMonitor;
pub use probe::{HttpProbe, ProbeConfig, ReachabilityProbe, DEFAULT_PROBE_ENDPOINTS};
pub use source::{ManualPathSource, PathReporter, PathSource, SysfsPathSource};

#[cfg(test)]
pub use probe::MockReachabilityProbe;

use std::fmt;

/// Interface class a passive watcher is restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InterfaceClass {
    /// Wi-Fi class (unmetered local link).
    Primary,
    /// Cellular class.
    Secondary,
    /// Any interface.
    Any,
}

impl InterfaceClass {
    /// Every class, one watcher each.
    pub const ALL: [InterfaceClass; 3] = [
        InterfaceClass::Primary,
        InterfaceClass::Secondary,
        InterfaceClass::Any,
    ];
}

impl fmt::Display for InterfaceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            InterfaceClass::Primary => "primary",
            InterfaceClass::Secondary => "secondary",
            InterfaceClass::Any => "any",
        })
    }
}

/// Path status reported by a watcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PathStatus {
    /// The path can carry traffic.
    Satisfied,
    /// No usable path.
    #[default]
    Unsatisfied,
    /// A path exists but must be brought up first.
    RequiresConnection,
}

/// Aggregated passive connectivity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConnectivityState {
    /// Primary-class path is satisfied.
    pub has_primary_interface: bool,
    /// Secondary-class path is satisfied.
    pub has_secondary_interface: bool,
    /// Status of the any-interface watcher. Advisory only.
    pub aggregate_path_status: PathStatus,
}

impl ConnectivityState {
    /// Authoritative online flag: either interface class is satisfied.
    pub fn online(&self) -> bool {
        self.has_primary_interface || self.has_secondary_interface
    }

    /// Applies one watcher's report. Returns true if the state changed.
    pub(crate) fn apply(&mut self, class: InterfaceClass, status: PathStatus) -> bool {
        let before = *self;
        let satisfied = status == PathStatus::Satisfied;
        match class {
            InterfaceClass::Primary => self.has_primary_interface = satisfied,
            InterfaceClass::Secondary => self.has_secondary_interface = satisfied,
            InterfaceClass::Any => self.aggregate_path_status = status,
        }
        before != *self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_online_ignores_aggregate_status() {
        let mut state = ConnectivityState::default();
        state.apply(InterfaceClass::Any, PathStatus::Satisfied);
        assert!(!state.online());

        state.apply(InterfaceClass::Secondary, PathStatus::Satisfied);
        assert!(state.online());

        state.apply(InterfaceClass::Any, PathStatus::Unsatisfied);
        assert!(state.online());
    }

    #[test]
    fn test_requires_connection_is_not_online() {
        let mut state = ConnectivityState::default();
        assert!(state.apply(InterfaceClass::Primary, PathStatus::Satisfied));
        assert!(state.apply(InterfaceClass::Primary, PathStatus::RequiresConnection));
        assert!(!state.online());
    }

    #[test]
    fn test_apply_reports_no_change() {
        let mut state = ConnectivityState::default();
        assert!(!state.apply(InterfaceClass::Primary, PathStatus::Unsatisfied));
    }
}
