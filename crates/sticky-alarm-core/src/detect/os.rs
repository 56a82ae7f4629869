//! OS query contract used by trigger detection.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessInfo {
    pub name: String,
    pub pid: u32,
}

/// A visible top-level window and the process that owns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowInfo {
    pub title: String,
    pub pid: u32,
}

/// Snapshot queries against the running system.
///
/// Implementations must tolerate per-item failures (a process exiting
/// mid-scan, access denied) by leaving the item out. They never fail as a
/// whole: no data means an empty list.
pub trait OsQuery {
    fn list_processes(&self) -> Vec<ProcessInfo>;

    /// Visible windows with a non-empty title. When `filter_pids` is given,
    /// only windows owned by one of those processes are returned.
    fn list_visible_windows(&self, filter_pids: Option<&HashSet<u32>>) -> Vec<WindowInfo>;
}

impl<Q: OsQuery + ?Sized> OsQuery for &Q {
    fn list_processes(&self) -> Vec<ProcessInfo> {
        (**self).list_processes()
    }

    fn list_visible_windows(&self, filter_pids: Option<&HashSet<u32>>) -> Vec<WindowInfo> {
        (**self).list_visible_windows(filter_pids)
    }
}
