//! In-memory [`OsQuery`] whose process and window lists are set by hand.
//!
//! Clones share the same script, so a test can keep one handle and change
//! what the system "looks like" between ticks of an orchestrator that owns
//! another.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use super::os::{OsQuery, ProcessInfo, WindowInfo};

#[derive(Debug, Default)]
struct Script {
    processes: Vec<ProcessInfo>,
    windows: Vec<WindowInfo>,
    next_pid: u32,
}

#[derive(Debug, Clone, Default)]
pub struct ScriptedQuery {
    script: Arc<Mutex<Script>>,
}

impl ScriptedQuery {
    pub fn new() -> Self {
        Self::default()
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        // A poisoned script only means another test thread panicked.
        self.script.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Start a process and return its pid.
    pub fn spawn(&self, name: &str) -> u32 {
        let mut script = self.script();
        script.next_pid += 1;
        let pid = script.next_pid;
        script.processes.push(ProcessInfo {
            name: name.to_string(),
            pid,
        });
        pid
    }

    /// Open a visible window owned by `pid`.
    pub fn open_window(&self, pid: u32, title: &str) {
        self.script().windows.push(WindowInfo {
            title: title.to_string(),
            pid,
        });
    }

    /// Start a process with one window.
    pub fn spawn_with_window(&self, name: &str, title: &str) -> u32 {
        let pid = self.spawn(name);
        self.open_window(pid, title);
        pid
    }

    /// Terminate a process and close its windows.
    pub fn kill(&self, pid: u32) {
        let mut script = self.script();
        script.processes.retain(|p| p.pid != pid);
        script.windows.retain(|w| w.pid != pid);
    }

    pub fn clear(&self) {
        let mut script = self.script();
        script.processes.clear();
        script.windows.clear();
    }
}

impl OsQuery for ScriptedQuery {
    fn list_processes(&self) -> Vec<ProcessInfo> {
        self.script().processes.clone()
    }

    fn list_visible_windows(&self, filter_pids: Option<&HashSet<u32>>) -> Vec<WindowInfo> {
        self.script()
            .windows
            .iter()
            .filter(|w| filter_pids.map_or(true, |pids| pids.contains(&w.pid)))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_script() {
        let query = ScriptedQuery::new();
        let handle = query.clone();
        let pid = handle.spawn_with_window("game.exe", "Game");
        assert_eq!(query.list_processes().len(), 1);

        handle.kill(pid);
        assert!(query.list_processes().is_empty());
        assert!(query.list_visible_windows(None).is_empty());
    }

    #[test]
    fn window_filter_by_pid() {
        let query = ScriptedQuery::new();
        let a = query.spawn_with_window("a.exe", "A");
        query.spawn_with_window("b.exe", "B");

        let only_a: HashSet<u32> = [a].into_iter().collect();
        let windows = query.list_visible_windows(Some(&only_a));
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].title, "A");
        assert_eq!(query.list_visible_windows(None).len(), 2);
    }
}
