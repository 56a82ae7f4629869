//! Relapse detection over live process and window state.
//!
//! Two independent checks:
//! - **Website trigger**: a Chromium browser window whose title contains a
//!   configured keyword. Only titles are inspected, so browser apps that do
//!   not match (music players, docs) are left alone.
//! - **App trigger**: a configured non-browser process is running.
//!
//! Browser executables are never matched by process name; a running browser
//! alone is not a relapse. Process names compare case-insensitively with any
//! `.exe` suffix dropped, so Windows and Unix names line up.
//!
//! Every call is a fresh snapshot. Nothing is cached.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::os::OsQuery;

/// Chromium-family browsers whose window titles are checked for trigger sites.
pub const CHROMIUM_BROWSERS: &[&str] = &["chrome.exe", "msedge.exe"];

/// Lower-cased process name without a trailing `.exe`, so Windows image
/// names and Unix command names compare equal.
fn process_key(name: &str) -> String {
    let name = name.trim().to_lowercase();
    match name.strip_suffix(".exe") {
        Some(stem) => stem.to_string(),
        None => name,
    }
}

fn is_browser(key: &str) -> bool {
    CHROMIUM_BROWSERS
        .iter()
        .any(|browser| process_key(browser) == key)
}

/// What re-raised the alarm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Relapse {
    /// A browser window title matched `keyword`.
    Site { keyword: String, title: String },
    /// A trigger process named `process` is running.
    App { process: String },
}

#[derive(Debug, Clone)]
pub struct TriggerDetector<Q> {
    query: Q,
}

impl<Q: OsQuery> TriggerDetector<Q> {
    pub fn new(query: Q) -> Self {
        Self { query }
    }

    /// Is any trigger site open in a browser window?
    pub fn is_trigger_site_open(&self, sites: &[String]) -> bool {
        self.find_trigger_site(sites).is_some()
    }

    /// Is any non-browser trigger app running?
    pub fn is_trigger_app_running(&self, apps: &[String]) -> bool {
        self.find_trigger_app(apps).is_some()
    }

    /// Does any visible window title contain `app_name` (case-insensitive)?
    ///
    /// Used to avoid launching an app twice. Matching a file stem against
    /// window titles is a heuristic; an app whose title differs from its
    /// executable name is not found.
    pub fn is_app_window_open(&self, app_name: &str) -> bool {
        let needle = app_name.trim().to_lowercase();
        if needle.is_empty() {
            return false;
        }
        self.query
            .list_visible_windows(None)
            .iter()
            .any(|w| w.title.to_lowercase().contains(&needle))
    }

    /// Run the website check, then the app check.
    pub fn find_relapse(&self, sites: &[String], apps: &[String]) -> Option<Relapse> {
        self.find_trigger_site(sites)
            .or_else(|| self.find_trigger_app(apps))
    }

    fn find_trigger_site(&self, sites: &[String]) -> Option<Relapse> {
        let keywords: Vec<String> = sites
            .iter()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();
        if keywords.is_empty() {
            return None;
        }

        let browser_pids: HashSet<u32> = self
            .query
            .list_processes()
            .into_iter()
            .filter(|p| is_browser(&process_key(&p.name)))
            .map(|p| p.pid)
            .collect();
        if browser_pids.is_empty() {
            return None;
        }

        self.query
            .list_visible_windows(Some(&browser_pids))
            .into_iter()
            .find_map(|window| {
                let title = window.title.to_lowercase();
                keywords
                    .iter()
                    .find(|kw| title.contains(kw.as_str()))
                    .map(|kw| Relapse::Site {
                        keyword: kw.clone(),
                        title: window.title.clone(),
                    })
            })
    }

    fn find_trigger_app(&self, apps: &[String]) -> Option<Relapse> {
        let targets: HashSet<String> = apps
            .iter()
            .map(|a| process_key(a))
            .filter(|a| !a.is_empty() && !is_browser(a))
            .collect();
        if targets.is_empty() {
            return None;
        }

        self.query.list_processes().into_iter().find_map(|p| {
            targets
                .contains(&process_key(&p.name))
                .then(|| Relapse::App {
                    process: p.name.to_lowercase(),
                })
        })
    }
}
