//! Live [`OsQuery`] backed by the running system.
//!
//! On Windows, processes come from a ToolHelp snapshot and windows from
//! `EnumWindows`. On Linux, processes are read from `/proc`; there is no
//! portable top-level window list, so no windows are reported and the
//! title-based checks answer "not found". Other platforms report nothing.

use std::collections::HashSet;

use super::os::{OsQuery, ProcessInfo, WindowInfo};

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemQuery;

impl SystemQuery {
    pub fn new() -> Self {
        Self
    }
}

impl OsQuery for SystemQuery {
    fn list_processes(&self) -> Vec<ProcessInfo> {
        platform::processes()
    }

    fn list_visible_windows(&self, filter_pids: Option<&HashSet<u32>>) -> Vec<WindowInfo> {
        platform::visible_windows(filter_pids)
    }
}

#[cfg(windows)]
mod platform {
    use std::collections::HashSet;

    use tracing::warn;
    use windows::Win32::Foundation::{CloseHandle, BOOL, HWND, LPARAM};
    use windows::Win32::System::Diagnostics::ToolHelp::{
        CreateToolhelp32Snapshot, Process32FirstW, Process32NextW, PROCESSENTRY32W,
        TH32CS_SNAPPROCESS,
    };
    use windows::Win32::UI::WindowsAndMessaging::{
        EnumWindows, GetWindowTextLengthW, GetWindowTextW, GetWindowThreadProcessId,
        IsWindowVisible,
    };

    use super::{ProcessInfo, WindowInfo};

    fn from_wide(buf: &[u16]) -> String {
        let len = buf.iter().position(|&c| c == 0).unwrap_or(buf.len());
        String::from_utf16_lossy(&buf[..len])
    }

    pub fn processes() -> Vec<ProcessInfo> {
        // SAFETY: plain snapshot call; the handle is closed below.
        let snapshot = match unsafe { CreateToolhelp32Snapshot(TH32CS_SNAPPROCESS, 0) } {
            Ok(handle) => handle,
            Err(err) => {
                warn!(%err, "process snapshot failed");
                return Vec::new();
            }
        };

        let mut entry = PROCESSENTRY32W {
            dwSize: std::mem::size_of::<PROCESSENTRY32W>() as u32,
            ..Default::default()
        };
        let mut processes = Vec::new();

        // SAFETY: `entry` is a properly sized PROCESSENTRY32W owned by this frame.
        let mut more = unsafe { Process32FirstW(snapshot, &mut entry) }.is_ok();
        while more {
            let name = from_wide(&entry.szExeFile);
            if !name.is_empty() {
                processes.push(ProcessInfo {
                    name,
                    pid: entry.th32ProcessID,
                });
            }
            // SAFETY: same snapshot handle and entry as the first call.
            more = unsafe { Process32NextW(snapshot, &mut entry) }.is_ok();
        }

        // SAFETY: the snapshot handle is valid and not used after this.
        let _ = unsafe { CloseHandle(snapshot) };
        processes
    }

    struct Collector<'a> {
        filter: Option<&'a HashSet<u32>>,
        windows: Vec<WindowInfo>,
    }

    unsafe extern "system" fn collect_window(hwnd: HWND, lparam: LPARAM) -> BOOL {
        // SAFETY: `lparam` is the `Collector` passed to EnumWindows below,
        // alive for the whole enumeration.
        let collector = &mut *(lparam.0 as *mut Collector<'_>);

        if !IsWindowVisible(hwnd).as_bool() {
            return true.into();
        }

        let mut pid = 0u32;
        GetWindowThreadProcessId(hwnd, Some(&mut pid as *mut u32));
        if let Some(filter) = collector.filter {
            if !filter.contains(&pid) {
                return true.into();
            }
        }

        let len = GetWindowTextLengthW(hwnd);
        if len <= 0 {
            return true.into();
        }
        let mut buf = vec![0u16; len as usize + 1];
        let copied = GetWindowTextW(hwnd, &mut buf);
        if copied > 0 {
            let title = from_wide(&buf[..copied as usize]);
            if !title.is_empty() {
                collector.windows.push(WindowInfo { title, pid });
            }
        }

        true.into()
    }

    pub fn visible_windows(filter: Option<&HashSet<u32>>) -> Vec<WindowInfo> {
        let mut collector = Collector {
            filter,
            windows: Vec::new(),
        };
        let lparam = LPARAM(&mut collector as *mut Collector<'_> as isize);

        // SAFETY: the callback only touches `collector` through `lparam`.
        if let Err(err) = unsafe { EnumWindows(Some(collect_window), lparam) } {
            warn!(%err, "window enumeration stopped early");
        }
        collector.windows
    }
}

/// Process names are the kernel's `comm` values: no `.exe` suffix and cut
/// to 15 bytes. The detector compares names with `.exe` stripped, so
/// `steam.exe` in the trigger list matches a `steam` process, but an app
/// whose command name is longer than 15 bytes is only matched by its
/// truncated form.
#[cfg(target_os = "linux")]
mod platform {
    use std::collections::HashSet;

    use tracing::warn;

    use super::{ProcessInfo, WindowInfo};

    pub fn processes() -> Vec<ProcessInfo> {
        let entries = match std::fs::read_dir("/proc") {
            Ok(entries) => entries,
            Err(err) => {
                warn!(%err, "cannot read /proc");
                return Vec::new();
            }
        };

        // Processes that exit mid-scan fail to read and are skipped.
        entries
            .filter_map(Result::ok)
            .filter_map(|entry| {
                let pid: u32 = entry.file_name().to_str()?.parse().ok()?;
                let comm = std::fs::read_to_string(entry.path().join("comm")).ok()?;
                let name = comm.trim_end().to_string();
                (!name.is_empty()).then_some(ProcessInfo { name, pid })
            })
            .collect()
    }

    pub fn visible_windows(_filter: Option<&HashSet<u32>>) -> Vec<WindowInfo> {
        Vec::new()
    }
}

#[cfg(not(any(windows, target_os = "linux")))]
mod platform {
    use std::collections::HashSet;

    use super::{ProcessInfo, WindowInfo};

    pub fn processes() -> Vec<ProcessInfo> {
        Vec::new()
    }

    pub fn visible_windows(_filter: Option<&HashSet<u32>>) -> Vec<WindowInfo> {
        Vec::new()
    }
}
