//! Login autostart entry.
//!
//! On Windows the entry is a `StickyAlarm.lnk` shortcut in the user's
//! Startup folder, created through PowerShell's `WScript.Shell` so no COM
//! bindings are needed. Elsewhere it is an XDG `sticky-alarm.desktop` file
//! in `~/.config/autostart`.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{AutostartError, Result};
use crate::storage::Config;

#[cfg(windows)]
const ENTRY_NAME: &str = "StickyAlarm.lnk";
#[cfg(not(windows))]
const ENTRY_NAME: &str = "sticky-alarm.desktop";

#[derive(Debug, Clone)]
pub struct Autostart {
    dir: PathBuf,
}

impl Autostart {
    /// The current user's autostart location.
    pub fn system() -> Result<Self, AutostartError> {
        let base = dirs::config_dir().ok_or(AutostartError::NoLocation)?;
        #[cfg(windows)]
        let dir = base
            .join("Microsoft")
            .join("Windows")
            .join("Start Menu")
            .join("Programs")
            .join("Startup");
        #[cfg(not(windows))]
        let dir = base.join("autostart");
        Ok(Self { dir })
    }

    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn entry_path(&self) -> PathBuf {
        self.dir.join(ENTRY_NAME)
    }

    pub fn is_enabled(&self) -> bool {
        self.entry_path().exists()
    }

    /// Create (or overwrite) the entry so `exe args...` runs at login.
    pub fn enable(&self, exe: &Path, args: &[&str]) -> Result<(), AutostartError> {
        std::fs::create_dir_all(&self.dir).map_err(|source| AutostartError::Io {
            path: self.dir.clone(),
            source,
        })?;
        let entry = self.entry_path();
        write_entry(&entry, exe, args)?;
        info!(entry = %entry.display(), "autostart enabled");
        Ok(())
    }

    /// Remove the entry. A missing entry is not an error.
    pub fn disable(&self) -> Result<(), AutostartError> {
        let entry = self.entry_path();
        match std::fs::remove_file(&entry) {
            Ok(()) => {
                info!(entry = %entry.display(), "autostart disabled");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(AutostartError::Io {
                path: entry,
                source,
            }),
        }
    }

    /// Create or remove the entry, then record the choice in the
    /// configuration file at `config_path`.
    pub fn apply(
        &self,
        enabled: bool,
        exe: &Path,
        args: &[&str],
        config: &mut Config,
        config_path: &Path,
    ) -> Result<()> {
        if enabled {
            self.enable(exe, args)?;
        } else {
            self.disable()?;
        }
        config.autostart = enabled;
        config.save_to(config_path)?;
        Ok(())
    }
}

#[cfg(windows)]
fn write_entry(entry: &Path, exe: &Path, args: &[&str]) -> Result<(), AutostartError> {
    use std::os::windows::process::CommandExt;

    const CREATE_NO_WINDOW: u32 = 0x0800_0000;

    let quote = |s: &str| s.replace('\'', "''");
    let working_dir = exe.parent().unwrap_or_else(|| Path::new("."));
    let script = format!(
        "$ws = New-Object -ComObject WScript.Shell; \
         $sc = $ws.CreateShortcut('{}'); \
         $sc.TargetPath = '{}'; \
         $sc.Arguments = '{}'; \
         $sc.WorkingDirectory = '{}'; \
         $sc.Description = 'Sticky Alarm - evening routine trigger'; \
         $sc.Save()",
        quote(&entry.display().to_string()),
        quote(&exe.display().to_string()),
        quote(&args.join(" ")),
        quote(&working_dir.display().to_string()),
    );

    let output = std::process::Command::new("powershell")
        .args(["-NoProfile", "-Command", &script])
        .creation_flags(CREATE_NO_WINDOW)
        .output()
        .map_err(|source| AutostartError::Io {
            path: entry.to_path_buf(),
            source,
        })?;
    if !output.status.success() {
        return Err(AutostartError::ShortcutFailed(
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        ));
    }
    Ok(())
}

#[cfg(not(windows))]
fn desktop_entry(exe: &Path, args: &[&str]) -> String {
    let mut exec = format!("\"{}\"", exe.display());
    for arg in args {
        exec.push(' ');
        exec.push_str(arg);
    }
    format!(
        "[Desktop Entry]\n\
         Type=Application\n\
         Name=Sticky Alarm\n\
         Comment=Evening routine trigger\n\
         Exec={exec}\n\
         Terminal=false\n\
         X-GNOME-Autostart-enabled=true\n"
    )
}

#[cfg(not(windows))]
fn write_entry(entry: &Path, exe: &Path, args: &[&str]) -> Result<(), AutostartError> {
    std::fs::write(entry, desktop_entry(exe, args)).map_err(|source| AutostartError::Io {
        path: entry.to_path_buf(),
        source,
    })
}
