use clap::Subcommand;
use sticky_alarm_core::{Autostart, Config};

#[derive(Subcommand)]
pub enum AutostartAction {
    /// Start `sticky-alarm run` at login
    Enable,
    /// Remove the login entry
    Disable,
    /// Print whether the login entry exists
    Status,
}

pub fn run(action: AutostartAction) -> Result<(), Box<dyn std::error::Error>> {
    let autostart = Autostart::system()?;
    match action {
        AutostartAction::Enable | AutostartAction::Disable => {
            let enabled = matches!(action, AutostartAction::Enable);
            let exe = std::env::current_exe()?;
            let path = Config::path()?;
            let mut config = Config::load_from(&path)?;
            autostart.apply(enabled, &exe, &["run"], &mut config, &path)?;
            println!("autostart {}", if enabled { "enabled" } else { "disabled" });
        }
        AutostartAction::Status => {
            let json = serde_json::json!({
                "enabled": autostart.is_enabled(),
                "entry": autostart.entry_path(),
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
    }
    Ok(())
}
