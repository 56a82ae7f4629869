use chrono::Local;
use serde::Serialize;
use sticky_alarm_core::Config;

#[derive(Serialize)]
struct Status {
    window: String,
    overnight: bool,
    in_window: bool,
    snooze_minutes: u32,
    autostart: bool,
}

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let window = config.active_window();
    let now = Local::now().naive_local();

    let status = Status {
        window: window.to_string(),
        overnight: window.is_overnight(),
        in_window: window.contains(&now),
        snooze_minutes: config.alarm.snooze_minutes,
        autostart: config.autostart,
    };
    println!("{}", serde_json::to_string_pretty(&status)?);
    Ok(())
}
