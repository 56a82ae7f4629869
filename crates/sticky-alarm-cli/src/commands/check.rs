use serde::Serialize;
use sticky_alarm_core::{Config, Relapse, SystemQuery, TriggerDetector};

#[derive(Serialize)]
struct CheckReport {
    trigger_site_open: bool,
    trigger_app_running: bool,
    relapse: Option<Relapse>,
}

/// One detection pass against the live system.
pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let detector = TriggerDetector::new(SystemQuery);
    let sites = &config.triggers.sites;
    let apps = &config.triggers.apps;

    let report = CheckReport {
        trigger_site_open: detector.is_trigger_site_open(sites),
        trigger_app_running: detector.is_trigger_app_running(apps),
        relapse: detector.find_relapse(sites, apps),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
