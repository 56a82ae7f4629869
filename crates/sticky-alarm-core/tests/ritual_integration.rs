//! Integration tests for the evening ritual, driven through the public API
//! with a scripted system.

use std::io;
use std::path::Path;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use sticky_alarm_core::{
    AlarmPresenter, AlarmSettings, Config, ConfigHandle, Event, ProcessLauncher, RitualState,
    ScriptedQuery, TickOrchestrator,
};

#[derive(Default)]
struct Popup {
    visible: bool,
    texts: Vec<String>,
}

impl AlarmPresenter for Popup {
    fn show(&mut self, alarm: &AlarmSettings) {
        self.visible = true;
        self.texts.push(alarm.text.clone());
    }

    fn dismiss(&mut self) {
        self.visible = false;
    }

    fn is_showing(&self) -> bool {
        self.visible
    }
}

struct Launcher;

impl ProcessLauncher for Launcher {
    fn launch(&mut self, _path: &Path) -> io::Result<()> {
        Ok(())
    }
}

fn evening(hour: u32, minute: u32, second: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 10, 16)
        .unwrap()
        .and_hms_opt(hour, minute, second)
        .unwrap()
}

#[test]
fn test_full_evening_walkthrough() {
    let handle = ConfigHandle::new(Config::default());
    let config = handle.snapshot();
    assert_eq!(config.active_window().to_string(), "20:00-04:00");
    assert_eq!(config.alarm.snooze_minutes, 15);

    let os = ScriptedQuery::new();
    let mut orch = TickOrchestrator::new(evening(19, 59, 50), &config, os.clone(), Popup::default(), Launcher);

    // 20:00:00 - the window opens and the alarm goes up.
    orch.tick(evening(19, 59, 55), &config);
    assert_eq!(orch.state(), RitualState::Waiting);
    orch.tick(evening(20, 0, 0), &config);
    assert_eq!(orch.state(), RitualState::Active);
    assert!(orch.presenter().is_showing());

    // The user snoozes.
    orch.snooze(evening(20, 0, 0), &config);
    assert_eq!(orch.state(), RitualState::Snoozed);

    // 20:14:59 - still snoozed.
    orch.tick(evening(20, 14, 59), &config);
    assert_eq!(orch.state(), RitualState::Snoozed);
    assert!(!orch.presenter().is_showing());

    // 20:15:00 - back.
    orch.tick(evening(20, 15, 0), &config);
    assert_eq!(orch.state(), RitualState::Active);
    assert!(orch.presenter().is_showing());

    // The user confirms.
    orch.confirm(evening(20, 15, 30), &config);
    assert_eq!(orch.state(), RitualState::Confirmed);
    assert!(!orch.presenter().is_showing());

    // A browser window titled "Reddit - feed" opens.
    let browser = os.spawn_with_window("chrome.exe", "Reddit - feed");
    let events = orch.tick(evening(20, 15, 35), &config);
    assert!(events.iter().any(|e| matches!(e, Event::RelapseDetected { .. })));
    assert_eq!(orch.state(), RitualState::Active);

    // The following tick reports Active and shows the alarm.
    orch.tick(evening(20, 15, 40), &config);
    assert_eq!(orch.state(), RitualState::Active);
    assert!(orch.presenter().is_showing());
    assert_eq!(orch.presenter().texts.len(), 3);

    // Closing the browser does not take the alarm down.
    os.kill(browser);
    orch.tick(evening(20, 15, 45), &config);
    assert_eq!(orch.state(), RitualState::Active);
    assert!(orch.presenter().is_showing());
    assert_eq!(orch.presenter().texts.len(), 3);
}

#[test]
fn test_restart_mid_window_then_next_evening() {
    let config = Config::default();
    let os = ScriptedQuery::new();
    let mut orch = TickOrchestrator::new(evening(22, 30, 0), &config, os, Popup::default(), Launcher);

    orch.tick(evening(22, 30, 0), &config);
    assert_eq!(orch.state(), RitualState::Confirmed);
    assert!(!orch.presenter().is_showing());

    // Morning resets the ritual.
    let morning = evening(9, 0, 0) + Duration::days(1);
    orch.tick(morning, &config);
    assert_eq!(orch.state(), RitualState::Waiting);

    // The next evening is a fresh entry.
    let next = evening(20, 0, 0) + Duration::days(1);
    orch.tick(next, &config);
    assert_eq!(orch.state(), RitualState::Active);
    assert!(orch.presenter().is_showing());
}

#[test]
fn test_settings_change_between_ticks() {
    let handle = ConfigHandle::new(Config::default());
    let os = ScriptedQuery::new();
    let mut orch = TickOrchestrator::new(
        evening(18, 0, 0),
        &handle.snapshot(),
        os,
        Popup::default(),
        Launcher,
    );

    orch.tick(evening(18, 0, 0), &handle.snapshot());
    assert_eq!(orch.state(), RitualState::Waiting);

    // The user moves the window start to 18:00 and saves.
    let mut edited = (*handle.snapshot()).clone();
    edited.apply("window.start_hour", "18").unwrap();
    edited.apply("alarm.popup_text", "Wind down").unwrap();
    handle.publish(edited);

    orch.tick(evening(18, 0, 5), &handle.snapshot());
    assert_eq!(orch.state(), RitualState::Active);
    assert_eq!(orch.presenter().texts, vec!["Wind down".to_string()]);
}

#[test]
fn test_browser_process_alone_is_not_a_relapse() {
    let mut config = Config::default();
    config.triggers.apps = vec!["chrome.exe".into()];
    let os = ScriptedQuery::new();
    os.spawn_with_window("chrome.exe", "Quarterly report - Google Docs");

    let mut orch = TickOrchestrator::new(evening(21, 0, 0), &config, os, Popup::default(), Launcher);
    for second in 0..10 {
        orch.tick(evening(21, 0, second * 5), &config);
    }
    assert_eq!(orch.state(), RitualState::Confirmed);
}
