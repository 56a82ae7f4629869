//! Tick orchestration.
//!
//! Ties the scheduler to the outside world. Each tick evaluates the
//! scheduler and then acts on the resulting state:
//!
//! - `Active`: show the alarm unless it is already up.
//! - `Confirmed`: look for a relapse and re-arm the scheduler if one is found.
//!   The alarm is shown by the *next* tick, so detection only ever changes
//!   state and presentation only ever follows state.
//! - `Waiting`: take the alarm down if it is up.
//!
//! User actions (snooze, confirm, manual test) arrive as separate calls.

use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use tracing::{debug, info, warn};

use crate::detect::{OsQuery, TriggerDetector};
use crate::events::{Event, SkipReason};
use crate::ritual::{RitualState, Scheduler};
use crate::storage::Config;

/// What the alarm presenter needs to raise the alarm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlarmSettings {
    pub sound_file: Option<PathBuf>,
    pub text: String,
    pub fullscreen: bool,
}

/// Command sink for the alarm UI.
///
/// The orchestrator never waits on it. The user's answer comes back later
/// as a snooze or confirm call.
pub trait AlarmPresenter {
    fn show(&mut self, alarm: &AlarmSettings);
    fn dismiss(&mut self);
    fn is_showing(&self) -> bool;
}

/// Best-effort application starter.
pub trait ProcessLauncher {
    fn launch(&mut self, path: &Path) -> io::Result<()>;
}

/// Opens paths detached with the platform's default handler.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLauncher;

impl ProcessLauncher for SystemLauncher {
    fn launch(&mut self, path: &Path) -> io::Result<()> {
        open::that_detached(path)
    }
}

pub struct TickOrchestrator<Q, P, L> {
    scheduler: Scheduler,
    detector: TriggerDetector<Q>,
    presenter: P,
    launcher: L,
}

impl<Q, P, L> TickOrchestrator<Q, P, L>
where
    Q: OsQuery,
    P: AlarmPresenter,
    L: ProcessLauncher,
{
    /// Build the orchestrator at process start. Starting inside the active
    /// window suppresses the first alarm.
    pub fn new(now: NaiveDateTime, config: &Config, query: Q, presenter: P, launcher: L) -> Self {
        Self {
            scheduler: Scheduler::new(now, &config.active_window()),
            detector: TriggerDetector::new(query),
            presenter,
            launcher,
        }
    }

    pub fn state(&self) -> RitualState {
        self.scheduler.state()
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn launcher(&self) -> &L {
        &self.launcher
    }

    /// One timer tick against the given configuration snapshot.
    pub fn tick(&mut self, now: NaiveDateTime, config: &Config) -> Vec<Event> {
        let mut events = Vec::new();
        let before = self.scheduler.state();
        let state = self.scheduler.tick(now, &config.active_window());
        record_transition(&mut events, before, state, now);
        debug!(?state, "tick");

        match state {
            RitualState::Active => {
                if !self.presenter.is_showing() {
                    self.show_alarm(now, config, &mut events);
                }
            }
            RitualState::Confirmed => {
                let relapse = self
                    .detector
                    .find_relapse(&config.triggers.sites, &config.triggers.apps);
                if let Some(relapse) = relapse {
                    if self.scheduler.relapse_detected() {
                        info!(?relapse, "relapse detected, alarm returns next tick");
                        events.push(Event::RelapseDetected { relapse, at: now });
                        record_transition(&mut events, state, self.scheduler.state(), now);
                    }
                }
            }
            RitualState::Waiting => {
                if self.presenter.is_showing() {
                    self.dismiss_alarm(now, &mut events);
                }
            }
            RitualState::Snoozed => {}
        }

        events
    }

    /// The user deferred the alarm.
    pub fn snooze(&mut self, now: NaiveDateTime, config: &Config) -> Vec<Event> {
        let mut events = Vec::new();
        let before = self.scheduler.state();
        if !self.scheduler.snooze(now, config.alarm.snooze_minutes) {
            debug!(state = ?before, "snooze ignored, no alarm to defer");
            return events;
        }

        record_transition(&mut events, before, self.scheduler.state(), now);
        if let Some(resume_at) = self.scheduler.resume_at() {
            info!(%resume_at, "alarm snoozed");
            events.push(Event::Snoozed { resume_at, at: now });
        }
        if self.presenter.is_showing() {
            self.dismiss_alarm(now, &mut events);
        }
        events
    }

    /// The user confirmed the routine: start the relapse watch and launch
    /// the routine apps that are not open yet.
    pub fn confirm(&mut self, now: NaiveDateTime, config: &Config) -> Vec<Event> {
        let mut events = Vec::new();
        let before = self.scheduler.state();
        self.scheduler.confirm_routine();
        record_transition(&mut events, before, self.scheduler.state(), now);
        info!("routine confirmed");
        events.push(Event::RoutineConfirmed { at: now });

        if self.presenter.is_showing() {
            self.dismiss_alarm(now, &mut events);
        }
        self.launch_routine_apps(now, config, &mut events);
        events
    }

    /// Manual test: raise the alarm right away, whatever the time.
    pub fn force_trigger(&mut self, now: NaiveDateTime, config: &Config) -> Vec<Event> {
        let mut events = Vec::new();
        let before = self.scheduler.state();
        self.scheduler.force_trigger();
        record_transition(&mut events, before, self.scheduler.state(), now);
        if !self.presenter.is_showing() {
            self.show_alarm(now, config, &mut events);
        }
        events
    }

    fn show_alarm(&mut self, now: NaiveDateTime, config: &Config, events: &mut Vec<Event>) {
        let alarm = config.alarm_settings();
        info!(fullscreen = alarm.fullscreen, "showing alarm");
        self.presenter.show(&alarm);
        events.push(Event::AlarmShown {
            fullscreen: alarm.fullscreen,
            at: now,
        });
    }

    fn dismiss_alarm(&mut self, now: NaiveDateTime, events: &mut Vec<Event>) {
        info!("dismissing alarm");
        self.presenter.dismiss();
        events.push(Event::AlarmDismissed { at: now });
    }

    fn launch_routine_apps(&mut self, now: NaiveDateTime, config: &Config, events: &mut Vec<Event>) {
        for app in &config.routine.launch_apps {
            let path = PathBuf::from(app);
            if !path.exists() {
                debug!(path = %path.display(), "routine app not found, skipping");
                events.push(Event::AppLaunchSkipped {
                    path,
                    reason: SkipReason::Missing,
                    at: now,
                });
                continue;
            }

            let name = path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default();
            if self.detector.is_app_window_open(&name) {
                debug!(app = %name, "routine app already open");
                events.push(Event::AppLaunchSkipped {
                    path,
                    reason: SkipReason::AlreadyOpen,
                    at: now,
                });
                continue;
            }

            match self.launcher.launch(&path) {
                Ok(()) => {
                    info!(path = %path.display(), "launched routine app");
                    events.push(Event::AppLaunched { path, at: now });
                }
                Err(err) => {
                    warn!(path = %path.display(), %err, "failed to launch routine app");
                    events.push(Event::AppLaunchFailed {
                        path,
                        error: err.to_string(),
                        at: now,
                    });
                }
            }
        }
    }
}

fn record_transition(
    events: &mut Vec<Event>,
    from: RitualState,
    to: RitualState,
    at: NaiveDateTime,
) {
    if from != to {
        info!(?from, ?to, "ritual state changed");
        events.push(Event::StateChanged { from, to, at });
    }
}
