//! Ritual scheduler state machine.
//!
//! Like the timer engines elsewhere in this workspace, the scheduler owns no
//! clock and no thread: the caller passes `now` and the current window into
//! `tick()` at whatever cadence it likes. All other transitions are explicit
//! user or detector events.
//!
//! ## State Transitions
//!
//! ```text
//!            fresh entry              snooze
//! Waiting ─────────────────> Active ─────────> Snoozed
//!    │                       ^  │  <─────────     │
//!    │ started mid-window    │  │   resume_at     │
//!    v                       │  │                 │
//! Confirmed ─────────────────┘  │ confirm         │ confirm
//!    ^          relapse         v                 v
//!    └───────────────────── Confirmed <───────────┘
//!
//! any state ── leaves the window ──> Waiting
//! ```

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::window::ActiveWindow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RitualState {
    /// Outside the active window, or freshly reset. No alarm.
    Waiting,
    /// The alarm must be shown now.
    Active,
    /// The user deferred the alarm until `resume_at`.
    Snoozed,
    /// The user acknowledged the ritual; relapse watch is on.
    Confirmed,
}

/// Internal state. Keeping `resume_at` inside the `Snoozed` variant makes it
/// impossible to have one without the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Waiting,
    Active,
    Snoozed { resume_at: NaiveDateTime },
    Confirmed,
}

impl Phase {
    fn state(self) -> RitualState {
        match self {
            Phase::Waiting => RitualState::Waiting,
            Phase::Active => RitualState::Active,
            Phase::Snoozed { .. } => RitualState::Snoozed,
            Phase::Confirmed => RitualState::Confirmed,
        }
    }
}

/// Decides when the alarm is shown, snoozed or suppressed.
#[derive(Debug, Clone)]
pub struct Scheduler {
    phase: Phase,
    /// Set when the process starts inside the window so the first tick does
    /// not fire the alarm. Consumed by that tick or by leaving the window.
    was_already_in_window: bool,
}

impl Scheduler {
    /// Create a scheduler in `Waiting`, remembering whether `now` is already
    /// inside the window.
    pub fn new(now: NaiveDateTime, window: &ActiveWindow) -> Self {
        Self {
            phase: Phase::Waiting,
            was_already_in_window: window.contains(&now),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> RitualState {
        self.phase.state()
    }

    /// When a snooze expires. `Some` only while `Snoozed`.
    pub fn resume_at(&self) -> Option<NaiveDateTime> {
        match self.phase {
            Phase::Snoozed { resume_at } => Some(resume_at),
            _ => None,
        }
    }

    pub fn was_already_in_window(&self) -> bool {
        self.was_already_in_window
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Evaluate the window at `now`. Idempotent for a fixed `now`.
    pub fn tick(&mut self, now: NaiveDateTime, window: &ActiveWindow) -> RitualState {
        if !window.contains(&now) {
            self.phase = Phase::Waiting;
            self.was_already_in_window = false;
            return self.state();
        }

        match self.phase {
            Phase::Waiting if self.was_already_in_window => {
                debug!(%window, "started inside active window, suppressing alarm");
                self.was_already_in_window = false;
                self.phase = Phase::Confirmed;
            }
            Phase::Waiting => {
                self.phase = Phase::Active;
            }
            Phase::Snoozed { resume_at } if now >= resume_at => {
                self.phase = Phase::Active;
            }
            Phase::Snoozed { .. } | Phase::Active | Phase::Confirmed => {}
        }

        self.state()
    }

    /// Defer the alarm by `minutes`. Only meaningful while the alarm is up
    /// (or already snoozed); returns false and does nothing otherwise.
    pub fn snooze(&mut self, now: NaiveDateTime, minutes: u32) -> bool {
        match self.phase {
            Phase::Active | Phase::Snoozed { .. } => {
                let resume_at = now + Duration::minutes(i64::from(minutes));
                self.phase = Phase::Snoozed { resume_at };
                true
            }
            Phase::Waiting | Phase::Confirmed => false,
        }
    }

    pub fn confirm_routine(&mut self) {
        self.phase = Phase::Confirmed;
    }

    /// A trigger site or app was seen after confirmation. Returns true when
    /// this re-armed the alarm.
    pub fn relapse_detected(&mut self) -> bool {
        if self.phase == Phase::Confirmed {
            self.phase = Phase::Active;
            true
        } else {
            false
        }
    }

    /// Manual test: raise the alarm regardless of time.
    pub fn force_trigger(&mut self) {
        self.phase = Phase::Active;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ritual::window::ClockTime;
    use chrono::NaiveDate;

    fn evening() -> ActiveWindow {
        ActiveWindow::new(ClockTime::new(20, 0), ClockTime::new(4, 0))
    }

    fn at(hour: u32, minute: u32, second: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 14)
            .unwrap()
            .and_hms_opt(hour, minute, second)
            .unwrap()
    }

    #[test]
    fn startup_inside_window_is_suppressed_once() {
        let now = at(21, 0, 0);
        let mut scheduler = Scheduler::new(now, &evening());
        assert!(scheduler.was_already_in_window());

        assert_eq!(scheduler.tick(now, &evening()), RitualState::Confirmed);
        assert!(!scheduler.was_already_in_window());
    }

    #[test]
    fn fresh_entry_raises_alarm() {
        let mut scheduler = Scheduler::new(at(19, 0, 0), &evening());
        assert_eq!(scheduler.tick(at(19, 30, 0), &evening()), RitualState::Waiting);
        assert_eq!(scheduler.tick(at(20, 0, 0), &evening()), RitualState::Active);
    }

    #[test]
    fn leaving_window_resets_everything() {
        let mut scheduler = Scheduler::new(at(21, 0, 0), &evening());
        let next_morning = at(21, 0, 0) + Duration::hours(8);
        assert_eq!(scheduler.tick(next_morning, &evening()), RitualState::Waiting);
        assert!(!scheduler.was_already_in_window());

        // The startup flag was cleared, so the next entry fires.
        let next_evening = at(20, 0, 0) + Duration::days(1);
        assert_eq!(scheduler.tick(next_evening, &evening()), RitualState::Active);
    }

    #[test]
    fn leaving_window_clears_snooze() {
        let mut scheduler = Scheduler::new(at(19, 0, 0), &evening());
        scheduler.tick(at(20, 0, 0), &evening());
        assert!(scheduler.snooze(at(3, 55, 0) + Duration::days(1), 15));
        assert!(scheduler.resume_at().is_some());

        let outside = at(4, 0, 0) + Duration::days(1);
        assert_eq!(scheduler.tick(outside, &evening()), RitualState::Waiting);
        assert_eq!(scheduler.resume_at(), None);
    }

    #[test]
    fn snooze_expires_on_the_minute() {
        let mut scheduler = Scheduler::new(at(19, 0, 0), &evening());
        scheduler.tick(at(20, 0, 0), &evening());

        assert!(scheduler.snooze(at(20, 0, 0), 15));
        assert_eq!(scheduler.resume_at(), Some(at(20, 15, 0)));
        assert_eq!(scheduler.tick(at(20, 14, 0), &evening()), RitualState::Snoozed);
        assert_eq!(scheduler.tick(at(20, 14, 59), &evening()), RitualState::Snoozed);
        assert_eq!(scheduler.tick(at(20, 15, 0), &evening()), RitualState::Active);
        assert_eq!(scheduler.resume_at(), None);
    }

    #[test]
    fn snoozing_again_extends_from_now() {
        let mut scheduler = Scheduler::new(at(19, 0, 0), &evening());
        scheduler.tick(at(20, 0, 0), &evening());
        scheduler.snooze(at(20, 0, 0), 15);
        assert!(scheduler.snooze(at(20, 5, 0), 15));
        assert_eq!(scheduler.resume_at(), Some(at(20, 20, 0)));
    }

    #[test]
    fn snooze_is_ignored_without_an_alarm() {
        let mut scheduler = Scheduler::new(at(19, 0, 0), &evening());
        assert!(!scheduler.snooze(at(19, 0, 0), 15));
        assert_eq!(scheduler.state(), RitualState::Waiting);

        scheduler.confirm_routine();
        assert!(!scheduler.snooze(at(21, 0, 0), 15));
        assert_eq!(scheduler.state(), RitualState::Confirmed);
    }

    #[test]
    fn confirm_from_any_state() {
        let mut scheduler = Scheduler::new(at(19, 0, 0), &evening());
        scheduler.confirm_routine();
        assert_eq!(scheduler.state(), RitualState::Confirmed);

        scheduler.force_trigger();
        scheduler.snooze(at(20, 0, 0), 5);
        scheduler.confirm_routine();
        assert_eq!(scheduler.state(), RitualState::Confirmed);
        assert_eq!(scheduler.resume_at(), None);
    }

    #[test]
    fn relapse_only_rearms_confirmed() {
        let mut scheduler = Scheduler::new(at(19, 0, 0), &evening());
        assert!(!scheduler.relapse_detected());
        assert_eq!(scheduler.state(), RitualState::Waiting);

        scheduler.confirm_routine();
        assert!(scheduler.relapse_detected());
        assert_eq!(scheduler.state(), RitualState::Active);
        assert!(!scheduler.relapse_detected());
    }

    #[test]
    fn active_and_confirmed_are_stable_inside_window() {
        let mut scheduler = Scheduler::new(at(19, 0, 0), &evening());
        scheduler.tick(at(20, 0, 0), &evening());
        for minute in 1..30 {
            assert_eq!(scheduler.tick(at(20, minute, 0), &evening()), RitualState::Active);
        }
        scheduler.confirm_routine();
        for minute in 30..59 {
            assert_eq!(scheduler.tick(at(20, minute, 0), &evening()), RitualState::Confirmed);
        }
    }

    #[test]
    fn force_trigger_works_outside_window() {
        let mut scheduler = Scheduler::new(at(12, 0, 0), &evening());
        scheduler.force_trigger();
        assert_eq!(scheduler.state(), RitualState::Active);
        // The next tick outside the window takes it back down.
        assert_eq!(scheduler.tick(at(12, 0, 5), &evening()), RitualState::Waiting);
    }

    #[derive(Clone, Copy)]
    enum Step {
        Tick(NaiveDateTime),
        Snooze(NaiveDateTime),
        Confirm,
        Relapse,
    }

    fn replay(start: NaiveDateTime, steps: &[Step]) -> (RitualState, Option<NaiveDateTime>) {
        let mut scheduler = Scheduler::new(start, &evening());
        for step in steps {
            match *step {
                Step::Tick(now) => {
                    scheduler.tick(now, &evening());
                }
                Step::Snooze(now) => {
                    scheduler.snooze(now, 10);
                }
                Step::Confirm => scheduler.confirm_routine(),
                Step::Relapse => {
                    scheduler.relapse_detected();
                }
            }
        }
        (scheduler.state(), scheduler.resume_at())
    }

    #[test]
    fn replaying_a_sequence_is_deterministic() {
        let steps = [
            Step::Tick(at(19, 59, 0)),
            Step::Tick(at(20, 0, 0)),
            Step::Snooze(at(20, 1, 0)),
            Step::Tick(at(20, 5, 0)),
            Step::Tick(at(20, 11, 0)),
            Step::Confirm,
            Step::Tick(at(20, 12, 0)),
            Step::Relapse,
            Step::Tick(at(20, 13, 0)),
            Step::Snooze(at(20, 13, 0)),
        ];
        let first = replay(at(19, 0, 0), &steps);
        let second = replay(at(19, 0, 0), &steps);
        assert_eq!(first, second);
        assert_eq!(first, (RitualState::Snoozed, Some(at(20, 23, 0))));
    }
}
