use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::detect::Relapse;
use crate::ritual::RitualState;

/// Every observable step of the ritual produces an Event.
/// Hosts log them or print them; nothing in the core consumes them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    StateChanged {
        from: RitualState,
        to: RitualState,
        at: NaiveDateTime,
    },
    AlarmShown {
        fullscreen: bool,
        at: NaiveDateTime,
    },
    AlarmDismissed {
        at: NaiveDateTime,
    },
    /// A trigger was seen while confirmed; the alarm returns next tick.
    RelapseDetected {
        relapse: Relapse,
        at: NaiveDateTime,
    },
    Snoozed {
        resume_at: NaiveDateTime,
        at: NaiveDateTime,
    },
    RoutineConfirmed {
        at: NaiveDateTime,
    },
    AppLaunched {
        path: PathBuf,
        at: NaiveDateTime,
    },
    /// Not launched because a window with its name is already open,
    /// or because the path does not exist.
    AppLaunchSkipped {
        path: PathBuf,
        reason: SkipReason,
        at: NaiveDateTime,
    },
    AppLaunchFailed {
        path: PathBuf,
        error: String,
        at: NaiveDateTime,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    Missing,
    AlreadyOpen,
}
