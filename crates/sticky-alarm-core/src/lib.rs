//! # Sticky Alarm Core Library
//!
//! This library provides the decision logic behind Sticky Alarm, an
//! "evening shutdown" enforcer: inside a configured daily window it raises an
//! alarm until the user acknowledges it, then watches for the user drifting
//! back to distracting websites or apps and raises the alarm again if so.
//! Hosts (the CLI, or a tray application) supply the UI, the clock cadence
//! and the OS access.
//!
//! ## Architecture
//!
//! - **Ritual**: the active-window rule and the scheduler state machine.
//!   Pure and clock-free; the caller passes `now`.
//! - **Detection**: relapse checks over an [`OsQuery`] snapshot of running
//!   processes and visible windows.
//! - **Orchestration**: [`TickOrchestrator`] runs one tick, drives the alarm
//!   presenter and launches routine apps on confirmation.
//! - **Runtime**: a single cooperative tokio loop with a command queue and
//!   published configuration snapshots.
//! - **Storage**: TOML configuration.
//!
//! ## Key Components
//!
//! - [`Scheduler`]: ritual state machine
//! - [`TriggerDetector`]: website/app relapse detection
//! - [`TickOrchestrator`]: per-tick decisions and side effects
//! - [`Runtime`]: the timer loop
//! - [`Config`]: application configuration management

pub mod autostart;
pub mod detect;
pub mod error;
pub mod events;
pub mod orchestrator;
pub mod ritual;
pub mod runtime;
pub mod storage;

pub use autostart::Autostart;
pub use detect::{OsQuery, ProcessInfo, Relapse, ScriptedQuery, SystemQuery, TriggerDetector, WindowInfo};
pub use error::{AutostartError, ConfigError, CoreError};
pub use events::{Event, SkipReason};
pub use orchestrator::{AlarmPresenter, AlarmSettings, ProcessLauncher, SystemLauncher, TickOrchestrator};
pub use ritual::{in_window, ActiveWindow, ClockTime, RitualState, Scheduler};
pub use runtime::{command_channel, Clock, Command, CommandReceiver, CommandSender, ConfigHandle, LocalClock, Runtime};
pub use storage::Config;
