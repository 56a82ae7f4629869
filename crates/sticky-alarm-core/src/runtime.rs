//! The cooperative timer loop.
//!
//! One task owns the orchestrator and runs every tick and every user command
//! to completion before starting the next, so ticks never overlap. Other
//! threads (a tray icon, a console reader) talk to it only by queueing
//! [`Command`]s through a [`CommandSender`].
//!
//! Configuration is shared through a [`ConfigHandle`]: writers publish a
//! whole new snapshot, and each tick works on the snapshot current when it
//! started.

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDateTime};
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::detect::OsQuery;
use crate::error::ConfigError;
use crate::events::Event;
use crate::orchestrator::{AlarmPresenter, ProcessLauncher, TickOrchestrator};
use crate::storage::Config;

/// Default tick cadence.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(5);

/// Requests queued for the timer loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Snooze,
    Confirm,
    /// Raise the alarm now (tray "test alarm").
    TriggerTest,
    /// Re-read the configuration file and publish it.
    ReloadConfig,
    Quit,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "snooze" => Ok(Command::Snooze),
            "confirm" => Ok(Command::Confirm),
            "test" | "trigger" => Ok(Command::TriggerTest),
            "reload" => Ok(Command::ReloadConfig),
            "quit" | "exit" => Ok(Command::Quit),
            other => Err(format!(
                "unknown command '{other}' (expected snooze, confirm, test, reload or quit)"
            )),
        }
    }
}

/// Thread-safe handle for queueing commands from any thread.
#[derive(Debug, Clone)]
pub struct CommandSender(mpsc::UnboundedSender<Command>);

impl CommandSender {
    /// Returns false once the loop has stopped.
    pub fn send(&self, command: Command) -> bool {
        self.0.send(command).is_ok()
    }
}

pub struct CommandReceiver(mpsc::UnboundedReceiver<Command>);

pub fn command_channel() -> (CommandSender, CommandReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (CommandSender(tx), CommandReceiver(rx))
}

/// Publishes immutable configuration snapshots.
#[derive(Debug, Clone)]
pub struct ConfigHandle {
    tx: Arc<watch::Sender<Arc<Config>>>,
    path: Option<PathBuf>,
}

impl ConfigHandle {
    pub fn new(config: Config) -> Self {
        let (tx, _rx) = watch::channel(Arc::new(config.normalized()));
        Self {
            tx: Arc::new(tx),
            path: None,
        }
    }

    /// A handle that reloads from `path` instead of the default location.
    pub fn with_path(config: Config, path: PathBuf) -> Self {
        Self {
            path: Some(path),
            ..Self::new(config)
        }
    }

    /// The latest published snapshot.
    pub fn snapshot(&self) -> Arc<Config> {
        self.tx.borrow().clone()
    }

    /// Replace the current snapshot. Readers see either the old or the new
    /// configuration as a whole.
    pub fn publish(&self, config: Config) {
        self.tx.send_replace(Arc::new(config.normalized()));
    }

    /// Re-read the configuration from disk and publish it.
    pub fn reload(&self) -> Result<(), ConfigError> {
        let config = match &self.path {
            Some(path) => Config::load_from(path)?,
            None => Config::load()?,
        };
        self.publish(config);
        Ok(())
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<Config>> {
        self.tx.subscribe()
    }
}

/// Source of the wall-clock time fed to the scheduler.
pub trait Clock {
    fn now(&self) -> NaiveDateTime;
}

/// Local wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalClock;

impl Clock for LocalClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

impl<F: Fn() -> NaiveDateTime> Clock for F {
    fn now(&self) -> NaiveDateTime {
        self()
    }
}

pub struct Runtime<Q, P, L, C = LocalClock> {
    orchestrator: TickOrchestrator<Q, P, L>,
    config: ConfigHandle,
    commands: CommandReceiver,
    period: Duration,
    clock: C,
}

impl<Q, P, L> Runtime<Q, P, L, LocalClock>
where
    Q: OsQuery,
    P: AlarmPresenter,
    L: ProcessLauncher,
{
    pub fn new(
        orchestrator: TickOrchestrator<Q, P, L>,
        config: ConfigHandle,
        commands: CommandReceiver,
    ) -> Self {
        Self {
            orchestrator,
            config,
            commands,
            period: DEFAULT_TICK_INTERVAL,
            clock: LocalClock,
        }
    }
}

impl<Q, P, L, C> Runtime<Q, P, L, C>
where
    Q: OsQuery,
    P: AlarmPresenter,
    L: ProcessLauncher,
    C: Clock,
{
    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    pub fn with_clock<C2: Clock>(self, clock: C2) -> Runtime<Q, P, L, C2> {
        Runtime {
            orchestrator: self.orchestrator,
            config: self.config,
            commands: self.commands,
            period: self.period,
            clock,
        }
    }

    pub fn orchestrator(&self) -> &TickOrchestrator<Q, P, L> {
        &self.orchestrator
    }

    /// Run until a [`Command::Quit`] arrives. Every event is passed to
    /// `on_event` as it happens.
    ///
    /// If every sender is dropped the loop keeps ticking; it just stops
    /// listening for commands.
    pub async fn run<F>(&mut self, mut on_event: F)
    where
        F: FnMut(&Event),
    {
        let mut ticker = tokio::time::interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut listening = true;

        info!(period_secs = self.period.as_secs_f64(), "ritual loop started");

        loop {
            tokio::select! {
                biased;

                _ = ticker.tick() => {
                    let config = self.config.snapshot();
                    let now = self.clock.now();
                    for event in self.orchestrator.tick(now, &config) {
                        on_event(&event);
                    }
                }
                command = self.commands.0.recv(), if listening => {
                    let Some(command) = command else {
                        debug!("command channel closed");
                        listening = false;
                        continue;
                    };
                    if command == Command::Quit {
                        info!("quit requested");
                        break;
                    }
                    for event in self.handle(command) {
                        on_event(&event);
                    }
                }
            }
        }
    }

    fn handle(&mut self, command: Command) -> Vec<Event> {
        debug!(?command, "handling command");
        let now = self.clock.now();
        match command {
            Command::Snooze => self.orchestrator.snooze(now, &self.config.snapshot()),
            Command::Confirm => self.orchestrator.confirm(now, &self.config.snapshot()),
            Command::TriggerTest => self.orchestrator.force_trigger(now, &self.config.snapshot()),
            Command::ReloadConfig => {
                match self.config.reload() {
                    Ok(()) => info!(window = %self.config.snapshot().active_window(), "configuration reloaded"),
                    Err(err) => warn!(%err, "configuration reload failed, keeping previous"),
                }
                Vec::new()
            }
            Command::Quit => Vec::new(),
        }
    }
}
