use std::io::{self, BufRead};
use std::net::TcpListener;
use std::time::Duration;

use chrono::Local;
use clap::Args;
use sticky_alarm_core::{
    command_channel, AlarmPresenter, AlarmSettings, Command, CommandSender, Config, ConfigError,
    ConfigHandle, Runtime, SystemLauncher, SystemQuery, TickOrchestrator,
};
use tracing::{info, warn};

/// Loopback port held for the lifetime of the process. Overridden by
/// `STICKY_ALARM_PORT`.
const INSTANCE_PORT: u16 = 59173;

fn instance_port() -> u16 {
    std::env::var("STICKY_ALARM_PORT")
        .ok()
        .and_then(|port| port.trim().parse().ok())
        .unwrap_or(INSTANCE_PORT)
}

#[derive(Args)]
pub struct RunArgs {
    /// Seconds between ticks
    #[arg(long, default_value = "5")]
    interval_secs: u64,
}

/// Prints the alarm to the terminal. Snooze and confirm are typed on stdin.
#[derive(Debug, Default)]
struct ConsolePresenter {
    showing: bool,
}

impl AlarmPresenter for ConsolePresenter {
    fn show(&mut self, alarm: &AlarmSettings) {
        self.showing = true;
        eprintln!();
        for line in alarm.text.lines() {
            eprintln!("    {line}");
        }
        eprintln!();
        eprintln!("    [snooze] or [confirm]");
        if let Some(sound) = &alarm.sound_file {
            info!(sound = %sound.display(), "alarm sound selected");
        }
    }

    fn dismiss(&mut self) {
        self.showing = false;
    }

    fn is_showing(&self) -> bool {
        self.showing
    }
}

pub fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let _guard = match TcpListener::bind(("127.0.0.1", instance_port())) {
        Ok(listener) => listener,
        Err(e) if e.kind() == io::ErrorKind::AddrInUse => {
            info!("another instance is already running");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let path = Config::path()?;
    let initial = match Config::load_from(&path) {
        Ok(config) => config,
        Err(err @ ConfigError::LoadFailed { .. }) => {
            warn!(%err, "unreadable configuration, running on defaults");
            Config::default()
        }
        Err(err) => return Err(err.into()),
    };
    let config = ConfigHandle::with_path(initial, path);
    let snapshot = config.snapshot();
    info!(window = %snapshot.active_window(), "starting");

    let orchestrator = TickOrchestrator::new(
        Local::now().naive_local(),
        &snapshot,
        SystemQuery,
        ConsolePresenter::default(),
        SystemLauncher,
    );

    let (tx, rx) = command_channel();
    spawn_stdin_reader(tx);

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let mut runtime = Runtime::new(orchestrator, config, rx)
        .with_period(Duration::from_secs(args.interval_secs.max(1)));

    rt.block_on(runtime.run(|event| match serde_json::to_string(event) {
        Ok(line) => println!("{line}"),
        Err(e) => warn!(%e, "failed to serialize event"),
    }));
    Ok(())
}

/// Forward stdin lines to the loop. Ends at EOF or once the loop is gone.
fn spawn_stdin_reader(tx: CommandSender) {
    std::thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if line.trim().is_empty() {
                continue;
            }
            match line.parse::<Command>() {
                Ok(command) => {
                    if !tx.send(command) {
                        break;
                    }
                }
                Err(e) => warn!("{e}"),
            }
        }
    });
}
