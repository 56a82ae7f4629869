use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "sticky-alarm", version, about = "Sticky Alarm - evening shutdown ritual")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the ritual loop in the foreground
    Run(commands::run::RunArgs),
    /// Print the active window and whether it is open now
    Status,
    /// Check once for open trigger sites and apps
    Check,
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Start at login
    Autostart {
        #[command(subcommand)]
        action: commands::autostart::AutostartAction,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Run(args) => commands::run::run(args),
        Commands::Status => commands::status::run(),
        Commands::Check => commands::check::run(),
        Commands::Config { action } => commands::config::run(action),
        Commands::Autostart { action } => commands::autostart::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
