use clap::{ArgAction, Parser, Subcommand};
use commands::{config, daemon, sync};
use std::path::PathBuf;

mod commands;
mod logging;
mod output;

#[derive(Parser)]
#[command(name = "watchlog")]
#[command(about = "watchlog - Archive Tautulli playback history into PostgreSQL")]
#[command(version)]
struct Cli {
    /// Enable verbose output (use multiple times for more verbosity: -v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "human", value_enum)]
    output: output::OutputFormat,

    /// Path to a TOML config file (environment variables override its values)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Write logs to a daily-rotated file instead of stderr
    #[arg(long, global = true, value_name = "PATH")]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the polling loop until terminated
    #[command(long_about = "Run watchlog as a long-lived service. A sync cycle runs immediately, then again after every interval. Failed cycles are logged and retried on the next interval; the process only exits on SIGINT/SIGTERM.")]
    Daemon {
        /// Seconds between cycles (overrides config and SYNC_INTERVAL_SECS)
        #[arg(long, value_name = "SECONDS")]
        interval: Option<u64>,

        /// Wait one interval before the first cycle
        #[arg(long, action = ArgAction::SetTrue)]
        no_startup_sync: bool,
    },
    /// Run a single sync cycle and exit
    #[command(long_about = "Fetch recent history once, store new records, and print the counts. Exits non-zero if the cycle failed.")]
    Sync,
    /// Inspect configuration
    Config {
        #[command(subcommand)]
        cmd: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the effective configuration (masks secrets)
    Show {
        /// Show secrets unmasked
        #[arg(long, action = ArgAction::SetTrue)]
        full: bool,
    },
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    logging::init_logging(cli.verbose, cli.quiet, cli.log_file.as_deref())
        .map_err(|e| color_eyre::eyre::eyre!("{}", e))?;

    let output = output::Output::new(cli.output, cli.quiet);
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Daemon {
            interval,
            no_startup_sync,
        } => daemon::run_daemon(config_path, interval, no_startup_sync).await,
        Commands::Sync => sync::run_sync(config_path, &output).await,
        Commands::Config { cmd } => match cmd {
            ConfigCommands::Show { full } => config::run_show(config_path, full, &output),
        },
    }
}
