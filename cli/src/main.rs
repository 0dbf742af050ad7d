//! PortGuard CLI - Audit listening network ports
//!
//! A command-line tool for scanning local listeners with risk
//! assessment and watching them for changes.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use commands::scan::ScanArgs;
use commands::watch::WatchArgs;

#[derive(Parser)]
#[command(name = "portguard")]
#[command(author, version, about = "Audit listening network ports")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan listening ports and assess their risk
    #[command(alias = "ls")]
    Scan(ScanArgs),

    /// Rescan periodically and report changes
    Watch(WatchArgs),

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Set the watch interval in seconds
    SetInterval { seconds: u64 },
    /// Restore default configuration
    Reset,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("portguard={0},portguard_core={0}", default_level)));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Some(Commands::Scan(args)) => commands::scan::run(args, cli.json).await?,
        Some(Commands::Watch(args)) => commands::watch::run(args, cli.json).await?,
        Some(Commands::Config { action }) => match action {
            ConfigAction::Show => commands::config::show(cli.json).await?,
            ConfigAction::SetInterval { seconds } => commands::config::set_interval(seconds).await?,
            ConfigAction::Reset => commands::config::reset().await?,
        },
        None => commands::scan::run(ScanArgs::default(), cli.json).await?,
    }

    Ok(())
}
