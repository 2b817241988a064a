use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod common;
mod platform;

#[derive(Parser)]
#[command(name = "mindguard-cli", version, about = "MindGuard CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Blocked app management
    Block {
        #[command(subcommand)]
        action: commands::block::BlockAction,
    },
    /// Per-app usage statistics
    Usage {
        #[command(subcommand)]
        action: commands::usage::UsageAction,
    },
    /// Reporter token and base URL
    Auth {
        #[command(subcommand)]
        action: commands::auth::AuthAction,
    },
    /// Screen-time reporting
    Report {
        #[command(subcommand)]
        action: commands::report::ReportAction,
    },
    /// Drive the enforcement engine from an event feed
    Enforce {
        #[command(subcommand)]
        action: commands::enforce::EnforceAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Permission status and settings
    Permissions {
        #[command(subcommand)]
        action: commands::permissions::PermissionsAction,
    },
}

fn main() {
    init_tracing();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Block { action } => commands::block::run(action),
        Commands::Usage { action } => commands::usage::run(action),
        Commands::Auth { action } => commands::auth::run(action),
        Commands::Report { action } => commands::report::run(action),
        Commands::Enforce { action } => commands::enforce::run(action),
        Commands::Config { action } => commands::config::run(action),
        Commands::Permissions { action } => commands::permissions::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

/// Logs go to stderr so command output on stdout stays machine readable.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
