//! `organ-wrap` command line.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use organ_wrap::OutputFormat;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Watertightness check, shrink wrap, and volume report for anatomical meshes
#[derive(Parser)]
#[command(name = "organ-wrap")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Watertightness check, shrink wrap, and volume report for anatomical meshes", long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Console output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    format: OutputFormat,

    /// Suppress console summaries
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process every structure of every organ
    Structures(commands::structures::StructuresArgs),
    /// Wrap each organ as one merged mesh
    Organs(commands::organs::OrgansArgs),
    /// Classify mesh files and print their reports
    Check(commands::check::CheckArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let global = commands::GlobalOptions {
        config: cli.config,
        format: cli.format,
        quiet: cli.quiet,
    };

    match cli.command {
        Commands::Structures(args) => commands::structures::execute(args, &global),
        Commands::Organs(args) => commands::organs::execute(args, &global),
        Commands::Check(args) => commands::check::execute(args, &global),
    }
}
