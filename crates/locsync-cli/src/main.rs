use std::io::IsTerminal;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::Result;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

mod commands;

#[derive(Parser)]
#[command(name = "locsync", version, about = "Locale file synchronization driven by an LLM translation provider")]
struct Cli {
    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Project root containing the locsync config and locale files
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    /// Explicit config file path (defaults to locsync.toml/.json under --root)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format for summaries
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate added/changed keys and merge them into the target locales
    Sync {
        /// Compute the plan without provider calls or writes
        #[arg(long, default_value_t = false)]
        dry_run: bool,
        /// Restrict the run to specific target locales (repeatable)
        #[arg(long = "target")]
        targets: Vec<String>,
    },

    /// Show the diff classification per target locale, no provider calls
    Status {
        #[arg(long = "target")]
        targets: Vec<String>,
    },

    /// Write a starter locsync.toml into the project root
    Init {
        /// Overwrite an existing config
        #[arg(long, default_value_t = false)]
        force: bool,
    },

    /// Dump JSON schemas of the machine-readable report types
    Schema {
        #[arg(long)]
        out_dir: PathBuf,
    },
}

fn init_tracing() -> tracing_appender::non_blocking::WorkerGuard {
    let file_appender = tracing_appender::rolling::daily("logs", "locsync.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let console_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")));

    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_target(true)
        .with_writer(file_writer)
        .with_filter(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();
    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let _guard = init_tracing();

    let cli = Cli::parse();

    let use_color = !cli.no_color
        && std::io::stdout().is_terminal()
        && std::env::var_os("NO_COLOR").is_none();

    let json = cli.format == OutputFormat::Json;
    match cli.cmd {
        Commands::Sync { dry_run, targets } => {
            commands::sync::run(&cli.root, cli.config.as_deref(), dry_run, &targets, use_color, json)
                .await
        }
        Commands::Status { targets } => {
            commands::status::run(&cli.root, cli.config.as_deref(), &targets, use_color, json)
        }
        Commands::Init { force } => commands::init::run(&cli.root, force),
        Commands::Schema { out_dir } => commands::schema::run(&out_dir),
    }
}
