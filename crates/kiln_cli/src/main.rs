//! Kiln CLI: task change detection and cache artifact packing.
//!
//! Provides `kiln pack` and `kiln unpack` for moving a directory tree in and
//! out of a single cache artifact, and `kiln status` for explaining why a
//! task is out of date against its recorded history.

#![warn(missing_docs)]

mod pack;
mod settings;
mod status;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Kiln: incremental task state and cache artifacts.
#[derive(Parser, Debug)]
#[command(name = "kiln", version, about = "Kiln incremental build cache")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (info-level) logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a custom `kiln.toml` configuration file.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Pack a directory tree into a cache artifact.
    Pack(PackArgs),
    /// Restore a directory tree from a cache artifact.
    Unpack(UnpackArgs),
    /// Report whether a task is up to date.
    Status(StatusArgs),
}

/// Arguments for the `kiln pack` subcommand.
#[derive(Parser, Debug)]
pub struct PackArgs {
    /// Directory whose contents are packed.
    pub dir: PathBuf,

    /// Artifact file to write.
    #[arg(short, long)]
    pub output: PathBuf,

    /// Write a plain archive regardless of configuration.
    #[arg(long)]
    pub no_compress: bool,
}

/// Arguments for the `kiln unpack` subcommand.
#[derive(Parser, Debug)]
pub struct UnpackArgs {
    /// Artifact file to read.
    pub file: PathBuf,

    /// Directory to restore into.
    #[arg(short = 'd', long = "dir")]
    pub dir: PathBuf,

    /// Read a plain archive regardless of configuration.
    #[arg(long)]
    pub no_compress: bool,
}

/// Arguments for the `kiln status` subcommand.
#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// Task path, e.g. `:app:compile`.
    #[arg(long)]
    pub task: String,

    /// JSON file holding the task's current execution record.
    #[arg(long)]
    pub current: PathBuf,

    /// Directory holding the task history.
    #[arg(long, default_value = ".kiln")]
    pub state_dir: PathBuf,

    /// Store the current record as the task's new history.
    #[arg(long)]
    pub record: bool,

    /// Inputs discovered while the task ran, stored with `--record`.
    #[arg(long, num_args = 1..)]
    pub discovered: Vec<PathBuf>,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to log at info level.
    pub verbose: bool,
    /// Optional path to a custom config file.
    pub config: Option<String>,
}

fn main() {
    let cli = Cli::parse();

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        config: cli.config,
    };
    init_logging(&global);

    let result = match cli.command {
        Command::Pack(ref args) => pack::run_pack(args, &global),
        Command::Unpack(ref args) => pack::run_unpack(args, &global),
        Command::Status(ref args) => status::run(args, &global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

/// Installs the stderr log subscriber. `RUST_LOG` takes precedence over the
/// level implied by `--quiet` and `--verbose`.
fn init_logging(global: &GlobalArgs) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level(global)));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}

fn default_level(global: &GlobalArgs) -> &'static str {
    if global.quiet {
        "error"
    } else if global.verbose {
        "info"
    } else {
        "warn"
    }
}
