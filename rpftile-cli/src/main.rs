//! RpfTile CLI - inspect CADRG/RPF datasets and decode frame files.

mod commands;
mod error;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::decode::DecodeArgs;
use commands::locate::LocateArgs;
use error::CliError;

#[derive(Debug, Parser)]
#[command(name = "rpftile", version, about = "CADRG/RPF map dataset tools")]
struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List the scales and zones of a dataset
    Info {
        /// Dataset directories, each containing an A.TOC
        #[arg(required = true)]
        dirs: Vec<PathBuf>,
    },

    /// Decode a frame file to a PNG image
    Decode {
        /// Path to the frame file
        frame: PathBuf,

        /// Output path (defaults to the frame name with .png)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Treat the frame as CIB imagery
        #[arg(long)]
        cib: bool,
    },

    /// Map a geographic coordinate to a zone and tile
    Locate {
        /// Dataset directories, each containing an A.TOC
        #[arg(required = true)]
        dirs: Vec<PathBuf>,

        /// Latitude in degrees
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        /// Longitude in degrees
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,

        /// Scale label, e.g. 1:250K (nearest available level is used)
        #[arg(short, long)]
        scale: Option<String>,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Info { dirs } => commands::info::run(dirs),
        Command::Decode { frame, output, cib } => commands::decode::run(DecodeArgs {
            frame,
            output,
            cib,
        }),
        Command::Locate {
            dirs,
            lat,
            lon,
            scale,
        } => commands::locate::run(LocateArgs {
            dirs,
            lat,
            lon,
            scale,
        }),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("Error: {error}");
            ExitCode::FAILURE
        }
    }
}
