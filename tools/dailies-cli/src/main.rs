//! Dailies CLI: render slates and review movies from image sequences.
//!
//! Usage:
//!   dailies slate <PATTERN> [FIELDS]        Render a slate image
//!   dailies mov <PATTERN> -o <OUT> [FIELDS] Render a review movie
//!   dailies probe <PATH>                    Show video stream metadata
//!   dailies check                           Check engine and resources

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use dailies_common::config::LoadedConfig;
use dailies_render_engine::CancelToken;

mod commands;

use commands::fields::FieldArgs;

#[derive(Parser)]
#[command(
    name = "dailies",
    about = "Slate and review movie generation for VFX dailies",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (defaults to $DAILIES_CONFIG or the standard locations)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Print engine commands instead of running them
    #[arg(long, global = true)]
    dry_run: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a slate image for a sequence
    Slate {
        /// Sequence pattern, e.g. /shots/shot010/shot010.%04d.exr
        pattern: String,

        /// Copy the rendered slate here
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        fields: FieldArgs,
    },

    /// Render a review movie for a sequence
    Mov {
        /// Sequence pattern, e.g. /shots/shot010/shot010.%04d.exr
        pattern: String,

        /// Output movie path
        #[arg(short, long)]
        output: PathBuf,

        /// Video preset name from the configuration
        #[arg(long, default_value = "")]
        preset: String,

        /// Skip the file name and frame counter burn-ins
        #[arg(long)]
        no_burnin: bool,

        /// Skip the slate frame
        #[arg(long)]
        no_slate: bool,

        /// Keep the intermediate slate image
        #[arg(long)]
        keep_temp: bool,

        #[command(flatten)]
        fields: FieldArgs,
    },

    /// Show metadata of the first video stream of a media file
    Probe {
        /// Media file
        path: PathBuf,
    },

    /// Check engine executables and slate resources
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => LoadedConfig::load(path)?,
        None => LoadedConfig::discover()?,
    };

    // Initialize logging
    let mut logging = loaded.config.logging.clone();
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    dailies_common::logging::init_logging(&logging);
    tracing::debug!(root = %loaded.root.display(), "Using configuration");

    let cancel = CancelToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, stopping the engine");
            interrupt.cancel();
        }
    });

    // Engine runs block until the child exits.
    tokio::task::spawn_blocking(move || run(cli, loaded, cancel)).await?
}

fn run(cli: Cli, mut loaded: LoadedConfig, cancel: CancelToken) -> anyhow::Result<()> {
    match cli.command {
        Commands::Slate {
            pattern,
            output,
            fields,
        } => commands::slate::run(loaded, cli.dry_run, cancel, &pattern, output, &fields),
        Commands::Mov {
            pattern,
            output,
            preset,
            no_burnin,
            no_slate,
            keep_temp,
            fields,
        } => {
            if keep_temp {
                loaded.config.keep_temp_files = true;
            }
            commands::mov::run(
                loaded,
                cli.dry_run,
                cancel,
                &pattern,
                &output,
                commands::mov::MovArgs {
                    preset,
                    burnin: !no_burnin,
                    slate: !no_slate,
                },
                &fields,
            )
        }
        Commands::Probe { path } => commands::probe::run(loaded, &path),
        Commands::Check => commands::check::run(&loaded),
    }
}
