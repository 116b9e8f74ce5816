//! Bokslut CLI binary.
//!
//! Extracts and analyzes Swedish inline-XBRL annual reports.

mod commands;
mod error;
mod settings;

use clap::{Parser, Subcommand};
use settings::Settings;
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "bokslut")]
#[command(about = "Bokslut: financial facts and red flags from Swedish annual reports", long_about = None)]
#[command(version)]
struct Cli {
    /// JSON settings file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract the record of one document
    Extract {
        /// Inline-XBRL document
        file: PathBuf,
    },

    /// Extract one document and report ratios, red flags and trend
    Analyze {
        /// Inline-XBRL document
        file: PathBuf,

        /// Registry status as JSON, e.g. '{"liquidation": {"since": "2024-05-02"}}'
        #[arg(long)]
        status: Option<String>,
    },

    /// Trend over several documents of the same entity
    Trend {
        /// Inline-XBRL documents, in any order
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Multi-year analysis of an entity from a filing directory
    Entity {
        /// Directory with one subdirectory per organisation number
        dir: PathBuf,

        /// Organisation number
        orgnr: String,

        /// Number of most recent filings to read
        #[arg(long, default_value = "5")]
        years: usize,

        /// Record cache database
        #[arg(long)]
        cache: Option<PathBuf>,

        /// Disable the record cache
        #[arg(long, conflicts_with = "cache")]
        no_cache: bool,

        /// Registry status as JSON
        #[arg(long)]
        status: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .init();
}

async fn run(cli: Cli) -> error::Result<()> {
    let settings = Settings::load(cli.config.as_deref())?;
    let analyzer = settings.analyzer()?;

    match cli.command {
        Commands::Extract { file } => commands::extract(&analyzer, &file),
        Commands::Analyze { file, status } => {
            let status = commands::parse_status(status.as_deref())?;
            commands::analyze(&analyzer, &file, &status)
        }
        Commands::Trend { files } => commands::trend(&analyzer, files).await,
        Commands::Entity {
            dir,
            orgnr,
            years,
            cache,
            no_cache,
            status,
        } => {
            let status = commands::parse_status(status.as_deref())?;
            let cache = if no_cache {
                None
            } else {
                Some(cache.unwrap_or_else(settings::default_cache_path))
            };
            commands::entity(&analyzer, &dir, &orgnr, years, cache.as_deref(), &status)
        }
    }
}
