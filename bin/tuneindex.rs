use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::info;
use tuneindex::{
    CatalogConfig, CatalogError, Field, JsonLinesSource, SearchFilters, SortOrder, TrackCatalog,
};

#[derive(Parser)]
#[command(name = "tuneindex")]
#[command(about = "Track catalog search engine", long_about = None)]
struct Args {
    /// Index directory
    #[arg(long, env = "TUNEINDEX_INDEX_DIR", default_value = "./index")]
    index_dir: PathBuf,

    /// JSON-lines track feed; when set, the index is rebuilt first if stale
    #[arg(long, env = "TUNEINDEX_SOURCE", global = true)]
    source: Option<PathBuf>,

    /// Maximum number of search hits
    #[arg(long, env = "TUNEINDEX_MAX_HITS", default_value = "1000")]
    max_hits: usize,

    /// Shuffle sampling budget in milliseconds
    #[arg(long, env = "TUNEINDEX_SAMPLER_TIMEOUT_MS", default_value = "1000")]
    sampler_timeout_ms: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Rebuild the index from --source unconditionally
    Rebuild,
    /// Keyword search; the last word matches as a prefix
    Search {
        keywords: String,
        #[arg(long)]
        year: Option<i32>,
        #[arg(long)]
        genre: Option<String>,
        /// default, artist, album or track
        #[arg(long, default_value = "default")]
        sort: String,
    },
    /// Look up one track by id
    Get { track_id: String },
    /// List an album's tracks
    Album { album_id: String },
    /// Random playlist of distinct tracks
    Shuffle {
        size: usize,
        #[arg(long)]
        year: Option<i32>,
    },
    /// Distinct values of an indexed field (genre, year, artistId, ...)
    Facets { field: String },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => match e.downcast_ref::<CatalogError>() {
            Some(CatalogError::LockHeld(path)) => {
                eprintln!("tuneindex is already running against {}", path.display());
                ExitCode::from(2)
            }
            _ => {
                eprintln!("Error: {e:#}");
                ExitCode::FAILURE
            }
        },
    }
}

fn run(args: Args) -> Result<()> {
    info!("Starting tuneindex v{}", tuneindex::VERSION);

    let config = CatalogConfig::new(&args.index_dir)
        .with_max_hits(args.max_hits)
        .with_sampler_timeout(Duration::from_millis(args.sampler_timeout_ms));
    let catalog = TrackCatalog::open(config)?;

    if let Command::Rebuild = args.command {
        let path = args
            .source
            .context("rebuild needs --source (or TUNEINDEX_SOURCE)")?;
        let stats = catalog.rebuild(&mut JsonLinesSource::new(path))?;
        print_json(&stats)?;
        return Ok(catalog.close()?);
    }

    if let Some(path) = &args.source {
        if let Some(stats) = catalog.prepare(&mut JsonLinesSource::new(path))? {
            info!("Rebuilt {} tracks ({} skipped)", stats.indexed, stats.skipped);
        }
    }

    match args.command {
        Command::Rebuild => {}
        Command::Search {
            keywords,
            year,
            genre,
            sort,
        } => {
            let sort: SortOrder = sort.parse()?;
            let filters = SearchFilters { year, genre };
            print_json(&catalog.search(Some(&keywords), &filters, sort))?;
        }
        Command::Get { track_id } => print_json(&catalog.get_by_id(&track_id)?)?,
        Command::Album { album_id } => print_json(&catalog.get_by_album_id(&album_id)?)?,
        Command::Shuffle { size, year } => print_json(&catalog.shuffled_playlist(size, year))?,
        Command::Facets { field } => {
            let field: Field = field.parse()?;
            match field {
                Field::Genre => print_json(&catalog.genres())?,
                Field::Year => print_json(&catalog.years())?,
                other => {
                    let mut values = catalog.distinct_values(other);
                    values.sort();
                    print_json(&values)?;
                }
            }
        }
    }

    catalog.close()?;
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let mut out = io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, value)?;
    writeln!(out)?;
    Ok(())
}
