//! Corpus CLI - resolve works and search metadata from the command line.
//!
//! Locations are printed one per line on stdout; search results are printed
//! as JSON. Logs go to stderr.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use corpus_core::{Corpus, CorpusError, Field, MovementSelector, WorkLocation};
use std::path::PathBuf;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "corpus")]
#[command(about = "Resolve and search a corpus of musical works")]
struct Args {
    /// Corpus root directory (defaults to the current directory)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Directory for index snapshots
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,

    /// Disable the index snapshot cache
    #[arg(long, global = true)]
    no_cache: bool,

    /// Concurrent parse workers during index builds
    #[arg(long, global = true)]
    workers: Option<usize>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the first location an identifier resolves to
    Work {
        identifier: String,
        /// Movement: `2`, `1-01`, or an inclusive range `1,3`
        #[arg(short, long, value_parser = parse_movement)]
        movement: Option<MovementSelector>,
        /// Accepted extensions (repeatable)
        #[arg(short, long = "ext")]
        extensions: Vec<String>,
    },
    /// Print every location an identifier resolves to
    List {
        identifier: String,
        #[arg(short, long, value_parser = parse_movement)]
        movement: Option<MovementSelector>,
        #[arg(short, long = "ext")]
        extensions: Vec<String>,
    },
    /// Print every location under a composer or collection
    Composer {
        name: String,
        #[arg(short, long = "ext")]
        extensions: Vec<String>,
    },
    /// Print every local file with the given extensions
    Paths {
        #[arg(short, long = "ext")]
        extensions: Vec<String>,
    },
    /// Regex search over indexed metadata
    Search {
        /// Regular expression, matched anywhere in a value
        query: String,
        /// composer, locale, timeSignature, keySignature or title
        #[arg(short, long)]
        field: Option<String>,
    },
    /// Rebuild the metadata index (Ctrl-C cancels)
    Rebuild,
}

fn parse_movement(value: &str) -> std::result::Result<MovementSelector, String> {
    match value.split_once(',') {
        Some((start, end)) => {
            let start = start.trim().parse().map_err(|e| format!("{}: {}", start, e))?;
            let end = end.trim().parse().map_err(|e| format!("{}: {}", end, e))?;
            Ok(MovementSelector::Range(start, end))
        }
        None => Ok(MovementSelector::from(value.trim())),
    }
}

fn print_locations(locations: &[WorkLocation]) {
    for location in locations {
        println!("{}", location);
    }
}

fn ext_refs(extensions: &[String]) -> Vec<&str> {
    extensions.iter().map(String::as_str).collect()
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Set up logging
    let log_level = if args.debug { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let root = match args.root {
        Some(path) => path,
        None => std::env::current_dir().context("Failed to read current directory")?,
    };

    let mut builder = Corpus::builder(&root).cache_enabled(!args.no_cache);
    if let Some(dir) = args.cache_dir {
        builder = builder.cache_dir(dir);
    }
    if let Some(workers) = args.workers {
        builder = builder.workers(workers);
    }
    let corpus = builder
        .build()
        .await
        .with_context(|| format!("Failed to open corpus at {}", root.display()))?;

    match args.command {
        Command::Work {
            identifier,
            movement,
            extensions,
        } => {
            let location = corpus.get_work(&identifier, movement, &ext_refs(&extensions))?;
            println!("{}", location);
        }
        Command::List {
            identifier,
            movement,
            extensions,
        } => {
            print_locations(&corpus.get_work_list(&identifier, movement, &ext_refs(&extensions)));
        }
        Command::Composer { name, extensions } => {
            print_locations(&corpus.get_composer(&name, &ext_refs(&extensions)));
        }
        Command::Paths { extensions } => {
            print_locations(&corpus.get_paths(&ext_refs(&extensions)));
        }
        Command::Search { query, field } => {
            let field: Option<Field> = field.as_deref().map(str::parse::<Field>).transpose()?;
            let result = corpus.search(&query, field).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Rebuild => {
            let handle = corpus.spawn_rebuild();
            let token = handle.token().clone();

            let cancel = tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("Interrupt received, cancelling index build");
                    token.cancel();
                }
            });

            let result = handle.wait().await;
            cancel.abort();

            match result {
                Ok(index) => {
                    info!(
                        "Index rebuilt: {} bundles, {} skipped",
                        index.len(),
                        index.skipped().len()
                    );
                    for skipped in index.skipped() {
                        println!("skipped\t{}\t{}", skipped.source_path, skipped.reason);
                    }
                }
                Err(CorpusError::Cancelled) => {
                    info!("Index build cancelled, previous index kept");
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    Ok(())
}
