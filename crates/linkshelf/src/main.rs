//! linkshelf CLI: store bookmarks and enrich them with page summaries and tags.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use log::{error, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter};

use linkshelf::{
    load_config, recover_interrupted, BookmarkService, Config, ConfigError, Database,
    EnrichmentJob, Enricher, JobQueue, LinkshelfError, NewBookmark, OutcomeKind, WorkerError,
    WorkerPool,
};

#[derive(Parser)]
#[command(name = "linkshelf", version, about = "Bookmark store with AI enrichment")]
struct Cli {
    /// Config file (JSON or YAML). Built-in defaults are used when omitted.
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a bookmark and wait for its enrichment
    Add {
        url: String,

        #[arg(long, default_value = "1")]
        user: i64,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        favorite: bool,

        /// Store the bookmark without AI enrichment
        #[arg(long)]
        no_ai: bool,

        /// Correlation id for the enrichment logs; generated when omitted
        #[arg(long)]
        trace_id: Option<String>,
    },

    /// Enrich every pending or interrupted bookmark, then exit
    Worker {
        /// Overrides `worker_count` from the config
        #[arg(long)]
        workers: Option<usize>,
    },

    /// Print a bookmark as JSON
    Show { id: i64 },

    /// Mark or unmark a bookmark as favorite
    Favorite {
        id: i64,

        #[arg(long)]
        off: bool,
    },
}

/// Queue for commands that never schedule enrichment.
struct NoQueue;

impl JobQueue for NoQueue {
    fn enqueue(&self, _job: EnrichmentJob) -> Result<(), WorkerError> {
        Err(WorkerError::ChannelClosed)
    }
}

fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    tracing_log::LogTracer::init()?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        let subscriber = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr));
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr));
        tracing::subscriber::set_global_default(subscriber)?;
    }
    Ok(())
}

fn open_database(config: &Config) -> linkshelf::Result<Arc<Database>> {
    let path = config.database_path().ok_or_else(|| {
        LinkshelfError::Config(ConfigError::Validation {
            message: "database_path is not set and no home directory was found".to_string(),
        })
    })?;
    Ok(Arc::new(Database::open(&path)?))
}

fn print_json<T: serde::Serialize>(value: &T) -> linkshelf::Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(LinkshelfError::Output)?;
    println!("{}", json);
    Ok(())
}

fn run(cli: Cli) -> linkshelf::Result<()> {
    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => Config::default(),
    };
    let db = open_database(&config)?;

    match cli.command {
        Commands::Add {
            url,
            user,
            title,
            favorite,
            no_ai,
            trace_id,
        } => {
            let mut new = NewBookmark::new(user, url);
            new.title = title.unwrap_or_default();
            new.is_favorite = favorite;
            new.ai_enabled = !no_ai;

            if no_ai {
                let service = BookmarkService::new(db, Arc::new(NoQueue));
                let bookmark = service.create(new)?;
                return print_json(&bookmark);
            }

            let enricher = Arc::new(Enricher::from_config(&config, db.clone())?);
            let pool = Arc::new(WorkerPool::new(enricher, 1)?);
            let service = BookmarkService::new(db.clone(), pool.clone());

            let bookmark = service.create_traced(new, trace_id)?;
            if let Some(outcome) = pool.recv_result() {
                if let OutcomeKind::Failed { error } = &outcome.kind {
                    warn!("Enrichment failed: {}", error);
                }
            }
            pool.shutdown();

            print_json(&service.get(bookmark.id)?)
        }

        Commands::Worker { workers } => {
            let worker_count = workers.unwrap_or(config.worker_count);
            let enricher = Arc::new(Enricher::from_config(&config, db.clone())?);
            let pool = WorkerPool::new(enricher, worker_count)?;

            let interrupted = Arc::new(AtomicBool::new(false));
            let flag = Arc::clone(&interrupted);
            if let Err(e) = ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed)) {
                warn!("Failed to install Ctrl-C handler: {}", e);
            }

            let total = recover_interrupted(db.as_ref(), &pool)?;
            info!("Processing {} bookmarks with {} workers", total, worker_count);

            let mut done = 0;
            let mut failed = 0;
            while done < total && !interrupted.load(Ordering::Relaxed) {
                if let Some(outcome) = pool.recv_result_timeout(Duration::from_millis(500)) {
                    done += 1;
                    if !outcome.is_completed() {
                        failed += 1;
                    }
                }
            }

            if done < total {
                info!(
                    "Interrupted with {} bookmarks unfinished ({} not yet started)",
                    total - done,
                    pool.queued()
                );
            }
            pool.shutdown();
            pool.wait();
            info!("Enriched {} bookmarks ({} not completed)", done, failed);
            Ok(())
        }

        Commands::Show { id } => {
            let service = BookmarkService::new(db, Arc::new(NoQueue));
            print_json(&service.get(id)?)
        }

        Commands::Favorite { id, off } => {
            let service = BookmarkService::new(db, Arc::new(NoQueue));
            print_json(&service.set_favorite(id, !off)?)
        }
    }
}

fn main() -> ExitCode {
    if let Err(e) = init_logging() {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
