// Only compile the TUI module when the tui feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use quotebook::{
    export_csv, filter_by_category, import_csv, pick_random, validate_submission, QuoteStore,
    RemoteSource, SyncEngine, SyncTrigger, DEFAULT_SYNC_INTERVAL_SECS,
};

#[derive(Parser)]
#[command(name = "quotebook")]
#[command(version)]
#[command(about = "Local-first quote manager with server reconciliation")]
struct Cli {
    /// Database path (defaults to the platform data directory)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print one random quote from the filtered view
    Show {
        /// Category to filter by (defaults to the last selection)
        #[arg(short, long)]
        category: Option<String>,
    },
    /// Add a quote locally, then push it to the remote
    Add { text: String, category: String },
    /// List the collection
    List {
        #[arg(short, long)]
        category: Option<String>,
    },
    /// Run one sync cycle now
    Sync,
    /// Run the periodic sync in the foreground
    Watch {
        /// Seconds between cycles
        #[arg(short, long, default_value_t = DEFAULT_SYNC_INTERVAL_SECS)]
        interval: u64,
    },
    /// Show recent sync cycles
    History {
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },
    /// Import quotes from a CSV file (merged like a sync batch)
    Import { path: PathBuf },
    /// Export the collection to a CSV file
    Export { path: PathBuf },
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "quotebook=info".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn default_db_path() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("", "", "quotebook")
        .context("could not determine a data directory for this platform")?;

    std::fs::create_dir_all(dirs.data_dir())
        .with_context(|| format!("failed to create {}", dirs.data_dir().display()))?;

    Ok(dirs.data_dir().join("quotebook.db"))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let db_path = match cli.db {
        Some(path) => path,
        None => default_db_path()?,
    };
    let store = QuoteStore::open(&db_path)?;
    let engine = SyncEngine::new(RemoteSource::from_env());
    let rt = tokio::runtime::Runtime::new().context("failed to start async runtime")?;

    match cli.command {
        Some(Commands::Show { category }) => {
            let quotes = store.load_quotes();
            let selected = category.unwrap_or_else(|| store.load_selected_category());
            store.save_selected_category(&selected)?;

            match pick_random(&quotes, &selected) {
                Some(quote) => println!("\"{}\"\n  - {}", quote.text, quote.category),
                None => println!("No quotes available for '{}'.", selected),
            }
        }
        Some(Commands::Add { text, category }) => {
            let mut quotes = store.load_quotes();

            let quote = match validate_submission(&text, &category, &quotes) {
                Ok(quote) => quote,
                Err(err) => {
                    eprintln!("❌ {err}");
                    std::process::exit(1);
                }
            };

            quotes.push(quote.clone());
            store.save_quotes(&quotes)?;
            println!("✓ Added \"{}\" [{}]", quote.text, quote.category);

            // Local state is already saved; the mock endpoint does not
            // persist anyway, so a failed push is only logged.
            if let Err(err) = rt.block_on(engine.remote().push_quote(&quote)) {
                tracing::warn!("push to remote failed: {err}");
            }
        }
        Some(Commands::List { category }) => {
            let quotes = store.load_quotes();
            let selected = category.unwrap_or_else(|| store.load_selected_category());

            let filtered = filter_by_category(&quotes, &selected);
            for quote in &filtered {
                println!("[{}] {}", quote.category, quote.text);
            }
            println!("({} quote(s), filter: {})", filtered.len(), selected);
        }
        Some(Commands::Sync) => match rt.block_on(engine.sync_once(&store, SyncTrigger::Manual)) {
            Ok(report) => {
                println!("✓ {}", report.summary());
                if report.merge.conflict_occurred() {
                    println!(
                        "⚖️  {} conflict(s) resolved automatically, server data preferred",
                        report.merge.conflicts.len()
                    );
                }
            }
            Err(err) => {
                eprintln!("❌ Sync failed: {err:#}");
                std::process::exit(1);
            }
        },
        Some(Commands::Watch { interval }) => {
            println!(
                "Watching {} every {}s (Ctrl-C to stop)",
                engine.remote().base_url(),
                interval
            );
            rt.block_on(engine.run_periodic(&store, Duration::from_secs(interval)))?;
        }
        Some(Commands::History { limit }) => {
            let records = store.recent_syncs(limit)?;
            if records.is_empty() {
                println!("No sync cycles recorded yet.");
            }
            for record in records {
                println!("{}", record.summary());
            }
        }
        Some(Commands::Import { path }) => {
            let incoming = import_csv(&path)?;
            let report = engine.apply_batch(&store, &incoming, SyncTrigger::Import)?;
            println!("✓ {}", report.summary());
        }
        Some(Commands::Export { path }) => {
            let quotes = store.load_quotes();
            export_csv(&path, &quotes)?;
            println!("✓ Exported {} quote(s) to {}", quotes.len(), path.display());
        }
        None => run_tui(&store, &engine, &rt)?,
    }

    Ok(())
}

#[cfg(feature = "tui")]
fn run_tui(store: &QuoteStore, engine: &SyncEngine, rt: &tokio::runtime::Runtime) -> Result<()> {
    let mut app = ui::App::new(store);
    ui::run_ui(&mut app, store, engine, rt)
}

#[cfg(not(feature = "tui"))]
fn run_tui(_store: &QuoteStore, _engine: &SyncEngine, _rt: &tokio::runtime::Runtime) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use the subcommands: quotebook show / add / sync");
    std::process::exit(1);
}
