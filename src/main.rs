use std::path::PathBuf;

use anyhow::{bail, Context};
use chrono::Utc;
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

use transcript_reconcile::config::AppConfig;
use transcript_reconcile::db::{self, PgStore};
use transcript_reconcile::ingest;
use transcript_reconcile::report;
use transcript_reconcile::{
    Catalog, EditSession, EngineError, Field, JsonFileStore, Reconciler, RowId, RowStore,
    TranscriptRow,
};

const SEED_TRANSCRIPT: &str = include_str!("../demos/transcript.csv");

#[derive(Parser)]
#[command(name = "transcript-reconcile")]
#[command(about = "Match scraped transcripts against a curriculum plan", long_about = None)]
struct Cli {
    /// Curriculum catalog (JSON); defaults to CURRICULUM_PATH
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,
    /// Local store file; ignored when DATABASE_URL is set
    #[arg(long, global = true)]
    store: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the Postgres schema
    InitDb,
    /// Load a small demo transcript
    Seed,
    /// Import scraped rows from a header-less CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
        /// Drop existing rows, edited ones included
        #[arg(long)]
        replace: bool,
    },
    /// Print progress for one major
    Reconcile {
        #[arg(long)]
        major: String,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Write a markdown progress report
    Report {
        #[arg(long)]
        major: String,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Override one cell of a row and commit
    Edit {
        /// Row id, or zero-based position
        #[arg(long)]
        row: String,
        #[arg(long)]
        field: String,
        #[arg(long)]
        value: String,
    },
    /// Clear the manual-edit flag of a row
    Reset {
        #[arg(long)]
        row: String,
    },
    /// Write the stored rows back out as positional CSV
    Export {
        #[arg(long, default_value = "transcript.csv")]
        out: PathBuf,
    },
}

enum Backend {
    Postgres(PgStore),
    File(JsonFileStore),
}

impl RowStore for Backend {
    async fn load(&self) -> Result<Option<Vec<TranscriptRow>>, EngineError> {
        match self {
            Backend::Postgres(store) => store.load().await,
            Backend::File(store) => store.load().await,
        }
    }

    async fn save(&self, rows: &[TranscriptRow]) -> Result<(), EngineError> {
        match self {
            Backend::Postgres(store) => store.save(rows).await,
            Backend::File(store) => store.save(rows).await,
        }
    }
}

enum RowSelector {
    Id(RowId),
    Position(usize),
}

fn parse_row(raw: &str) -> anyhow::Result<RowSelector> {
    if let Ok(index) = raw.trim().parse::<usize>() {
        return Ok(RowSelector::Position(index));
    }
    let id = raw
        .parse::<RowId>()
        .with_context(|| format!("`{raw}` is neither a row id nor a position"))?;
    Ok(RowSelector::Id(id))
}

fn resolve(session: &EditSession, selector: &RowSelector) -> anyhow::Result<RowId> {
    match selector {
        RowSelector::Id(id) => Ok(*id),
        RowSelector::Position(index) => session
            .rows()
            .get(*index)
            .map(|row| row.id)
            .ok_or_else(|| EngineError::RowOutOfRange {
                index: *index,
                len: session.rows().len(),
            })
            .map_err(Into::into),
    }
}

async fn load_rows(store: &Backend) -> anyhow::Result<Vec<TranscriptRow>> {
    Ok(store
        .load()
        .await
        .context("failed to load stored transcript")?
        .unwrap_or_default())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = AppConfig::from_env();
    if let Some(path) = cli.catalog {
        config.curriculum_path = path;
    }
    if let Some(path) = cli.store {
        config.store_path = path;
    }

    let pool = match &config.database_url {
        Some(url) => Some(
            PgPoolOptions::new()
                .max_connections(5)
                .connect(url)
                .await
                .context("failed to connect to Postgres")?,
        ),
        None => None,
    };
    let store = match &pool {
        Some(pool) => Backend::Postgres(PgStore::new(pool.clone(), config.cache_key.clone())),
        None => Backend::File(JsonFileStore::new(config.store_path.clone())),
    };

    match cli.command {
        Commands::InitDb => {
            let Some(pool) = &pool else {
                bail!("DATABASE_URL must be set to initialise the Postgres schema");
            };
            db::init_db(pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            let rows = ingest::read_csv(SEED_TRANSCRIPT.as_bytes())?;
            store.save(&rows).await?;
            println!("Seeded {} transcript rows.", rows.len());
        }
        Commands::Import { csv, replace } => {
            let file = std::fs::File::open(&csv)
                .with_context(|| format!("failed to open {}", csv.display()))?;
            let fresh = ingest::read_csv(file)?;
            let imported = fresh.len();
            let rows = if replace {
                fresh
            } else {
                let previous = load_rows(&store).await?;
                ingest::merge_fresh_scrape(&previous, fresh)
            };
            store.save(&rows).await?;
            println!(
                "Imported {imported} rows from {} ({} stored).",
                csv.display(),
                rows.len()
            );
        }
        Commands::Reconcile { major, limit } => {
            let catalog = Catalog::load(&config.curriculum_path)?;
            let plan = catalog.plan(&major)?;
            let rows = load_rows(&store).await?;
            let result = Reconciler::new(catalog.aliases().clone()).reconcile(plan, &rows);
            let stats = &result.stats;

            println!(
                "Credits {} / {} ({} passed), average {}",
                stats.earned_credits,
                stats.total_credits,
                stats.passed_credits,
                report::format_average(stats)
            );
            if result.matched.is_empty() {
                println!("No plan courses found on the transcript.");
            } else {
                println!("Plan courses:");
                for entry in result.matched.iter().take(limit) {
                    println!(
                        "- {} -> {} [{}] row {}",
                        entry.display_label,
                        entry.row.final_score,
                        entry.row.letter_grade,
                        entry.row.id
                    );
                }
            }
            if !result.unmapped.is_empty() {
                println!("Electives / unclassified:");
                for entry in result.unmapped.iter().take(limit) {
                    println!(
                        "- {} -> {} row {}",
                        entry.row.subject_name, entry.row.final_score, entry.row.id
                    );
                }
            }
        }
        Commands::Report { major, out } => {
            let catalog = Catalog::load(&config.curriculum_path)?;
            let plan = catalog.plan(&major)?;
            let rows = load_rows(&store).await?;
            let result = Reconciler::new(catalog.aliases().clone()).reconcile(plan, &rows);
            let report = report::build_report(plan, &result, Utc::now());
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
        Commands::Edit { row, field, value } => {
            let selector = parse_row(&row)?;
            let field: Field = field.parse()?;
            let rows = load_rows(&store).await?;
            let session = EditSession::begin(&rows);
            let id = resolve(&session, &selector)?;
            let committed = session.set_cell(id, field, value)?.commit(&store).await?;
            println!("Updated {field} on row {id} ({} rows stored).", committed.len());
        }
        Commands::Reset { row } => {
            let selector = parse_row(&row)?;
            let rows = load_rows(&store).await?;
            let session = EditSession::begin(&rows);
            let id = resolve(&session, &selector)?;
            session.reset_manual_flag(id)?.commit(&store).await?;
            println!("Cleared manual-edit flag on row {id}.");
        }
        Commands::Export { out } => {
            let rows = load_rows(&store).await?;
            let file = std::fs::File::create(&out)
                .with_context(|| format!("failed to create {}", out.display()))?;
            ingest::write_csv(file, &rows)?;
            println!("Exported {} rows to {}.", rows.len(), out.display());
        }
    }

    Ok(())
}
