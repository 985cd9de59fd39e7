//! Finds CLI — merge extraction snapshots into the venue store.
//!
//! Candidate records are JSON files as produced by the extraction
//! pipeline: data fields plus a `field_confidence` map and optional
//! `source_info`. Each file is one source. Malformed files are skipped
//! with a warning and never abort the batch; store-level failures do.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use finds_core::{CandidateRecord, ListingStore};
use finds_store_sqlite::SqliteStore;
use serde::Deserialize;
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Finds venue store CLI")]
struct Cli {
  /// Path to the SQLite database; overrides config file and environment.
  #[arg(long)]
  db: Option<PathBuf>,

  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Merge one or more candidate JSON files into an entity's record.
  Upsert {
    /// Official entity name — the identity key, fully trusted.
    #[arg(long)]
    name: String,

    /// Entity type; decides the listing/entity field split.
    #[arg(long, default_value = "venue")]
    entity_type: String,

    /// Fold all files into one candidate before a single upsert
    /// (progressive augmentation; file order decides scalar ties).
    #[arg(long)]
    merge_sources: bool,

    /// Candidate record files, one JSON object per file.
    #[arg(required = true)]
    files: Vec<PathBuf>,
  },

  /// Print a stored record as JSON.
  Show {
    /// Entity name to look up.
    #[arg(long, conflicts_with = "id")]
    name: Option<String>,

    #[arg(long, default_value = "venue")]
    entity_type: String,

    /// Look up by immutable listing id instead of name.
    #[arg(long)]
    id: Option<String>,
  },

  /// List all stored listings.
  List,
}

/// Runtime settings from `config.toml` plus `FINDS_*` environment
/// overrides. Built once here and passed down explicitly — no globals.
#[derive(Debug, Deserialize)]
struct Settings {
  #[serde(default = "default_database_path")]
  database_path: PathBuf,
}

fn default_database_path() -> PathBuf {
  PathBuf::from("finds.db")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config.clone()).required(false))
    .add_source(config::Environment::with_prefix("FINDS"))
    .build()
    .context("failed to read configuration")?;
  let settings: Settings = settings
    .try_deserialize()
    .context("failed to deserialise settings")?;

  let db_path = cli.db.unwrap_or(settings.database_path);
  let store = SqliteStore::open(&db_path)
    .await
    .with_context(|| format!("failed to open store at {db_path:?}"))?;

  match cli.command {
    Command::Upsert {
      name,
      entity_type,
      merge_sources,
      files,
    } => run_upsert(&store, &name, &entity_type, merge_sources, &files).await,
    Command::Show {
      name,
      entity_type,
      id,
    } => run_show(&store, name, entity_type, id).await,
    Command::List => run_list(&store).await,
  }
}

// ─── Upsert ──────────────────────────────────────────────────────────────────

async fn run_upsert(
  store: &SqliteStore,
  name: &str,
  entity_type: &str,
  merge_sources: bool,
  files: &[PathBuf],
) -> anyhow::Result<()> {
  // Load every file first; unreadable or malformed snapshots are skipped,
  // not fatal — one bad source must not block the others.
  let mut candidates = Vec::new();
  for path in files {
    match load_candidate(path) {
      Ok(candidate) if candidate.is_empty() => {
        // A source that yielded no usable data is a no-op, not an error.
        info!(file = %path.display(), "candidate carries no fields; skipping");
      }
      Ok(candidate) => candidates.push(candidate),
      Err(error) => {
        warn!(file = %path.display(), %error, "skipping malformed candidate");
      }
    }
  }

  if candidates.is_empty() {
    info!("no usable candidates; nothing to do");
    return Ok(());
  }

  if merge_sources {
    let mut merged = candidates.remove(0);
    for candidate in candidates {
      merged.absorb(candidate);
    }
    candidates = vec![merged];
  }

  for candidate in candidates {
    match store
      .upsert(name.to_string(), entity_type.to_string(), candidate)
      .await
    {
      Ok(outcome) => {
        info!(
          listing_id = %outcome.listing.listing_id,
          listing_changes = outcome.report.listing_changes.len(),
          entity_changes = outcome.report.entity_changes.len(),
          "merged candidate"
        );
        println!("{}", serde_json::to_string_pretty(&outcome.report)?);
      }
      Err(finds_store_sqlite::Error::Core(core)) if core.is_recoverable() => {
        warn!(error = %core, "skipping rejected candidate");
      }
      Err(error) => return Err(error).context("upsert failed"),
    }
  }

  Ok(())
}

fn load_candidate(path: &Path) -> anyhow::Result<CandidateRecord> {
  let text = std::fs::read_to_string(path)
    .with_context(|| format!("failed to read {}", path.display()))?;
  let value: serde_json::Value = serde_json::from_str(&text)
    .with_context(|| format!("{} is not valid JSON", path.display()))?;
  Ok(CandidateRecord::from_value(value)?)
}

// ─── Show / list ─────────────────────────────────────────────────────────────

async fn run_show(
  store: &SqliteStore,
  name: Option<String>,
  entity_type: String,
  id: Option<String>,
) -> anyhow::Result<()> {
  let record = match (name, id) {
    (_, Some(id)) => store.get_by_listing_id(id).await?,
    (Some(name), None) => store.get_by_identity(name, entity_type).await?,
    (None, None) => anyhow::bail!("pass --name or --id"),
  };

  match record {
    Some(record) => println!("{}", serde_json::to_string_pretty(&record)?),
    None => anyhow::bail!("no such record"),
  }
  Ok(())
}

async fn run_list(store: &SqliteStore) -> anyhow::Result<()> {
  let listings = store.list_listings().await?;
  for listing in &listings {
    println!(
      "{}  {}  {} ({})",
      listing.listing_id, listing.slug, listing.entity_name, listing.entity_type
    );
  }
  info!(count = listings.len(), "listings");
  Ok(())
}
