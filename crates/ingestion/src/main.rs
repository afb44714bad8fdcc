//! CineScope ingestion CLI
//!
//! One-shot run: stream movie Parquet shards, normalize rows into canonical
//! records, and batch-load them into the vector store.

use anyhow::Context;
use cinescope_core::config::{load_dotenv, ConfigLoader, IngestConfig, StoreConfig};
use cinescope_ingestion::{
    BatchLoader, LoaderConfig, NormalizeOutcome, Normalizer, ParquetSource, QdrantStore, Schema,
    VectorStore,
};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "cinescope-ingest",
    about = "Load movie Parquet shards into the CineScope vector store",
    version
)]
struct Args {
    /// Directory holding the Parquet shards
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Shard filename prefix
    #[arg(long)]
    file_prefix: Option<String>,

    /// Records per bulk upsert
    #[arg(long)]
    batch_size: Option<usize>,

    /// Cap on records submitted this run
    #[arg(long)]
    max_objects: Option<usize>,

    /// Target collection name
    #[arg(long)]
    collection: Option<String>,

    /// Vector store URL
    #[arg(long)]
    store_url: Option<String>,

    /// Skip collection bootstrap (assume it exists)
    #[arg(long)]
    no_bootstrap: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    load_dotenv();
    let args = Args::parse();

    let mut ingest_config = IngestConfig::from_env()?;
    let mut store_config = StoreConfig::from_env()?;

    if let Some(data_dir) = args.data_dir {
        ingest_config.data_dir = data_dir;
    }
    if let Some(file_prefix) = args.file_prefix {
        ingest_config.file_prefix = file_prefix;
    }
    if let Some(batch_size) = args.batch_size {
        ingest_config.batch_size = batch_size;
    }
    if let Some(max_objects) = args.max_objects {
        ingest_config.max_objects = max_objects;
    }
    if let Some(collection) = args.collection {
        store_config.collection = collection;
    }
    if let Some(store_url) = args.store_url {
        store_config.url = store_url;
    }

    ingest_config.validate()?;
    store_config.validate()?;

    let source = ParquetSource::new(&ingest_config.data_dir, &ingest_config.file_prefix);
    let normalizer = Normalizer::new(Schema::movies());

    let store = QdrantStore::new(&store_config.url, &store_config.collection)?;
    if !args.no_bootstrap {
        store
            .ensure_collection(store_config.vector_dim)
            .await
            .context("collection bootstrap failed")?;
    }

    let mut loader = BatchLoader::new(
        store,
        LoaderConfig {
            batch_size: ingest_config.batch_size,
            flush_timeout: store_config.flush_timeout,
            max_objects: Some(ingest_config.max_objects),
        },
    )?;

    info!(
        data_dir = %ingest_config.data_dir.display(),
        collection = %store_config.collection,
        batch_size = ingest_config.batch_size,
        "Starting ingestion run"
    );

    let progress = ProgressBar::new_spinner();
    progress.set_style(ProgressStyle::with_template("{spinner} {pos} rows {msg}")?);

    for row in source.rows()? {
        if loader.at_capacity() {
            info!("Reached max_objects cap, stopping input");
            break;
        }

        let raw = row.context("failed reading source row")?;
        match normalizer.normalize(&raw) {
            NormalizeOutcome::Record(record) => loader.submit(record).await?,
            NormalizeOutcome::Skip { field } => {
                warn!(%field, "row missing required field, skipped");
                loader.record_skipped()?;
            }
        }
        progress.inc(1);
    }
    progress.finish_and_clear();

    let report = loader.finish().await?;

    if !report.failures.is_empty() {
        warn!("Failed to add {} objects", report.failures.len());
        for failure in report.failures.preview(3) {
            warn!(key = %failure.key, reason = %failure.reason, "failed object");
        }
    }

    let total = loader.store().count().await?;
    info!(
        seen = report.seen,
        stored = report.stored,
        duplicates = report.duplicates,
        skipped = report.skipped,
        failed = report.failures.len(),
        total_in_store = total,
        "Ingestion complete"
    );

    Ok(())
}
