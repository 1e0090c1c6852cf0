//! StudyForge batch ingestion CLI
//!
//! Usage: ingest <directory> <class_num> <subject>
//!
//! Parses every PDF in the directory, classifies the extracted chunks,
//! embeds them, and persists them to the content store. One ingestion
//! process should run at a time; store writes are not coordinated
//! between concurrent writers.

use anyhow::{bail, Context};
use std::path::PathBuf;
use studyforge_common::{
    config::AppConfig, db::DbPool, embeddings::create_embedder, store::ContentStore,
    MAX_CLASS_NUM, MIN_CLASS_NUM, VERSION,
};
use studyforge_ingestion::PdfIngestor;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_target(true)
        .init();

    info!("StudyForge ingest v{}", VERSION);

    let args: Vec<String> = std::env::args().skip(1).collect();
    let [dir, class_num, subject] = args.as_slice() else {
        bail!("usage: ingest <directory> <class_num> <subject>");
    };

    let dir = PathBuf::from(dir);
    if !dir.is_dir() {
        bail!("not a directory: {}", dir.display());
    }

    let class_num: i32 = class_num
        .parse()
        .with_context(|| format!("invalid class number: {}", class_num))?;
    if !(MIN_CLASS_NUM..=MAX_CLASS_NUM).contains(&class_num) {
        bail!(
            "class number must be between {} and {}",
            MIN_CLASS_NUM,
            MAX_CLASS_NUM
        );
    }

    // Load configuration
    let config = AppConfig::load().context("Failed to load configuration")?;

    // Connect the store
    info!("Connecting to database...");
    let pool = DbPool::new(&config.database).await?;
    let embedder = create_embedder(&config.embedding)?;
    let store = ContentStore::new(pool, embedder);
    store.ensure_schema().await?;

    // Parse and persist
    let started = std::time::Instant::now();
    let ingestor = PdfIngestor::new(config.ingestion.clone());
    let chunks = ingestor.parse_directory(&dir, class_num, subject)?;

    if chunks.is_empty() {
        bail!("no chunks extracted from {}", dir.display());
    }

    let added = store
        .add_chunks(&chunks, config.ingestion.batch_size)
        .await?;

    studyforge_common::metrics::record_ingestion(
        started.elapsed().as_secs_f64(),
        added,
        subject,
    );

    info!(
        extracted = chunks.len(),
        added,
        skipped = chunks.len() - added,
        "Ingestion complete"
    );

    println!(
        "Ingested {} of {} chunks for Class {} {}",
        added,
        chunks.len(),
        class_num,
        subject
    );

    Ok(())
}
