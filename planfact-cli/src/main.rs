//! planfact: extract confidence-scored project facts from an
//! architectural-plan document and print the aggregate as JSON.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use planfact_core::config::ExtractConfig;
use planfact_core::events::{ExtractEventHandler, StageEvent};
use planfact_core::traits::{PropertyRecord, PropertyRecords};
use planfact_extract::{DocumentInput, Pipeline, RunOptions};
use planfact_remote::{HttpLlmExtractor, HttpOcrProvider, HttpPropertyRecords};
use planfact_storage::SqliteResultCache;

#[derive(Parser, Debug)]
#[command(name = "planfact", version, about = "Architectural-plan fact extraction")]
struct Args {
    /// Path to the plan document (PDF).
    document: PathBuf,

    /// Optional TOML config overriding the default policies.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Parcel identifier for the authoritative property-record lookup.
    #[arg(long)]
    parcel: Option<String>,

    /// Reference lot area (SF), when supplying city data directly.
    #[arg(long)]
    lot_area: Option<f64>,

    /// Reference residential FAR, when supplying city data directly.
    #[arg(long)]
    resid_far: Option<f64>,

    /// Known maximum-affordable-FAR ceiling for the zone.
    #[arg(long)]
    zone_max_far: Option<f64>,

    /// Run the language-model reconciliation pass.
    #[arg(long)]
    llm: bool,

    /// SQLite result-cache path. Caching is disabled when omitted.
    #[arg(long)]
    cache: Option<PathBuf>,

    /// Print stage progress to stderr.
    #[arg(long)]
    progress: bool,
}

struct StderrProgress;

impl ExtractEventHandler for StderrProgress {
    fn on_stage(&self, event: &StageEvent) {
        eprintln!("[{:>3}%] {}", event.percent, event.label);
    }

    fn on_warning(&self, message: &str) {
        eprintln!("warning: {message}");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            ExtractConfig::from_toml_str(&raw).context("parsing config")?
        }
        None => ExtractConfig::default(),
    };

    let bytes = std::fs::read(&args.document)
        .with_context(|| format!("reading document {}", args.document.display()))?;

    let reference = resolve_reference(&args).await?;

    let ocr = HttpOcrProvider::from_env();
    let llm = HttpLlmExtractor::from_env();
    let cache = match &args.cache {
        Some(path) => Some(
            SqliteResultCache::open(path, config.cache.clone())
                .map_err(|e| anyhow::anyhow!("opening cache: {e}"))?,
        ),
        None => None,
    };
    let progress = StderrProgress;

    let mut pipeline = Pipeline::new(config);
    if let Some(ocr) = &ocr {
        pipeline = pipeline.with_ocr(ocr);
    }
    if let Some(llm) = &llm {
        pipeline = pipeline.with_llm(llm);
    }
    if let Some(cache) = &cache {
        pipeline = pipeline.with_store(cache);
    }
    if args.progress {
        pipeline = pipeline.with_events(&progress);
    }

    let options = RunOptions {
        reference,
        zone_max_far: args.zone_max_far,
        enable_llm: args.llm,
    };
    let result = pipeline.run(DocumentInput::Bytes(bytes), &options).await;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

/// City reference data: direct flags win; otherwise the parcel lookup runs
/// when configured. Absence is fine; gates just stay off.
async fn resolve_reference(args: &Args) -> anyhow::Result<Option<PropertyRecord>> {
    if let (Some(lot_area_sf), Some(resid_far)) = (args.lot_area, args.resid_far) {
        return Ok(Some(PropertyRecord {
            lot_area_sf,
            resid_far,
            bldg_area_sf: None,
        }));
    }
    let Some(parcel) = &args.parcel else {
        return Ok(None);
    };
    let Some(client) = HttpPropertyRecords::from_env() else {
        tracing::warn!("--parcel given but no property-record service configured");
        return Ok(None);
    };
    match client.lookup(parcel).await {
        Ok(record) => Ok(record),
        Err(e) => {
            tracing::warn!(error = %e, "property-record lookup failed; validation gates disabled");
            Ok(None)
        }
    }
}
