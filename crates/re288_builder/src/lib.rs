//! RE288 Builder Library
//!
//! Statcast pitch CSV → annotated dataset → run expectancy model → tables
//!
//! - CSV ingestion with per-row error accounting
//! - Annotated dataset cache (MessagePack + LZ4 + SHA256)
//! - Season output files (CSV tables, JSON records and scorecards, metadata)

pub mod dataset_cache;
pub mod outputs;

use anyhow::{bail, Context, Result};
use re288_core::{AnnotatedPitch, ModelConfig, PitchEvent, CONFIG_PATH_ENV};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

pub use dataset_cache::{
    build_dataset_cache, load_dataset_cache, save_cache_metadata, verify_cache, CacheMetadata,
    DatasetCache,
};
pub use outputs::{write_season_outputs, RunMetadata};

/// CSV parsing statistics
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseStats {
    pub total_rows: u32,
    pub parsed: u32,
    pub failed: u32,
}

/// Parse a Statcast pitch CSV into events.
///
/// Columns are matched by header name; extra columns are ignored. Rows that
/// fail to deserialize are counted and skipped.
pub fn load_events(csv_path: &Path) -> Result<(Vec<PitchEvent>, ParseStats)> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(csv_path)
        .with_context(|| format!("Failed to open CSV file: {}", csv_path.display()))?;

    let mut events = Vec::new();
    let mut stats = ParseStats::default();

    for result in reader.deserialize::<PitchEvent>() {
        stats.total_rows += 1;
        match result {
            Ok(event) => {
                stats.parsed += 1;
                events.push(event);
            }
            Err(err) => {
                stats.failed += 1;
                // +1 for the header line
                let line = stats.total_rows + 1;
                log::warn!("Line {} - skipping malformed row: {}", line, err);
            }
        }
    }

    log::info!(
        "Loaded {} pitches from {} ({} rows, {} skipped)",
        stats.parsed,
        csv_path.display(),
        stats.total_rows,
        stats.failed
    );

    Ok((events, stats))
}

/// SHA256 of a file as lowercase hex, streamed from disk
pub fn file_checksum(path: &Path) -> Result<String> {
    let mut file =
        File::open(path).with_context(|| format!("Failed to open file: {}", path.display()))?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    Ok(format!("{:x}", hasher.finalize()))
}

pub(crate) fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Resolve configuration: explicit path, then `RE288_CONFIG_PATH`, then defaults.
pub fn resolve_config(explicit: Option<&Path>) -> Result<ModelConfig> {
    if let Some(path) = explicit {
        return ModelConfig::load(path)
            .with_context(|| format!("Failed to load config: {}", path.display()));
    }

    match std::env::var(CONFIG_PATH_ENV) {
        Ok(path) if !path.trim().is_empty() => {
            let path = path.trim();
            log::info!("Using config from {}={}", CONFIG_PATH_ENV, path);
            ModelConfig::load(path)
                .with_context(|| format!("Failed to load config from {CONFIG_PATH_ENV}='{path}'"))
        }
        _ => Ok(ModelConfig::default()),
    }
}

/// Restrict events to a configured season window.
///
/// Unknown season labels keep every event.
pub fn select_season(
    events: Vec<PitchEvent>,
    season: &str,
    config: &ModelConfig,
) -> Vec<PitchEvent> {
    match config.season(season) {
        Some(window) => re288_core::filter_season(events, window),
        None => {
            log::warn!(
                "Season '{}' has no configured date window; using all {} pitches",
                season,
                events.len()
            );
            events
        }
    }
}

/// Where a season's pitches come from
#[derive(Debug, Clone, PartialEq)]
pub enum DatasetSource {
    /// Raw Statcast CSV; filtered to the season window and annotated
    Csv(PathBuf),
    /// Previously annotated dataset cache
    Cache(PathBuf),
}

impl DatasetSource {
    pub fn path(&self) -> &Path {
        match self {
            DatasetSource::Csv(path) | DatasetSource::Cache(path) => path,
        }
    }
}

/// Load annotated pitches for one season.
pub fn load_annotated(
    source: &DatasetSource,
    season: &str,
    config: &ModelConfig,
) -> Result<Vec<AnnotatedPitch>> {
    match source {
        DatasetSource::Csv(path) => {
            let (events, _stats) = load_events(path)?;
            let events = select_season(events, season, config);
            Ok(re288_core::annotate(&events))
        }
        DatasetSource::Cache(path) => {
            // Cached pitches carry no dates, so the season window cannot be reapplied
            let cache = load_dataset_cache(path)?;
            match cache.season.as_deref() {
                Some(cached) if cached != season => bail!(
                    "Cache {} was built for season '{}', not '{}'",
                    path.display(),
                    cached,
                    season
                ),
                Some(_) => {}
                None => log::warn!(
                    "Cache {} has no season label; using all {} pitches as season '{}'",
                    path.display(),
                    cache.pitches.len(),
                    season
                ),
            }
            Ok(cache.pitches)
        }
    }
}

/// Full pipeline for one season: load, model, write outputs.
pub fn compute_season(
    source: &DatasetSource,
    season: &str,
    out_dir: &Path,
    config: &ModelConfig,
) -> Result<RunMetadata> {
    let input_checksum = file_checksum(source.path())?;
    let pitches = load_annotated(source, season, config)?;

    let model = re288_core::build_model_from_pitches(&pitches, config)
        .with_context(|| format!("Failed to build model for season {season}"))?;

    write_season_outputs(
        out_dir,
        season,
        &model,
        config,
        &input_checksum,
        pitches.len() as u64,
    )
}
