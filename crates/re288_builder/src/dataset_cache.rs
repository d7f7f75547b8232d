//! Annotated Dataset Cache
//!
//! Annotated pitches → MessagePack → LZ4 (size-prepended) → file, with a
//! SHA256 checksum of the compressed bytes. Loading a cache skips CSV parsing
//! and annotation entirely.

use anyhow::{bail, Context, Result};
use re288_core::AnnotatedPitch;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::{file_checksum, sha256_hex};

/// Current cache layout
pub const SCHEMA_VERSION: &str = "re288-v1";

/// Cache metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheMetadata {
    /// Schema version (e.g. "re288-v1")
    pub schema_version: String,
    /// SHA256 checksum of the cache file (hex)
    pub checksum: String,
    /// Creation time (RFC3339)
    pub created_at: String,
    /// Serialized size before compression (bytes)
    pub original_size: u64,
    /// Size on disk (bytes)
    pub compressed_size: u64,
    /// compressed / original
    pub compression_ratio: f64,
    /// Number of annotated pitches
    pub events: u64,
}

/// Cache file payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetCache {
    pub schema_version: String,
    /// Season label the pitches were filtered to, if any
    pub season: Option<String>,
    pub pitches: Vec<AnnotatedPitch>,
}

/// Write annotated pitches to a compressed cache file.
///
/// # Arguments
///
/// * `pitches` - annotated pitches, in dataset order
/// * `season` - season label the pitches were filtered to
/// * `output` - cache file path (parent directories are created)
/// * `schema_version` - schema version string
pub fn build_dataset_cache(
    pitches: &[AnnotatedPitch],
    season: Option<&str>,
    output: &Path,
    schema_version: &str,
) -> Result<CacheMetadata> {
    let payload = DatasetCache {
        schema_version: schema_version.to_string(),
        season: season.map(str::to_string),
        pitches: pitches.to_vec(),
    };

    let msgpack_bytes =
        rmp_serde::to_vec(&payload).context("Failed to serialize dataset to MessagePack")?;
    let original_size = msgpack_bytes.len() as u64;

    let compressed = lz4_flex::compress_prepend_size(&msgpack_bytes);
    let compressed_size = compressed.len() as u64;
    let checksum = sha256_hex(&compressed);

    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory: {}", parent.display()))?;
    }
    fs::write(output, &compressed)
        .with_context(|| format!("Failed to write cache file: {}", output.display()))?;

    log::info!(
        "Wrote {} pitches to {} ({} → {} bytes)",
        pitches.len(),
        output.display(),
        original_size,
        compressed_size
    );

    Ok(CacheMetadata {
        schema_version: schema_version.to_string(),
        checksum,
        created_at: chrono::Utc::now().to_rfc3339(),
        original_size,
        compressed_size,
        compression_ratio: compressed_size as f64 / original_size as f64,
        events: pitches.len() as u64,
    })
}

/// Check a cache file against an expected SHA256 checksum
pub fn verify_cache(cache_file: &Path, expected_checksum: &str) -> Result<bool> {
    let actual = file_checksum(cache_file)
        .with_context(|| format!("Failed to checksum cache file: {}", cache_file.display()))?;
    Ok(actual == expected_checksum)
}

/// Write cache metadata as pretty JSON
pub fn save_cache_metadata(path: &Path, meta: &CacheMetadata) -> Result<()> {
    let metadata_json =
        serde_json::to_string_pretty(meta).context("Failed to serialize cache metadata")?;
    fs::write(path, metadata_json)
        .with_context(|| format!("Failed to write metadata file: {}", path.display()))
}

/// Decompress and decode a cache file.
///
/// Fails on a schema version other than [`SCHEMA_VERSION`].
pub fn load_dataset_cache(cache_file: &Path) -> Result<DatasetCache> {
    let compressed = fs::read(cache_file)
        .with_context(|| format!("Failed to read cache file: {}", cache_file.display()))?;

    let msgpack_bytes =
        lz4_flex::decompress_size_prepended(&compressed).context("Failed to decompress LZ4")?;

    let cache: DatasetCache =
        rmp_serde::from_slice(&msgpack_bytes).context("Failed to deserialize MessagePack")?;

    if cache.schema_version != SCHEMA_VERSION {
        bail!(
            "Unsupported cache schema '{}' in {} (expected '{}')",
            cache.schema_version,
            cache_file.display(),
            SCHEMA_VERSION
        );
    }

    log::info!(
        "Loaded {} annotated pitches from {}",
        cache.pitches.len(),
        cache_file.display()
    );
    Ok(cache)
}
