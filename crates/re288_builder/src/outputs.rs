//! Season output files
//!
//! One `compute` run writes, for season `<label>`:
//! - `<label>re288.csv` and `<label>{strike,ball,foul}_values_288.csv`
//! - `<label>re288.json` (every state keyed by identifier)
//! - `<label>_SBF_values_generic.json` / `<label>_SBF_values_specific.json`
//! - `<label>_metadata.json`

use anyhow::{Context, Result};
use re288_core::{
    expectancy_table, record_map, value_table, CountTable, ModelConfig, Outcome, ValueModel,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Provenance of one season run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub season: String,
    /// SHA256 of the input file (CSV or cache)
    pub input_checksum: String,
    /// RFC3339
    pub created_at: String,
    pub events: u64,
    pub observed_situations: usize,
    /// Identifiers of situations with no observations
    pub unobserved_situations: Vec<String>,
}

/// Write a count table as CSV. Undefined cells are written as `NaN`.
pub fn write_count_table_csv(table: &CountTable, path: &Path, precision: u32) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create CSV file: {}", path.display()))?;

    let header = std::iter::once("").chain(table.columns.iter().map(String::as_str));
    writer
        .write_record(header)
        .with_context(|| format!("Failed to write header: {}", path.display()))?;

    for row in &table.rows {
        let cells = row.cells.iter().map(|cell| match cell {
            Some(value) => format!("{:.*}", precision as usize, value),
            None => "NaN".to_string(),
        });
        writer
            .write_record(std::iter::once(row.label.clone()).chain(cells))
            .with_context(|| format!("Failed to write row {}: {}", row.label, path.display()))?;
    }

    writer
        .flush()
        .with_context(|| format!("Failed to flush CSV file: {}", path.display()))?;
    Ok(())
}

fn write_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize JSON")?;
    fs::write(path, json).with_context(|| format!("Failed to write JSON file: {}", path.display()))
}

/// Write every output file for one season and return its metadata.
pub fn write_season_outputs(
    out_dir: &Path,
    season: &str,
    model: &ValueModel,
    config: &ModelConfig,
    input_checksum: &str,
    events: u64,
) -> Result<RunMetadata> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create output directory: {}", out_dir.display()))?;
    let file = |name: String| -> PathBuf { out_dir.join(name) };

    write_count_table_csv(
        &expectancy_table(model, config.expectancy_precision),
        &file(format!("{season}re288.csv")),
        config.expectancy_precision,
    )?;

    for (outcome, stem) in [
        (Outcome::Strike, "strike"),
        (Outcome::Ball, "ball"),
        (Outcome::Foul, "foul"),
    ] {
        write_count_table_csv(
            &value_table(model, outcome, config.value_precision),
            &file(format!("{season}{stem}_values_288.csv")),
            config.value_precision,
        )?;
    }

    write_json(&record_map(model), &file(format!("{season}re288.json")))?;
    write_json(&model.generic, &file(format!("{season}_SBF_values_generic.json")))?;
    write_json(&model.specific, &file(format!("{season}_SBF_values_specific.json")))?;

    let unobserved_situations: Vec<String> = model.unobserved().map(|s| s.key()).collect();
    if !unobserved_situations.is_empty() {
        log::warn!(
            "{} situations unobserved in season {}",
            unobserved_situations.len(),
            season
        );
    }

    let metadata = RunMetadata {
        season: season.to_string(),
        input_checksum: input_checksum.to_string(),
        created_at: chrono::Utc::now().to_rfc3339(),
        events,
        observed_situations: re288_core::SITUATION_COUNT - unobserved_situations.len(),
        unobserved_situations,
    };
    write_json(&metadata, &file(format!("{season}_metadata.json")))?;

    log::info!("Wrote season {} outputs to {}", season, out_dir.display());
    Ok(metadata)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load_events;
    use crate::tests::{sample_csv, write_temp};
    use tempfile::TempDir;

    fn sample_model() -> Result<(ValueModel, u64)> {
        let csv = write_temp(&sample_csv());
        let (events, _) = load_events(csv.path())?;
        let model = re288_core::build_model(&events, &ModelConfig::default())?;
        Ok((model, events.len() as u64))
    }

    #[test]
    fn test_writes_all_files() -> Result<()> {
        let dir = TempDir::new()?;
        let out = dir.path().join("out");
        let (model, events) = sample_model()?;

        let metadata =
            write_season_outputs(&out, "2023", &model, &ModelConfig::default(), "abc123", events)?;

        for name in [
            "2023re288.csv",
            "2023strike_values_288.csv",
            "2023ball_values_288.csv",
            "2023foul_values_288.csv",
            "2023re288.json",
            "2023_SBF_values_generic.json",
            "2023_SBF_values_specific.json",
            "2023_metadata.json",
        ] {
            assert!(out.join(name).exists(), "missing {name}");
        }

        assert_eq!(metadata.events, 9);
        assert_eq!(metadata.input_checksum, "abc123");
        assert_eq!(
            metadata.observed_situations + metadata.unobserved_situations.len(),
            288
        );
        Ok(())
    }

    #[test]
    fn test_expectancy_csv_layout() -> Result<()> {
        let dir = TempDir::new()?;
        let (model, events) = sample_model()?;
        write_season_outputs(dir.path(), "2023", &model, &ModelConfig::default(), "x", events)?;

        let content = fs::read_to_string(dir.path().join("2023re288.csv"))?;
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 25);
        assert_eq!(lines[0], ",02,12,01,22,11,00,10,21,32,20,31,30");

        // 1-0 with nobody on was seen once, before a two-run inning; 1-2 never
        let first: Vec<&str> = lines[1].split(',').collect();
        assert_eq!(first[0], "0outXXX");
        assert_eq!(first[7], "2.00");
        assert_eq!(first[2], "NaN");
        Ok(())
    }

    #[test]
    fn test_record_json_uses_null_for_undefined() -> Result<()> {
        let dir = TempDir::new()?;
        let (model, events) = sample_model()?;
        write_season_outputs(dir.path(), "2023", &model, &ModelConfig::default(), "x", events)?;

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join("2023re288.json"))?)?;
        assert!(json["232OOO"]["value"].is_null());
        assert_eq!(json["010XXX"]["B"], "020XXX");
        assert_eq!(json["INNING_OVER"]["value"], 0.0);
        Ok(())
    }
}
