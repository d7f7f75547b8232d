//! Model configuration
//!
//! Loaded from JSON or YAML and validated after parsing.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// Environment variable naming a config file for the builder CLI.
pub const CONFIG_PATH_ENV: &str = "RE288_CONFIG_PATH";

/// Decimal places allowed for exported tables
const MAX_PRECISION: u32 = 10;

/// Inclusive date window for one season.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl SeasonWindow {
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

/// Weight used for the specific `strike_to_ball` scorecard entry.
///
/// Historical output weights both swap directions by the ball frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwapWeighting {
    #[default]
    BallFrequency,
    /// `strike_to_ball` weighted by the strike frequency
    OwnCategory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_seasons")]
    pub seasons: BTreeMap<String, SeasonWindow>,

    /// Decimal places for the run expectancy table (default: 2)
    #[serde(default = "default_expectancy_precision")]
    pub expectancy_precision: u32,

    /// Decimal places for the value change tables (default: 3)
    #[serde(default = "default_value_precision")]
    pub value_precision: u32,

    #[serde(default)]
    pub swap_weighting: SwapWeighting,

    /// Event count above which aggregation runs on the rayon pool (default: 10000)
    #[serde(default = "default_parallel_threshold")]
    pub parallel_threshold: usize,
}

fn default_seasons() -> BTreeMap<String, SeasonWindow> {
    let window = |start: (i32, u32, u32), end: (i32, u32, u32)| {
        Some(SeasonWindow {
            start: NaiveDate::from_ymd_opt(start.0, start.1, start.2)?,
            end: NaiveDate::from_ymd_opt(end.0, end.1, end.2)?,
        })
    };

    [
        ("2021", window((2021, 4, 1), (2021, 11, 2))),
        ("2022", window((2022, 4, 7), (2022, 11, 5))),
        ("2023", window((2023, 3, 30), (2023, 7, 10))),
    ]
    .into_iter()
    .filter_map(|(label, w)| w.map(|w| (label.to_string(), w)))
    .collect()
}

fn default_expectancy_precision() -> u32 {
    2
}

fn default_value_precision() -> u32 {
    3
}

fn default_parallel_threshold() -> usize {
    10_000
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            seasons: default_seasons(),
            expectancy_precision: default_expectancy_precision(),
            value_precision: default_value_precision(),
            swap_weighting: SwapWeighting::default(),
            parallel_threshold: default_parallel_threshold(),
        }
    }
}

impl ModelConfig {
    /// Load from a `.json`, `.yaml` or `.yml` file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| ModelError::Config(format!("failed to read {}: {e}", path.display())))?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml(&content),
            _ => Self::from_json(&content),
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: ModelConfig =
            serde_json::from_str(json).map_err(|e| ModelError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: ModelConfig =
            serde_yaml::from_str(yaml).map_err(|e| ModelError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        for (label, window) in &self.seasons {
            if window.start > window.end {
                return Err(ModelError::Config(format!(
                    "season '{label}' starts {} after it ends {}",
                    window.start, window.end
                )));
            }
        }
        if self.expectancy_precision > MAX_PRECISION {
            return Err(ModelError::Config(format!(
                "expectancy_precision must be 0-{MAX_PRECISION}, got {}",
                self.expectancy_precision
            )));
        }
        if self.value_precision > MAX_PRECISION {
            return Err(ModelError::Config(format!(
                "value_precision must be 0-{MAX_PRECISION}, got {}",
                self.value_precision
            )));
        }
        Ok(())
    }

    pub fn season(&self, label: &str) -> Option<&SeasonWindow> {
        self.seasons.get(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = ModelConfig::default();
        assert_eq!(config.expectancy_precision, 2);
        assert_eq!(config.value_precision, 3);
        assert_eq!(config.swap_weighting, SwapWeighting::BallFrequency);
        assert_eq!(config.seasons.len(), 3);

        let w2023 = config.season("2023").unwrap();
        assert!(w2023.contains(NaiveDate::from_ymd_opt(2023, 3, 30).unwrap()));
        assert!(w2023.contains(NaiveDate::from_ymd_opt(2023, 7, 10).unwrap()));
        assert!(!w2023.contains(NaiveDate::from_ymd_opt(2023, 7, 11).unwrap()));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = ModelConfig::from_json(r#"{"value_precision": 4}"#).unwrap();
        assert_eq!(config.value_precision, 4);
        assert_eq!(config.expectancy_precision, 2);
        assert!(config.season("2022").is_some());
    }

    #[test]
    fn test_yaml_config() {
        let yaml = r#"
seasons:
  "2024":
    start: 2024-03-28
    end: 2024-09-29
swap_weighting: own_category
"#;
        let config = ModelConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.seasons.len(), 1);
        assert_eq!(config.swap_weighting, SwapWeighting::OwnCategory);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let inverted = r#"{"seasons": {"x": {"start": "2023-05-01", "end": "2023-04-01"}}}"#;
        assert!(matches!(
            ModelConfig::from_json(inverted),
            Err(ModelError::Config(_))
        ));
        assert!(ModelConfig::from_json(r#"{"expectancy_precision": 11}"#).is_err());
        assert!(ModelConfig::from_json("not json").is_err());
    }

    #[test]
    fn test_load_by_extension() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let mut yaml = tempfile::Builder::new().suffix(".yaml").tempfile()?;
        yaml.write_all(b"value_precision: 5\n")?;
        assert_eq!(ModelConfig::load(yaml.path())?.value_precision, 5);

        let mut json = NamedTempFile::new()?;
        json.write_all(br#"{"expectancy_precision": 1}"#)?;
        assert_eq!(ModelConfig::load(json.path())?.expectancy_precision, 1);
        Ok(())
    }
}
