//! Pipeline configuration
//!
//! Every field has a default matching the characterization campaign, so the
//! pipeline runs without a config file. A TOML file can override any subset:
//!
//! ```
//! use rowpress_ingest::config::PipelineConfig;
//!
//! let config = PipelineConfig::from_toml_str("temperatures = [80]").unwrap();
//! assert_eq!(config.temperatures, vec![80]);
//! assert_eq!(config.iterations, 5);
//! ```

use crate::error::{IngestError, Result};
use crate::output::OutputFormat;
use crate::reduce::SelectionBasis;
use crate::timing;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// One access pattern of the ECC report and its BER base file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EccPattern {
    /// Pattern prefix; the directory is `<name>-checkered`
    pub name: String,
    pub hammer_count: u64,
}

/// ECC word analysis over fixed-budget BER tables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EccConfig {
    pub temperature: i32,
    pub attack_time_ms: u64,
    pub ras_scale: u64,
    pub patterns: Vec<EccPattern>,
}

impl Default for EccConfig {
    fn default() -> Self {
        Self {
            temperature: 80,
            attack_time_ms: 60,
            ras_scale: 258,
            patterns: vec![
                EccPattern {
                    name: "single".to_string(),
                    hammer_count: 7711,
                },
                EccPattern {
                    name: "double".to_string(),
                    hammer_count: 3855,
                },
            ],
        }
    }
}

/// Overlap of HCFIRST flips across a tAggON sweep
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelationConfig {
    pub pattern: String,
    pub temperature: i32,
    /// RAS scale of the hammer-only reference run
    pub rh_ras_scale: u64,
    pub sweep_ras_scales: Vec<u64>,
    pub retention_wait_ms: u64,
    pub retention_temperature: i32,
}

impl Default for RelationConfig {
    fn default() -> Self {
        Self {
            pattern: "single".to_string(),
            temperature: 50,
            rh_ras_scale: 0,
            sweep_ras_scales: vec![
                1_000_000, 100_000, 10_000, 1000, 100, 10, 1, 200_000, 20_000, 20, 2338, 258, 2,
                500_000, 50_000, 5000, 500, 50, 5,
            ],
            retention_wait_ms: 4096,
            retention_temperature: 80,
        }
    }
}

/// Bit-flip direction summary selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectionConfig {
    pub pattern: String,
    pub temperature: i32,
}

impl Default for DirectionConfig {
    fn default() -> Self {
        Self {
            pattern: "single-checkered".to_string(),
            temperature: 50,
        }
    }
}

/// Top-level pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Root under which `<tag>/` artifact directories are written
    pub processed_data_root: PathBuf,
    /// Temperatures kept by temperature-filtered walks
    pub temperatures: Vec<i32>,
    /// Trial indices `0..iterations` read for table-based reports
    pub iterations: u32,
    pub selection_basis: SelectionBasis,
    pub format: OutputFormat,
    pub ecc: EccConfig,
    pub relation: RelationConfig,
    pub direction: DirectionConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            processed_data_root: PathBuf::from("processed_data"),
            temperatures: vec![50, 80],
            iterations: 5,
            selection_basis: SelectionBasis::default(),
            format: OutputFormat::default(),
            ecc: EccConfig::default(),
            relation: RelationConfig::default(),
            direction: DirectionConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: PipelineConfig =
            toml::from_str(text).map_err(|e| IngestError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| IngestError::io(path, e))?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if self.iterations == 0 {
            return Err(IngestError::Config("iterations must be >= 1".to_string()));
        }
        if self.relation.sweep_ras_scales.is_empty() {
            return Err(IngestError::Config(
                "relation.sweep_ras_scales must not be empty".to_string(),
            ));
        }
        if let Some(ras) = self
            .relation
            .sweep_ras_scales
            .iter()
            .chain([&self.relation.rh_ras_scale, &self.ecc.ras_scale])
            .find(|ras| timing::t_agg_on_ns(**ras).is_none())
        {
            return Err(IngestError::Config(format!(
                "ras scale {} is too large for a tAggON in nanoseconds",
                ras
            )));
        }
        if self.ecc.patterns.is_empty() {
            return Err(IngestError::Config(
                "ecc.patterns must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether a decoded temperature passes the configured filter
    pub fn keeps_temperature(&self, celsius: i32) -> bool {
        self.temperatures.contains(&celsius)
    }
}
