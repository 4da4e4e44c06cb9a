//! Experiment kinds and the key that identifies one experiment's results

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Named test procedure; the directory name under `<data_root>/<module>/`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ExperimentKind {
    /// Bit-error-rate sweep at a fixed hammer count
    #[serde(rename = "BER")]
    Ber,
    /// Hammer-count-to-first-failure search
    #[serde(rename = "HCFIRST")]
    HcFirst,
    /// Pure retention baseline (no hammering)
    #[serde(rename = "RETENTION_FAILURE")]
    RetentionFailure,
    /// Minimum aggressor-row-open-time search
    #[serde(rename = "MIN_TAGGON")]
    MinTaggon,
    /// Fixed-time BER with an extra-delay / tAggON ratio split
    #[serde(rename = "FT_BER")]
    FtBer,
    /// Fixed-activation BER with an extra-delay / tAggON ratio split
    #[serde(rename = "FA_BER")]
    FaBer,
}

impl ExperimentKind {
    pub const ALL: [ExperimentKind; 6] = [
        ExperimentKind::Ber,
        ExperimentKind::HcFirst,
        ExperimentKind::RetentionFailure,
        ExperimentKind::MinTaggon,
        ExperimentKind::FtBer,
        ExperimentKind::FaBer,
    ];

    /// Directory name used by the test bench
    pub fn dir_name(self) -> &'static str {
        match self {
            ExperimentKind::Ber => "BER",
            ExperimentKind::HcFirst => "HCFIRST",
            ExperimentKind::RetentionFailure => "RETENTION_FAILURE",
            ExperimentKind::MinTaggon => "MIN_TAGGON",
            ExperimentKind::FtBer => "FT_BER",
            ExperimentKind::FaBer => "FA_BER",
        }
    }

    /// Short tag used for processed artifact names (`processed_data/<tag>/<module>_<tag>_log`)
    pub fn artifact_tag(self) -> &'static str {
        match self {
            ExperimentKind::Ber => "ber",
            ExperimentKind::HcFirst => "hcf",
            ExperimentKind::RetentionFailure => "retention",
            ExperimentKind::MinTaggon => "min_taggon",
            ExperimentKind::FtBer => "ft_ber",
            ExperimentKind::FaBer => "fa_ber",
        }
    }

    /// Whether the configured temperature filter applies to walks of this kind
    pub fn filters_temperature(self) -> bool {
        !matches!(self, ExperimentKind::MinTaggon)
    }
}

impl fmt::Display for ExperimentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

impl FromStr for ExperimentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ExperimentKind::ALL
            .into_iter()
            .find(|kind| kind.dir_name() == s)
            .ok_or_else(|| format!("unknown experiment kind \"{}\"", s))
    }
}

/// Identity of one experiment's raw results, decoded from the directory layout
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExperimentKey {
    pub module: String,
    pub experiment_kind: ExperimentKind,
    pub access_pattern: String,
    pub temperature_celsius: i32,
}

impl ExperimentKey {
    /// Double-sided patterns activate two aggressors per hammer
    pub fn is_double_sided(&self) -> bool {
        self.access_pattern.contains("double")
    }
}
