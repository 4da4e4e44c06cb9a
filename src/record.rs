//! Typed observation records and the per-(module, kind) result table
//!
//! Each experiment kind has a fixed column schema. Records are plain serde
//! structs; [`ResultTable`] owns them for one (module, kind) run and is
//! written once at the end of the run.

use crate::experiment::ExperimentKind;
use serde::{Deserialize, Serialize};

/// Fixed column schema of a record type
pub trait TableSchema: Serialize {
    /// Column names in serialization order
    const COLUMNS: &'static [&'static str];

    /// Field values rendered for a CSV row, in [`Self::COLUMNS`] order
    fn csv_fields(&self) -> Vec<String>;
}

/// Bit-error-rate observation: bit flips found in one victim row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BerRecord {
    pub module: String,
    pub pattern: String,
    pub temperature: i32,
    pub hc: u64,
    pub ac: u64,
    #[serde(rename = "tAggON")]
    pub t_agg_on_ns: u64,
    pub row: u64,
    pub bitflips: u64,
    pub itr: u32,
    pub atk_time_ms: u64,
}

impl TableSchema for BerRecord {
    const COLUMNS: &'static [&'static str] = &[
        "module",
        "pattern",
        "temperature",
        "hc",
        "ac",
        "tAggON",
        "row",
        "bitflips",
        "itr",
        "atk_time_ms",
    ];

    fn csv_fields(&self) -> Vec<String> {
        vec![
            self.module.clone(),
            self.pattern.clone(),
            self.temperature.to_string(),
            self.hc.to_string(),
            self.ac.to_string(),
            self.t_agg_on_ns.to_string(),
            self.row.to_string(),
            self.bitflips.to_string(),
            self.itr.to_string(),
            self.atk_time_ms.to_string(),
        ]
    }
}

/// Hammer-count-to-first-failure observation for one victim row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HcFirstRecord {
    pub module: String,
    pub pattern: String,
    pub temperature: i32,
    #[serde(rename = "tAggON")]
    pub t_agg_on_ns: u64,
    pub row: u64,
    pub hcf: u64,
    pub ac_min: u64,
    pub itr: u32,
    pub atk_time_ns: u64,
}

impl TableSchema for HcFirstRecord {
    const COLUMNS: &'static [&'static str] = &[
        "module",
        "pattern",
        "temperature",
        "tAggON",
        "row",
        "hcf",
        "ac_min",
        "itr",
        "atk_time_ns",
    ];

    fn csv_fields(&self) -> Vec<String> {
        vec![
            self.module.clone(),
            self.pattern.clone(),
            self.temperature.to_string(),
            self.t_agg_on_ns.to_string(),
            self.row.to_string(),
            self.hcf.to_string(),
            self.ac_min.to_string(),
            self.itr.to_string(),
            self.atk_time_ns.to_string(),
        ]
    }
}

/// Minimum tAggON that still flips a bit in one victim row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinTaggonRecord {
    pub module: String,
    pub pattern: String,
    pub temperature: i32,
    pub row: u64,
    pub act_count: u64,
    #[serde(rename = "min_tAggON")]
    pub min_t_agg_on_ns: u64,
    pub itr: u32,
}

impl TableSchema for MinTaggonRecord {
    const COLUMNS: &'static [&'static str] = &[
        "module",
        "pattern",
        "temperature",
        "row",
        "act_count",
        "min_tAggON",
        "itr",
    ];

    fn csv_fields(&self) -> Vec<String> {
        vec![
            self.module.clone(),
            self.pattern.clone(),
            self.temperature.to_string(),
            self.row.to_string(),
            self.act_count.to_string(),
            self.min_t_agg_on_ns.to_string(),
            self.itr.to_string(),
        ]
    }
}

/// BER observation under an extra-delay / ratio split (FA_BER, FT_BER)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitBerRecord {
    pub module: String,
    pub pattern: String,
    pub temperature: i32,
    pub hc: u64,
    pub ac: u64,
    pub extra_delay_ns: u64,
    pub ratio: f64,
    #[serde(rename = "tAggON")]
    pub t_agg_on_ns: f64,
    #[serde(rename = "tAggOFF")]
    pub t_agg_off_ns: f64,
    pub row: u64,
    pub bitflips: u64,
    pub itr: u32,
    /// Only fixed-time runs carry an attack budget
    pub atk_time_ms: Option<u64>,
}

impl TableSchema for SplitBerRecord {
    const COLUMNS: &'static [&'static str] = &[
        "module",
        "pattern",
        "temperature",
        "hc",
        "ac",
        "extra_delay_ns",
        "ratio",
        "tAggON",
        "tAggOFF",
        "row",
        "bitflips",
        "itr",
        "atk_time_ms",
    ];

    fn csv_fields(&self) -> Vec<String> {
        vec![
            self.module.clone(),
            self.pattern.clone(),
            self.temperature.to_string(),
            self.hc.to_string(),
            self.ac.to_string(),
            self.extra_delay_ns.to_string(),
            self.ratio.to_string(),
            self.t_agg_on_ns.to_string(),
            self.t_agg_off_ns.to_string(),
            self.row.to_string(),
            self.bitflips.to_string(),
            self.itr.to_string(),
            self.atk_time_ms.map(|t| t.to_string()).unwrap_or_default(),
        ]
    }
}

/// Bits per cacheline
pub const BITS_PER_CACHELINE: u64 = 512;
/// Bits per 64-bit word (and per ECC word)
pub const BITS_PER_WORD: u64 = 64;
/// Bits per byte
pub const BITS_PER_BYTE: u64 = 8;

/// Location of one flipped bit inside a row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BitLocation {
    pub cacheline: u64,
    pub word: u64,
    pub byte: u64,
    pub bit: u64,
}

impl BitLocation {
    /// Bit offset within the row
    pub fn linear_bit_index(&self) -> u64 {
        self.cacheline * BITS_PER_CACHELINE
            + self.word * BITS_PER_WORD
            + self.byte * BITS_PER_BYTE
            + self.bit
    }

    /// 64-bit ECC word containing this bit
    pub fn ecc_word_index(&self) -> u64 {
        self.linear_bit_index() / BITS_PER_WORD
    }
}

/// One row of a bit-location table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BitFlipRecord {
    pub location: BitLocation,
    /// Flip direction (0: 1->0, 1: 0->1), when reported
    pub dir: Option<u8>,
    /// Hammer count at which the flip appeared, when reported
    pub hammer_count: Option<u64>,
    pub bank: Option<u64>,
    pub row_offset: i64,
    pub pivot_row: u64,
}

impl BitFlipRecord {
    /// Physical victim row
    pub fn victim_row(&self) -> i64 {
        self.pivot_row as i64 + self.row_offset
    }

    /// Identity used to compare flips across experiments
    pub fn site(&self) -> FlipSite {
        FlipSite {
            pivot_row: self.pivot_row,
            row_offset: self.row_offset,
            linear_bit_index: self.location.linear_bit_index(),
        }
    }
}

/// Geometry-free identity of a flipped bit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FlipSite {
    pub pivot_row: u64,
    pub row_offset: i64,
    pub linear_bit_index: u64,
}

/// Records of one (module, kind) run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultTable<R> {
    pub module: String,
    pub kind: ExperimentKind,
    pub columns: Vec<String>,
    pub records: Vec<R>,
}

impl<R: TableSchema> ResultTable<R> {
    pub fn new(module: impl Into<String>, kind: ExperimentKind, records: Vec<R>) -> Self {
        Self {
            module: module.into(),
            kind,
            columns: R::COLUMNS.iter().map(|c| c.to_string()).collect(),
            records,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Artifact stem: `<module>_<tag>_log`
    pub fn artifact_stem(&self) -> String {
        format!("{}_{}_log", self.module, self.kind.artifact_tag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_location_indices() {
        let loc = BitLocation {
            cacheline: 2,
            word: 3,
            byte: 1,
            bit: 4,
        };
        assert_eq!(loc.linear_bit_index(), 1228);
        assert_eq!(loc.ecc_word_index(), 19);
    }

    #[test]
    fn test_victim_row_applies_offset() {
        let rec = BitFlipRecord {
            location: BitLocation {
                cacheline: 0,
                word: 0,
                byte: 0,
                bit: 0,
            },
            dir: Some(1),
            hammer_count: None,
            bank: Some(1),
            row_offset: -1,
            pivot_row: 100,
        };
        assert_eq!(rec.victim_row(), 99);
        assert_eq!(rec.site().linear_bit_index, 0);
    }

    #[test]
    fn test_columns_match_csv_fields() {
        let rec = HcFirstRecord {
            module: "moduleX".to_string(),
            pattern: "single-checkered".to_string(),
            temperature: 50,
            t_agg_on_ns: 7776,
            row: 42,
            hcf: 1200,
            ac_min: 1200,
            itr: 0,
            atk_time_ns: 9_352_800,
        };
        assert_eq!(rec.csv_fields().len(), HcFirstRecord::COLUMNS.len());
    }

    #[test]
    fn test_artifact_stem() {
        let table: ResultTable<BerRecord> = ResultTable::new("S0", ExperimentKind::Ber, vec![]);
        assert_eq!(table.artifact_stem(), "S0_ber_log");
        assert!(table.is_empty());
        assert_eq!(table.columns.len(), BerRecord::COLUMNS.len());
    }
}
