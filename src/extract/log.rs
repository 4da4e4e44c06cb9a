// Log-line extractors for BER, HCFIRST, MIN_TAGGON and the split-delay BER kinds.
//
// Every result line carries at least three integers; the second is the
// victim row and the third is the kind's outcome value, e.g.
//   HC_First = 7 row 42 : 1200
//   Found 3 bitflips in row 1024 ...

use super::SourceFile;
use crate::error::{IngestError, Result};
use crate::experiment::ExperimentKind;
use crate::grammar::FilenameParameters;
use crate::record::{BerRecord, HcFirstRecord, MinTaggonRecord, SplitBerRecord, TableSchema};
use crate::timing;

/// Whitespace-separated tokens made only of decimal digits, in order.
/// A digit token that does not fit in `u64` is an error, not a gap.
pub fn integer_tokens(line: &str) -> std::result::Result<Vec<u64>, String> {
    line.split_whitespace()
        .filter(|t| t.bytes().all(|b| b.is_ascii_digit()))
        .map(|t| {
            t.parse::<u64>()
                .map_err(|e| format!("integer token \"{}\": {}", t, e))
        })
        .collect()
}

/// Reason string for a derived quantity that does not fit in `u64`
fn overflow(quantity: &str, inputs: impl std::fmt::Display) -> String {
    format!("{} overflows for {}", quantity, inputs)
}

fn t_agg_on(ras_scale: u64) -> std::result::Result<u64, String> {
    timing::t_agg_on_ns(ras_scale)
        .ok_or_else(|| overflow("tAggON", format!("ras scale {}", ras_scale)))
}

/// Extracts typed records from the lines of one log file
pub trait LogExtractor {
    type Record: TableSchema + Clone;

    fn kind(&self) -> ExperimentKind;

    /// Substring identifying a result line
    fn marker(&self) -> &'static str;

    /// Substring marking a result line that reports no result
    fn no_result_sentinel(&self) -> Option<&'static str> {
        None
    }

    /// Build a record from the positional (row, outcome) pair; `Ok(None)`
    /// drops the observation
    fn record(
        &self,
        src: &SourceFile<'_>,
        row: u64,
        outcome: u64,
    ) -> std::result::Result<Option<Self::Record>, String>;

    /// Extract all records from the file's lines
    fn extract<'l, I>(&self, src: &SourceFile<'_>, lines: I) -> Result<Vec<Self::Record>>
    where
        I: IntoIterator<Item = &'l str>,
    {
        let fail = |reason: String| IngestError::Extraction {
            path: src.path.to_path_buf(),
            kind: self.kind(),
            reason,
        };

        let mut records = Vec::new();
        for (idx, line) in lines.into_iter().enumerate() {
            if !line.contains(self.marker()) {
                continue;
            }
            if let Some(sentinel) = self.no_result_sentinel() {
                if line.contains(sentinel) {
                    continue;
                }
            }

            let ints = integer_tokens(line)
                .map_err(|reason| fail(format!("line {}: {}", idx + 1, reason)))?;
            if ints.len() < 3 {
                return Err(fail(format!(
                    "line {}: expected 3 integer tokens after \"{}\", found {}",
                    idx + 1,
                    self.marker(),
                    ints.len()
                )));
            }

            let record = self
                .record(src, ints[1], ints[2])
                .map_err(|reason| fail(format!("line {}: {}", idx + 1, reason)))?;
            if let Some(record) = record {
                records.push(record);
            }
        }
        Ok(records)
    }
}

fn wrong_params(kind: ExperimentKind, params: &FilenameParameters) -> String {
    format!(
        "filename parameters belong to {}, not {}",
        params.kind(),
        kind
    )
}

/// Activations per hammer: double-sided patterns drive two aggressors
fn activations(src: &SourceFile<'_>, hammers: u64) -> std::result::Result<u64, String> {
    if src.key.is_double_sided() {
        hammers
            .checked_mul(2)
            .ok_or_else(|| overflow("activation count", format!("hammer count {}", hammers)))
    } else {
        Ok(hammers)
    }
}

/// `Found` lines: bit flips per victim row
#[derive(Debug, Clone, Copy, Default)]
pub struct BerExtractor;

impl LogExtractor for BerExtractor {
    type Record = BerRecord;

    fn kind(&self) -> ExperimentKind {
        ExperimentKind::Ber
    }

    fn marker(&self) -> &'static str {
        "Found"
    }

    fn record(
        &self,
        src: &SourceFile<'_>,
        row: u64,
        bitflips: u64,
    ) -> std::result::Result<Option<BerRecord>, String> {
        let FilenameParameters::Ber {
            hammer_count,
            ras_scale,
            attack_time_ms,
        } = src.name.params
        else {
            return Err(wrong_params(self.kind(), &src.name.params));
        };

        Ok(Some(BerRecord {
            module: src.name.module.clone(),
            pattern: src.key.access_pattern.clone(),
            temperature: src.key.temperature_celsius,
            hc: hammer_count,
            ac: activations(src, hammer_count)?,
            t_agg_on_ns: t_agg_on(ras_scale)?,
            row,
            bitflips,
            itr: src.name.iteration,
            atk_time_ms: attack_time_ms,
        }))
    }
}

/// `HC_First =` lines: hammer count to first bit flip per victim row
#[derive(Debug, Clone, Copy, Default)]
pub struct HcFirstExtractor;

impl LogExtractor for HcFirstExtractor {
    type Record = HcFirstRecord;

    fn kind(&self) -> ExperimentKind {
        ExperimentKind::HcFirst
    }

    fn marker(&self) -> &'static str {
        "HC_First ="
    }

    fn no_result_sentinel(&self) -> Option<&'static str> {
        Some("Inf.")
    }

    fn record(
        &self,
        src: &SourceFile<'_>,
        row: u64,
        hcf: u64,
    ) -> std::result::Result<Option<HcFirstRecord>, String> {
        let FilenameParameters::HcFirst { ras_scale } = src.name.params else {
            return Err(wrong_params(self.kind(), &src.name.params));
        };

        let ac_min = activations(src, hcf)?;
        let atk_time_ns = timing::attack_time_ns(ras_scale, ac_min).ok_or_else(|| {
            overflow("attack time", format!("ras scale {} x {} activations", ras_scale, ac_min))
        })?;
        Ok(Some(HcFirstRecord {
            module: src.name.module.clone(),
            pattern: src.key.access_pattern.clone(),
            temperature: src.key.temperature_celsius,
            t_agg_on_ns: t_agg_on(ras_scale)?,
            row,
            hcf,
            ac_min,
            itr: src.name.iteration,
            atk_time_ns,
        }))
    }
}

/// `Min RAS Scale =` lines: smallest RAS scale that flips a bit per victim row
#[derive(Debug, Clone, Copy, Default)]
pub struct MinTaggonExtractor;

impl LogExtractor for MinTaggonExtractor {
    type Record = MinTaggonRecord;

    fn kind(&self) -> ExperimentKind {
        ExperimentKind::MinTaggon
    }

    fn marker(&self) -> &'static str {
        "Min RAS Scale ="
    }

    fn no_result_sentinel(&self) -> Option<&'static str> {
        Some("Inf.")
    }

    fn record(
        &self,
        src: &SourceFile<'_>,
        row: u64,
        min_ras_scale: u64,
    ) -> std::result::Result<Option<MinTaggonRecord>, String> {
        let FilenameParameters::MinTaggon { activation_count } = src.name.params else {
            return Err(wrong_params(self.kind(), &src.name.params));
        };

        // scale 0 means the search never converged
        if min_ras_scale == 0 {
            return Ok(None);
        }

        Ok(Some(MinTaggonRecord {
            module: src.name.module.clone(),
            pattern: src.key.access_pattern.clone(),
            temperature: src.key.temperature_celsius,
            row,
            act_count: activation_count,
            min_t_agg_on_ns: t_agg_on(min_ras_scale)?,
            itr: src.name.iteration,
        }))
    }
}

/// `Found` lines of FA_BER / FT_BER runs
#[derive(Debug, Clone, Copy)]
pub struct SplitBerExtractor {
    kind: ExperimentKind,
}

impl SplitBerExtractor {
    pub fn fixed_activation() -> Self {
        Self {
            kind: ExperimentKind::FaBer,
        }
    }

    pub fn fixed_time() -> Self {
        Self {
            kind: ExperimentKind::FtBer,
        }
    }
}

impl LogExtractor for SplitBerExtractor {
    type Record = SplitBerRecord;

    fn kind(&self) -> ExperimentKind {
        self.kind
    }

    fn marker(&self) -> &'static str {
        "Found"
    }

    fn record(
        &self,
        src: &SourceFile<'_>,
        row: u64,
        bitflips: u64,
    ) -> std::result::Result<Option<SplitBerRecord>, String> {
        let (hammer_count, extra_delay, ratio, atk_time_ms) = match (self.kind, src.name.params) {
            (
                ExperimentKind::FaBer,
                FilenameParameters::FaBer {
                    hammer_count,
                    extra_delay,
                    ratio,
                },
            ) => (hammer_count, extra_delay, ratio, None),
            (
                ExperimentKind::FtBer,
                FilenameParameters::FtBer {
                    hammer_count,
                    extra_delay,
                    ratio,
                    attack_time_ms,
                },
            ) => (hammer_count, extra_delay, ratio, Some(attack_time_ms)),
            (kind, params) => return Err(wrong_params(kind, &params)),
        };

        let (t_agg_on_ns, t_agg_off_ns) = timing::extra_delay_ratio_to_on_off_ns(extra_delay, ratio);
        Ok(Some(SplitBerRecord {
            module: src.name.module.clone(),
            pattern: src.key.access_pattern.clone(),
            temperature: src.key.temperature_celsius,
            hc: hammer_count,
            ac: activations(src, hammer_count)?,
            extra_delay_ns: timing::extra_delay_ns(extra_delay).ok_or_else(|| {
                overflow("extra delay", format!("counter {}", extra_delay))
            })?,
            ratio,
            t_agg_on_ns,
            t_agg_off_ns,
            row,
            bitflips,
            itr: src.name.iteration,
            atk_time_ms,
        }))
    }
}
