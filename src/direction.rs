//! Bit-flip direction summary of HCFIRST bit-location tables
//!
//! Producers of these tables sometimes wrap the data tree in extra
//! directories (`fix_data/`, `new_data/`, `data/`), so files are located
//! with the anchored path grammar over the whole data root.

use crate::config::PipelineConfig;
use crate::error::{IngestError, Result};
use crate::experiment::ExperimentKind;
use crate::extract::read_bit_flip_table;
use crate::grammar::{decode_filename, FilenameParameters, PathGrammar, DEFAULT_ANCHORS};
use crate::output;
use crate::pipeline::{resolve_root, IngestReport};
use crate::record::{ResultTable, TableSchema};
use crate::reduce::ReductionPolicy;
use crate::timing;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// One flipped bit with the hammer count that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct DirectionObservation {
    pub t_agg_on_ns: u64,
    pub pivot_row: u64,
    pub hammer_count: u64,
    pub dir: Option<u8>,
    pub itr: u32,
}

/// Flip directions at the lowest hammer count, per tAggON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectionSummary {
    pub module: String,
    pub pattern: String,
    pub temperature: i32,
    pub hc: u64,
    #[serde(rename = "tAggON")]
    pub t_agg_on_ns: u64,
    pub dir0: u64,
    pub dir1: u64,
    pub total_bitflips: u64,
}

impl TableSchema for DirectionSummary {
    const COLUMNS: &'static [&'static str] = &[
        "module",
        "pattern",
        "temperature",
        "hc",
        "tAggON",
        "dir0",
        "dir1",
        "total_bitflips",
    ];

    fn csv_fields(&self) -> Vec<String> {
        vec![
            self.module.clone(),
            self.pattern.clone(),
            self.temperature.to_string(),
            self.hc.to_string(),
            self.t_agg_on_ns.to_string(),
            self.dir0.to_string(),
            self.dir1.to_string(),
            self.total_bitflips.to_string(),
        ]
    }
}

/// Collect observations of `module` at the configured pattern and temperature
pub fn collect(
    data_root: &Path,
    module: &str,
    config: &PipelineConfig,
) -> Result<(Vec<DirectionObservation>, IngestReport)> {
    let kind = ExperimentKind::HcFirst;
    let grammar = PathGrammar::anchored(DEFAULT_ANCHORS);
    let root = resolve_root(data_root)?;

    let mut report = IngestReport::default();
    let mut observations = Vec::new();

    for entry in WalkDir::new(&root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(error = %e, "walk error");
                continue;
            }
        };
        let path = entry.path();
        if !entry.file_type().is_file() || path.extension().map_or(true, |ext| ext != "csv") {
            continue;
        }
        // tables outside an anchored tree are not inputs of this summary
        let Ok(decoded) = grammar.decode(path) else {
            tracing::debug!(path = %path.display(), "no anchored experiment key");
            continue;
        };
        let key = &decoded.key;
        if key.module != module
            || key.experiment_kind != kind
            || key.access_pattern != config.direction.pattern
            || key.temperature_celsius != config.direction.temperature
        {
            continue;
        }
        report.files_seen += 1;

        let parsed = decode_filename(kind, &decoded.filename)
            .and_then(|name| read_bit_flip_table(path, kind).map(|records| (name, records)));
        let (name, records) = match parsed {
            Ok(parsed) => parsed,
            Err(e) => {
                report.skip(kind, &e, path);
                continue;
            }
        };
        let FilenameParameters::HcFirst { ras_scale } = name.params else {
            continue;
        };
        let Some(t_agg_on_ns) = timing::t_agg_on_ns(ras_scale) else {
            let err = IngestError::Extraction {
                path: path.to_path_buf(),
                kind,
                reason: format!("tAggON overflows for ras scale {}", ras_scale),
            };
            report.skip(kind, &err, path);
            continue;
        };

        report.files_extracted += 1;
        for record in records {
            // rows without a hammer count never flipped
            let Some(hammer_count) = record.hammer_count else {
                continue;
            };
            report.records += 1;
            observations.push(DirectionObservation {
                t_agg_on_ns,
                pivot_row: record.pivot_row,
                hammer_count,
                dir: record.dir,
                itr: name.iteration,
            });
        }
    }

    Ok((observations, report))
}

/// Reduce observations to one summary row per tAggON
pub fn summarize(
    module: &str,
    pattern: &str,
    temperature: i32,
    observations: Vec<DirectionObservation>,
) -> Vec<DirectionSummary> {
    let firsts = ReductionPolicy::MIN_HAMMER_COUNT_FIRST.reduce(
        observations,
        |o| (o.t_agg_on_ns, o.pivot_row),
        |o| o.hammer_count,
    );

    let mut per_t_agg_on: BTreeMap<u64, DirectionSummary> = BTreeMap::new();
    for obs in firsts {
        let summary = per_t_agg_on
            .entry(obs.t_agg_on_ns)
            .or_insert_with(|| DirectionSummary {
                module: module.to_string(),
                pattern: pattern.to_string(),
                temperature,
                hc: obs.hammer_count,
                t_agg_on_ns: obs.t_agg_on_ns,
                dir0: 0,
                dir1: 0,
                total_bitflips: 0,
            });
        summary.hc = summary.hc.min(obs.hammer_count);
        match obs.dir {
            Some(0) => summary.dir0 += 1,
            Some(1) => summary.dir1 += 1,
            _ => {}
        }
        summary.total_bitflips = summary.dir0 + summary.dir1;
    }

    per_t_agg_on.into_values().collect()
}

/// Artifact name, e.g. `S0_HCFIRST_50_singlecheckered_bitflipdirection.csv`
pub fn file_name(module: &str, config: &PipelineConfig) -> String {
    format!(
        "{}_{}_{}_{}_bitflipdirection.csv",
        module,
        ExperimentKind::HcFirst.dir_name(),
        config.direction.temperature,
        config.direction.pattern.replace('-', "")
    )
}

/// Collect, summarize and write the direction CSV
pub fn run(
    data_root: &Path,
    module: &str,
    config: &PipelineConfig,
) -> Result<(IngestReport, PathBuf)> {
    let (observations, report) = collect(data_root, module, config)?;
    let summaries = summarize(
        module,
        &config.direction.pattern,
        config.direction.temperature,
        observations,
    );
    if summaries.is_empty() {
        return Err(IngestError::EmptyResult {
            module: module.to_string(),
            kind: ExperimentKind::HcFirst,
        });
    }

    let table = ResultTable::new(module, ExperimentKind::HcFirst, summaries);
    let path = config
        .processed_data_root
        .join("hcf_bitflipdirection")
        .join(file_name(module, config));
    output::write_atomic(&path, output::table_to_csv(&table).as_bytes())?;
    Ok((report, path))
}
