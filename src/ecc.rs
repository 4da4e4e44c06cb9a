//! ECC word analysis of fixed-budget BER runs
//!
//! For each configured access pattern, picks the worst BER iteration and
//! reports how many 64-bit words saw exactly N flipped bits.

use crate::config::{EccPattern, PipelineConfig};
use crate::error::{IngestError, Result};
use crate::experiment::ExperimentKind;
use crate::extract::read_iterations;
use crate::output;
use crate::pipeline::resolve_root;
use crate::reduce::{select_worst_iteration, word_flip_histogram};
use crate::timing;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Per-word flip histogram of one access pattern
#[derive(Debug, Clone, PartialEq)]
pub struct EccReport {
    pub module: String,
    pub pattern: String,
    pub attack_time_ms: u64,
    pub t_agg_on_ns: u64,
    /// Worst iteration, `None` when no iteration file exists
    pub iteration: Option<u32>,
    /// flips per word -> number of (row, word) groups
    pub histogram: BTreeMap<u64, u64>,
}

impl EccReport {
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = write!(
            out,
            "Type: {}\tAttack time: {}ms\ttAggON: {}ns",
            self.pattern, self.attack_time_ms, self.t_agg_on_ns
        );
        if let Some(itr) = self.iteration {
            let _ = write!(out, "\tWorst iteration: {}", itr);
        }
        out.push('\n');

        if self.histogram.is_empty() {
            out.push_str("No bitflips\n");
            return out;
        }

        out.push_str("bfs_per_word,words\n");
        for (flips, words) in &self.histogram {
            let _ = writeln!(out, "{},{}", flips, words);
        }
        out
    }

    pub fn file_name(&self) -> String {
        format!("{}_{}.log", self.module, self.pattern)
    }
}

/// Build the report of one pattern
pub fn build_report(
    data_root: &Path,
    module: &str,
    pattern: &EccPattern,
    config: &PipelineConfig,
) -> Result<EccReport> {
    let ecc = &config.ecc;
    let dir = resolve_root(data_root)?
        .join(module)
        .join(ExperimentKind::Ber.dir_name())
        .join(format!("{}-checkered", pattern.name))
        .join(format!("{}C", ecc.temperature));
    let stem = format!(
        "{}_{}_{}_{}ms",
        module, pattern.hammer_count, ecc.ras_scale, ecc.attack_time_ms
    );

    let tables = read_iterations(&dir, &stem, config.iterations, ExperimentKind::Ber);
    let counts: Vec<(u32, usize)> = tables
        .iter()
        .map(|(itr, records)| (*itr, config.selection_basis.count(records)))
        .collect();
    let iteration = select_worst_iteration(&counts);

    let histogram = tables
        .iter()
        .find(|(itr, _)| Some(*itr) == iteration)
        .map(|(_, records)| word_flip_histogram(records))
        .unwrap_or_default();

    tracing::info!(
        module,
        pattern = %pattern.name,
        iteration = ?iteration,
        words = histogram.values().sum::<u64>(),
        "ecc histogram built"
    );

    Ok(EccReport {
        module: module.to_string(),
        pattern: pattern.name.clone(),
        attack_time_ms: ecc.attack_time_ms,
        t_agg_on_ns: timing::t_agg_on_ns(ecc.ras_scale).ok_or_else(|| {
            IngestError::Config(format!("ecc.ras_scale {} overflows tAggON", ecc.ras_scale))
        })?,
        iteration,
        histogram,
    })
}

/// Build and write the report of every configured pattern
pub fn run(data_root: &Path, module: &str, config: &PipelineConfig) -> Result<Vec<PathBuf>> {
    let out_dir = config.processed_data_root.join("ecc");
    let mut written = Vec::new();
    for pattern in &config.ecc.patterns {
        let report = build_report(data_root, module, pattern, config)?;
        let path = out_dir.join(report.file_name());
        output::write_atomic(&path, report.render().as_bytes())?;
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const HEADER: &str = "Cacheline,Word,Byte,Bit,Dir,Hammer Count,Bank,Row Offset,Pivot Row";

    fn write_table(dir: &Path, name: &str, rows: &[&str]) {
        fs::create_dir_all(dir).unwrap();
        let mut text = format!("{}\n", HEADER);
        for row in rows {
            text.push_str(row);
            text.push('\n');
        }
        fs::write(dir.join(name), text).unwrap();
    }

    #[test]
    fn test_worst_iteration_histogram() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("S0/BER/single-checkered/80C");
        write_table(&dir, "S0_7711_258_60ms_itr0.csv", &["0,0,0,1,0,0,0,0,10"]);
        write_table(
            &dir,
            "S0_7711_258_60ms_itr1.csv",
            &[
                "0,0,0,1,0,0,0,0,10",
                "0,0,0,2,0,0,0,0,10",
                "0,1,0,0,0,0,0,0,10",
            ],
        );

        let config = PipelineConfig::default();
        let report = build_report(root.path(), "S0", &config.ecc.patterns[0], &config).unwrap();
        assert_eq!(report.iteration, Some(1));
        // word 0 has two flipped bits, word 1 has one
        assert_eq!(report.histogram.get(&2), Some(&1));
        assert_eq!(report.histogram.get(&1), Some(&1));

        let text = report.render();
        assert!(text.starts_with("Type: single\tAttack time: 60ms\ttAggON: 7776ns"));
        assert!(text.contains("bfs_per_word,words\n1,1\n2,1\n"));
    }

    #[test]
    fn test_missing_tables_report_no_bitflips() {
        let root = tempfile::tempdir().unwrap();
        let config = PipelineConfig {
            processed_data_root: root.path().join("out"),
            ..PipelineConfig::default()
        };
        let written = run(root.path(), "S0", &config).unwrap();
        assert_eq!(written.len(), 2);
        let single = fs::read_to_string(&written[0]).unwrap();
        assert!(single.ends_with("No bitflips\n"));
        assert!(written[1].ends_with("S0_double.log"));
    }
}
