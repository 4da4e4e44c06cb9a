//! Cross-experiment relation: overlap of flipped bits across a tAggON sweep
//!
//! Answers, for every swept RAS scale: of the bits flippable at that tAggON,
//! how many also flip under the hammer-only reference run, and how many
//! also fail under pure retention (no hammering).

use crate::config::PipelineConfig;
use crate::error::{IngestError, Result};
use crate::experiment::ExperimentKind;
use crate::extract::{existing_iterations, read_iterations};
use crate::output;
use crate::pipeline::resolve_root;
use crate::record::{BitFlipRecord, FlipSite};
use crate::reduce::{select_worst_iteration, ReductionPolicy};
use crate::timing;
use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Column header of the relation log
pub const HEADER: &str = "tAggON,rp_bfs,rp_rh_bfs,rp_ret_bfs,rh_bfs,ret_bfs";

/// Number of sites present in both sets
pub fn overlap(a: &BTreeSet<FlipSite>, b: &BTreeSet<FlipSite>) -> usize {
    a.intersection(b).count()
}

/// Why a flip set could not be built
#[derive(Debug, Clone, PartialEq)]
pub enum Unavailable {
    /// No iteration file exists; carries the first one looked for
    Missing(PathBuf),
    /// Iteration files exist but none of them parsed; carries the first one
    Unreadable(PathBuf),
}

impl Unavailable {
    pub fn path(&self) -> &Path {
        match self {
            Unavailable::Missing(path) | Unavailable::Unreadable(path) => path.as_path(),
        }
    }

    fn render(&self) -> String {
        match self {
            Unavailable::Missing(path) => format!("(not found - {})", path.display()),
            Unavailable::Unreadable(path) => format!("(unreadable - {})", path.display()),
        }
    }
}

type Tables = Vec<(u32, Vec<BitFlipRecord>)>;

fn load_iterations(
    dir: &Path,
    stem: &str,
    iterations: u32,
    kind: ExperimentKind,
) -> std::result::Result<Tables, Unavailable> {
    let existing = existing_iterations(dir, stem, iterations);
    let Some((_, first)) = existing.first() else {
        return Err(Unavailable::Missing(dir.join(format!("{}_itr0.csv", stem))));
    };
    let tables = read_iterations(dir, stem, iterations, kind);
    if tables.is_empty() {
        return Err(Unavailable::Unreadable(first.clone()));
    }
    Ok(tables)
}

/// Flip sites at the minimum hammer count per pivot row, across all
/// iterations
pub fn min_hammer_sites(
    dir: &Path,
    stem: &str,
    iterations: u32,
) -> std::result::Result<BTreeSet<FlipSite>, Unavailable> {
    let flips: Vec<_> = load_iterations(dir, stem, iterations, ExperimentKind::HcFirst)?
        .into_iter()
        .flat_map(|(_, records)| records)
        .filter(|r| r.hammer_count.is_some())
        .collect();

    let kept = ReductionPolicy::MIN_HAMMER_COUNT.reduce(flips, |r| r.pivot_row, |r| r.hammer_count);
    Ok(kept.iter().map(|r| r.site()).collect())
}

/// Flip sites of the worst retention iteration
pub fn retention_sites(
    dir: &Path,
    stem: &str,
    config: &PipelineConfig,
) -> std::result::Result<BTreeSet<FlipSite>, Unavailable> {
    let tables = load_iterations(dir, stem, config.iterations, ExperimentKind::RetentionFailure)?;
    let counts: Vec<(u32, usize)> = tables
        .iter()
        .map(|(itr, records)| (*itr, config.selection_basis.count(records)))
        .collect();
    let worst = select_worst_iteration(&counts);

    Ok(tables
        .into_iter()
        .find(|(itr, _)| Some(*itr) == worst)
        .map(|(_, records)| records.iter().map(|r| r.site()).collect())
        .unwrap_or_default())
}

/// One sweep point
#[derive(Debug, Clone, PartialEq)]
pub struct RelationRow {
    pub t_agg_on_ns: u64,
    /// Sites flippable at this tAggON
    pub total: usize,
    /// Overlap with the hammer-only reference; `None` when `total` is 0
    pub overlap_rh: Option<usize>,
    /// Overlap with the retention reference; `None` when `total` is 0
    pub overlap_ret: Option<usize>,
    pub rh_total: usize,
    pub ret_total: usize,
    /// Set when the sweep point had no usable iteration file
    pub unavailable: Option<Unavailable>,
}

impl RelationRow {
    fn render(&self) -> String {
        let na = |v: Option<usize>| v.map_or_else(|| "NaN".to_string(), |v| v.to_string());
        format!(
            "{},{},{},{},{},{}",
            self.t_agg_on_ns,
            self.total,
            na(self.overlap_rh),
            na(self.overlap_ret),
            self.rh_total,
            self.ret_total
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RelationBody {
    Rows(Vec<RelationRow>),
    /// A reference set could not be built; no sweep was computed
    ReferenceUnavailable(Unavailable),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RelationReport {
    pub module: String,
    pub pattern: String,
    pub temperature: i32,
    pub body: RelationBody,
}

impl RelationReport {
    pub fn file_name(&self) -> String {
        format!(
            "{}_{}_{}_{}C.log",
            self.module,
            ExperimentKind::HcFirst.dir_name(),
            self.pattern,
            self.temperature
        )
    }

    pub fn render(&self) -> String {
        match &self.body {
            RelationBody::ReferenceUnavailable(reason) => format!("{}\n", reason.render()),
            RelationBody::Rows(rows) => {
                let mut out = String::new();
                let _ = writeln!(out, "{}", HEADER);
                for row in rows {
                    let _ = writeln!(out, "{}", row.render());
                }
                out
            }
        }
    }
}

/// Compute the relation report for `module`
pub fn build_report(data_root: &Path, module: &str, config: &PipelineConfig) -> Result<RelationReport> {
    let rel = &config.relation;
    let root = resolve_root(data_root)?.join(module);
    let pattern_dir = format!("{}-checkered", rel.pattern);
    let hcf_dir = root
        .join(ExperimentKind::HcFirst.dir_name())
        .join(&pattern_dir)
        .join(format!("{}C", rel.temperature));
    let ret_dir = root
        .join(ExperimentKind::RetentionFailure.dir_name())
        .join(&pattern_dir)
        .join(format!("{}C", rel.retention_temperature));

    let report = |body| RelationReport {
        module: module.to_string(),
        pattern: rel.pattern.clone(),
        temperature: rel.temperature,
        body,
    };

    let ret_stem = format!("{}_{}", module, rel.retention_wait_ms);
    let ret = match retention_sites(&ret_dir, &ret_stem, config) {
        Ok(sites) => sites,
        Err(reason) => return Ok(report(RelationBody::ReferenceUnavailable(reason))),
    };

    let rh_stem = format!("{}_{}", module, rel.rh_ras_scale);
    let rh = match min_hammer_sites(&hcf_dir, &rh_stem, config.iterations) {
        Ok(sites) => sites,
        Err(reason) => return Ok(report(RelationBody::ReferenceUnavailable(reason))),
    };

    let mut rows = Vec::with_capacity(rel.sweep_ras_scales.len());
    for &ras_scale in &rel.sweep_ras_scales {
        let stem = format!("{}_{}", module, ras_scale);
        let mut row = RelationRow {
            t_agg_on_ns: timing::t_agg_on_ns(ras_scale).ok_or_else(|| {
                IngestError::Config(format!("sweep ras scale {} overflows tAggON", ras_scale))
            })?,
            total: 0,
            overlap_rh: None,
            overlap_ret: None,
            rh_total: rh.len(),
            ret_total: ret.len(),
            unavailable: None,
        };

        match min_hammer_sites(&hcf_dir, &stem, config.iterations) {
            Err(reason) => {
                tracing::warn!(path = %reason.path().display(), "sweep point unavailable");
                row.unavailable = Some(reason);
            }
            Ok(sites) if sites.is_empty() => {}
            Ok(sites) => {
                row.total = sites.len();
                row.overlap_rh = Some(overlap(&sites, &rh));
                row.overlap_ret = Some(overlap(&sites, &ret));
            }
        }
        rows.push(row);
    }

    Ok(report(RelationBody::Rows(rows)))
}

/// Build and write the relation log
pub fn run(data_root: &Path, module: &str, config: &PipelineConfig) -> Result<(RelationReport, PathBuf)> {
    let report = build_report(data_root, module, config)?;
    let path = config
        .processed_data_root
        .join("relation")
        .join(report.file_name());
    output::write_atomic(&path, report.render().as_bytes())?;
    Ok((report, path))
}
