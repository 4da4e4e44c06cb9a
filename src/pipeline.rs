//! Batch extraction of one (module, experiment kind)
//!
//! Walks `<data_root>/<module>/<KIND>`, decodes every path and filename,
//! extracts records, and builds one [`ResultTable`]. A file that fails to
//! decode or extract is skipped and reported; the run only fails when no
//! records at all were extracted.

use crate::config::PipelineConfig;
use crate::error::{IngestError, Result};
use crate::experiment::{ExperimentKey, ExperimentKind};
use crate::extract::{LogExtractor, SourceFile};
use crate::grammar::{decode_filename, DecodedFilename, PathGrammar};
use crate::output;
use crate::record::ResultTable;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A file left out of a run, and why
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub kind: ExperimentKind,
    pub reason: String,
}

/// Bookkeeping of one directory walk
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestReport {
    /// Regular files encountered
    pub files_seen: usize,
    /// Files whose records made it into the table
    pub files_extracted: usize,
    /// Records extracted across all files
    pub records: usize,
    /// Files dropped because of a per-file error
    pub skipped: Vec<SkippedFile>,
}

impl IngestReport {
    pub(crate) fn skip(&mut self, kind: ExperimentKind, err: &IngestError, path: &Path) {
        tracing::warn!(path = %path.display(), kind = %kind, error = %err, "skipping file");
        self.skipped.push(SkippedFile {
            path: path.to_path_buf(),
            kind,
            reason: err.to_string(),
        });
    }
}

/// Table built by a run plus its walk report
#[derive(Debug, Clone)]
pub struct Extraction<R> {
    pub table: ResultTable<R>,
    pub report: IngestReport,
}

/// Absolute form of a user-supplied data root
pub fn resolve_root(data_root: &Path) -> Result<PathBuf> {
    fs::canonicalize(data_root).map_err(|e| IngestError::io(data_root, e))
}

/// Decoded source file, or `None` when the file is not an input of this run
fn classify(
    kind: ExperimentKind,
    module: &str,
    path: &Path,
    config: &PipelineConfig,
) -> Result<Option<(ExperimentKey, DecodedFilename)>> {
    let decoded = PathGrammar::positional().decode(path)?;

    if kind.filters_temperature() && !config.keeps_temperature(decoded.key.temperature_celsius) {
        tracing::debug!(path = %path.display(), "temperature filtered out");
        return Ok(None);
    }
    if !decoded.filename.ends_with(".log") {
        return Ok(None);
    }

    let name = decode_filename(kind, &decoded.filename)?;
    if name.module != module {
        tracing::debug!(path = %path.display(), "belongs to module {}", name.module);
        return Ok(None);
    }

    Ok(Some((decoded.key, name)))
}

fn extract_file<E: LogExtractor>(
    extractor: &E,
    module: &str,
    path: &Path,
    config: &PipelineConfig,
) -> Result<Option<Vec<E::Record>>> {
    let Some((key, name)) = classify(extractor.kind(), module, path, config)? else {
        return Ok(None);
    };

    let text = fs::read_to_string(path).map_err(|e| IngestError::Extraction {
        path: path.to_path_buf(),
        kind: extractor.kind(),
        reason: format!("unreadable: {}", e),
    })?;

    let src = SourceFile {
        path,
        key: &key,
        name: &name,
    };
    extractor.extract(&src, text.lines()).map(Some)
}

/// Extract every log of `module` for the extractor's kind
pub fn extract_module<E: LogExtractor>(
    extractor: &E,
    data_root: &Path,
    module: &str,
    config: &PipelineConfig,
) -> Result<Extraction<E::Record>> {
    let kind = extractor.kind();
    let results_dir = resolve_root(data_root)?.join(module).join(kind.dir_name());
    tracing::info!(dir = %results_dir.display(), "extracting {} records", kind);

    let mut report = IngestReport::default();
    let mut records = Vec::new();

    for entry in WalkDir::new(&results_dir).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                // a missing results directory simply yields no records
                tracing::warn!(dir = %results_dir.display(), error = %e, "walk error");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        report.files_seen += 1;

        let path = entry.path();
        match extract_file(extractor, module, path, config) {
            Ok(Some(file_records)) => {
                report.files_extracted += 1;
                report.records += file_records.len();
                records.extend(file_records);
            }
            Ok(None) => {}
            Err(e) if e.is_per_file() => report.skip(kind, &e, path),
            Err(e) => return Err(e),
        }
    }

    if records.is_empty() {
        return Err(IngestError::EmptyResult {
            module: module.to_string(),
            kind,
        });
    }

    Ok(Extraction {
        table: ResultTable::new(module, kind, records),
        report,
    })
}

/// Summary of a completed run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub kind: ExperimentKind,
    pub module: String,
    pub report: IngestReport,
    pub artifact: PathBuf,
}

/// Extract and persist the table for one (module, kind)
pub fn run<E: LogExtractor>(
    extractor: &E,
    data_root: &Path,
    module: &str,
    config: &PipelineConfig,
) -> Result<RunSummary> {
    let extraction = extract_module(extractor, data_root, module, config)?;
    let artifact = output::write_table(
        &extraction.table,
        &config.processed_data_root,
        config.format,
    )?;

    Ok(RunSummary {
        kind: extractor.kind(),
        module: module.to_string(),
        report: extraction.report,
        artifact,
    })
}
