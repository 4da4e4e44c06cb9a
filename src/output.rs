//! Processed artifact writers
//!
//! Result tables go to `<processed_root>/<tag>/<module>_<tag>_log.<ext>` as
//! MessagePack (default) or CSV. Reports are plain text. Every artifact is
//! built fully in memory and then written once through a rename, so an
//! aborted run never leaves a half-written file under the final name.

use crate::error::{IngestError, Result};
use crate::record::{ResultTable, TableSchema};
use clap::ValueEnum;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Serialization of result tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// MessagePack with named fields (default)
    #[default]
    Msgpack,
    /// CSV with a header row, for spreadsheets
    Csv,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Msgpack => "msgpack",
            OutputFormat::Csv => "csv",
        }
    }
}

/// Escape CSV field (handle commas, quotes, newlines)
pub fn escape_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Render a result table as CSV
pub fn table_to_csv<R: TableSchema>(table: &ResultTable<R>) -> String {
    let mut output = String::new();
    output.push_str(&R::COLUMNS.join(","));
    output.push('\n');

    for record in &table.records {
        let fields: Vec<String> = record
            .csv_fields()
            .iter()
            .map(|f| escape_field(f))
            .collect();
        output.push_str(&fields.join(","));
        output.push('\n');
    }

    output
}

/// Write `contents` to `path` via a sibling temporary file and a rename
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| IngestError::io(parent, e))?;
    }

    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);

    fs::write(&tmp, contents).map_err(|e| IngestError::io(&tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| IngestError::io(path, e))
}

/// Final location of a table artifact
pub fn table_path<R: TableSchema>(
    table: &ResultTable<R>,
    processed_root: &Path,
    format: OutputFormat,
) -> PathBuf {
    processed_root
        .join(table.kind.artifact_tag())
        .join(format!("{}.{}", table.artifact_stem(), format.extension()))
}

/// Serialize and write a result table, replacing any previous artifact
pub fn write_table<R: TableSchema>(
    table: &ResultTable<R>,
    processed_root: &Path,
    format: OutputFormat,
) -> Result<PathBuf> {
    let path = table_path(table, processed_root, format);
    let bytes = match format {
        OutputFormat::Msgpack => {
            rmp_serde::to_vec_named(table).map_err(|e| IngestError::Serialize(e.to_string()))?
        }
        OutputFormat::Csv => table_to_csv(table).into_bytes(),
    };

    write_atomic(&path, &bytes)?;
    tracing::info!(
        path = %path.display(),
        records = table.len(),
        "wrote {} table",
        table.kind
    );
    Ok(path)
}

/// Load a MessagePack table artifact
pub fn read_table<R: DeserializeOwned>(path: &Path) -> Result<ResultTable<R>> {
    let bytes = fs::read(path).map_err(|e| IngestError::io(path, e))?;
    rmp_serde::from_slice(&bytes).map_err(|e| IngestError::Serialize(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::experiment::ExperimentKind;
    use crate::record::MinTaggonRecord;

    fn sample_table() -> ResultTable<MinTaggonRecord> {
        ResultTable::new(
            "S0",
            ExperimentKind::MinTaggon,
            vec![MinTaggonRecord {
                module: "S0".to_string(),
                pattern: "single-checkered".to_string(),
                temperature: 50,
                row: 7,
                act_count: 1,
                min_t_agg_on_ns: 66,
                itr: 0,
            }],
        )
    }

    #[test]
    fn test_escape_field() {
        assert_eq!(escape_field("plain"), "plain");
        assert_eq!(escape_field("a,b"), "\"a,b\"");
        assert_eq!(escape_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_table_to_csv() {
        let csv = table_to_csv(&sample_table());
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("module,pattern,temperature,row,act_count,min_tAggON,itr")
        );
        assert_eq!(lines.next(), Some("S0,single-checkered,50,7,1,66,0"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_msgpack_artifact_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let table = sample_table();
        let path = write_table(&table, dir.path(), OutputFormat::Msgpack).unwrap();
        assert_eq!(
            path,
            dir.path().join("min_taggon").join("S0_min_taggon_log.msgpack")
        );

        let loaded: ResultTable<MinTaggonRecord> = read_table(&path).unwrap();
        assert_eq!(loaded, table);
    }

    #[test]
    fn test_rerun_overwrites_without_leftovers() {
        let dir = tempfile::tempdir().unwrap();
        let table = sample_table();
        write_table(&table, dir.path(), OutputFormat::Csv).unwrap();
        let path = write_table(&table, dir.path(), OutputFormat::Csv).unwrap();

        let entries: Vec<_> = fs::read_dir(path.parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries.len(), 1);
    }
}
