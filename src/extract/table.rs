// Bit-location table reader.
//
// Tables are comma-separated with a header row naming the columns:
//   Cacheline,Word,Byte,Bit,Dir,Hammer Count,Bank,Row Offset,Pivot Row
// Column order is free; Dir, Hammer Count and Bank are optional.

use crate::error::{IngestError, Result};
use crate::experiment::ExperimentKind;
use crate::record::{BitFlipRecord, BitLocation};
use std::fs;
use std::path::{Path, PathBuf};

const REQUIRED: &[&str] = &["Cacheline", "Word", "Byte", "Bit", "Row Offset", "Pivot Row"];

struct Columns {
    cacheline: usize,
    word: usize,
    byte: usize,
    bit: usize,
    row_offset: usize,
    pivot_row: usize,
    dir: Option<usize>,
    hammer_count: Option<usize>,
    bank: Option<usize>,
}

impl Columns {
    fn from_header(header: &str) -> std::result::Result<Self, String> {
        let names: Vec<&str> = header.split(',').map(str::trim).collect();
        let find = |name: &str| names.iter().position(|n| *n == name);

        for &name in REQUIRED {
            if find(name).is_none() {
                return Err(format!("header is missing column \"{}\"", name));
            }
        }

        let required = |name: &str| find(name).unwrap_or_default();
        Ok(Self {
            cacheline: required("Cacheline"),
            word: required("Word"),
            byte: required("Byte"),
            bit: required("Bit"),
            row_offset: required("Row Offset"),
            pivot_row: required("Pivot Row"),
            dir: find("Dir"),
            hammer_count: find("Hammer Count"),
            bank: find("Bank"),
        })
    }

    fn width(&self) -> usize {
        [
            Some(self.cacheline),
            Some(self.word),
            Some(self.byte),
            Some(self.bit),
            Some(self.row_offset),
            Some(self.pivot_row),
            self.dir,
            self.hammer_count,
            self.bank,
        ]
        .into_iter()
        .flatten()
        .max()
        .map_or(0, |max| max + 1)
    }
}

fn is_missing(cell: &str) -> bool {
    cell.is_empty() || cell.eq_ignore_ascii_case("nan")
}

fn parse_cell<T: std::str::FromStr>(
    cells: &[&str],
    idx: usize,
    name: &str,
) -> std::result::Result<T, String> {
    let cell = cells[idx];
    cell.parse::<T>()
        .map_err(|_| format!("{} \"{}\" is not an integer", name, cell))
}

fn parse_optional<T: std::str::FromStr>(
    cells: &[&str],
    idx: Option<usize>,
    name: &str,
) -> std::result::Result<Option<T>, String> {
    match idx {
        Some(i) if !is_missing(cells[i]) => parse_cell(cells, i, name).map(Some),
        _ => Ok(None),
    }
}

fn parse_row(cells: &[&str], cols: &Columns) -> std::result::Result<BitFlipRecord, String> {
    Ok(BitFlipRecord {
        location: BitLocation {
            cacheline: parse_cell(cells, cols.cacheline, "Cacheline")?,
            word: parse_cell(cells, cols.word, "Word")?,
            byte: parse_cell(cells, cols.byte, "Byte")?,
            bit: parse_cell(cells, cols.bit, "Bit")?,
        },
        dir: parse_optional(cells, cols.dir, "Dir")?,
        hammer_count: parse_optional(cells, cols.hammer_count, "Hammer Count")?,
        bank: parse_optional(cells, cols.bank, "Bank")?,
        row_offset: parse_cell(cells, cols.row_offset, "Row Offset")?,
        pivot_row: parse_cell(cells, cols.pivot_row, "Pivot Row")?,
    })
}

/// Parse a bit-location table from its text
pub fn parse_bit_flip_table(
    path: &Path,
    kind: ExperimentKind,
    text: &str,
) -> Result<Vec<BitFlipRecord>> {
    let fail = |reason: String| IngestError::Extraction {
        path: path.to_path_buf(),
        kind,
        reason,
    };

    let mut lines = text.lines().enumerate().filter(|(_, l)| !l.trim().is_empty());
    let Some((_, header)) = lines.next() else {
        return Err(fail("table has no header row".to_string()));
    };
    let cols = Columns::from_header(header).map_err(fail)?;
    let width = cols.width();

    let mut records = Vec::new();
    for (idx, line) in lines {
        let cells: Vec<&str> = line.split(',').map(str::trim).collect();
        if cells.len() < width {
            return Err(fail(format!(
                "line {}: expected {} fields, found {}",
                idx + 1,
                width,
                cells.len()
            )));
        }

        let parsed = parse_row(&cells, &cols);
        records.push(parsed.map_err(|reason| fail(format!("line {}: {}", idx + 1, reason)))?);
    }

    Ok(records)
}

/// Read and parse a bit-location table file
pub fn read_bit_flip_table(path: &Path, kind: ExperimentKind) -> Result<Vec<BitFlipRecord>> {
    let text = fs::read_to_string(path).map_err(|e| IngestError::Extraction {
        path: path.to_path_buf(),
        kind,
        reason: format!("unreadable: {}", e),
    })?;
    parse_bit_flip_table(path, kind, &text)
}

/// `<dir>/<stem>_itr<N>.csv` files that exist for N in `0..iterations`
pub fn existing_iterations(dir: &Path, stem: &str, iterations: u32) -> Vec<(u32, PathBuf)> {
    (0..iterations)
        .map(|itr| (itr, dir.join(format!("{}_itr{}.csv", stem, itr))))
        .filter(|(_, path)| path.is_file())
        .collect()
}

/// Parse every existing `<stem>_itr<N>.csv`; unreadable or malformed
/// iterations are logged and left out
pub fn read_iterations(
    dir: &Path,
    stem: &str,
    iterations: u32,
    kind: ExperimentKind,
) -> Vec<(u32, Vec<BitFlipRecord>)> {
    existing_iterations(dir, stem, iterations)
        .into_iter()
        .filter_map(|(itr, path)| match read_bit_flip_table(&path, kind) {
            Ok(records) => Some((itr, records)),
            Err(e) => {
                tracing::warn!(path = %path.display(), kind = %kind, error = %e, "skipping iteration");
                None
            }
        })
        .collect()
}
