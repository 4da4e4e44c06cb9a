//! Record extraction from raw result files
//!
//! Two families of producers exist:
//! - line-oriented logs (`.log`), scanned for a kind-specific marker line
//! - comma-separated bit-location tables (`.csv`) with a header row
//!
//! Extraction errors are scoped to one file; callers decide whether to skip.

mod log;
mod table;

pub use log::{
    integer_tokens, BerExtractor, HcFirstExtractor, LogExtractor, MinTaggonExtractor,
    SplitBerExtractor,
};
pub use table::{
    existing_iterations, parse_bit_flip_table, read_bit_flip_table, read_iterations,
};

use crate::experiment::ExperimentKey;
use crate::grammar::DecodedFilename;
use std::path::Path;

/// A raw file together with everything decoded from its path and name
#[derive(Debug, Clone, Copy)]
pub struct SourceFile<'a> {
    pub path: &'a Path,
    pub key: &'a ExperimentKey,
    pub name: &'a DecodedFilename,
}
