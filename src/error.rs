//! Error taxonomy for the ingestion pipeline
//!
//! Per-file errors (path, filename, content) are local: the pipeline logs
//! them and moves on to the next file. Only an empty aggregate result is
//! fatal for an invocation.

use crate::experiment::ExperimentKind;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while decoding, extracting, or persisting results
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("malformed path {}: {reason}", path.display())]
    PathDecode { path: PathBuf, reason: String },

    #[error("malformed filename \"{filename}\": {reason}")]
    FilenameDecode { filename: String, reason: String },

    #[error("{kind} extraction failed for {}: {reason}", path.display())]
    Extraction {
        path: PathBuf,
        kind: ExperimentKind,
        reason: String,
    },

    #[error("no {kind} records extracted for module {module}")]
    EmptyResult { module: String, kind: ExperimentKind },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize result table: {0}")]
    Serialize(String),

    #[error("Invalid pipeline configuration: {0}")]
    Config(String),
}

impl IngestError {
    /// True for errors scoped to a single input file
    pub fn is_per_file(&self) -> bool {
        matches!(
            self,
            IngestError::PathDecode { .. }
                | IngestError::FilenameDecode { .. }
                | IngestError::Extraction { .. }
        )
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        IngestError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for ingestion operations
pub type Result<T> = std::result::Result<T, IngestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_per_file_classification() {
        let path_err = IngestError::PathDecode {
            path: PathBuf::from("/a/b"),
            reason: "too short".to_string(),
        };
        assert!(path_err.is_per_file());

        let empty = IngestError::EmptyResult {
            module: "S0".to_string(),
            kind: ExperimentKind::HcFirst,
        };
        assert!(!empty.is_per_file());
    }

    #[test]
    fn test_empty_result_names_module_and_kind() {
        let empty = IngestError::EmptyResult {
            module: "H7".to_string(),
            kind: ExperimentKind::Ber,
        };
        let msg = empty.to_string();
        assert!(msg.contains("H7"));
        assert!(msg.contains("BER"));
    }

    #[test]
    fn test_extraction_message_carries_path() {
        let err = IngestError::Extraction {
            path: PathBuf::from("/data/S0/HCFIRST/single-checkered/50C/S0_0_itr0.log"),
            kind: ExperimentKind::HcFirst,
            reason: "expected 3 integer tokens, found 1".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("S0_0_itr0.log"));
        assert!(msg.contains("HCFIRST"));
    }
}
