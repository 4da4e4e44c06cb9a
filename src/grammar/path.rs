// Path grammar: an ordered list of segment roles aligned either against the
// tail of the path or against a wrapper-directory anchor.

use crate::error::{IngestError, Result};
use crate::experiment::{ExperimentKey, ExperimentKind};
use regex::Regex;
use std::path::{Component, Path};
use std::sync::OnceLock;

/// Wrapper directories some producers place above the module directory,
/// in the order they are re-based on
pub const DEFAULT_ANCHORS: &[&str] = &["fix_data", "new_data", "data"];

/// Meaning of one path segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentRole {
    Module,
    Experiment,
    AccessPattern,
    Temperature,
    Filename,
}

impl SegmentRole {
    fn describe(self) -> &'static str {
        match self {
            SegmentRole::Module => "module",
            SegmentRole::Experiment => "experiment kind",
            SegmentRole::AccessPattern => "access pattern",
            SegmentRole::Temperature => "temperature",
            SegmentRole::Filename => "filename",
        }
    }
}

const STANDARD_ROLES: &[SegmentRole] = &[
    SegmentRole::Module,
    SegmentRole::Experiment,
    SegmentRole::AccessPattern,
    SegmentRole::Temperature,
    SegmentRole::Filename,
];

#[derive(Debug, Clone, Copy)]
enum Alignment {
    /// Roles cover the last N segments
    Trailing,
    /// Roles start right after the anchor segment
    Anchored(&'static [&'static str]),
}

/// Grammar mapping path segments to an [`ExperimentKey`]
#[derive(Debug, Clone, Copy)]
pub struct PathGrammar {
    alignment: Alignment,
    roles: &'static [SegmentRole],
}

/// Result of decoding one path
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedPath {
    pub key: ExperimentKey,
    pub filename: String,
}

fn temperature_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(-?\d+)C$").expect("temperature pattern is valid"))
}

impl PathGrammar {
    /// `.../module/kind/pattern/<temp>C/filename`, counted from the end
    pub const fn positional() -> Self {
        Self {
            alignment: Alignment::Trailing,
            roles: STANDARD_ROLES,
        }
    }

    /// `.../<anchor>/module/kind/pattern/<temp>C/filename`, counted from the anchor
    pub const fn anchored(anchors: &'static [&'static str]) -> Self {
        Self {
            alignment: Alignment::Anchored(anchors),
            roles: STANDARD_ROLES,
        }
    }

    /// Decode a path into its experiment key and filename
    pub fn decode(&self, path: &Path) -> Result<DecodedPath> {
        let fail = |reason: String| IngestError::PathDecode {
            path: path.to_path_buf(),
            reason,
        };

        let mut segments = Vec::new();
        for component in path.components() {
            if let Component::Normal(part) = component {
                let part = part
                    .to_str()
                    .ok_or_else(|| fail("segment is not valid UTF-8".to_string()))?;
                segments.push(part);
            }
        }

        let aligned: &[&str] = match self.alignment {
            Alignment::Trailing => {
                if segments.len() < self.roles.len() {
                    return Err(fail(format!(
                        "expected at least {} segments, found {}",
                        self.roles.len(),
                        segments.len()
                    )));
                }
                &segments[segments.len() - self.roles.len()..]
            }
            Alignment::Anchored(anchors) => {
                let mut start = None;
                for anchor in anchors {
                    let base = start.unwrap_or(0);
                    if let Some(offset) = segments[base..].iter().position(|s| s == anchor) {
                        start = Some(base + offset);
                    }
                }
                let Some(start) = start else {
                    return Err(fail(format!(
                        "no anchor segment (one of {})",
                        anchors.join(", ")
                    )));
                };
                let rest = &segments[start + 1..];
                if rest.len() < self.roles.len() {
                    let missing = self.roles[rest.len()];
                    return Err(fail(format!(
                        "{} segment missing after anchor \"{}\"",
                        missing.describe(),
                        segments[start]
                    )));
                }
                &rest[..self.roles.len()]
            }
        };

        let mut module = None;
        let mut kind = None;
        let mut pattern = None;
        let mut temperature = None;
        let mut filename = None;

        for (role, segment) in self.roles.iter().zip(aligned) {
            match role {
                SegmentRole::Module => module = Some(segment.to_string()),
                SegmentRole::Experiment => {
                    kind = Some(segment.parse::<ExperimentKind>().map_err(fail)?);
                }
                SegmentRole::AccessPattern => pattern = Some(segment.to_string()),
                SegmentRole::Temperature => {
                    let caps = temperature_regex().captures(segment).ok_or_else(|| {
                        fail(format!("temperature segment \"{}\" is not <int>C", segment))
                    })?;
                    let value = caps[1].parse::<i32>().map_err(|e| {
                        fail(format!("temperature segment \"{}\": {}", segment, e))
                    })?;
                    temperature = Some(value);
                }
                SegmentRole::Filename => filename = Some(segment.to_string()),
            }
        }

        match (module, kind, pattern, temperature, filename) {
            (Some(module), Some(experiment_kind), Some(access_pattern), Some(t), Some(filename)) => {
                Ok(DecodedPath {
                    key: ExperimentKey {
                        module,
                        experiment_kind,
                        access_pattern,
                        temperature_celsius: t,
                    },
                    filename,
                })
            }
            _ => Err(fail("grammar does not cover every key role".to_string())),
        }
    }
}
