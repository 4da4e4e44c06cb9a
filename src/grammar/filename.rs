// Filename grammar: `<module>_<field>..._itr<N>[.ext]`, one field layout per
// experiment kind, decoded by a single shared token engine.

use crate::error::{IngestError, Result};
use crate::experiment::ExperimentKind;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Token type of one interior filename field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// Unsigned decimal integer
    Int,
    /// Decimal float (e.g. a tAggON ratio)
    Float,
    /// Unsigned integer with an `ms` suffix
    Millis,
}

/// Named, typed interior field of a filename layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub ty: FieldType,
}

const fn field(name: &'static str, ty: FieldType) -> Field {
    Field { name, ty }
}

const BER_LAYOUT: &[Field] = &[
    field("hammer_count", FieldType::Int),
    field("ras_scale", FieldType::Int),
    field("attack_time_ms", FieldType::Millis),
];
const HCFIRST_LAYOUT: &[Field] = &[field("ras_scale", FieldType::Int)];
const RETENTION_LAYOUT: &[Field] = &[field("wait_time_ms", FieldType::Int)];
const MIN_TAGGON_LAYOUT: &[Field] = &[field("activation_count", FieldType::Int)];
const FA_BER_LAYOUT: &[Field] = &[
    field("hammer_count", FieldType::Int),
    field("extra_delay", FieldType::Int),
    field("ratio", FieldType::Float),
];
const FT_BER_LAYOUT: &[Field] = &[
    field("hammer_count", FieldType::Int),
    field("extra_delay", FieldType::Int),
    field("ratio", FieldType::Float),
    field("attack_time_ms", FieldType::Millis),
];

/// Interior field layout (between module and `itrN`) for a kind
pub fn layout(kind: ExperimentKind) -> &'static [Field] {
    match kind {
        ExperimentKind::Ber => BER_LAYOUT,
        ExperimentKind::HcFirst => HCFIRST_LAYOUT,
        ExperimentKind::RetentionFailure => RETENTION_LAYOUT,
        ExperimentKind::MinTaggon => MIN_TAGGON_LAYOUT,
        ExperimentKind::FaBer => FA_BER_LAYOUT,
        ExperimentKind::FtBer => FT_BER_LAYOUT,
    }
}

/// Kind-specific parameters carried by a filename
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FilenameParameters {
    Ber {
        hammer_count: u64,
        ras_scale: u64,
        attack_time_ms: u64,
    },
    HcFirst {
        ras_scale: u64,
    },
    RetentionFailure {
        wait_time_ms: u64,
    },
    MinTaggon {
        activation_count: u64,
    },
    FaBer {
        hammer_count: u64,
        extra_delay: u64,
        ratio: f64,
    },
    FtBer {
        hammer_count: u64,
        extra_delay: u64,
        ratio: f64,
        attack_time_ms: u64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Value {
    Int(u64),
    Float(f64),
}

impl Value {
    fn int(self) -> u64 {
        match self {
            Value::Int(v) => v,
            Value::Float(v) => v as u64,
        }
    }

    fn float(self) -> f64 {
        match self {
            Value::Int(v) => v as f64,
            Value::Float(v) => v,
        }
    }
}

impl FilenameParameters {
    pub fn kind(&self) -> ExperimentKind {
        match self {
            FilenameParameters::Ber { .. } => ExperimentKind::Ber,
            FilenameParameters::HcFirst { .. } => ExperimentKind::HcFirst,
            FilenameParameters::RetentionFailure { .. } => ExperimentKind::RetentionFailure,
            FilenameParameters::MinTaggon { .. } => ExperimentKind::MinTaggon,
            FilenameParameters::FaBer { .. } => ExperimentKind::FaBer,
            FilenameParameters::FtBer { .. } => ExperimentKind::FtBer,
        }
    }

    // `values` has already been checked against `layout(kind)`
    fn from_values(kind: ExperimentKind, v: &[Value]) -> Self {
        match kind {
            ExperimentKind::Ber => FilenameParameters::Ber {
                hammer_count: v[0].int(),
                ras_scale: v[1].int(),
                attack_time_ms: v[2].int(),
            },
            ExperimentKind::HcFirst => FilenameParameters::HcFirst {
                ras_scale: v[0].int(),
            },
            ExperimentKind::RetentionFailure => FilenameParameters::RetentionFailure {
                wait_time_ms: v[0].int(),
            },
            ExperimentKind::MinTaggon => FilenameParameters::MinTaggon {
                activation_count: v[0].int(),
            },
            ExperimentKind::FaBer => FilenameParameters::FaBer {
                hammer_count: v[0].int(),
                extra_delay: v[1].int(),
                ratio: v[2].float(),
            },
            ExperimentKind::FtBer => FilenameParameters::FtBer {
                hammer_count: v[0].int(),
                extra_delay: v[1].int(),
                ratio: v[2].float(),
                attack_time_ms: v[3].int(),
            },
        }
    }

    fn values(&self) -> Vec<Value> {
        match *self {
            FilenameParameters::Ber {
                hammer_count,
                ras_scale,
                attack_time_ms,
            } => vec![
                Value::Int(hammer_count),
                Value::Int(ras_scale),
                Value::Int(attack_time_ms),
            ],
            FilenameParameters::HcFirst { ras_scale } => vec![Value::Int(ras_scale)],
            FilenameParameters::RetentionFailure { wait_time_ms } => vec![Value::Int(wait_time_ms)],
            FilenameParameters::MinTaggon { activation_count } => {
                vec![Value::Int(activation_count)]
            }
            FilenameParameters::FaBer {
                hammer_count,
                extra_delay,
                ratio,
            } => vec![
                Value::Int(hammer_count),
                Value::Int(extra_delay),
                Value::Float(ratio),
            ],
            FilenameParameters::FtBer {
                hammer_count,
                extra_delay,
                ratio,
                attack_time_ms,
            } => vec![
                Value::Int(hammer_count),
                Value::Int(extra_delay),
                Value::Float(ratio),
                Value::Int(attack_time_ms),
            ],
        }
    }
}

/// Module, parameters and trial index decoded from one filename
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodedFilename {
    pub module: String,
    pub params: FilenameParameters,
    pub iteration: u32,
}

impl DecodedFilename {
    /// Render the file stem (no extension) that decodes back to `self`
    pub fn encode(&self) -> String {
        let mut tokens = vec![self.module.clone()];
        let fields = layout(self.params.kind());
        for (field, value) in fields.iter().zip(self.params.values()) {
            tokens.push(match (field.ty, value) {
                (FieldType::Millis, v) => format!("{}ms", v.int()),
                (FieldType::Float, v) => format!("{}", v.float()),
                (FieldType::Int, v) => v.int().to_string(),
            });
        }
        tokens.push(format!("itr{}", self.iteration));
        tokens.join("_")
    }
}

fn iteration_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^itr(\d+)$").expect("iteration pattern is valid"))
}

// The extension is whatever follows the last '.' in the final `_` token, so
// float fields such as `0.5` survive when there is no extension.
fn strip_extension(filename: &str) -> &str {
    let tail_start = filename.rfind('_').unwrap_or(0);
    match filename[tail_start..].rfind('.') {
        Some(dot) => &filename[..tail_start + dot],
        None => filename,
    }
}

fn is_decimal(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit())
}

fn parse_token(token: &str, f: Field) -> std::result::Result<Value, String> {
    match f.ty {
        FieldType::Int => {
            if !is_decimal(token) {
                return Err(format!("{} \"{}\" is not an integer", f.name, token));
            }
            token
                .parse::<u64>()
                .map(Value::Int)
                .map_err(|e| format!("{} \"{}\": {}", f.name, token, e))
        }
        FieldType::Millis => {
            let digits = token
                .strip_suffix("ms")
                .filter(|d| is_decimal(d))
                .ok_or_else(|| format!("{} \"{}\" is not <int>ms", f.name, token))?;
            digits
                .parse::<u64>()
                .map(Value::Int)
                .map_err(|e| format!("{} \"{}\": {}", f.name, token, e))
        }
        FieldType::Float => token
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| format!("{} \"{}\" is not a number", f.name, token)),
    }
}

/// Decode a filename (with or without extension) against `kind`'s layout
pub fn decode_filename(kind: ExperimentKind, filename: &str) -> Result<DecodedFilename> {
    let fail = |reason: String| IngestError::FilenameDecode {
        filename: filename.to_string(),
        reason,
    };

    let stem = strip_extension(filename);
    let tokens: Vec<&str> = stem.split('_').collect();
    let fields = layout(kind);
    let expected = fields.len() + 2;

    if tokens.len() != expected {
        return Err(fail(format!(
            "{} layout expects {} tokens, found {}",
            kind,
            expected,
            tokens.len()
        )));
    }

    let module = tokens[0];
    if module.is_empty() {
        return Err(fail("empty module token".to_string()));
    }

    let itr_token = tokens[expected - 1];
    let iteration = iteration_regex()
        .captures(itr_token)
        .and_then(|caps| caps[1].parse::<u32>().ok())
        .ok_or_else(|| fail(format!("trial token \"{}\" is not itr<N>", itr_token)))?;

    let values = tokens[1..expected - 1]
        .iter()
        .zip(fields)
        .map(|(token, f)| parse_token(token, *f))
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(fail)?;

    Ok(DecodedFilename {
        module: module.to_string(),
        params: FilenameParameters::from_values(kind, &values),
        iteration,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_hcfirst() {
        let decoded = decode_filename(ExperimentKind::HcFirst, "moduleX_258_itr0.log").unwrap();
        assert_eq!(decoded.module, "moduleX");
        assert_eq!(decoded.params, FilenameParameters::HcFirst { ras_scale: 258 });
        assert_eq!(decoded.iteration, 0);
    }

    #[test]
    fn test_decode_ber_strips_ms() {
        let decoded = decode_filename(ExperimentKind::Ber, "S2_7711_258_60ms_itr3.log").unwrap();
        assert_eq!(
            decoded.params,
            FilenameParameters::Ber {
                hammer_count: 7711,
                ras_scale: 258,
                attack_time_ms: 60
            }
        );
        assert_eq!(decoded.iteration, 3);
    }

    #[test]
    fn test_decode_ft_ber_float_ratio() {
        let decoded =
            decode_filename(ExperimentKind::FtBer, "M1_1000_40_0.25_60ms_itr1.csv").unwrap();
        assert_eq!(
            decoded.params,
            FilenameParameters::FtBer {
                hammer_count: 1000,
                extra_delay: 40,
                ratio: 0.25,
                attack_time_ms: 60
            }
        );
    }

    #[test]
    fn test_float_survives_without_extension() {
        let decoded = decode_filename(ExperimentKind::FaBer, "M1_1000_40_0.5_itr1").unwrap();
        assert_eq!(decoded.iteration, 1);
        match decoded.params {
            FilenameParameters::FaBer { ratio, .. } => assert_eq!(ratio, 0.5),
            other => panic!("unexpected params {:?}", other),
        }
    }

    #[test]
    fn test_token_count_mismatch() {
        let err = decode_filename(ExperimentKind::HcFirst, "S0_258_60ms_itr0.log").unwrap_err();
        match err {
            IngestError::FilenameDecode { filename, reason } => {
                assert_eq!(filename, "S0_258_60ms_itr0.log");
                assert!(reason.contains("expects 3 tokens"));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_non_numeric_field() {
        let err = decode_filename(ExperimentKind::MinTaggon, "S0_abc_itr0.log").unwrap_err();
        assert!(err.to_string().contains("activation_count"));
    }

    #[test]
    fn test_bad_trial_token() {
        let err = decode_filename(ExperimentKind::HcFirst, "S0_258_run0.log").unwrap_err();
        assert!(err.to_string().contains("itr<N>"));
    }

    #[test]
    fn test_millis_requires_suffix() {
        assert!(decode_filename(ExperimentKind::Ber, "S0_1_2_60_itr0.log").is_err());
    }

    #[test]
    fn test_encode_round_trip() {
        let original = DecodedFilename {
            module: "H5".to_string(),
            params: FilenameParameters::FtBer {
                hammer_count: 12,
                extra_delay: 7,
                ratio: 0.3,
                attack_time_ms: 60,
            },
            iteration: 4,
        };
        let stem = original.encode();
        assert_eq!(stem, "H5_12_7_0.3_60ms_itr4");
        let decoded = decode_filename(ExperimentKind::FtBer, &format!("{}.log", stem)).unwrap();
        assert_eq!(decoded, original);
    }
}
