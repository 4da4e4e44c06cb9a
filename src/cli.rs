//! CLI argument parsing for rowpress-ingest

use crate::output::OutputFormat;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "rowpress-ingest")]
#[command(version)]
#[command(
    about = "Ingest RowHammer/RowPress characterization results into per-module tables",
    long_about = None
)]
pub struct Cli {
    /// TOML configuration file (defaults apply when omitted)
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Processed-data root, overrides `processed_data_root` from the config
    #[arg(short, long = "out-dir", value_name = "DIR", global = true)]
    pub out_dir: Option<PathBuf>,

    /// Table serialization, overrides `format` from the config
    #[arg(long = "format", value_enum, global = true)]
    pub format: Option<OutputFormat>,

    /// Enable trace-level logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Raw data location shared by every subcommand
#[derive(Args, Debug, Clone)]
pub struct Target {
    /// Raw data root containing `<module>/<KIND>/...`
    #[arg(value_name = "DATA_ROOT")]
    pub data_root: PathBuf,

    /// Module identifier, e.g. S0
    #[arg(value_name = "MODULE")]
    pub module: String,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Bit error rate logs (BER)
    Ber(Target),
    /// First hammer count to flip a bit (HCFIRST)
    Hcf(Target),
    /// Minimum aggressor-on time (MIN_TAGGON)
    MinTaggon(Target),
    /// Split-timing BER with a fixed activation count (FA_BER)
    FaBer(Target),
    /// Split-timing BER with a fixed time budget (FT_BER)
    FtBer(Target),
    /// Flipped bits per 64-bit word of the worst BER iteration
    Ecc(Target),
    /// Overlap of HCFIRST sweep flips with hammer-only and retention references
    Relation(Target),
    /// 0->1 vs 1->0 flips at the lowest hammer count, per tAggON
    BitflipDirection(Target),
}

impl Command {
    pub fn target(&self) -> &Target {
        match self {
            Command::Ber(t)
            | Command::Hcf(t)
            | Command::MinTaggon(t)
            | Command::FaBer(t)
            | Command::FtBer(t)
            | Command::Ecc(t)
            | Command::Relation(t)
            | Command::BitflipDirection(t) => t,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_subcommand_target() {
        let cli = Cli::parse_from(["rowpress-ingest", "hcf", "/data", "S0"]);
        assert!(matches!(cli.command, Command::Hcf(_)));
        let target = cli.command.target();
        assert_eq!(target.data_root, PathBuf::from("/data"));
        assert_eq!(target.module, "S0");
    }

    #[test]
    fn test_cli_global_options_after_subcommand() {
        let cli = Cli::parse_from([
            "rowpress-ingest",
            "min-taggon",
            "/data",
            "S1",
            "--format",
            "csv",
            "--out-dir",
            "/out",
            "--debug",
        ]);
        assert!(matches!(cli.command, Command::MinTaggon(_)));
        assert_eq!(cli.format, Some(OutputFormat::Csv));
        assert_eq!(cli.out_dir, Some(PathBuf::from("/out")));
        assert!(cli.debug);
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["rowpress-ingest", "ber", "/data", "S0"]);
        assert!(cli.config.is_none());
        assert!(cli.format.is_none());
        assert!(!cli.debug);
    }

    #[test]
    fn test_cli_kebab_case_subcommands() {
        let cli = Cli::parse_from(["rowpress-ingest", "bitflip-direction", "/d", "S0"]);
        assert!(matches!(cli.command, Command::BitflipDirection(_)));
        let cli = Cli::parse_from(["rowpress-ingest", "fa-ber", "/d", "S0"]);
        assert!(matches!(cli.command, Command::FaBer(_)));
    }

    #[test]
    fn test_cli_requires_module() {
        assert!(Cli::try_parse_from(["rowpress-ingest", "ber", "/data"]).is_err());
    }
}
