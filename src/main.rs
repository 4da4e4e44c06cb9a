use anyhow::{Context, Result};
use clap::Parser;
use rowpress_ingest::cli::{Cli, Command};
use rowpress_ingest::config::PipelineConfig;
use rowpress_ingest::extract::{
    BerExtractor, HcFirstExtractor, LogExtractor, MinTaggonExtractor, SplitBerExtractor,
};
use rowpress_ingest::pipeline::{self, IngestReport};
use rowpress_ingest::{direction, ecc, relation};
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber; per-file warnings go to stderr
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into())
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(args: &Cli) -> Result<PipelineConfig> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    if let Some(out_dir) = &args.out_dir {
        config.processed_data_root = out_dir.clone();
    }
    if let Some(format) = args.format {
        config.format = format;
    }
    Ok(config)
}

fn print_report(report: &IngestReport, artifact: &Path) {
    println!(
        "files: {} seen, {} extracted, {} skipped; records: {}; wrote {}",
        report.files_seen,
        report.files_extracted,
        report.skipped.len(),
        report.records,
        artifact.display()
    );
}

fn run_table<E: LogExtractor>(
    extractor: &E,
    data_root: &Path,
    module: &str,
    config: &PipelineConfig,
) -> Result<()> {
    let summary = pipeline::run(extractor, data_root, module, config)?;
    print_report(&summary.report, &summary.artifact);
    Ok(())
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.debug);

    let config = load_config(&args)?;
    let target = args.command.target();
    let (data_root, module) = (target.data_root.as_path(), target.module.as_str());

    if !data_root.is_dir() {
        anyhow::bail!("Data root {} is not a directory", data_root.display());
    }

    match &args.command {
        Command::Ber(_) => run_table(&BerExtractor, data_root, module, &config)?,
        Command::Hcf(_) => run_table(&HcFirstExtractor, data_root, module, &config)?,
        Command::MinTaggon(_) => run_table(&MinTaggonExtractor, data_root, module, &config)?,
        Command::FaBer(_) => run_table(
            &SplitBerExtractor::fixed_activation(),
            data_root,
            module,
            &config,
        )?,
        Command::FtBer(_) => {
            run_table(&SplitBerExtractor::fixed_time(), data_root, module, &config)?
        }
        Command::Ecc(_) => {
            for path in ecc::run(data_root, module, &config)? {
                println!("wrote {}", path.display());
            }
        }
        Command::Relation(_) => {
            let (_, path) = relation::run(data_root, module, &config)?;
            println!("wrote {}", path.display());
        }
        Command::BitflipDirection(_) => {
            let (report, path) = direction::run(data_root, module, &config)?;
            print_report(&report, &path);
        }
    }

    Ok(())
}
