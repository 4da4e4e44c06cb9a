//! Extraction hot path benchmarks
//!
//! A characterization campaign produces tens of thousands of small logs and
//! bit-location tables per module, so per-file decode and scan cost dominates
//! a run.
//!
//! # Run Instructions
//!
//! ```bash
//! cargo bench --bench extraction
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rowpress_ingest::experiment::{ExperimentKey, ExperimentKind};
use rowpress_ingest::extract::{parse_bit_flip_table, HcFirstExtractor, LogExtractor, SourceFile};
use rowpress_ingest::grammar::{decode_filename, PathGrammar};
use rowpress_ingest::reduce::word_flip_histogram;
use std::fmt::Write as _;
use std::path::Path;

fn hcfirst_log(lines: usize) -> String {
    let mut text = String::new();
    for row in 0..lines {
        let _ = writeln!(text, "Hammering row {}", row);
        let _ = writeln!(text, "HC_First = {} row {} : {}", row % 4, row, 1000 + row);
    }
    text
}

fn bit_flip_table(rows: usize) -> String {
    let mut text = String::from("Cacheline,Word,Byte,Bit,Dir,Hammer Count,Bank,Row Offset,Pivot Row\n");
    for i in 0..rows {
        let _ = writeln!(
            text,
            "{},{},{},{},{},{},1,{},{}",
            i % 128,
            i % 8,
            i % 8,
            i % 8,
            i % 2,
            1000 + i,
            (i % 3) as i64 - 1,
            i / 16
        );
    }
    text
}

fn bench_decode_path_and_filename(c: &mut Criterion) {
    let path = Path::new("/mnt/raw/S0/HCFIRST/single-checkered/50C/S0_258_itr0.log");
    let grammar = PathGrammar::positional();

    c.bench_function("decode_path_and_filename", |b| {
        b.iter(|| {
            let decoded = grammar.decode(black_box(path)).unwrap();
            decode_filename(decoded.key.experiment_kind, &decoded.filename).unwrap()
        });
    });
}

fn bench_hcfirst_extract(c: &mut Criterion) {
    let mut group = c.benchmark_group("hcfirst_extract");
    let path = Path::new("S0/HCFIRST/single-checkered/50C/S0_258_itr0.log");
    let key = ExperimentKey {
        module: "S0".to_string(),
        experiment_kind: ExperimentKind::HcFirst,
        access_pattern: "single-checkered".to_string(),
        temperature_celsius: 50,
    };
    let name = decode_filename(ExperimentKind::HcFirst, "S0_258_itr0.log").unwrap();
    let src = SourceFile {
        path,
        key: &key,
        name: &name,
    };

    for lines in [100, 1_000, 10_000] {
        let text = hcfirst_log(lines);
        group.bench_with_input(BenchmarkId::from_parameter(lines), &text, |b, text| {
            b.iter(|| HcFirstExtractor.extract(&src, black_box(text).lines()).unwrap());
        });
    }
    group.finish();
}

fn bench_table_histogram(c: &mut Criterion) {
    let mut group = c.benchmark_group("bit_flip_table_histogram");
    let path = Path::new("S0_7711_258_60ms_itr0.csv");

    for rows in [1_000, 10_000] {
        let text = bit_flip_table(rows);
        group.bench_with_input(BenchmarkId::from_parameter(rows), &text, |b, text| {
            b.iter(|| {
                let records = parse_bit_flip_table(path, ExperimentKind::Ber, black_box(text)).unwrap();
                word_flip_histogram(&records)
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_decode_path_and_filename,
    bench_hcfirst_extract,
    bench_table_histogram,
);
criterion_main!(benches);
