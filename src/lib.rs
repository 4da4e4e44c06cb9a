//! rowpress-ingest - RowHammer/RowPress characterization result ingestion
//!
//! This library turns raw per-trial results of DRAM characterization runs
//! (line-oriented logs and bit-location CSV tables) into per-module result
//! tables, and derives ECC, cross-experiment relation and bit-flip direction
//! reports from them.

pub mod cli;
pub mod config;
pub mod direction;
pub mod ecc;
pub mod error;
pub mod experiment;
pub mod extract;
pub mod grammar;
pub mod output;
pub mod pipeline;
pub mod record;
pub mod reduce;
pub mod relation;
pub mod timing;
