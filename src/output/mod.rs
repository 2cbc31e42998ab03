//! Output module for indexing reports
//!
//! This module handles:
//! - Aggregating per-site page and lemma counts into statistics
//! - Printing statistics for the command line

pub mod stats;

pub use stats::{
    load_statistics, print_statistics, DetailedStatistics, Statistics, TotalStatistics,
    NOT_INDEXED,
};
