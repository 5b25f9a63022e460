use std::collections::BTreeMap;
use std::fmt::Display;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::defaults::COMMIT_HASH_DISPLAY_LENGTH;

/// Timing and throughput statistics for one operation at one configuration
/// within a snapshot. All time fields are in nanoseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub operation_name: String,
    pub data_type: String,
    pub vector_size: u64,
    pub min_time: f64,
    pub max_time: f64,
    pub mean_time: f64,
    pub median_time: f64,
    pub stddev_time: f64,
    pub p95_time: f64,
    pub p99_time: f64,
    pub iterations: u64,
    pub elements_processed: u64,
    pub throughput_mops: f64,
}

/// One benchmark run's full result set for one commit.
///
/// The `benchmarks` map is keyed by benchmark name, unique within a snapshot.
/// A `BTreeMap` keeps flattened row order deterministic for a given input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub commit_hash: String,
    pub timestamp: String,
    pub build_config: String,
    pub cpu_info: String,
    pub benchmarks: BTreeMap<String, Measurement>,
}

/// Identifies one comparable time series: all rows sharing a key form the
/// history of a single operation/type/size combination across commits.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConfigKey {
    pub operation_name: String,
    pub data_type: String,
    pub vector_size: u64,
}

impl Display for ConfigKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.operation_name, self.data_type, self.vector_size
        )
    }
}

/// One measurement with its snapshot metadata denormalized onto it.
///
/// Uniqueness key is (`commit_hash`, `benchmark_name`); rows sharing a
/// [`ConfigKey`] across commits form the time-series axis.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatRow {
    pub commit_hash: String,
    pub commit_short: String,
    pub timestamp: String,
    /// Parsed form of `timestamp`; falls back to load time when the raw
    /// value is unparseable (ordering for such rows is best-effort).
    pub parsed_at: NaiveDateTime,
    pub build_config: String,
    pub cpu_info: String,
    pub benchmark_name: String,
    pub operation_name: String,
    pub data_type: String,
    pub vector_size: u64,
    pub min_time: f64,
    pub max_time: f64,
    pub mean_time: f64,
    pub median_time: f64,
    pub stddev_time: f64,
    pub p95_time: f64,
    pub p99_time: f64,
    pub iterations: u64,
    pub elements_processed: u64,
    pub throughput_mops: f64,
}

impl FlatRow {
    #[must_use]
    pub fn config_key(&self) -> ConfigKey {
        ConfigKey {
            operation_name: self.operation_name.clone(),
            data_type: self.data_type.clone(),
            vector_size: self.vector_size,
        }
    }
}

/// A throughput drop between two consecutive commits of one configuration
/// exceeding the configured threshold. Derived, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct RegressionEvent {
    pub key: ConfigKey,
    pub from_commit: String,
    pub to_commit: String,
    /// Timestamp of the current (regressed) row.
    pub timestamp: NaiveDateTime,
    pub prev_throughput: f64,
    pub curr_throughput: f64,
    /// `(curr - prev) / prev`; negative for a drop.
    pub change_fraction: f64,
}

impl RegressionEvent {
    /// Change expressed as a percentage for display.
    #[must_use]
    pub fn change_percent(&self) -> f64 {
        self.change_fraction * 100.0
    }
}

/// Shortens a commit hash for display. Hashes shorter than the display
/// length (e.g. the "unknown" placeholder) are passed through unchanged.
#[must_use]
pub fn short_hash(commit_hash: &str) -> &str {
    commit_hash
        .get(..COMMIT_HASH_DISPLAY_LENGTH)
        .unwrap_or(commit_hash)
}
