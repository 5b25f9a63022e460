//! Centralized default values for prism-perf.
//!
//! Defaults shared between the CLI surface and the analysis core live here
//! so they are defined exactly once.

/// Default directory scanned for benchmark snapshot files.
///
/// This matches the directory the PRISM benchmark suite writes its
/// per-commit result files into.
pub const DEFAULT_BENCHMARK_DIR: &str = "benchmark_results";

/// Default output path for the generated HTML report.
pub const DEFAULT_OUTPUT_FILE: &str = "performance_report.html";

/// Default regression threshold as a fraction.
///
/// A throughput drop between two consecutive commits larger than this
/// fraction is flagged as a regression. 0.10 means a 10% drop.
pub const DEFAULT_REGRESSION_THRESHOLD: f64 = 0.10;

/// File name prefix of snapshot files within the benchmark directory.
///
/// Snapshot files are named `benchmark_<timestamp>.json`.
pub const SNAPSHOT_FILE_PREFIX: &str = "benchmark_";

/// File extension of snapshot files.
pub const SNAPSHOT_FILE_EXTENSION: &str = "json";

/// Timestamp format used inside snapshot files and in snapshot file names.
///
/// Example: `2026-08-27_14-03-59`. The underscore variant keeps the value
/// usable as a file name component.
pub const SNAPSHOT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Number of characters of a commit hash shown in plots and summaries.
pub const COMMIT_HASH_DISPLAY_LENGTH: usize = 8;
