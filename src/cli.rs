use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use env_logger::Env;
use log::{warn, Level};

use crate::aggregate::{RegressionConfig, ThresholdBoundary};
use crate::defaults::{DEFAULT_BENCHMARK_DIR, DEFAULT_OUTPUT_FILE, DEFAULT_REGRESSION_THRESHOLD};
use crate::loading::{self, LoadStatus};
use crate::{reporting, sample_data};

#[derive(Parser)]
#[command(version, name = "prism-perf", about = "Generate interactive performance reports from PRISM benchmark snapshots", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Increase logging verbosity
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Load benchmark snapshots and render the HTML performance report
    Report {
        /// Directory containing benchmark snapshot JSON files
        #[arg(long, default_value = DEFAULT_BENCHMARK_DIR)]
        benchmark_dir: PathBuf,

        /// Output HTML file name
        #[arg(short, long, default_value = DEFAULT_OUTPUT_FILE)]
        output: PathBuf,

        /// Throughput drop fraction flagged as a regression (0.10 = 10%)
        #[arg(long, default_value_t = DEFAULT_REGRESSION_THRESHOLD)]
        regression_threshold: f64,

        /// Flag a drop of exactly the threshold as a regression
        #[arg(long)]
        inclusive_threshold: bool,
    },
    /// Write synthetic sample snapshots for trying out the dashboard
    GenerateSampleData {
        /// Directory to write sample snapshot files into
        #[arg(long, default_value = DEFAULT_BENCHMARK_DIR)]
        benchmark_dir: PathBuf,
    },
}

pub fn handle_calls() -> Result<()> {
    let cli = Cli::parse();
    let logger_level = match cli.verbose {
        0 => Level::Warn,
        1 => Level::Info,
        2 => Level::Debug,
        _ => Level::Trace,
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(logger_level.as_str())).init();

    match cli.command {
        Commands::Report {
            benchmark_dir,
            output,
            regression_threshold,
            inclusive_threshold,
        } => {
            if !regression_threshold.is_finite() || regression_threshold < 0.0 {
                bail!("Regression threshold must be a non-negative fraction, got {regression_threshold}");
            }

            let config = RegressionConfig {
                threshold: regression_threshold,
                boundary: if inclusive_threshold {
                    ThresholdBoundary::Inclusive
                } else {
                    ThresholdBoundary::Exclusive
                },
            };

            let outcome = loading::load_snapshots(&benchmark_dir);
            match outcome.status {
                LoadStatus::MissingDirectory => bail!(
                    "Benchmark directory {} does not exist",
                    benchmark_dir.display()
                ),
                LoadStatus::NoSnapshotFiles => bail!(
                    "No benchmark files found in {}",
                    benchmark_dir.display()
                ),
                LoadStatus::Loaded => {}
            }
            if !outcome.skipped.is_empty() {
                warn!(
                    "Excluded {} unparseable snapshot file(s)",
                    outcome.skipped.len()
                );
            }
            if outcome.snapshots.is_empty() {
                bail!(
                    "No valid snapshot could be parsed from {}",
                    benchmark_dir.display()
                );
            }

            reporting::generate_report(&outcome.snapshots, &output, &config)?;
            println!("Performance report generated: {}", output.display());
            println!("To view the report, open {} in your web browser", output.display());
            Ok(())
        }
        Commands::GenerateSampleData { benchmark_dir } => {
            sample_data::generate(&benchmark_dir)?;
            println!("Generated sample benchmark files in {}", benchmark_dir.display());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_asserts() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_report_defaults() {
        let cli = Cli::try_parse_from(["prism-perf", "report"]).unwrap();
        match cli.command {
            Commands::Report {
                benchmark_dir,
                output,
                regression_threshold,
                inclusive_threshold,
            } => {
                assert_eq!(benchmark_dir, PathBuf::from(DEFAULT_BENCHMARK_DIR));
                assert_eq!(output, PathBuf::from(DEFAULT_OUTPUT_FILE));
                assert_eq!(regression_threshold, DEFAULT_REGRESSION_THRESHOLD);
                assert!(!inclusive_threshold);
            }
            Commands::GenerateSampleData { .. } => panic!("expected report subcommand"),
        }
    }

    #[test]
    fn test_report_threshold_override() {
        let cli = Cli::try_parse_from([
            "prism-perf",
            "report",
            "--regression-threshold",
            "0.05",
            "--inclusive-threshold",
        ])
        .unwrap();
        match cli.command {
            Commands::Report {
                regression_threshold,
                inclusive_threshold,
                ..
            } => {
                assert_eq!(regression_threshold, 0.05);
                assert!(inclusive_threshold);
            }
            Commands::GenerateSampleData { .. } => panic!("expected report subcommand"),
        }
    }
}
