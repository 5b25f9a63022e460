use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use log::info;
use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::data::{Measurement, Snapshot};
use crate::defaults::SNAPSHOT_TIMESTAMP_FORMAT;
use crate::stats::{self, VecAggregation};

/// Simulated commit history, oldest first.
const SAMPLE_COMMITS: [&str; 10] = [
    "a1b2c3d4", "e5f6a7b8", "c9d0e1f2", "a3b4c5d6", "e7f8a9b0", "c1d2e3f4", "a5b6c7d8", "e9f0a1b2",
    "c3d4e5f6", "a7b8c9d0",
];

/// Baseline median time and variance in nanoseconds per operation.
const BASE_PERFORMANCE: [(&str, f64, f64); 12] = [
    ("SR_Add_f", 120.0, 10.0),
    ("SR_Add_d", 150.0, 12.0),
    ("SR_Mul_f", 140.0, 15.0),
    ("SR_Mul_d", 180.0, 18.0),
    ("UD_Add_f", 100.0, 8.0),
    ("UD_Add_d", 125.0, 10.0),
    ("UD_Mul_f", 115.0, 12.0),
    ("UD_Mul_d", 145.0, 14.0),
    ("STD_Add_f", 25.0, 2.0),
    ("STD_Add_d", 35.0, 3.0),
    ("STD_Mul_f", 30.0, 2.5),
    ("STD_Mul_d", 40.0, 3.5),
];

const SAMPLE_SIZES: [u64; 6] = [1024, 4096, 16384, 65536, 262_144, 1_048_576];

const SAMPLE_ITERATIONS: usize = 100;

/// Performance multiplier per commit position, seeding a regression at
/// commit 4, an improvement at commit 6 and gradual improvement from
/// commit 8 on.
fn performance_factor(commit_index: usize) -> f64 {
    match commit_index {
        3 => 1.25,
        5 => 0.85,
        i if i >= 7 => 0.95 - (i - 7) as f64 * 0.02,
        _ => 1.0,
    }
}

fn simulate_measurement(
    rng: &mut impl Rng,
    operation_name: &str,
    vector_size: u64,
    base_time_ns: f64,
    base_variance: f64,
    factor: f64,
) -> Result<Measurement> {
    // Larger vectors run slightly slower per element.
    let size_factor = 1.0 + (vector_size as f64 / 1e6) * 0.3;
    let mean_ns = base_time_ns * size_factor * factor;
    let stddev_ns = base_variance * size_factor;

    let normal = Normal::new(mean_ns, stddev_ns)
        .with_context(|| format!("invalid timing distribution for {operation_name}"))?;
    let mut samples: Vec<f64> = (0..SAMPLE_ITERATIONS)
        .map(|_| normal.sample(rng).max(0.0))
        .collect();
    // median() sorts in place; min/max/percentiles below rely on the order.
    let median_time = samples.median().unwrap_or(0.0);

    let summary = stats::aggregate_measurements(samples.iter());
    let p95_time = samples[(0.95 * samples.len() as f64) as usize];
    let p99_time = samples[(0.99 * samples.len() as f64) as usize];

    let data_type = if operation_name.ends_with("_f") { "f" } else { "d" };

    Ok(Measurement {
        operation_name: operation_name.to_string(),
        data_type: data_type.to_string(),
        vector_size,
        min_time: samples[0],
        max_time: samples[samples.len() - 1],
        mean_time: summary.mean,
        median_time,
        stddev_time: summary.stddev,
        p95_time,
        p99_time,
        iterations: SAMPLE_ITERATIONS as u64,
        elements_processed: vector_size * SAMPLE_ITERATIONS as u64,
        throughput_mops: stats::throughput_mops(vector_size, median_time),
    })
}

/// Writes a realistic set of sample snapshot files into `dir`, spanning 30
/// days of simulated benchmark runs, for demonstrating the dashboard.
pub fn generate(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create sample data directory {}", dir.display()))?;

    let mut rng = rand::rng();
    let base_time = Utc::now().naive_utc() - Duration::days(30);

    for (i, commit) in SAMPLE_COMMITS.iter().enumerate() {
        let timestamp = (base_time + Duration::days(3 * i as i64))
            .format(SNAPSHOT_TIMESTAMP_FORMAT)
            .to_string();
        let factor = performance_factor(i);

        let mut benchmarks = BTreeMap::new();
        for (operation_name, base_ns, variance) in BASE_PERFORMANCE {
            for vector_size in SAMPLE_SIZES {
                let measurement = simulate_measurement(
                    &mut rng,
                    operation_name,
                    vector_size,
                    base_ns,
                    variance,
                    factor,
                )?;
                benchmarks.insert(format!("{operation_name}_{vector_size}"), measurement);
            }
        }

        let snapshot = Snapshot {
            commit_hash: (*commit).to_string(),
            timestamp: timestamp.clone(),
            build_config: "Release".to_string(),
            cpu_info: "Intel Xeon E5-2686 v4 @ 2.30GHz".to_string(),
            benchmarks,
        };

        let path = dir.join(format!("benchmark_{timestamp}.json"));
        let contents = serde_json::to_string_pretty(&snapshot)?;
        fs::write(&path, contents)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!("Created benchmark data for commit {commit}: {}", path.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_performance_factor_schedule() {
        assert_eq!(performance_factor(0), 1.0);
        assert_eq!(performance_factor(3), 1.25);
        assert_eq!(performance_factor(5), 0.85);
        assert_eq!(performance_factor(7), 0.95);
        assert!(performance_factor(9) < performance_factor(8));
    }

    #[test]
    fn test_simulated_measurement_is_consistent() {
        let mut rng = rand::rng();
        let m = simulate_measurement(&mut rng, "SR_Add_f", 1024, 120.0, 10.0, 1.0).unwrap();

        assert_eq!(m.data_type, "f");
        assert_eq!(m.iterations, 100);
        assert_eq!(m.elements_processed, 1024 * 100);
        assert!(m.min_time <= m.median_time && m.median_time <= m.max_time);
        assert!(m.median_time <= m.p95_time && m.p95_time <= m.p99_time);
        assert_eq!(
            m.throughput_mops,
            stats::throughput_mops(m.vector_size, m.median_time)
        );
    }

    #[test]
    fn test_double_precision_type_tag() {
        let mut rng = rand::rng();
        let m = simulate_measurement(&mut rng, "SR_Add_d", 1024, 150.0, 12.0, 1.0).unwrap();
        assert_eq!(m.data_type, "d");
    }

    #[test]
    fn test_generate_writes_one_file_per_commit() {
        let dir = tempfile::tempdir().unwrap();
        generate(dir.path()).unwrap();

        let files: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.file_name()
                    .to_str()
                    .is_some_and(|n| n.starts_with("benchmark_") && n.ends_with(".json"))
            })
            .collect();
        assert_eq!(files.len(), SAMPLE_COMMITS.len());
    }
}
