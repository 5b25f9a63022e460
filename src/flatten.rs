use chrono::{NaiveDateTime, Utc};
use log::warn;

use crate::data::{short_hash, FlatRow, Snapshot};
use crate::defaults::SNAPSHOT_TIMESTAMP_FORMAT;

/// Expands snapshots into flat rows, one per benchmarks entry, with all
/// snapshot metadata denormalized onto every row.
///
/// Pure reshaping: every measurement field is copied verbatim, nothing is
/// filtered or deduplicated. If two snapshots share a commit hash, both row
/// sets are kept.
#[must_use]
pub fn flatten(snapshots: &[Snapshot]) -> Vec<FlatRow> {
    snapshots.iter().flat_map(flatten_snapshot).collect()
}

fn flatten_snapshot(snapshot: &Snapshot) -> Vec<FlatRow> {
    let parsed_at = parse_snapshot_timestamp(&snapshot.timestamp, &snapshot.commit_hash);
    let commit_short = short_hash(&snapshot.commit_hash).to_string();

    snapshot
        .benchmarks
        .iter()
        .map(|(benchmark_name, m)| FlatRow {
            commit_hash: snapshot.commit_hash.clone(),
            commit_short: commit_short.clone(),
            timestamp: snapshot.timestamp.clone(),
            parsed_at,
            build_config: snapshot.build_config.clone(),
            cpu_info: snapshot.cpu_info.clone(),
            benchmark_name: benchmark_name.clone(),
            operation_name: m.operation_name.clone(),
            data_type: m.data_type.clone(),
            vector_size: m.vector_size,
            min_time: m.min_time,
            max_time: m.max_time,
            mean_time: m.mean_time,
            median_time: m.median_time,
            stddev_time: m.stddev_time,
            p95_time: m.p95_time,
            p99_time: m.p99_time,
            iterations: m.iterations,
            elements_processed: m.elements_processed,
            throughput_mops: m.throughput_mops,
        })
        .collect()
}

/// Parses the snapshot timestamp into a comparable time value.
///
/// Fallback, not silent data fabrication: an unparseable timestamp is
/// replaced with the current time and flagged as a data-quality concern,
/// which makes downstream ordering for those rows best-effort.
fn parse_snapshot_timestamp(raw: &str, commit_hash: &str) -> NaiveDateTime {
    match NaiveDateTime::parse_from_str(raw, SNAPSHOT_TIMESTAMP_FORMAT) {
        Ok(parsed) => parsed,
        Err(err) => {
            warn!(
                "Unparseable timestamp '{raw}' on commit {commit_hash} ({err}); \
                 falling back to the current time, ordering for these rows is best-effort"
            );
            Utc::now().naive_utc()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use chrono::NaiveDate;

    use crate::data::Measurement;

    fn measurement(operation_name: &str, data_type: &str, vector_size: u64) -> Measurement {
        Measurement {
            operation_name: operation_name.to_string(),
            data_type: data_type.to_string(),
            vector_size,
            min_time: 100.5,
            max_time: 139.25,
            mean_time: 121.125,
            median_time: 120.0,
            stddev_time: 5.5,
            p95_time: 132.75,
            p99_time: 138.0,
            iterations: 100,
            elements_processed: vector_size * 100,
            throughput_mops: 8533.333,
        }
    }

    fn snapshot(commit: &str, timestamp: &str) -> Snapshot {
        let mut benchmarks = BTreeMap::new();
        benchmarks.insert(
            "SR_Add_f_1024".to_string(),
            measurement("SR_Add_f", "f", 1024),
        );
        benchmarks.insert(
            "SR_Mul_d_4096".to_string(),
            measurement("SR_Mul_d", "d", 4096),
        );
        Snapshot {
            commit_hash: commit.to_string(),
            timestamp: timestamp.to_string(),
            build_config: "Release".to_string(),
            cpu_info: "test cpu".to_string(),
            benchmarks,
        }
    }

    #[test]
    fn test_flatten_completeness() {
        let s = snapshot("a1b2c3d4e5f6", "2026-08-01_12-00-00");
        let rows = flatten(std::slice::from_ref(&s));
        assert_eq!(rows.len(), s.benchmarks.len());
    }

    #[test]
    fn test_fields_copied_verbatim() {
        let s = snapshot("a1b2c3d4e5f6", "2026-08-01_12-00-00");
        let rows = flatten(std::slice::from_ref(&s));

        let row = rows
            .iter()
            .find(|r| r.benchmark_name == "SR_Add_f_1024")
            .unwrap();
        let m = &s.benchmarks["SR_Add_f_1024"];

        assert_eq!(row.commit_hash, s.commit_hash);
        assert_eq!(row.commit_short, "a1b2c3d4");
        assert_eq!(row.timestamp, s.timestamp);
        assert_eq!(row.build_config, s.build_config);
        assert_eq!(row.cpu_info, s.cpu_info);
        assert_eq!(row.operation_name, m.operation_name);
        assert_eq!(row.data_type, m.data_type);
        assert_eq!(row.vector_size, m.vector_size);
        assert_eq!(row.min_time, m.min_time);
        assert_eq!(row.max_time, m.max_time);
        assert_eq!(row.mean_time, m.mean_time);
        assert_eq!(row.median_time, m.median_time);
        assert_eq!(row.stddev_time, m.stddev_time);
        assert_eq!(row.p95_time, m.p95_time);
        assert_eq!(row.p99_time, m.p99_time);
        assert_eq!(row.iterations, m.iterations);
        assert_eq!(row.elements_processed, m.elements_processed);
        assert_eq!(row.throughput_mops, m.throughput_mops);
    }

    #[test]
    fn test_timestamp_parsed() {
        let s = snapshot("a1b2c3d4e5f6", "2026-08-01_12-30-45");
        let rows = flatten(std::slice::from_ref(&s));
        let expected = NaiveDate::from_ymd_opt(2026, 8, 1)
            .unwrap()
            .and_hms_opt(12, 30, 45)
            .unwrap();
        assert!(rows.iter().all(|r| r.parsed_at == expected));
    }

    #[test]
    fn test_unparseable_timestamp_falls_back_to_now() {
        let before = Utc::now().naive_utc();
        let s = snapshot("a1b2c3d4e5f6", "not-a-timestamp");
        let rows = flatten(std::slice::from_ref(&s));
        let after = Utc::now().naive_utc();

        for row in &rows {
            assert!(row.parsed_at >= before && row.parsed_at <= after);
            // The raw value survives untouched for diagnostics.
            assert_eq!(row.timestamp, "not-a-timestamp");
        }
    }

    #[test]
    fn test_duplicate_commit_hashes_are_kept() {
        let a = snapshot("a1b2c3d4e5f6", "2026-08-01_12-00-00");
        let b = snapshot("a1b2c3d4e5f6", "2026-08-02_12-00-00");
        let rows = flatten(&[a, b]);
        assert_eq!(rows.len(), 4);
    }

    #[test]
    fn test_empty_input() {
        assert!(flatten(&[]).is_empty());
    }
}
