use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use log::debug;

use crate::data::{ConfigKey, FlatRow, RegressionEvent};
use crate::defaults::DEFAULT_REGRESSION_THRESHOLD;

/// Whether a change of exactly the threshold counts as a regression.
///
/// The benchmark suite historically used a strict comparison, making an
/// exactly-at-threshold drop a non-event. That remains the default, with
/// the inclusive variant available for callers that want the boundary in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThresholdBoundary {
    #[default]
    Exclusive,
    Inclusive,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegressionConfig {
    /// Throughput drop fraction above which a regression is flagged.
    pub threshold: f64,
    pub boundary: ThresholdBoundary,
}

impl Default for RegressionConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_REGRESSION_THRESHOLD,
            boundary: ThresholdBoundary::default(),
        }
    }
}

impl RegressionConfig {
    fn is_regression(&self, change_fraction: f64) -> bool {
        match self.boundary {
            ThresholdBoundary::Exclusive => change_fraction < -self.threshold,
            ThresholdBoundary::Inclusive => change_fraction <= -self.threshold,
        }
    }
}

/// Distinguishes "nothing to analyze" from "analyzed and found clean".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisStatus {
    NoData,
    NoRegressions,
    RegressionsDetected,
}

#[derive(Debug)]
pub struct RegressionAnalysis {
    pub status: AnalysisStatus,
    pub configurations_analyzed: usize,
    pub events: Vec<RegressionEvent>,
}

/// Selects, per configuration, the row with the maximum parsed timestamp.
///
/// Tie-break is deterministic for a given input ordering: only a strictly
/// greater timestamp replaces the current candidate, so among rows sharing
/// the maximum timestamp the first-encountered one wins. Output is sorted
/// by configuration key.
#[must_use]
pub fn latest_per_configuration(rows: &[FlatRow]) -> Vec<FlatRow> {
    let mut latest: BTreeMap<ConfigKey, &FlatRow> = BTreeMap::new();
    for row in rows {
        match latest.entry(row.config_key()) {
            Entry::Vacant(entry) => {
                entry.insert(row);
            }
            Entry::Occupied(mut entry) => {
                if row.parsed_at > entry.get().parsed_at {
                    entry.insert(row);
                }
            }
        }
    }
    latest.into_values().cloned().collect()
}

/// Groups rows by configuration key and sorts each group ascending by
/// parsed timestamp. The sort is stable: rows with equal timestamps keep
/// their relative input order.
#[must_use]
pub fn time_ordered_series(rows: &[FlatRow]) -> BTreeMap<ConfigKey, Vec<FlatRow>> {
    let mut series: BTreeMap<ConfigKey, Vec<FlatRow>> = BTreeMap::new();
    for row in rows {
        series.entry(row.config_key()).or_default().push(row.clone());
    }
    for group in series.values_mut() {
        group.sort_by_key(|row| row.parsed_at);
    }
    series
}

/// Compares consecutive commits within each configuration's time-ordered
/// series and flags throughput drops exceeding the configured threshold.
///
/// A pair whose previous throughput is not positive produces no event; this
/// is a domain rule guarding the relative-change division, not an error.
/// Series with fewer than two rows contribute zero events. Pure and
/// deterministic: the same rows and config always yield the same analysis.
#[must_use]
pub fn detect_regressions(rows: &[FlatRow], config: &RegressionConfig) -> RegressionAnalysis {
    let series = time_ordered_series(rows);
    let configurations_analyzed = series.len();

    let mut events = Vec::new();
    for (key, group) in &series {
        for pair in group.windows(2) {
            let (prev, curr) = (&pair[0], &pair[1]);
            if prev.throughput_mops <= 0.0 {
                debug!(
                    "[{key}] skipping pair {}..{}: previous throughput {} is not positive",
                    prev.commit_short, curr.commit_short, prev.throughput_mops
                );
                continue;
            }
            let change_fraction =
                (curr.throughput_mops - prev.throughput_mops) / prev.throughput_mops;
            if config.is_regression(change_fraction) {
                events.push(RegressionEvent {
                    key: key.clone(),
                    from_commit: prev.commit_hash.clone(),
                    to_commit: curr.commit_hash.clone(),
                    timestamp: curr.parsed_at,
                    prev_throughput: prev.throughput_mops,
                    curr_throughput: curr.throughput_mops,
                    change_fraction,
                });
            }
        }
    }

    let status = if configurations_analyzed == 0 {
        AnalysisStatus::NoData
    } else if events.is_empty() {
        AnalysisStatus::NoRegressions
    } else {
        AnalysisStatus::RegressionsDetected
    };

    RegressionAnalysis {
        status,
        configurations_analyzed,
        events,
    }
}
