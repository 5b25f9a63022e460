use std::fmt::Display;

use average::{self, concatenate, Estimate, Mean, Variance};

pub trait VecAggregation {
    fn median(&mut self) -> Option<f64>;
}

concatenate!(AggStats, [Mean, mean], [Variance, sample_variance]);

pub fn aggregate_measurements<'a>(measurements: impl Iterator<Item = &'a f64>) -> Stats {
    let s: AggStats = measurements.copied().collect();
    Stats {
        mean: s.mean(),
        stddev: s.sample_variance().sqrt(),
        len: s.mean.len() as usize,
    }
}

#[derive(Debug)]
pub struct Stats {
    pub mean: f64,
    pub stddev: f64,
    pub len: usize,
}

impl Display for Stats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "μ: {:.2} σ: {:.2} n: {}",
            self.mean, self.stddev, self.len,
        )
    }
}

impl VecAggregation for Vec<f64> {
    fn median(&mut self) -> Option<f64> {
        self.sort_by(f64::total_cmp);
        match self.len() {
            0 => None,
            even if even % 2 == 0 => {
                let left = self[even / 2 - 1];
                let right = self[even / 2];
                Some((left + right) / 2.0)
            }
            odd => Some(self[odd / 2]),
        }
    }
}

/// The single throughput derivation used by every producer of measurement
/// data: elements per second in millions, from the median time per
/// iteration in nanoseconds.
#[must_use]
pub fn throughput_mops(vector_size: u64, median_time_ns: f64) -> f64 {
    if median_time_ns <= 0.0 {
        return 0.0;
    }
    vector_size as f64 / (median_time_ns / 1e9) / 1e6
}

#[cfg(test)]
mod test {
    use super::*;
    use itertools::Itertools;

    #[test]
    fn no_floating_error() {
        let measurements = (0..100).map(|_| 0.1).collect_vec();
        let stats = aggregate_measurements(measurements.iter());
        assert_eq!(stats.mean, 0.1);
        assert_eq!(stats.len, 100);
        let naive_mean = (0..100).map(|_| 0.1).sum::<f64>() / 100.0;
        assert_ne!(naive_mean, 0.1);
    }

    #[test]
    fn single_measurement() {
        let measurements = vec![1.0];
        let stats = aggregate_measurements(measurements.iter());
        assert_eq!(stats.len, 1);
        assert_eq!(stats.mean, 1.0);
        assert_eq!(stats.stddev, 0.0);
    }

    #[test]
    fn no_measurement() {
        let measurements = vec![];
        let stats = aggregate_measurements(measurements.iter());
        assert_eq!(stats.len, 0);
        assert_eq!(stats.mean, 0.0);
        assert_eq!(stats.stddev, 0.0);
    }

    #[test]
    fn median_of_even_and_odd_lengths() {
        let mut empty: Vec<f64> = vec![];
        assert_eq!(empty.median(), None);

        let mut odd = vec![3.0, 1.0, 2.0];
        assert_eq!(odd.median(), Some(2.0));

        let mut even = vec![4.0, 1.0, 3.0, 2.0];
        assert_eq!(even.median(), Some(2.5));
    }

    #[test]
    fn throughput_from_median_time() {
        // 1024 elements in 1024 ns is one element per ns: 1e9 elements/s,
        // or 1000 MOPS.
        assert_eq!(throughput_mops(1024, 1024.0), 1000.0);
    }

    #[test]
    fn throughput_guard_for_nonpositive_time() {
        assert_eq!(throughput_mops(1024, 0.0), 0.0);
        assert_eq!(throughput_mops(1024, -5.0), 0.0);
    }
}
