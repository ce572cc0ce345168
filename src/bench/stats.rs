use std::fmt;

/// Nearest-rank percentile of an ascending slice.
///
/// Returns `None` for an empty slice.
pub fn percentile(sorted: &[f64], p: f64) -> Option<f64> {
    let rank = (p * sorted.len() as f64 / 100.0).ceil() as i64 - 1;
    sorted.get(rank.max(0) as usize).copied()
}

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub p50: f64,
    pub p95: f64,
}

impl Summary {
    /// Sorts the samples in place and summarizes them.
    pub fn from_samples(samples: &mut [f64]) -> Option<Self> {
        samples.sort_by(f64::total_cmp);
        let min = *samples.first()?;
        let max = *samples.last()?;
        let mean = samples.iter().sum::<f64>() / samples.len() as f64;
        Some(Self {
            count: samples.len(),
            min,
            max,
            mean,
            p50: percentile(samples, 50.0)?,
            p95: percentile(samples, 95.0)?,
        })
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Summary ({} calls):", self.count)?;
        writeln!(f, "  Min:   {:>10.2} ms", self.min)?;
        writeln!(f, "  Max:   {:>10.2} ms", self.max)?;
        writeln!(f, "  Mean:  {:>10.2} ms", self.mean)?;
        writeln!(f, "  P50:   {:>10.2} ms", self.p50)?;
        writeln!(f, "  P95:   {:>10.2} ms", self.p95)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tens() -> Vec<f64> {
        (1..=10).map(|i| (i * 10) as f64).collect()
    }

    #[test]
    fn nearest_rank_on_ten_samples() {
        let sorted = tens();
        assert_eq!(percentile(&sorted, 50.0), Some(50.0));
        assert_eq!(percentile(&sorted, 95.0), Some(100.0));
        assert_eq!(percentile(&sorted, 10.0), Some(10.0));
        assert_eq!(percentile(&sorted, 100.0), Some(100.0));
    }

    #[test]
    fn single_sample_is_every_percentile() {
        for p in 1..=100 {
            assert_eq!(percentile(&[42.5], p as f64), Some(42.5));
        }
    }

    #[test]
    fn low_percentile_clamps_to_first() {
        assert_eq!(percentile(&tens(), 0.0), Some(10.0));
    }

    #[test]
    fn empty_has_no_percentile_or_summary() {
        assert_eq!(percentile(&[], 50.0), None);
        assert_eq!(Summary::from_samples(&mut []), None);
    }

    #[test]
    fn summary_sorts_and_matches_extremes() {
        let mut samples = vec![31.0, 4.5, 99.25, 12.0, 7.0, 55.5, 3.0];
        let total: f64 = samples.iter().sum();
        let summary = Summary::from_samples(&mut samples).unwrap();

        assert_eq!(summary.count, 7);
        assert_eq!(summary.min, 3.0);
        assert_eq!(summary.max, 99.25);
        assert!((summary.mean - total / 7.0).abs() < 1e-9);
        assert_eq!(summary.p50, 12.0);
        assert_eq!(summary.p95, 99.25);
        assert!(samples.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn summary_display_uses_operator_terms() {
        let summary = Summary::from_samples(&mut tens()).unwrap();
        let text = summary.to_string();
        assert!(text.contains("P50"));
        assert!(text.contains("P95"));
        assert!(text.contains("Mean"));
    }
}
