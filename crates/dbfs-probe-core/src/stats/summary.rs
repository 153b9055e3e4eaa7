//! Summary statistics across independent trials

use serde::Serialize;

/// Mean, extremes and spread of a set of trial values
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Summary {
    /// Number of values summarized
    pub count: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    /// Population standard deviation, absent when any value is infinite
    #[serde(skip_serializing_if = "Option::is_none")]
    pub std_dev: Option<f64>,
}

impl Summary {
    /// Summarize a set of values, or `None` if there are none
    ///
    /// # Example
    /// ```
    /// use dbfs_probe_core::stats::summary::Summary;
    ///
    /// let s = Summary::from_values(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
    /// assert_eq!(s.mean, 5.0);
    /// assert_eq!(s.std_dev, Some(2.0));
    /// ```
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        let count = values.len();
        let mean = values.iter().sum::<f64>() / count as f64;
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let std_dev = values.iter().all(|v| v.is_finite()).then(|| {
            let variance =
                values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count as f64;
            variance.sqrt()
        });

        Some(Self {
            count,
            mean,
            min,
            max,
            std_dev,
        })
    }

    /// Summarize integer counts (e.g. samples needed per trial)
    pub fn from_counts(counts: &[u64]) -> Option<Self> {
        let values: Vec<f64> = counts.iter().map(|&c| c as f64).collect();
        Self::from_values(&values)
    }

    /// Apply a linear scale to every location statistic
    ///
    /// Used to express sample counts in milliseconds.
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            count: self.count,
            mean: self.mean * factor,
            min: self.min * factor,
            max: self.max * factor,
            std_dev: self.std_dev.map(|sd| sd * factor.abs()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_empty_has_no_summary() {
        assert_eq!(Summary::from_values(&[]), None);
        assert_eq!(Summary::from_counts(&[]), None);
    }

    #[test]
    fn test_single_value() {
        let s = Summary::from_values(&[-12.5]).unwrap();
        assert_eq!(s.count, 1);
        assert_eq!(s.mean, -12.5);
        assert_eq!(s.min, -12.5);
        assert_eq!(s.max, -12.5);
        assert_eq!(s.std_dev, Some(0.0));
    }

    #[test]
    fn test_counts() {
        let s = Summary::from_counts(&[100, 200, 300]).unwrap();
        assert_eq!(s.mean, 200.0);
        assert_eq!(s.min, 100.0);
        assert_eq!(s.max, 300.0);
        assert_abs_diff_eq!(s.std_dev.unwrap(), 81.6496580927726, epsilon = 1e-9);
    }

    #[test]
    fn test_scaled_to_ms() {
        let s = Summary::from_counts(&[441, 882]).unwrap().scaled(1000.0 / 44100.0);
        assert_abs_diff_eq!(s.min, 10.0, epsilon = 1e-9);
        assert_abs_diff_eq!(s.max, 20.0, epsilon = 1e-9);
        assert_abs_diff_eq!(s.mean, 15.0, epsilon = 1e-9);
        assert_abs_diff_eq!(s.std_dev.unwrap(), 5.0, epsilon = 1e-9);
    }

    #[test]
    fn test_infinite_values_have_no_spread() {
        let s = Summary::from_values(&[f64::NEG_INFINITY, -20.0]).unwrap();
        assert_eq!(s.min, f64::NEG_INFINITY);
        assert_eq!(s.max, -20.0);
        assert_eq!(s.std_dev, None);
        assert_eq!(s.scaled(2.0).std_dev, None);

        let json = serde_json::to_value(s).unwrap();
        assert!(json.get("std_dev").is_none());
    }
}
