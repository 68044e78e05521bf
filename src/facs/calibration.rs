use std::collections::BTreeMap;

use serde::Serialize;
use tracing::info;

use crate::facs::features::FeatureVector;

/// Smallest sigma we divide by when scoring.
const MIN_SIGMA: f32 = 1e-6;

/// Scale that turns a median absolute deviation into a normal-consistent sigma.
const MAD_TO_SIGMA: f32 = 1.4826;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureStats {
    pub median: f32,
    pub sigma: f32,
}

pub struct RobustStatistics;

impl RobustStatistics {
    /// Median of `values`; the mean of the two middle elements for even lengths.
    pub fn compute_median(values: &[f32]) -> f32 {
        if values.is_empty() {
            return 0.0;
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(f32::total_cmp);

        let len = sorted.len();
        if len % 2 == 1 {
            sorted[len / 2]
        } else {
            (sorted[len / 2 - 1] + sorted[len / 2]) / 2.0
        }
    }

    pub fn compute_robust_stats(values: &[f32]) -> FeatureStats {
        let median = Self::compute_median(values);
        let abs_devs: Vec<f32> = values.iter().map(|&v| (v - median).abs()).collect();
        let mad = Self::compute_median(&abs_devs);

        FeatureStats {
            median,
            sigma: (MAD_TO_SIGMA * mad).max(MIN_SIGMA),
        }
    }
}

/// Learns a per-user resting baseline from the first frames of a session and
/// reports how far later frames deviate from it. Debug output only; the
/// decision list never reads it.
#[derive(Debug, Clone)]
pub struct BaselineCalibrator {
    target_frames: usize,
    samples: Vec<FeatureVector>,
    stats: BTreeMap<&'static str, FeatureStats>,
}

impl BaselineCalibrator {
    pub fn new(target_frames: usize) -> Self {
        Self {
            target_frames: target_frames.max(1),
            samples: Vec::new(),
            stats: BTreeMap::new(),
        }
    }

    pub fn is_calibrated(&self) -> bool {
        !self.stats.is_empty()
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    pub fn stats(&self) -> &BTreeMap<&'static str, FeatureStats> {
        &self.stats
    }

    pub fn reset(&mut self) {
        self.samples.clear();
        self.stats.clear();
    }

    /// Records a frame while uncalibrated; finalizes once enough have been seen.
    /// Returns true on the frame that completes calibration.
    pub fn add_sample(&mut self, feats: FeatureVector) -> bool {
        if self.is_calibrated() {
            return false;
        }
        self.samples.push(feats);
        if self.samples.len() >= self.target_frames {
            return self.finalize_calibration();
        }
        false
    }

    pub fn finalize_calibration(&mut self) -> bool {
        if self.samples.is_empty() {
            return false;
        }

        for (i, &name) in FeatureVector::NAMES.iter().enumerate() {
            let vals: Vec<f32> = self.samples.iter().map(|s| s.named_values()[i].1).collect();
            self.stats.insert(name, RobustStatistics::compute_robust_stats(&vals));
        }
        self.samples.clear();

        info!(stats = ?self.stats, "baseline calibration finalized");
        true
    }

    pub fn z_score(&self, key: &str, value: f32) -> f32 {
        match self.stats.get(key) {
            Some(stat) => (value - stat.median) / stat.sigma,
            None => 0.0,
        }
    }

    /// Per-feature z-scores against the baseline, or `None` before calibration.
    pub fn deviations(&self, feats: &FeatureVector) -> Option<BTreeMap<&'static str, f32>> {
        if !self.is_calibrated() {
            return None;
        }
        Some(
            feats
                .named_values()
                .into_iter()
                .map(|(name, value)| (name, self.z_score(name, value)))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_mar(mar: f32) -> FeatureVector {
        FeatureVector {
            mar,
            ..FeatureVector::default()
        }
    }

    #[test]
    fn test_robust_statistics() {
        // Odd length
        let v1 = vec![1.0, 3.0, 2.0];
        assert_eq!(RobustStatistics::compute_median(&v1), 2.0);

        // Even length
        let v2 = vec![1.0, 4.0, 3.0, 2.0];
        assert_eq!(RobustStatistics::compute_median(&v2), 2.5);

        // Deviations from 2 are 1, 1, 0 -> MAD 1
        let stats = RobustStatistics::compute_robust_stats(&v1);
        assert_eq!(stats.median, 2.0);
        assert!((stats.sigma - 1.4826).abs() < 0.0001);

        assert_eq!(RobustStatistics::compute_median(&[]), 0.0);
    }

    #[test]
    fn test_constant_feature_gets_floor_sigma() {
        let stats = RobustStatistics::compute_robust_stats(&[0.3, 0.3, 0.3]);
        assert_eq!(stats.sigma, MIN_SIGMA);
    }

    #[test]
    fn test_calibration_logic() {
        let mut cal = BaselineCalibrator::new(3);
        assert!(!cal.add_sample(with_mar(10.0)));
        assert!(!cal.add_sample(with_mar(12.0)));
        assert!(cal.deviations(&with_mar(11.0)).is_none());
        assert!(cal.add_sample(with_mar(11.0)));

        assert!(cal.is_calibrated());
        assert_eq!(cal.sample_count(), 0);
        assert_eq!(cal.stats()["mar"].median, 11.0);
        assert_eq!(cal.z_score("mar", 11.0), 0.0);

        let devs = cal.deviations(&with_mar(11.0 + 1.4826)).unwrap();
        assert!((devs["mar"] - 1.0).abs() < 1e-4);
        assert_eq!(devs.len(), FeatureVector::NAMES.len());

        // Further samples are ignored once calibrated.
        assert!(!cal.add_sample(with_mar(100.0)));
        assert_eq!(cal.stats()["mar"].median, 11.0);
    }

    #[test]
    fn test_reset_forgets_baseline() {
        let mut cal = BaselineCalibrator::new(1);
        assert!(cal.add_sample(with_mar(0.2)));
        cal.reset();
        assert!(!cal.is_calibrated());
        assert_eq!(cal.z_score("mar", 0.5), 0.0);
    }
}
