// Copyright 2025 Sushanth (https://github.com/sushanthpy)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Statistical anomaly detection: Z-score, modified Z-score, IQR, CUSUM,
//! and moving-average, each guarding its own minimum sample size and
//! divide-by-zero condition by returning an empty result.

use sentinel_core::{config::{CusumConfig, IqrConfig, ModifiedZScoreConfig, MovingAverageConfig, ZScoreConfig}, stats, Detection};

use crate::detector::{Detector, Series};

/// Flags points beyond `±threshold` population standard deviations.
pub struct ZScoreDetector {
    pub threshold: f64,
}

impl ZScoreDetector {
    pub fn new(config: ZScoreConfig) -> Self {
        Self { threshold: config.threshold }
    }
}

impl Detector for ZScoreDetector {
    fn method(&self) -> &'static str {
        "zscore"
    }

    fn detect(&self, series: &Series) -> Vec<Detection> {
        if series.len() < 3 {
            return Vec::new();
        }
        let mean = stats::mean(&series.values);
        let std = stats::stddev(&series.values);
        if std <= f64::EPSILON {
            return Vec::new();
        }

        let mut out = Vec::new();
        for (i, &value) in series.values.iter().enumerate() {
            let z_score = ((value - mean) / std).abs();
            if z_score > self.threshold {
                let confidence = stats::sigmoid_confidence(z_score, self.threshold, 0.5);
                let detection = Detection::new(i, value, confidence, self.method())
                    .with_timestamp(series.timestamp_at(i))
                    .with_field("expected_value", mean)
                    .with_field("z_score", z_score)
                    .with_field("deviation", (value - mean).abs())
                    .with_field("threshold", self.threshold);
                out.push(detection);
            }
        }
        out
    }
}

/// Flags points beyond `±threshold` modified Z-scores (median/MAD based,
/// more robust to outliers than [`ZScoreDetector`]).
pub struct ModifiedZScoreDetector {
    pub threshold: f64,
}

impl ModifiedZScoreDetector {
    pub fn new(config: ModifiedZScoreConfig) -> Self {
        Self { threshold: config.threshold }
    }
}

impl Detector for ModifiedZScoreDetector {
    fn method(&self) -> &'static str {
        "modified_zscore"
    }

    fn detect(&self, series: &Series) -> Vec<Detection> {
        if series.len() < 3 {
            return Vec::new();
        }
        let median = stats::median(&series.values);
        let mut mad = stats::mad(&series.values);
        if mad <= f64::EPSILON {
            mad = stats::mean_absolute_deviation(&series.values);
            if mad <= f64::EPSILON {
                return Vec::new();
            }
        }

        let mut out = Vec::new();
        for (i, &value) in series.values.iter().enumerate() {
            let modified_z = 0.6745 * (value - median) / mad;
            if modified_z.abs() > self.threshold {
                let confidence = stats::sigmoid_confidence(modified_z.abs(), self.threshold, 0.5);
                let detection = Detection::new(i, value, confidence, self.method())
                    .with_timestamp(series.timestamp_at(i))
                    .with_field("expected_value", median)
                    .with_field("modified_z_score", modified_z)
                    .with_field("deviation", (value - median).abs())
                    .with_field("threshold", self.threshold);
                out.push(detection);
            }
        }
        out
    }
}

/// Flags points outside `[Q1 - k*IQR, Q3 + k*IQR]`.
pub struct IqrDetector {
    pub multiplier: f64,
}

impl IqrDetector {
    pub fn new(config: IqrConfig) -> Self {
        Self { multiplier: config.multiplier }
    }
}

impl Detector for IqrDetector {
    fn method(&self) -> &'static str {
        "iqr"
    }

    fn detect(&self, series: &Series) -> Vec<Detection> {
        if series.len() < 4 {
            return Vec::new();
        }
        let (q1, q3, iqr) = stats::quartiles(&series.values);
        if iqr <= f64::EPSILON {
            return Vec::new();
        }
        let lower = q1 - self.multiplier * iqr;
        let upper = q3 + self.multiplier * iqr;

        let mut out = Vec::new();
        for (i, &value) in series.values.iter().enumerate() {
            if value < lower || value > upper {
                let (deviation, expected) = if value < lower {
                    (lower - value, lower)
                } else {
                    (value - upper, upper)
                };
                let confidence = stats::sigmoid_confidence(deviation, iqr, 1.0);
                let detection = Detection::new(i, value, confidence, self.method())
                    .with_timestamp(series.timestamp_at(i))
                    .with_field("expected_value", expected)
                    .with_field("q1", q1)
                    .with_field("q3", q3)
                    .with_field("iqr", iqr)
                    .with_field("deviation", deviation)
                    .with_field("multiplier", self.multiplier);
                out.push(detection);
            }
        }
        out
    }
}

/// Cumulative-sum detector for sustained shifts in mean. Resets both
/// accumulators to zero immediately after a detection, so a single
/// sustained shift produces one detection rather than a run of them.
pub struct CusumDetector {
    pub threshold: f64,
    pub drift: f64,
}

impl CusumDetector {
    pub fn new(config: CusumConfig) -> Self {
        Self { threshold: config.threshold, drift: config.drift }
    }
}

impl Detector for CusumDetector {
    fn method(&self) -> &'static str {
        "cusum"
    }

    fn detect(&self, series: &Series) -> Vec<Detection> {
        if series.len() < 5 {
            return Vec::new();
        }
        let mean = stats::mean(&series.values);
        let std = stats::stddev(&series.values);
        if std <= f64::EPSILON {
            return Vec::new();
        }

        let mut cusum_pos = 0.0_f64;
        let mut cusum_neg = 0.0_f64;
        let mut out = Vec::new();

        for (i, &value) in series.values.iter().enumerate() {
            let standardized = (value - mean) / std;
            cusum_pos = (cusum_pos + standardized - self.drift).max(0.0);
            cusum_neg = (cusum_neg - standardized - self.drift).max(0.0);

            if cusum_pos > self.threshold || cusum_neg > self.threshold {
                let cusum_value = cusum_pos.max(cusum_neg);
                let confidence = stats::sigmoid_confidence(cusum_value, self.threshold, 0.3);
                let detection = Detection::new(i, value, confidence, self.method())
                    .with_timestamp(series.timestamp_at(i))
                    .with_field("expected_value", mean)
                    .with_field("cusum_positive", cusum_pos)
                    .with_field("cusum_negative", cusum_neg)
                    .with_field("deviation", (value - mean).abs())
                    .with_field("threshold", self.threshold);
                out.push(detection);

                cusum_pos = 0.0;
                cusum_neg = 0.0;
            }
        }
        out
    }
}

/// Flags points that deviate from their own trailing moving average by
/// more than `threshold_std` moving standard deviations.
pub struct MovingAverageDetector {
    pub window: usize,
    pub threshold_std: f64,
}

impl MovingAverageDetector {
    pub fn new(config: MovingAverageConfig) -> Self {
        Self { window: config.window, threshold_std: config.threshold }
    }
}

impl Detector for MovingAverageDetector {
    fn method(&self) -> &'static str {
        "moving_average"
    }

    fn detect(&self, series: &Series) -> Vec<Detection> {
        if series.len() < self.window + 1 {
            return Vec::new();
        }

        let mut out = Vec::new();
        for i in self.window..series.len() {
            let window = &series.values[i - self.window..i];
            let ma = stats::mean(window);
            let ma_std = stats::stddev(window);
            if ma_std <= f64::EPSILON {
                continue;
            }

            let value = series.values[i];
            let deviation = (value - ma).abs();
            let z_score = deviation / ma_std;

            if z_score > self.threshold_std {
                let confidence = stats::sigmoid_confidence(z_score, self.threshold_std, 0.5);
                let detection = Detection::new(i, value, confidence, self.method())
                    .with_timestamp(series.timestamp_at(i))
                    .with_field("expected_value", ma)
                    .with_field("moving_average", ma)
                    .with_field("moving_std", ma_std)
                    .with_field("z_score", z_score)
                    .with_field("deviation", deviation)
                    .with_field("window_size", self.window as f64);
                out.push(detection);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spike_series() -> Series {
        let mut values = vec![10.0; 20];
        values[10] = 100.0;
        Series::from_values(values)
    }

    #[test]
    fn zscore_flags_the_single_spike() {
        let detector = ZScoreDetector::new(ZScoreConfig::default());
        let detections = detector.detect(&spike_series());
        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].index, 10);
        assert_eq!(detections[0].method, "zscore");
    }

    #[test]
    fn zscore_skips_short_series() {
        let detector = ZScoreDetector::new(ZScoreConfig::default());
        assert!(detector.detect(&Series::from_values(vec![1.0, 2.0])).is_empty());
    }

    #[test]
    fn zscore_skips_constant_series() {
        let detector = ZScoreDetector::new(ZScoreConfig::default());
        let series = Series::from_values(vec![5.0; 10]);
        assert!(detector.detect(&series).is_empty());
    }

    #[test]
    fn modified_zscore_flags_the_single_spike() {
        let detector = ModifiedZScoreDetector::new(ModifiedZScoreConfig::default());
        let detections = detector.detect(&spike_series());
        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].index, 10);
    }

    #[test]
    fn iqr_flags_outlier_beyond_bounds() {
        let detector = IqrDetector::new(IqrConfig::default());
        let detections = detector.detect(&spike_series());
        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].index, 10);
    }

    #[test]
    fn iqr_skips_zero_iqr() {
        let detector = IqrDetector::new(IqrConfig::default());
        let series = Series::from_values(vec![1.0, 1.0, 1.0, 1.0, 1.0, 100.0]);
        // IQR of mostly-constant data may be zero; either way this must not panic.
        let _ = detector.detect(&series);
    }

    #[test]
    fn cusum_flags_a_sustained_mean_shift() {
        let mut values = vec![0.0; 20];
        for v in values.iter_mut().skip(10) {
            *v = 5.0;
        }
        let detector = CusumDetector::new(CusumConfig::default());
        let detections = detector.detect(&Series::from_values(values));
        assert!(!detections.is_empty());
        assert!(detections[0].index >= 10);
    }

    #[test]
    fn cusum_resets_after_detection() {
        let mut values = vec![0.0; 30];
        for v in values.iter_mut().skip(10) {
            *v = 5.0;
        }
        let detector = CusumDetector::new(CusumConfig::default());
        let detections = detector.detect(&Series::from_values(values));
        // Resetting after a hit means we don't get a detection at every
        // single subsequent index once the threshold trips once.
        assert!(detections.len() < 20);
    }

    #[test]
    fn moving_average_flags_spike_relative_to_trailing_window() {
        let detector = MovingAverageDetector::new(MovingAverageConfig::default());
        let detections = detector.detect(&spike_series());
        assert!(detections.iter().any(|d| d.index == 10));
    }
}
