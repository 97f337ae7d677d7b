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

//! Temporal and time-series anomaly detection: regime change, trend
//! reversal, seasonal decomposition, exponential-smoothing forecast
//! error, and moving-average crossover.

use sentinel_core::{
    config::{ChangePointConfig, ExponentialSmoothingConfig, MaCrossoverConfig, SeasonalConfig, TrendConfig},
    stats, Detection,
};

use crate::detector::{Detector, Series};

/// Binary-segmentation regime-change detector: recursively splits the
/// series wherever the variance-reduction cost of a split exceeds the
/// configured penalty.
pub struct ChangePointDetector {
    pub min_size: usize,
    pub penalty: f64,
}

impl ChangePointDetector {
    pub fn new(config: ChangePointConfig) -> Self {
        Self { min_size: config.min_size, penalty: config.penalty }
    }

    fn find_best_split(&self, arr: &[f64], start: usize, end: usize) -> (usize, f64) {
        let mut best_idx = start + self.min_size;
        let mut best_cost = f64::INFINITY;
        let total_var = stats::variance(&arr[start..end]) * (end - start) as f64;

        for i in (start + self.min_size)..(end - self.min_size) {
            let left = &arr[start..i];
            let right = &arr[i..end];
            let split_var = stats::variance(left) * left.len() as f64 + stats::variance(right) * right.len() as f64;
            let cost = total_var - split_var - self.penalty;
            if cost < best_cost {
                best_cost = cost;
                best_idx = i;
            }
        }
        (best_idx, best_cost)
    }

    fn segment(&self, arr: &[f64], start: usize, end: usize, out: &mut Vec<usize>) {
        if end - start < self.min_size * 2 {
            return;
        }
        let (idx, cost) = self.find_best_split(arr, start, end);
        if cost < -self.penalty {
            out.push(idx);
            self.segment(arr, start, idx, out);
            self.segment(arr, idx, end, out);
        }
    }

    fn detect_changepoints(&self, arr: &[f64]) -> Vec<usize> {
        let mut changepoints = Vec::new();
        if arr.len() < self.min_size * 2 {
            return changepoints;
        }
        self.segment(arr, 0, arr.len(), &mut changepoints);
        changepoints.sort_unstable();
        changepoints
    }
}

impl Detector for ChangePointDetector {
    fn method(&self) -> &'static str {
        "changepoint"
    }

    fn detect(&self, series: &Series) -> Vec<Detection> {
        if series.len() < self.min_size * 2 {
            return Vec::new();
        }
        let arr = &series.values;
        let changepoints = self.detect_changepoints(arr);

        let mut out = Vec::new();
        for cp_idx in changepoints {
            let before_start = cp_idx.saturating_sub(self.min_size);
            let before = &arr[before_start..cp_idx];
            let after_end = (cp_idx + self.min_size).min(arr.len());
            let after = &arr[cp_idx..after_end];
            if before.is_empty() || after.is_empty() {
                continue;
            }

            let mean_before = stats::mean(before);
            let mean_after = stats::mean(after);
            let std_before = stats::stddev(before);
            let change_magnitude = (mean_after - mean_before).abs();

            let confidence = if std_before > f64::EPSILON {
                let significance = change_magnitude / std_before;
                stats::sigmoid_confidence(significance, 2.0, 0.5)
            } else {
                0.5
            };

            let detection = Detection::new(cp_idx, arr[cp_idx], confidence, self.method())
                .with_timestamp(series.timestamp_at(cp_idx))
                .with_type("regime_change")
                .with_field("mean_before", mean_before)
                .with_field("mean_after", mean_after)
                .with_field("change_magnitude", change_magnitude);
            out.push(detection);
        }
        out
    }
}

/// Flags windows whose local linear-regression slope diverges sharply
/// from the series' global slope.
pub struct TrendAnomalyDetector {
    pub window: usize,
}

impl TrendAnomalyDetector {
    pub fn new(config: TrendConfig) -> Self {
        Self { window: config.window }
    }
}

impl Detector for TrendAnomalyDetector {
    fn method(&self) -> &'static str {
        "trend_deviation"
    }

    fn detect(&self, series: &Series) -> Vec<Detection> {
        if series.len() < self.window {
            return Vec::new();
        }
        let arr = &series.values;
        let global_slope = stats::linear_regression(arr).slope;
        if global_slope.abs() <= 0.001 {
            return Vec::new();
        }

        let mut out = Vec::new();
        if self.window >= arr.len() {
            return out;
        }
        for i in self.window..(arr.len().saturating_sub(self.window)) {
            let window = &arr[i - self.window..i + self.window];
            let local_slope = stats::linear_regression(window).slope;
            let slope_change = (local_slope - global_slope).abs() / global_slope.abs();

            if slope_change > 1.5 {
                let confidence = (slope_change / 3.0).min(1.0);
                let detection = Detection::new(i, arr[i], confidence, self.method())
                    .with_timestamp(series.timestamp_at(i))
                    .with_type("trend_reversal")
                    .with_field("global_slope", global_slope)
                    .with_field("local_slope", local_slope)
                    .with_field("slope_change", slope_change);
                out.push(detection);
            }
        }
        out
    }
}

/// Removes a seasonal pattern (averaged per seasonal phase, then
/// centered) and flags outliers in the deseasonalized residual.
pub struct SeasonalAnomalyDetector {
    pub period: usize,
}

impl SeasonalAnomalyDetector {
    pub fn new(config: SeasonalConfig) -> Self {
        Self { period: config.period }
    }

    fn extract_seasonal_pattern(&self, arr: &[f64]) -> Vec<f64> {
        let mut seasonal = vec![0.0; self.period];
        for (phase, slot) in seasonal.iter_mut().enumerate() {
            let values: Vec<f64> = arr.iter().skip(phase).step_by(self.period).copied().collect();
            if !values.is_empty() {
                *slot = stats::mean(&values);
            }
        }
        let center = stats::mean(&seasonal);
        for slot in seasonal.iter_mut() {
            *slot -= center;
        }
        seasonal
    }
}

impl Detector for SeasonalAnomalyDetector {
    fn method(&self) -> &'static str {
        "seasonal_decomposition"
    }

    fn detect(&self, series: &Series) -> Vec<Detection> {
        if self.period == 0 || series.len() < self.period * 2 {
            return Vec::new();
        }
        let arr = &series.values;
        if !stats::has_seasonality(arr, self.period) {
            tracing::debug!(period = self.period, "no seasonality detected, skipping seasonal anomaly detection");
            return Vec::new();
        }

        let seasonal_pattern = self.extract_seasonal_pattern(arr);
        let deseasonalized: Vec<f64> = arr
            .iter()
            .enumerate()
            .map(|(i, v)| v - seasonal_pattern[i % self.period])
            .collect();

        let mean = stats::mean(&deseasonalized);
        let std = stats::stddev(&deseasonalized);
        if std <= f64::EPSILON {
            return Vec::new();
        }

        const THRESHOLD: f64 = 3.0;
        let mut out = Vec::new();
        for (i, (&orig, &deseas)) in arr.iter().zip(deseasonalized.iter()).enumerate() {
            let z_score = (deseas - mean).abs() / std;
            if z_score > THRESHOLD {
                let expected_seasonal = seasonal_pattern[i % self.period];
                let expected_value = mean + expected_seasonal;
                let confidence = stats::sigmoid_confidence(z_score, THRESHOLD, 0.5);

                let detection = Detection::new(i, orig, confidence, self.method())
                    .with_timestamp(series.timestamp_at(i))
                    .with_type("seasonal_outlier")
                    .with_field("expected_value", expected_value)
                    .with_field("seasonal_component", expected_seasonal)
                    .with_field("residual", deseas)
                    .with_field("z_score", z_score);
                out.push(detection);
            }
        }
        out
    }
}

/// Flags forecast errors from a simple exponential-smoothing forecaster
/// that are themselves anomalous relative to the errors seen so far.
pub struct ExponentialSmoothingDetector {
    pub alpha: f64,
    pub threshold: f64,
    pub warmup: usize,
}

impl ExponentialSmoothingDetector {
    pub fn new(config: ExponentialSmoothingConfig, threshold: f64) -> Self {
        Self { alpha: config.alpha, threshold, warmup: config.warmup }
    }
}

impl Detector for ExponentialSmoothingDetector {
    fn method(&self) -> &'static str {
        "exponential_smoothing"
    }

    fn detect(&self, series: &Series) -> Vec<Detection> {
        if series.len() < 5 {
            return Vec::new();
        }
        let arr = &series.values;
        let mut forecast = arr[0];
        let mut errors: Vec<f64> = Vec::new();
        let mut out = Vec::new();

        for (i, &value) in arr.iter().enumerate().skip(1) {
            let error = (value - forecast).abs();
            errors.push(error);
            forecast = self.alpha * value + (1.0 - self.alpha) * forecast;

            if i > self.warmup {
                let error_mean = stats::mean(&errors);
                let error_std = stats::stddev(&errors);
                if error_std > f64::EPSILON {
                    let z_score = (error - error_mean) / error_std;
                    if z_score > self.threshold {
                        let confidence = stats::sigmoid_confidence(z_score, self.threshold, 0.5);
                        let detection = Detection::new(i, value, confidence, self.method())
                            .with_timestamp(series.timestamp_at(i))
                            .with_type("forecast_error")
                            .with_field("expected_value", forecast)
                            .with_field("forecast_error", error)
                            .with_field("z_score", z_score);
                        out.push(detection);
                    }
                }
            }
        }
        out
    }
}

/// Flags points where the short-window moving average diverges from the
/// long-window moving average by more than `deviation_threshold`.
pub struct MaCrossoverDetector {
    pub short_window: usize,
    pub long_window: usize,
    pub deviation_threshold: f64,
}

impl MaCrossoverDetector {
    pub fn new(config: MaCrossoverConfig) -> Self {
        Self {
            short_window: config.short_window,
            long_window: config.long_window,
            deviation_threshold: config.deviation_threshold,
        }
    }
}

impl Detector for MaCrossoverDetector {
    fn method(&self) -> &'static str {
        "ma_crossover"
    }

    fn detect(&self, series: &Series) -> Vec<Detection> {
        if series.len() < self.long_window {
            return Vec::new();
        }
        let arr = &series.values;
        let mut out = Vec::new();

        for i in self.long_window..arr.len() {
            let short_ma = stats::mean(&arr[i - self.short_window..i]);
            let long_ma = stats::mean(&arr[i - self.long_window..i]);
            if long_ma.abs() <= f64::EPSILON {
                continue;
            }
            let deviation = (short_ma - long_ma).abs() / long_ma;
            if deviation > self.deviation_threshold {
                let confidence = (deviation / self.deviation_threshold).min(1.0);
                let detection = Detection::new(i, arr[i], confidence, self.method())
                    .with_timestamp(series.timestamp_at(i))
                    .with_type("moving_average_divergence")
                    .with_field("short_ma", short_ma)
                    .with_field("long_ma", long_ma)
                    .with_field("deviation", deviation);
                out.push(detection);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn changepoint_detects_a_mean_shift() {
        let mut values = vec![1.0; 40];
        for v in values.iter_mut().skip(20) {
            *v = 20.0;
        }
        let detector = ChangePointDetector::new(ChangePointConfig { min_size: 5, penalty: 1.0 });
        let detections = detector.detect(&Series::from_values(values));
        assert!(!detections.is_empty());
    }

    #[test]
    fn changepoint_skips_short_series() {
        let detector = ChangePointDetector::new(ChangePointConfig::default());
        assert!(detector.detect(&Series::from_values(vec![1.0, 2.0, 3.0])).is_empty());
    }

    #[test]
    fn trend_flags_local_reversal_against_a_strong_global_trend() {
        let mut values: Vec<f64> = (0..80).map(|i| i as f64).collect();
        for v in values.iter_mut().skip(40).take(10) {
            *v -= 30.0;
        }
        let detector = TrendAnomalyDetector::new(TrendConfig { window: 10 });
        let detections = detector.detect(&Series::from_values(values));
        assert!(!detections.is_empty());
    }

    #[test]
    fn seasonal_requires_actual_seasonality() {
        let values: Vec<f64> = (0..50).map(|i| i as f64 * 0.1).collect();
        let detector = SeasonalAnomalyDetector::new(SeasonalConfig { period: 12 });
        assert!(detector.detect(&Series::from_values(values)).is_empty());
    }

    #[test]
    fn seasonal_flags_a_residual_outlier() {
        let mut values = Vec::new();
        for cycle in 0..10 {
            for phase in 0..12 {
                let mut v = (phase as f64 / 12.0 * std::f64::consts::TAU).sin() * 10.0;
                if cycle == 5 && phase == 6 {
                    v += 50.0;
                }
                values.push(v);
            }
        }
        let detector = SeasonalAnomalyDetector::new(SeasonalConfig { period: 12 });
        let detections = detector.detect(&Series::from_values(values));
        assert!(detections.iter().any(|d| d.index == 5 * 12 + 6));
    }

    #[test]
    fn exponential_smoothing_flags_a_sudden_jump() {
        let mut values = vec![10.0; 30];
        values[25] = 200.0;
        let detector = ExponentialSmoothingDetector::new(ExponentialSmoothingConfig::default(), 3.0);
        let detections = detector.detect(&Series::from_values(values));
        assert!(detections.iter().any(|d| d.index == 25));
    }

    #[test]
    fn ma_crossover_flags_short_long_divergence() {
        let mut values = vec![10.0; 30];
        for v in values.iter_mut().skip(25) {
            *v = 30.0;
        }
        let detector = MaCrossoverDetector::new(MaCrossoverConfig::default());
        let detections = detector.detect(&Series::from_values(values));
        assert!(!detections.is_empty());
    }
}
