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

//! Rolling OI feature engineering: delta, momentum, OI-price
//! correlation, and Z-score, each a pure function over a raw OI series.

use sentinel_core::stats;

/// Percent change between consecutive OI readings; `oi_values[i-1] <= 0`
/// yields a `0.0` delta rather than a division by a non-positive OI.
pub fn oi_delta(oi_values: &[f64]) -> Vec<f64> {
    if oi_values.len() < 2 {
        return Vec::new();
    }
    oi_values
        .windows(2)
        .map(|w| if w[0] > 0.0 { (w[1] - w[0]) / w[0] * 100.0 } else { 0.0 })
        .collect()
}

/// Trailing moving average of [`oi_delta`], widening from the start of
/// the series until `window` deltas are available.
pub fn oi_momentum(oi_values: &[f64], window: usize) -> Vec<f64> {
    let deltas = oi_delta(oi_values);
    if deltas.len() < window {
        return deltas;
    }
    (0..deltas.len())
        .map(|i| {
            if i < window - 1 {
                stats::mean(&deltas[..=i])
            } else {
                stats::mean(&deltas[i + 1 - window..=i])
            }
        })
        .collect()
}

/// Rolling Pearson correlation between OI and price over a trailing
/// `window`; `0.0` for indices before the first full window.
pub fn oi_price_correlation(oi_values: &[f64], price_values: &[f64], window: usize) -> Vec<f64> {
    if oi_values.len() != price_values.len() || oi_values.len() < window {
        return Vec::new();
    }
    (0..oi_values.len())
        .map(|i| {
            if i < window - 1 {
                0.0
            } else {
                stats::pearson(&oi_values[i + 1 - window..=i], &price_values[i + 1 - window..=i])
            }
        })
        .collect()
}

/// Rolling Z-score of OI values over a trailing `window`; `0.0` before
/// the first full window or when the window has zero variance.
pub fn oi_zscore(oi_values: &[f64], window: usize) -> Vec<f64> {
    if oi_values.len() < window {
        return vec![0.0; oi_values.len()];
    }
    (0..oi_values.len())
        .map(|i| {
            if i < window - 1 {
                0.0
            } else {
                let w = &oi_values[i + 1 - window..=i];
                let mean = stats::mean(w);
                let std = stats::stddev(w);
                if std > f64::EPSILON {
                    (oi_values[i] - mean) / std
                } else {
                    0.0
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delta_is_percent_change_between_consecutive_points() {
        let deltas = oi_delta(&[100.0, 110.0, 99.0]);
        assert_eq!(deltas.len(), 2);
        assert!((deltas[0] - 10.0).abs() < 1e-9);
    }

    #[test]
    fn delta_guards_non_positive_previous_value() {
        let deltas = oi_delta(&[0.0, 110.0]);
        assert_eq!(deltas[0], 0.0);
    }

    #[test]
    fn momentum_widens_until_window_is_full() {
        let oi: Vec<f64> = (1..=10).map(|i| i as f64 * 100.0).collect();
        let momentum = oi_momentum(&oi, 3);
        assert_eq!(momentum.len(), oi_delta(&oi).len());
    }

    #[test]
    fn zscore_is_zero_before_first_full_window() {
        let oi: Vec<f64> = (1..=5).map(|i| i as f64).collect();
        let z = oi_zscore(&oi, 10);
        assert!(z.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn correlation_tracks_a_perfectly_linear_relationship() {
        let oi: Vec<f64> = (0..30).map(|i| i as f64).collect();
        let price: Vec<f64> = (0..30).map(|i| i as f64 * 2.0).collect();
        let corr = oi_price_correlation(&oi, &price, 10);
        assert!((corr.last().unwrap() - 1.0).abs() < 1e-6);
    }
}
