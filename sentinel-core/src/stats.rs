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

//! Shared numeric primitives. Every detector, the correlation engine, and
//! the trend/seasonality helpers in §4.8 build on these instead of
//! reimplementing them -- this is the "shared utilities" slice of the
//! implementation budget in spec.md §2.
//!
//! Every divisor here is guarded: a `0.0` standard deviation, IQR, MAD, or
//! sample size below the minimum returns `None`/`0.0` rather than
//! panicking or producing `NaN`/`Inf`, per the Design Notes in
//! SPEC_FULL.md §9.

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation (denominator `n`, not `n - 1`) --
/// matches the detectors' use of the full observed window as "the"
/// distribution rather than a sample estimate of a larger one.
pub fn stddev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

pub fn variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64
}

pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
    percentile_sorted(&sorted, 0.5)
}

/// Median absolute deviation, unscaled (callers apply the `0.6745`
/// consistency constant themselves, per the modified Z-score contract).
pub fn mad(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let med = median(values);
    let deviations: Vec<f64> = values.iter().map(|v| (v - med).abs()).collect();
    median(&deviations)
}

/// Mean absolute deviation around the mean -- the modified Z-score
/// detector's documented fallback when MAD is exactly zero.
pub fn mean_absolute_deviation(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    mean(&values.iter().map(|v| (v - m).abs()).collect::<Vec<_>>())
}

/// Linear-interpolation percentile over an already-sorted slice (the
/// convention the IQR/median detectors share).
pub fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    if sorted.len() == 1 {
        return sorted[0];
    }
    let rank = p * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        let frac = rank - lo as f64;
        sorted[lo] + (sorted[hi] - sorted[lo]) * frac
    }
}

/// `(q1, q3, iqr)`.
pub fn quartiles(values: &[f64]) -> (f64, f64, f64) {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let q1 = percentile_sorted(&sorted, 0.25);
    let q3 = percentile_sorted(&sorted, 0.75);
    (q1, q3, q3 - q1)
}

/// Pearson product-moment correlation. Returns `0.0` if either series has
/// zero variance (undefined correlation treated as "no relationship"
/// rather than `NaN`).
pub fn pearson(xs: &[f64], ys: &[f64]) -> f64 {
    if xs.len() != ys.len() || xs.len() < 2 {
        return 0.0;
    }
    let mx = mean(xs);
    let my = mean(ys);
    let mut cov = 0.0;
    let mut vx = 0.0;
    let mut vy = 0.0;
    for (x, y) in xs.iter().zip(ys.iter()) {
        let dx = x - mx;
        let dy = y - my;
        cov += dx * dy;
        vx += dx * dx;
        vy += dy * dy;
    }
    if vx <= f64::EPSILON || vy <= f64::EPSILON {
        return 0.0;
    }
    (cov / (vx.sqrt() * vy.sqrt())).clamp(-1.0, 1.0)
}

fn ranks(values: &[f64]) -> Vec<f64> {
    let mut idx: Vec<usize> = (0..values.len()).collect();
    idx.sort_by(|&a, &b| values[a].partial_cmp(&values[b]).unwrap());
    let mut out = vec![0.0; values.len()];
    let mut i = 0;
    while i < idx.len() {
        let mut j = i;
        while j + 1 < idx.len() && values[idx[j + 1]] == values[idx[i]] {
            j += 1;
        }
        // Average rank for tied values (1-indexed ranks).
        let avg_rank = ((i + 1) + (j + 1)) as f64 / 2.0;
        for k in idx.iter().take(j + 1).skip(i) {
            out[*k] = avg_rank;
        }
        i = j + 1;
    }
    out
}

/// Spearman rank correlation: Pearson correlation over rank-transformed
/// series (ties broken by average rank).
pub fn spearman(xs: &[f64], ys: &[f64]) -> f64 {
    if xs.len() != ys.len() || xs.len() < 2 {
        return 0.0;
    }
    pearson(&ranks(xs), &ranks(ys))
}

/// Abramowitz-Stegun approximation of the error function, accurate to
/// ~1.5e-7 -- enough for a correlation p-value estimate, and fully
/// deterministic (no platform `erf` dependency).
fn erf(x: f64) -> f64 {
    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();
    let a1 = 0.254829592;
    let a2 = -0.284496736;
    let a3 = 1.421413741;
    let a4 = -1.453152027;
    let a5 = 1.061405429;
    let p = 0.3275911;
    let t = 1.0 / (1.0 + p * x);
    let y = 1.0 - (((((a5 * t + a4) * t) + a3) * t + a2) * t + a1) * t * (-x * x).exp();
    sign * y
}

fn standard_normal_cdf(z: f64) -> f64 {
    0.5 * (1.0 + erf(z / std::f64::consts::SQRT_2))
}

/// Two-tailed p-value for a Pearson/Spearman correlation coefficient `r`
/// over `n` paired observations, via the Fisher z-transformation. Used
/// only to annotate correlation results; the significance gate itself is
/// the `|r| >= threshold` test described in spec.md §4.3.
pub fn correlation_p_value(r: f64, n: usize) -> f64 {
    if n < 4 {
        return 1.0;
    }
    let r = r.clamp(-0.999_999, 0.999_999);
    let z = 0.5 * ((1.0 + r) / (1.0 - r)).ln() * ((n as f64 - 3.0).sqrt());
    2.0 * (1.0 - standard_normal_cdf(z.abs()))
}

/// Result of an ordinary least-squares fit of `values` against their
/// index `0..n`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearRegression {
    pub slope: f64,
    pub intercept: f64,
    pub abs_r: f64,
}

/// Linear regression of `values` against their position in the slice.
/// Returns a zero-slope, zero-correlation fit for fewer than two points.
pub fn linear_regression(values: &[f64]) -> LinearRegression {
    if values.len() < 2 {
        return LinearRegression {
            slope: 0.0,
            intercept: mean(values),
            abs_r: 0.0,
        };
    }
    let xs: Vec<f64> = (0..values.len()).map(|i| i as f64).collect();
    let mx = mean(&xs);
    let my = mean(values);
    let mut num = 0.0;
    let mut den = 0.0;
    for (x, y) in xs.iter().zip(values.iter()) {
        num += (x - mx) * (y - my);
        den += (x - mx).powi(2);
    }
    if den <= f64::EPSILON {
        return LinearRegression {
            slope: 0.0,
            intercept: my,
            abs_r: 0.0,
        };
    }
    let slope = num / den;
    let intercept = my - slope * mx;
    let r = pearson(&xs, values).abs();
    LinearRegression {
        slope,
        intercept,
        abs_r: r,
    }
}

/// Direction classification for a trend: stable when `|slope|` is small
/// relative to the series' own scale (`< 0.01 * stddev(values)`), per
/// §4.8, else rising or falling by sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendDirection {
    Rising,
    Falling,
    Stable,
}

pub fn trend_direction(slope: f64, values: &[f64]) -> TrendDirection {
    let scale = stddev(values);
    if slope.abs() < 0.01 * scale {
        TrendDirection::Stable
    } else if slope > 0.0 {
        TrendDirection::Rising
    } else {
        TrendDirection::Falling
    }
}

/// Autocorrelation of `values` at `lag`, via the standard biased
/// estimator. Returns `0.0` if `lag >= values.len()` or the series has
/// zero variance.
pub fn autocorrelation(values: &[f64], lag: usize) -> f64 {
    if lag == 0 || lag >= values.len() {
        return 0.0;
    }
    let m = mean(values);
    let denom: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    if denom <= f64::EPSILON {
        return 0.0;
    }
    let numer: f64 = values[..values.len() - lag]
        .iter()
        .zip(values[lag..].iter())
        .map(|(a, b)| (a - m) * (b - m))
        .sum();
    numer / denom
}

/// `true` iff the series shows seasonality at lag `period`: the
/// autocorrelation there exceeds `0.5` (§4.8).
pub fn has_seasonality(values: &[f64], period: usize) -> bool {
    autocorrelation(values, period) > 0.5
}

/// Confidence from a standardized deviation ratio via a sigmoid:
/// `sigma(k * (r - 1))`, clipped to `[0, 1]`, where `r = deviation / threshold`.
/// Shared by every detector that derives confidence from "how far past
/// the threshold" an observation fell (spec.md §4.1).
pub fn sigmoid_confidence(deviation: f64, threshold: f64, k: f64) -> f64 {
    if threshold <= f64::EPSILON {
        return 0.0;
    }
    let r = deviation / threshold;
    let x = k * (r - 1.0);
    let sigmoid = 1.0 / (1.0 + (-x).exp());
    sigmoid.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_and_stddev_of_constant_series_is_zero_variance() {
        let xs = vec![5.0; 10];
        assert_eq!(mean(&xs), 5.0);
        assert_eq!(stddev(&xs), 0.0);
    }

    #[test]
    fn pearson_perfect_positive_and_negative() {
        let xs = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let ys = vec![2.0, 4.0, 6.0, 8.0, 10.0];
        assert!((pearson(&xs, &ys) - 1.0).abs() < 1e-9);
        let neg: Vec<f64> = ys.iter().map(|v| -v).collect();
        assert!((pearson(&xs, &neg) + 1.0).abs() < 1e-9);
    }

    #[test]
    fn pearson_constant_series_is_zero_not_nan() {
        let xs = vec![1.0, 1.0, 1.0];
        let ys = vec![1.0, 2.0, 3.0];
        assert_eq!(pearson(&xs, &ys), 0.0);
    }

    #[test]
    fn spearman_matches_pearson_on_monotone_nonlinear() {
        let xs = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let ys = vec![1.0, 4.0, 9.0, 16.0, 25.0];
        assert!((spearman(&xs, &ys) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn quartiles_and_iqr_outlier_bounds() {
        let xs = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 100.0];
        let (q1, q3, iqr) = quartiles(&xs);
        assert!(q1 < q3);
        assert!(iqr > 0.0);
    }

    #[test]
    fn autocorrelation_detects_seasonal_signal() {
        let period = 4;
        let values: Vec<f64> = (0..40)
            .map(|i| (2.0 * std::f64::consts::PI * (i as f64) / period as f64).sin())
            .collect();
        assert!(has_seasonality(&values, period));
    }

    #[test]
    fn linear_regression_recovers_known_slope() {
        let values: Vec<f64> = (0..20).map(|i| 2.0 * i as f64 + 1.0).collect();
        let reg = linear_regression(&values);
        assert!((reg.slope - 2.0).abs() < 1e-9);
        assert!((reg.intercept - 1.0).abs() < 1e-6);
        assert!(reg.abs_r > 0.99);
    }

    #[test]
    fn sigmoid_confidence_clips_to_unit_interval() {
        assert!(sigmoid_confidence(1000.0, 3.0, 2.0) <= 1.0);
        assert!(sigmoid_confidence(0.0, 3.0, 2.0) >= 0.0);
        assert_eq!(sigmoid_confidence(3.0, 0.0, 2.0), 0.0);
    }
}
