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

//! Price-vs-open-interest divergence classification: the five-way
//! classification (first match wins, same ordering the original
//! specialist uses) of how price and OI are moving relative to one
//! another.

use chrono::{DateTime, Utc};
use sentinel_core::{config::OiDivergenceConfig, Detection};

pub struct OiDivergenceDetector {
    pub price_threshold: f64,
    pub oi_threshold: f64,
    pub spike_threshold: f64,
}

impl OiDivergenceDetector {
    pub fn new(config: OiDivergenceConfig) -> Self {
        Self {
            price_threshold: config.price_threshold,
            oi_threshold: config.oi_threshold,
            spike_threshold: config.spike_threshold,
        }
    }

    fn explanation(divergence_type: &str, price_chg: f64, oi_chg: f64) -> String {
        match divergence_type {
            "bearish_divergence" => format!(
                "Price increased {:.2}% while OI decreased {:.2}%. This suggests weakening bullish momentum and potential reversal.",
                price_chg, oi_chg.abs()
            ),
            "bullish_divergence" => format!(
                "Price decreased {:.2}% while OI increased {:.2}%. This suggests weakening bearish momentum and potential reversal.",
                price_chg.abs(), oi_chg
            ),
            "bullish_continuation" => format!(
                "Price increased {:.2}% with OI increasing {:.2}%. Strong bullish momentum with new positions being added.",
                price_chg, oi_chg
            ),
            "bearish_continuation" => format!(
                "Price decreased {:.2}% while OI increased {:.2}%. Potential short squeeze setup or strong bearish conviction.",
                price_chg.abs(), oi_chg
            ),
            "oi_spike_anomaly" => format!(
                "Unusual OI change of {:.2}% detected. This may indicate market manipulation, large whale activity, or approaching liquidation cascade.",
                oi_chg
            ),
            _ => format!("Divergence detected: price={:.2}%, OI={:.2}%", price_chg, oi_chg),
        }
    }

    /// `price_changes` and `oi_changes` are parallel percent-change series
    /// (same length); `timestamps`/`symbols` are optional parallel
    /// annotations joined in by index.
    pub fn detect(
        &self,
        price_changes: &[f64],
        oi_changes: &[f64],
        timestamps: &[Option<DateTime<Utc>>],
        symbols: &[Option<String>],
    ) -> Vec<Detection> {
        if price_changes.len() != oi_changes.len() {
            tracing::warn!("price and OI change lists have different lengths");
            return Vec::new();
        }
        if price_changes.is_empty() {
            return Vec::new();
        }

        let mut out = Vec::new();
        for (i, (&price_chg, &oi_chg)) in price_changes.iter().zip(oi_changes.iter()).enumerate() {
            let (divergence_type, confidence, severity): (&str, f64, &str) = if price_chg > self.price_threshold && oi_chg < -self.oi_threshold {
                ("bearish_divergence", (0.6 + oi_chg.abs() / 20.0).min(0.95), if oi_chg.abs() > 5.0 { "high" } else { "medium" })
            } else if price_chg < -self.price_threshold && oi_chg > self.oi_threshold {
                ("bullish_divergence", (0.6 + oi_chg / 20.0).min(0.95), if oi_chg > 5.0 { "high" } else { "medium" })
            } else if price_chg > 2.0 && oi_chg > 5.0 {
                ("bullish_continuation", (0.5 + oi_chg / 30.0).min(0.9), "medium")
            } else if price_chg < -2.0 && oi_chg > 5.0 {
                ("bearish_continuation", (0.5 + oi_chg / 30.0).min(0.9), "medium")
            } else if oi_chg.abs() > self.spike_threshold {
                ("oi_spike_anomaly", (0.7 + oi_chg.abs() / 50.0).min(0.95), if oi_chg.abs() > 20.0 { "high" } else { "medium" })
            } else {
                continue;
            };

            let explanation = Self::explanation(divergence_type, price_chg, oi_chg);
            let mut detection = Detection::new(i, price_chg, confidence, "oi_divergence")
                .with_type(divergence_type)
                .with_field("price_change_pct", price_chg)
                .with_field("oi_change_pct", oi_chg)
                .with_field("severity", severity)
                .with_field("explanation", explanation);

            if let Some(Some(ts)) = timestamps.get(i) {
                detection = detection.with_timestamp(Some(*ts));
            }
            if let Some(Some(symbol)) = symbols.get(i) {
                detection = detection.with_field("symbol", symbol.clone());
            }
            out.push(detection);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_ts(n: usize) -> Vec<Option<DateTime<Utc>>> {
        vec![None; n]
    }
    fn no_sym(n: usize) -> Vec<Option<String>> {
        vec![None; n]
    }

    #[test]
    fn detects_bullish_divergence_price_down_oi_up() {
        let detector = OiDivergenceDetector::new(OiDivergenceConfig::default());
        let price = vec![-2.0];
        let oi = vec![5.0];
        let detections = detector.detect(&price, &oi, &no_ts(1), &no_sym(1));
        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].detection_type.as_deref(), Some("bullish_divergence"));
    }

    #[test]
    fn detects_bearish_divergence_price_up_oi_down() {
        let detector = OiDivergenceDetector::new(OiDivergenceConfig::default());
        let price = vec![2.0];
        let oi = vec![-5.0];
        let detections = detector.detect(&price, &oi, &no_ts(1), &no_sym(1));
        assert_eq!(detections[0].detection_type.as_deref(), Some("bearish_divergence"));
    }

    #[test]
    fn detects_oi_spike_with_no_strong_price_move() {
        let detector = OiDivergenceDetector::new(OiDivergenceConfig::default());
        let price = vec![0.1];
        let oi = vec![15.0];
        let detections = detector.detect(&price, &oi, &no_ts(1), &no_sym(1));
        assert_eq!(detections[0].detection_type.as_deref(), Some("oi_spike_anomaly"));
    }

    #[test]
    fn mismatched_lengths_yield_nothing() {
        let detector = OiDivergenceDetector::new(OiDivergenceConfig::default());
        assert!(detector.detect(&[1.0, 2.0], &[1.0], &no_ts(2), &no_sym(2)).is_empty());
    }

    #[test]
    fn calm_market_yields_nothing() {
        let detector = OiDivergenceDetector::new(OiDivergenceConfig::default());
        let detections = detector.detect(&[0.1], &[0.2], &no_ts(1), &no_sym(1));
        assert!(detections.is_empty());
    }
}
