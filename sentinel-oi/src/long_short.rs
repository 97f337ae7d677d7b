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

//! Long/short ratio imbalance detection: crowded-trade signalling at
//! extreme and moderate bands, on either side of parity.

use chrono::{DateTime, Utc};
use sentinel_core::{config::LongShortConfig, Detection};

pub struct LongShortRatioDetector {
    pub extreme_ratio: f64,
    pub moderate_ratio: f64,
}

impl LongShortRatioDetector {
    pub fn new(config: LongShortConfig) -> Self {
        Self {
            extreme_ratio: config.extreme_ratio,
            moderate_ratio: config.moderate_ratio,
        }
    }

    /// `is_top_trader` raises the reported severity for an extreme
    /// imbalance (top-trader positioning is more market-moving than the
    /// retail-wide aggregate).
    pub fn detect(
        &self,
        ratios: &[f64],
        timestamps: &[Option<DateTime<Utc>>],
        symbols: &[Option<String>],
        is_top_trader: bool,
    ) -> Vec<Detection> {
        let mut out = Vec::new();
        for (i, &ratio) in ratios.iter().enumerate() {
            if ratio <= 0.0 {
                continue;
            }
            let direction = if ratio > 1.0 { "long" } else { "short" };

            let (confidence, signal, trader_severity, explanation) = if ratio >= self.extreme_ratio || ratio <= 1.0 / self.extreme_ratio {
                let confidence = (0.65 + ratio.ln().abs() / 5.0).min(0.9);
                let signal = format!("extreme_{}_crowding", direction);
                let severity = if is_top_trader { "high" } else { "medium" };
                let explanation = format!(
                    "Extreme {} bias detected with ratio {:.2}. Crowded trade may lead to squeeze or rapid reversal.",
                    direction, ratio
                );
                (confidence, signal, severity, explanation)
            } else if ratio >= self.moderate_ratio || ratio <= 1.0 / self.moderate_ratio {
                let confidence = 0.5 + ratio.ln().abs() / 8.0;
                let signal = format!("elevated_{}_bias", direction);
                let explanation = format!(
                    "Elevated {} bias with ratio {:.2}. Monitor for potential reversal.",
                    direction, ratio
                );
                (confidence, signal, "low", explanation)
            } else {
                continue;
            };

            let trader_type = if is_top_trader { "top_traders" } else { "global" };
            let mut detection = Detection::new(i, ratio, confidence, "long_short_ratio")
                .with_type(signal.clone())
                .with_field("long_short_ratio", ratio)
                .with_field("signal", signal)
                .with_field("severity", trader_severity)
                .with_field("trader_type", trader_type)
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

    #[test]
    fn extreme_long_crowding_is_flagged() {
        let detector = LongShortRatioDetector::new(LongShortConfig::default());
        let detections = detector.detect(&[4.0], &[None], &[None], false);
        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].detection_type.as_deref(), Some("extreme_long_crowding"));
    }

    #[test]
    fn extreme_short_crowding_from_low_ratio() {
        let detector = LongShortRatioDetector::new(LongShortConfig::default());
        let detections = detector.detect(&[0.2], &[None], &[None], false);
        assert_eq!(detections[0].detection_type.as_deref(), Some("extreme_short_crowding"));
    }

    #[test]
    fn top_trader_extreme_ratio_is_high_severity() {
        let detector = LongShortRatioDetector::new(LongShortConfig::default());
        let detections = detector.detect(&[4.0], &[None], &[None], true);
        assert_eq!(detections[0].field_f64("severity"), None);
        assert_eq!(detections[0].fields.get("severity").and_then(|v| v.as_str()), Some("high"));
    }

    #[test]
    fn balanced_ratio_is_ignored() {
        let detector = LongShortRatioDetector::new(LongShortConfig::default());
        assert!(detector.detect(&[1.05], &[None], &[None], false).is_empty());
    }
}
