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

//! Funding-rate anomaly detection: extreme and moderate imbalance bands,
//! signalling overbought/oversold long/short pressure.

use chrono::{DateTime, Utc};
use sentinel_core::{config::FundingConfig, Detection};

pub struct FundingRateDetector {
    pub extreme_threshold: f64,
    pub moderate_threshold: f64,
}

impl FundingRateDetector {
    pub fn new(config: FundingConfig) -> Self {
        Self {
            extreme_threshold: config.extreme_threshold,
            moderate_threshold: config.moderate_threshold,
        }
    }

    pub fn detect(
        &self,
        funding_rates: &[f64],
        timestamps: &[Option<DateTime<Utc>>],
        symbols: &[Option<String>],
    ) -> Vec<Detection> {
        let mut out = Vec::new();
        for (i, &rate) in funding_rates.iter().enumerate() {
            let (confidence, signal, explanation) = if rate.abs() >= self.extreme_threshold {
                let confidence = (0.7 + rate.abs() / 0.2).min(0.95);
                let signal = if rate > 0.0 { "extreme_long_pressure" } else { "extreme_short_pressure" };
                let condition = if rate > 0.0 { "overbought" } else { "oversold" };
                let explanation = format!(
                    "Extreme funding rate of {:.4}% indicates {} conditions. Potential reversal or forced liquidations.",
                    rate, condition
                );
                (confidence, signal, explanation)
            } else if rate.abs() >= self.moderate_threshold {
                let confidence = 0.6 + rate.abs() / 0.15;
                let signal = if rate > 0.0 { "high_long_pressure" } else { "high_short_pressure" };
                let bias = if rate > 0.0 { "long" } else { "short" };
                let explanation = format!(
                    "Elevated funding rate of {:.4}% indicates strong {} bias in the market.",
                    rate, bias
                );
                (confidence, signal, explanation)
            } else {
                continue;
            };

            let severity = if rate.abs() >= self.extreme_threshold { "high" } else { "medium" };
            let mut detection = Detection::new(i, rate, confidence, "funding_rate")
                .with_type(signal)
                .with_field("funding_rate", rate)
                .with_field("signal", signal)
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
