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

//! Open-interest derivatives specialist: only looks at `oi_derivatives`
//! (and, for divergence, `cryptocurrency` price) points, grouped by
//! symbol, and delegates to the three OI-specialist detectors.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use sentinel_core::{config::AgentConfig, severity, AgentAnomaly, DataPoint, Detection, SentinelConfig};
use sentinel_oi::{FundingRateDetector, LongShortRatioDetector, OiDivergenceDetector};

use crate::agent::{Agent, AgentResult};

pub struct OiAgent {
    config: Arc<SentinelConfig>,
    agent_config: AgentConfig,
}

impl OiAgent {
    pub const NAME: &'static str = "OIAgent";

    pub fn new(config: Arc<SentinelConfig>) -> Self {
        let agent_config = config.agents.for_agent(Self::NAME);
        Self { config, agent_config }
    }

    fn group_by_symbol<'a>(points: &[&'a DataPoint]) -> BTreeMap<String, Vec<&'a DataPoint>> {
        let mut grouped: BTreeMap<String, Vec<&DataPoint>> = BTreeMap::new();
        for &point in points {
            let symbol = point.symbol.clone().unwrap_or_else(|| "unknown".to_string());
            grouped.entry(symbol).or_default().push(point);
        }
        grouped
    }

    fn last_two_by_time<'a>(mut points: Vec<&'a DataPoint>) -> Option<(&'a DataPoint, &'a DataPoint)> {
        points.sort_by_key(|p| p.timestamp);
        if points.len() < 2 {
            return None;
        }
        let len = points.len();
        Some((points[len - 2], points[len - 1]))
    }

    fn percent_change(prev: f64, next: f64) -> f64 {
        if prev > 0.0 {
            (next - prev) / prev * 100.0
        } else {
            0.0
        }
    }

    fn to_agent_anomaly(&self, symbol: &str, detection_type: &str, detection: Detection) -> Option<AgentAnomaly> {
        if detection.confidence < self.agent_config.min_confidence {
            return None;
        }
        let timestamp = detection.timestamp?;
        let explanation = detection
            .fields
            .get("explanation")
            .and_then(|v| v.as_str())
            .unwrap_or("OI derivatives anomaly detected")
            .to_string();
        let scope = if detection.fields.get("severity").and_then(|v| v.as_str()) == Some("high") { 1.5 } else { 1.0 };
        let magnitude = detection.field_f64("oi_change_pct").unwrap_or(0.0).abs() / 10.0;
        let (severity_score, severity_label) = severity::calculate_with_label(detection.confidence, magnitude, scope, None);

        Some(AgentAnomaly {
            agent_name: self.name().to_string(),
            agent_weight: self.weight(),
            source: "oi_derivatives".to_string(),
            metric: detection_type.to_string(),
            symbol: Some(symbol.to_string()),
            timestamp,
            value: detection.value,
            confidence: detection.confidence,
            severity_label,
            severity_score,
            detection_methods: BTreeSet::from([detection.method.clone()]),
            explanation,
            auxiliary: detection.fields,
        })
    }
}

#[async_trait::async_trait]
impl Agent for OiAgent {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn weight(&self) -> f64 {
        self.agent_config.weight
    }

    async fn analyze(&self, current: &[DataPoint], _historical: &[DataPoint]) -> AgentResult {
        let oi_points: Vec<&DataPoint> = current.iter().filter(|p| p.source == "oi_derivatives").collect();
        if oi_points.is_empty() {
            return AgentResult::empty(self.name(), self.weight());
        }
        let crypto_points: Vec<&DataPoint> = current.iter().filter(|p| p.source == "cryptocurrency").collect();

        let oi_by_symbol = Self::group_by_symbol(&oi_points);
        let crypto_by_symbol = Self::group_by_symbol(&crypto_points);

        let divergence_detector = OiDivergenceDetector::new(self.config.oi.divergence);
        let funding_detector = FundingRateDetector::new(self.config.oi.funding);
        let ratio_detector = LongShortRatioDetector::new(self.config.oi.long_short);

        let mut anomalies = Vec::new();

        for (symbol, points) in &oi_by_symbol {
            let oi_values: Vec<&DataPoint> = points.iter().copied().filter(|p| p.metric == "open_interest").collect();
            let funding_points: Vec<&DataPoint> = points.iter().copied().filter(|p| p.metric == "funding_rate").collect();
            let long_short_points: Vec<&DataPoint> = points.iter().copied().filter(|p| p.metric == "long_short_ratio").collect();
            let top_trader_points: Vec<&DataPoint> = points.iter().copied().filter(|p| p.metric == "top_trader_long_short_ratio").collect();

            // 1. Price/OI divergence.
            if let Some(crypto) = crypto_by_symbol.get(symbol) {
                let price_points: Vec<&DataPoint> = crypto.iter().copied().filter(|p| p.metric == "price_usd").collect();
                if oi_values.len() >= 2 {
                    if let (Some((prev_price, next_price)), Some((prev_oi, next_oi))) =
                        (Self::last_two_by_time(price_points), Self::last_two_by_time(oi_values.clone()))
                    {
                        let price_change_pct = Self::percent_change(prev_price.value, next_price.value);
                        let oi_change_pct = Self::percent_change(prev_oi.value, next_oi.value);
                        let detections = divergence_detector.detect(
                            &[price_change_pct],
                            &[oi_change_pct],
                            &[Some(next_oi.timestamp)],
                            &[Some(symbol.clone())],
                        );
                        for detection in detections {
                            if let Some(anomaly) = self.to_agent_anomaly(symbol, "divergence", detection) {
                                anomalies.push(anomaly);
                            }
                        }
                    }
                }
            }

            // 2. Funding rate extremes.
            if !funding_points.is_empty() {
                let rates: Vec<f64> = funding_points.iter().map(|p| p.value).collect();
                let timestamps: Vec<Option<chrono::DateTime<chrono::Utc>>> = funding_points.iter().map(|p| Some(p.timestamp)).collect();
                let symbols = vec![Some(symbol.clone()); rates.len()];
                for detection in funding_detector.detect(&rates, &timestamps, &symbols) {
                    if let Some(anomaly) = self.to_agent_anomaly(symbol, "funding_rate", detection) {
                        anomalies.push(anomaly);
                    }
                }
            }

            // 3. Long/short ratio crowding (overall market).
            if !long_short_points.is_empty() {
                let ratios: Vec<f64> = long_short_points.iter().map(|p| p.value).collect();
                let timestamps: Vec<Option<chrono::DateTime<chrono::Utc>>> = long_short_points.iter().map(|p| Some(p.timestamp)).collect();
                let symbols = vec![Some(symbol.clone()); ratios.len()];
                for detection in ratio_detector.detect(&ratios, &timestamps, &symbols, false) {
                    if let Some(anomaly) = self.to_agent_anomaly(symbol, "long_short_ratio", detection) {
                        anomalies.push(anomaly);
                    }
                }
            }

            // 4. Top-trader ratio crowding (more significant than the aggregate).
            if !top_trader_points.is_empty() {
                let ratios: Vec<f64> = top_trader_points.iter().map(|p| p.value).collect();
                let timestamps: Vec<Option<chrono::DateTime<chrono::Utc>>> = top_trader_points.iter().map(|p| Some(p.timestamp)).collect();
                let symbols = vec![Some(symbol.clone()); ratios.len()];
                for detection in ratio_detector.detect(&ratios, &timestamps, &symbols, true) {
                    if let Some(anomaly) = self.to_agent_anomaly(symbol, "top_trader_ratio", detection) {
                        anomalies.push(anomaly);
                    }
                }
            }
        }

        AgentResult { agent_name: self.name().to_string(), weight: self.weight(), anomalies, metadata: sentinel_core::Metadata::new() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn ts(seconds: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + seconds, 0).unwrap()
    }

    #[tokio::test]
    async fn no_oi_data_yields_empty_result() {
        let agent = OiAgent::new(Arc::new(SentinelConfig::default()));
        let points = vec![DataPoint::new("cryptocurrency", "price_usd", 100.0, ts(0))];
        let result = agent.analyze(&points, &[]).await;
        assert!(result.anomalies.is_empty());
    }

    #[tokio::test]
    async fn extreme_funding_rate_is_flagged() {
        let mut config = SentinelConfig::default();
        config.agents.per_agent.insert(
            "OIAgent".to_string(),
            sentinel_core::config::AgentConfig { weight: 0.2, min_confidence: 0.1, novelty_detection: false },
        );
        let agent = OiAgent::new(Arc::new(config));
        let points = vec![DataPoint::new("oi_derivatives", "funding_rate", 0.2, ts(0)).with_symbol("BTCUSDT")];
        let result = agent.analyze(&points, &[]).await;
        assert_eq!(result.anomalies.len(), 1);
        assert_eq!(result.anomalies[0].symbol.as_deref(), Some("BTCUSDT"));
    }

    #[tokio::test]
    async fn price_oi_bullish_divergence_is_flagged() {
        let mut config = SentinelConfig::default();
        config.agents.per_agent.insert(
            "OIAgent".to_string(),
            sentinel_core::config::AgentConfig { weight: 0.2, min_confidence: 0.1, novelty_detection: false },
        );
        let agent = OiAgent::new(Arc::new(config));
        let points = vec![
            DataPoint::new("cryptocurrency", "price_usd", 100.0, ts(0)).with_symbol("BTCUSDT"),
            DataPoint::new("cryptocurrency", "price_usd", 95.0, ts(1)).with_symbol("BTCUSDT"),
            DataPoint::new("oi_derivatives", "open_interest", 1000.0, ts(0)).with_symbol("BTCUSDT"),
            DataPoint::new("oi_derivatives", "open_interest", 1100.0, ts(1)).with_symbol("BTCUSDT"),
        ];
        let result = agent.analyze(&points, &[]).await;
        assert!(result.anomalies.iter().any(|a| a.metric == "divergence"));
    }
}
