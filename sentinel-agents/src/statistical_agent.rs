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

//! Ensemble statistical detection, one series per `(source, metric)` in
//! the current batch. Historical data plays no part here -- the
//! ensemble only ever looks at the points it was just handed.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use sentinel_core::{config::AgentConfig, severity, AgentAnomaly, DataPoint, SentinelConfig};
use sentinel_detectors::detector::Series;
use sentinel_detectors::ensemble::EnsembleStatisticalDetector;

use crate::agent::{Agent, AgentResult};

pub struct StatisticalAgent {
    config: Arc<SentinelConfig>,
    agent_config: AgentConfig,
}

impl StatisticalAgent {
    pub const NAME: &'static str = "StatisticalAgent";

    pub fn new(config: Arc<SentinelConfig>) -> Self {
        let agent_config = config.agents.for_agent(Self::NAME);
        Self { config, agent_config }
    }

    fn group(current: &[DataPoint]) -> BTreeMap<(String, String), Vec<&DataPoint>> {
        let mut grouped: BTreeMap<(String, String), Vec<&DataPoint>> = BTreeMap::new();
        for point in current {
            grouped.entry(point.source_metric_key()).or_default().push(point);
        }
        grouped
    }

    fn explanation(methods: &[String], consensus_count: usize, confidence: f64, source: &str, metric: &str) -> String {
        let mut explanation = format!(
            "Statistical anomaly detected in {source} {metric}. {consensus_count} detection methods agreed (confidence: {confidence:.2})."
        );
        if methods.iter().any(|m| m == "zscore") {
            explanation.push_str(" Value is significantly outside normal distribution.");
        }
        if methods.iter().any(|m| m == "iqr") {
            explanation.push_str(" Value is beyond interquartile range bounds.");
        }
        if methods.iter().any(|m| m == "cusum") {
            explanation.push_str(" Cumulative sum indicates a sustained shift in mean.");
        }
        explanation
    }
}

#[async_trait::async_trait]
impl Agent for StatisticalAgent {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn weight(&self) -> f64 {
        self.agent_config.weight
    }

    async fn analyze(&self, current: &[DataPoint], _historical: &[DataPoint]) -> AgentResult {
        let detector = EnsembleStatisticalDetector::new(&self.config.statistical);
        let mut anomalies = Vec::new();

        for ((source, metric), points) in Self::group(current) {
            let values: Vec<f64> = points.iter().map(|p| p.value).collect();
            let timestamps = points.iter().map(|p| Some(p.timestamp)).collect();
            let series = Series::new(values, timestamps);

            for detection in detector.detect(&series) {
                if detection.confidence < self.agent_config.min_confidence {
                    continue;
                }
                let Some(timestamp) = detection.timestamp else {
                    continue;
                };

                let methods: Vec<String> = detection
                    .fields
                    .get("methods")
                    .and_then(|v| serde_json::from_value(v.clone()).ok())
                    .unwrap_or_default();
                let consensus_count = detection.field_f64("consensus_count").unwrap_or(0.0) as usize;
                let deviation = detection.field_f64("deviation").unwrap_or(0.0);

                // No detector in this ensemble computes a real novelty signal yet,
                // so the bonus stays unclaimed even when the flag is on.
                let (severity_score, severity_label) = severity::calculate_with_label(detection.confidence, deviation, 1.0, None);

                anomalies.push(AgentAnomaly {
                    agent_name: self.name().to_string(),
                    agent_weight: self.weight(),
                    source: source.clone(),
                    metric: metric.clone(),
                    symbol: None,
                    timestamp,
                    value: detection.value,
                    confidence: detection.confidence,
                    severity_label,
                    severity_score,
                    detection_methods: methods.iter().cloned().collect::<BTreeSet<_>>(),
                    explanation: Self::explanation(&methods, consensus_count, detection.confidence, &source, &metric),
                    auxiliary: detection.fields,
                });
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
    async fn flags_a_single_spike_in_current_data() {
        let agent = StatisticalAgent::new(Arc::new(SentinelConfig::default()));
        let mut points = Vec::new();
        for i in 0..20 {
            let value = if i == 10 { 500.0 } else { 10.0 };
            points.push(DataPoint::new("cryptocurrency", "price_usd", value, ts(i)));
        }
        let result = agent.analyze(&points, &[]).await;
        assert_eq!(result.agent_name, "StatisticalAgent");
        assert!(!result.anomalies.is_empty());
        assert_eq!(result.anomalies[0].source, "cryptocurrency");
    }

    #[tokio::test]
    async fn calm_series_produces_no_anomalies() {
        let agent = StatisticalAgent::new(Arc::new(SentinelConfig::default()));
        let points: Vec<DataPoint> = (0..20).map(|i| DataPoint::new("weather", "temperature", 20.0, ts(i))).collect();
        let result = agent.analyze(&points, &[]).await;
        assert!(result.anomalies.is_empty());
    }
}
