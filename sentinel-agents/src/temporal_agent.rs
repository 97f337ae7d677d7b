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

//! Time-series pattern detection: change-point, trend, seasonal,
//! exponential-smoothing, and moving-average-crossover, run over the
//! combined historical-plus-current series and then filtered back down
//! to anomalies that fall within the current window.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use sentinel_core::{config::AgentConfig, severity, stats, AgentAnomaly, DataPoint, Detection, SentinelConfig};
use sentinel_detectors::detector::{Detector, Series};
use sentinel_detectors::temporal::{
    ChangePointDetector, ExponentialSmoothingDetector, MaCrossoverDetector, SeasonalAnomalyDetector, TrendAnomalyDetector,
};

use crate::agent::{Agent, AgentResult};

/// `z > 3` on the standardized forecast-error stream, per the
/// exponential-smoothing residual rule -- not itself configurable.
const EXPONENTIAL_SMOOTHING_THRESHOLD: f64 = 3.0;

struct PatternContext {
    rising: bool,
    falling: bool,
    seasonal: bool,
}

pub struct TemporalAgent {
    config: Arc<SentinelConfig>,
    agent_config: AgentConfig,
}

impl TemporalAgent {
    pub const NAME: &'static str = "TemporalAgent";

    pub fn new(config: Arc<SentinelConfig>) -> Self {
        let agent_config = config.agents.for_agent(Self::NAME);
        Self { config, agent_config }
    }

    fn group<'a>(historical: &'a [DataPoint], current: &'a [DataPoint]) -> BTreeMap<(String, String), Vec<&'a DataPoint>> {
        let mut grouped: BTreeMap<(String, String), Vec<&DataPoint>> = BTreeMap::new();
        for point in historical.iter().chain(current.iter()) {
            grouped.entry(point.source_metric_key()).or_default().push(point);
        }
        for points in grouped.values_mut() {
            points.sort_by_key(|p| p.timestamp);
        }
        grouped
    }

    fn pattern_context(&self, values: &[f64]) -> Option<PatternContext> {
        if values.len() < 10 {
            return None;
        }
        let trend = stats::trend_direction(stats::linear_regression(values).slope, values);
        let seasonal = stats::has_seasonality(values, self.config.temporal.seasonal.period);
        Some(PatternContext {
            rising: trend == stats::TrendDirection::Rising,
            falling: trend == stats::TrendDirection::Falling,
            seasonal,
        })
    }

    fn is_recent(timestamp: Option<chrono::DateTime<chrono::Utc>>, current: &[DataPoint]) -> bool {
        let Some(timestamp) = timestamp else {
            return true;
        };
        match current.iter().map(|p| p.timestamp).min() {
            Some(earliest) => timestamp >= earliest,
            None => true,
        }
    }

    fn explanation(detection: &Detection, pattern: &Option<PatternContext>) -> String {
        let anomaly_type = detection.detection_type.as_deref().unwrap_or("temporal");
        let mut explanation = format!("Temporal anomaly ({anomaly_type}) detected using {}.", detection.method);

        match detection.method.as_str() {
            "changepoint" => {
                let before = detection.field_f64("mean_before").unwrap_or(0.0);
                let after = detection.field_f64("mean_after").unwrap_or(0.0);
                explanation.push_str(&format!(" Significant regime change detected. Mean shifted from {before:.2} to {after:.2}."));
            }
            "trend_deviation" => explanation.push_str(" Local trend diverged significantly from global trend."),
            "seasonal_decomposition" => explanation.push_str(" Value deviates from expected seasonal pattern."),
            "ma_crossover" => {
                let deviation = detection.field_f64("deviation").unwrap_or(0.0);
                explanation.push_str(&format!(" Short and long-term moving averages diverged by {:.2}%.", deviation * 100.0));
            }
            _ => {}
        }

        if let Some(pattern) = pattern {
            if pattern.rising {
                explanation.push_str(" Overall trend is increasing.");
            } else if pattern.falling {
                explanation.push_str(" Overall trend is decreasing.");
            }
            if pattern.seasonal {
                explanation.push_str(" Seasonal patterns detected in data.");
            }
        }

        explanation
    }
}

#[async_trait::async_trait]
impl Agent for TemporalAgent {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn weight(&self) -> f64 {
        self.agent_config.weight
    }

    async fn analyze(&self, current: &[DataPoint], historical: &[DataPoint]) -> AgentResult {
        let detectors: Vec<Box<dyn Detector>> = vec![
            Box::new(ChangePointDetector::new(self.config.temporal.changepoint)),
            Box::new(TrendAnomalyDetector::new(self.config.temporal.trend)),
            Box::new(SeasonalAnomalyDetector::new(self.config.temporal.seasonal)),
            Box::new(ExponentialSmoothingDetector::new(self.config.temporal.exponential_smoothing, EXPONENTIAL_SMOOTHING_THRESHOLD)),
            Box::new(MaCrossoverDetector::new(self.config.temporal.moving_average)),
        ];

        let mut anomalies = Vec::new();

        for ((source, metric), points) in Self::group(historical, current) {
            let values: Vec<f64> = points.iter().map(|p| p.value).collect();
            let timestamps = points.iter().map(|p| Some(p.timestamp)).collect();
            let series = Series::new(values.clone(), timestamps);
            let pattern = self.pattern_context(&values);

            for detector in &detectors {
                for detection in detector.detect(&series) {
                    if detection.confidence < self.agent_config.min_confidence {
                        continue;
                    }
                    if !Self::is_recent(detection.timestamp, current) {
                        continue;
                    }
                    let Some(timestamp) = detection.timestamp else {
                        continue;
                    };

                    let magnitude = detection.field_f64("change_magnitude").unwrap_or(0.0).abs();
                    let (severity_score, severity_label) = severity::calculate_with_label(detection.confidence, magnitude, 1.0, None);
                    let explanation = Self::explanation(&detection, &pattern);
                    let method = detection.method.clone();

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
                        detection_methods: BTreeSet::from([method]),
                        explanation,
                        auxiliary: detection.fields,
                    });
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
    async fn detects_a_sustained_mean_shift() {
        let agent = TemporalAgent::new(Arc::new(SentinelConfig::default()));
        let mut points = Vec::new();
        for i in 0..40 {
            let value = if i < 20 { 10.0 } else { 40.0 };
            points.push(DataPoint::new("github", "stars", value, ts(i)));
        }
        let result = agent.analyze(&points, &[]).await;
        assert!(!result.anomalies.is_empty());
    }

    #[tokio::test]
    async fn flat_series_yields_nothing() {
        let agent = TemporalAgent::new(Arc::new(SentinelConfig::default()));
        let points: Vec<DataPoint> = (0..40).map(|i| DataPoint::new("github", "stars", 10.0, ts(i))).collect();
        let result = agent.analyze(&points, &[]).await;
        assert!(result.anomalies.is_empty());
    }
}
