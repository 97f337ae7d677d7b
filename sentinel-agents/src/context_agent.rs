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

//! Contextual annotation: one synthesized per-source context (events +
//! relevance), derived from how extreme that source's own batch of
//! values is -- not from a hardcoded per-source catalog. A real
//! deployment would plug this into a news/event feed; this agent
//! characterizes "how unusual did this source look" from the data
//! itself so the seam stays honest without external integrations.

use std::sync::Arc;

use sentinel_core::{config::AgentConfig, severity, AgentAnomaly, DataPoint, SentinelConfig, SeverityLabel};

use crate::agent::{Agent, AgentResult};

/// Volatility ratio above which a source's batch is "highly unusual"
/// rather than merely "elevated".
const HIGH_VOLATILITY_RATIO: f64 = 2.0;

struct SourceContext {
    events: Vec<String>,
    relevance: f64,
}

pub struct ContextAgent {
    agent_config: AgentConfig,
}

impl ContextAgent {
    pub const NAME: &'static str = "ContextAgent";

    pub fn new(config: Arc<SentinelConfig>) -> Self {
        let agent_config = config.agents.for_agent(Self::NAME);
        Self { agent_config }
    }

    /// Characterizes a source's batch by how far its extreme point sits
    /// from its own average, relative to the average itself -- a
    /// dimensionless "how unusual is this" ratio, not a literal per-source
    /// lookup.
    fn fetch_context(points: &[&DataPoint]) -> SourceContext {
        let values: Vec<f64> = points.iter().map(|p| p.value).collect();
        let avg = sentinel_core::stats::mean(&values);
        let max_abs = values.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
        let denom = if avg.abs() > f64::EPSILON { avg.abs() } else { 1.0 };
        let deviation_ratio = (max_abs - avg.abs()) / denom;

        if deviation_ratio > HIGH_VOLATILITY_RATIO {
            SourceContext {
                events: vec!["Highly unusual deviation from this source's own baseline".to_string()],
                relevance: 0.75,
            }
        } else {
            SourceContext {
                events: vec!["Within the source's typical variability".to_string()],
                relevance: 0.4,
            }
        }
    }

    fn explanation(source: &str, metric: &str, context: &SourceContext) -> String {
        format!(
            "Anomaly in {source} {metric} may be related to external events: {}. Contextual relevance: {:.2}.",
            context.events.join(", "),
            context.relevance
        )
    }
}

#[async_trait::async_trait]
impl Agent for ContextAgent {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn weight(&self) -> f64 {
        self.agent_config.weight
    }

    async fn analyze(&self, current: &[DataPoint], _historical: &[DataPoint]) -> AgentResult {
        let mut grouped: std::collections::BTreeMap<&str, Vec<&DataPoint>> = std::collections::BTreeMap::new();
        for point in current {
            grouped.entry(point.source.as_str()).or_default().push(point);
        }

        let mut anomalies = Vec::new();
        for (source, points) in grouped {
            if points.is_empty() {
                continue;
            }
            let context = Self::fetch_context(&points);
            if context.relevance < self.agent_config.min_confidence {
                continue;
            }

            let representative = points.iter().max_by(|a, b| a.value.abs().total_cmp(&b.value.abs())).expect("points non-empty");

            anomalies.push(AgentAnomaly {
                agent_name: self.name().to_string(),
                agent_weight: self.weight(),
                source: source.to_string(),
                metric: representative.metric.clone(),
                symbol: representative.symbol.clone(),
                timestamp: representative.timestamp,
                value: representative.value,
                confidence: context.relevance,
                severity_label: SeverityLabel::Medium,
                severity_score: severity::calculate(context.relevance, 0.0, 1.0, None),
                detection_methods: std::collections::BTreeSet::from(["context".to_string()]),
                explanation: Self::explanation(source, &representative.metric, &context),
                auxiliary: sentinel_core::Metadata::new(),
            });
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
    async fn emits_one_anomaly_per_source_with_the_extreme_point() {
        let agent = ContextAgent::new(Arc::new(SentinelConfig::default()));
        let points = vec![
            DataPoint::new("cryptocurrency", "price_usd", 1.0, ts(0)),
            DataPoint::new("cryptocurrency", "price_usd", 1000.0, ts(1)),
            DataPoint::new("cryptocurrency", "price_usd", 1.0, ts(2)),
            DataPoint::new("cryptocurrency", "price_usd", 1.0, ts(3)),
        ];
        let result = agent.analyze(&points, &[]).await;
        assert_eq!(result.anomalies.len(), 1);
        assert_eq!(result.anomalies[0].value, 1000.0);
    }

    #[tokio::test]
    async fn low_volatility_is_below_the_default_confidence_gate() {
        let agent = ContextAgent::new(Arc::new(SentinelConfig::default()));
        let points = vec![
            DataPoint::new("weather", "temperature", 20.0, ts(0)),
            DataPoint::new("weather", "temperature", 21.0, ts(1)),
        ];
        let result = agent.analyze(&points, &[]).await;
        assert!(result.anomalies.is_empty());
    }
}
