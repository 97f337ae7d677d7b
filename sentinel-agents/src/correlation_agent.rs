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

//! Thin agent wrapper around [`sentinel_correlation::CorrelationEngine`]:
//! normalizes its two anomaly shapes into [`AgentAnomaly`] and applies
//! this agent's own confidence gate on top of the engine's.

use std::collections::BTreeSet;
use std::sync::Arc;

use sentinel_core::{config::AgentConfig, AgentAnomaly, DataPoint, SentinelConfig};
use sentinel_correlation::{CorrelationAnomaly, CorrelationEngine};

use crate::agent::{Agent, AgentResult};

pub struct CorrelationAgent {
    engine: CorrelationEngine,
    agent_config: AgentConfig,
}

impl CorrelationAgent {
    pub const NAME: &'static str = "CorrelationAgent";

    pub fn new(config: Arc<SentinelConfig>) -> Self {
        let agent_config = config.agents.for_agent(Self::NAME);
        Self { engine: CorrelationEngine::new(config.correlation), agent_config }
    }

    fn to_agent_anomaly(&self, anomaly: CorrelationAnomaly) -> AgentAnomaly {
        match anomaly {
            CorrelationAnomaly::CorrelationBreak {
                source1,
                metric1,
                source2,
                metric2,
                timestamp,
                value1,
                value2,
                historical_correlation,
                current_correlation,
                correlation_change,
                confidence,
                severity_score,
                severity_label,
                explanation,
            } => {
                let mut auxiliary = sentinel_core::Metadata::new();
                auxiliary.insert("source1".into(), source1.clone().into());
                auxiliary.insert("metric1".into(), metric1.clone().into());
                auxiliary.insert("source2".into(), source2.clone().into());
                auxiliary.insert("metric2".into(), metric2.clone().into());
                auxiliary.insert("value1".into(), value1.into());
                auxiliary.insert("value2".into(), value2.into());
                auxiliary.insert("historical_correlation".into(), historical_correlation.into());
                auxiliary.insert("current_correlation".into(), current_correlation.into());
                auxiliary.insert("correlation_change".into(), correlation_change.into());

                AgentAnomaly {
                    agent_name: self.name().to_string(),
                    agent_weight: self.weight(),
                    source: format!("{source1}/{source2}"),
                    metric: format!("{metric1}/{metric2}"),
                    symbol: None,
                    timestamp,
                    value: value1,
                    confidence,
                    severity_label,
                    severity_score,
                    detection_methods: BTreeSet::from(["correlation_break".to_string()]),
                    explanation,
                    auxiliary,
                }
            }
            CorrelationAnomaly::SimultaneousAnomaly {
                timestamp,
                affected_sources,
                point_count,
                confidence,
                severity_score,
                severity_label,
                explanation,
            } => {
                let mut auxiliary = sentinel_core::Metadata::new();
                auxiliary.insert("affected_sources".into(), serde_json::to_value(&affected_sources).unwrap_or_default());
                auxiliary.insert("point_count".into(), (point_count as f64).into());

                AgentAnomaly {
                    agent_name: self.name().to_string(),
                    agent_weight: self.weight(),
                    source: "multi-source".to_string(),
                    metric: "correlation".to_string(),
                    symbol: None,
                    timestamp,
                    value: point_count as f64,
                    confidence,
                    severity_label,
                    severity_score,
                    detection_methods: BTreeSet::from(["simultaneous_anomaly".to_string()]),
                    explanation,
                    auxiliary,
                }
            }
        }
    }
}

#[async_trait::async_trait]
impl Agent for CorrelationAgent {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn weight(&self) -> f64 {
        self.agent_config.weight
    }

    async fn analyze(&self, current: &[DataPoint], historical: &[DataPoint]) -> AgentResult {
        let report = self.engine.analyze(current, historical);

        let matrix_snapshot: Vec<serde_json::Value> = report
            .matrix
            .iter()
            .map(|pair| {
                serde_json::json!({
                    "source1": pair.source1,
                    "metric1": pair.metric1,
                    "source2": pair.source2,
                    "metric2": pair.metric2,
                    "pearson": pair.pearson,
                    "spearman": pair.spearman,
                    "significant": pair.significant,
                    "data_points": pair.data_points,
                })
            })
            .collect();
        let mut metadata = sentinel_core::Metadata::new();
        metadata.insert("correlation_matrix".into(), serde_json::Value::Array(matrix_snapshot));

        let anomalies = report
            .anomalies
            .into_iter()
            .filter(|a| a.confidence() >= self.agent_config.min_confidence)
            .map(|a| self.to_agent_anomaly(a))
            .collect();

        AgentResult { agent_name: self.name().to_string(), weight: self.weight(), anomalies, metadata }
    }
}
