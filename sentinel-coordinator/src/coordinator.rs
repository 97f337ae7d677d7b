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

//! The consensus and synthesis stage (§4.5): flattens every agent's
//! anomalies into one list, groups them by `(source, metric,
//! minute-truncated timestamp)`, builds one candidate [`AnomalyReport`]
//! per group, accepts those meeting the consensus threshold, sorts them,
//! and publishes the accepted set into the knowledge graph along with
//! their derived relationships.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::{DateTime, Timelike, Utc};
use sentinel_core::types::{AgentAnomaly, AnomalyReport, SeverityLabel};
use sentinel_core::{id, Metadata, SentinelConfig};
use sentinel_graph::{KnowledgeGraph, NodeData};

use crate::counterfactual;
use crate::narrative::{Narrator, ReportDraft, TemplateNarrator};
use crate::relationships;

fn truncate_to_minute(timestamp: DateTime<Utc>) -> DateTime<Utc> {
    timestamp.with_second(0).and_then(|ts| ts.with_nanosecond(0)).unwrap_or(timestamp)
}

/// Groups, scores, accepts, sorts, and publishes anomalies for one
/// detection cycle. Holds the process-wide [`KnowledgeGraph`] handle it
/// writes accepted reports and relationships into.
pub struct Coordinator {
    config: Arc<SentinelConfig>,
    graph: Arc<KnowledgeGraph>,
    narrator: Arc<dyn Narrator>,
}

impl Coordinator {
    pub fn new(config: Arc<SentinelConfig>, graph: Arc<KnowledgeGraph>) -> Self {
        Self { config, graph, narrator: Arc::new(TemplateNarrator) }
    }

    /// Same as [`Coordinator::new`] but with a pluggable narrator -- the
    /// seam an LLM-backed narrative generator would be wired through
    /// (§9). Never on the hot path by construction: the coordinator only
    /// calls `narrate` synchronously after every other field is final.
    pub fn with_narrator(config: Arc<SentinelConfig>, graph: Arc<KnowledgeGraph>, narrator: Arc<dyn Narrator>) -> Self {
        Self { config, graph, narrator }
    }

    /// Runs the full consensus pass over one cycle's flattened agent
    /// anomalies and returns the accepted reports, already written into
    /// the knowledge graph with their derived relationships.
    pub fn synthesize(&self, anomalies: Vec<AgentAnomaly>) -> Vec<AnomalyReport> {
        let mut groups: BTreeMap<(String, String, DateTime<Utc>), Vec<AgentAnomaly>> = BTreeMap::new();
        for anomaly in anomalies {
            let key = (anomaly.source.clone(), anomaly.metric.clone(), truncate_to_minute(anomaly.timestamp));
            groups.entry(key).or_default().push(anomaly);
        }

        let mut reports = Vec::new();
        for ((source, metric, minute), members) in groups {
            if let Some(report) = self.build_candidate(source, metric, minute, members) {
                reports.push(report);
            }
        }

        // Stable on (severity_score desc, consensus_score desc); ties keep
        // insertion (group-iteration) order per §5's ordering guarantee.
        reports.sort_by(|a, b| {
            b.severity_score
                .partial_cmp(&a.severity_score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| b.consensus_score.partial_cmp(&a.consensus_score).unwrap_or(Ordering::Equal))
        });

        for report in &reports {
            self.publish(report);
        }
        relationships::derive_and_apply(&self.graph, &reports);

        reports
    }

    fn build_candidate(
        &self,
        source: String,
        metric: String,
        minute: DateTime<Utc>,
        members: Vec<AgentAnomaly>,
    ) -> Option<AnomalyReport> {
        if members.is_empty() {
            return None;
        }

        let total_weight: f64 = members.iter().map(|m| m.agent_weight).sum();
        let consensus_score = if total_weight > 0.0 {
            members.iter().map(|m| m.agent_weight * m.confidence).sum::<f64>() / total_weight
        } else {
            members.iter().map(|m| m.confidence).sum::<f64>() / members.len() as f64
        };

        if consensus_score < self.config.agents.coordinator.consensus_threshold {
            return None;
        }

        let severity_score = members.iter().map(|m| m.severity_score).sum::<f64>() / members.len() as f64;
        let severity_label = SeverityLabel::from_score(severity_score);

        let representative = members
            .iter()
            .max_by(|a, b| a.confidence.total_cmp(&b.confidence))
            .expect("members non-empty")
            .clone();

        let mut detection_methods: BTreeSet<String> = BTreeSet::new();
        let mut detecting_agents: BTreeSet<String> = BTreeSet::new();
        for member in &members {
            detection_methods.extend(member.detection_methods.iter().cloned());
            detection_methods.insert(member.agent_name.clone());
            detecting_agents.insert(member.agent_name.clone());
        }

        let explanation = members
            .iter()
            .filter(|m| !m.explanation.is_empty())
            .map(|m| format!("[{}] {}", m.agent_name, m.explanation))
            .collect::<Vec<_>>()
            .join(" | ");

        let draft = ReportDraft {
            source: &source,
            metric: &metric,
            consensus_score,
            severity_label,
            detection_count: members.len(),
            detecting_agents: &detecting_agents,
            detection_methods: &detection_methods,
            representative: &representative,
        };
        let narrative = self.narrator.narrate(&draft);
        let counterfactuals = counterfactual::derive(&representative);
        let anomaly_id = id::anomaly_id(&source, &metric, minute);

        Some(AnomalyReport {
            anomaly_id,
            source,
            metric,
            timestamp: minute,
            value: representative.value,
            consensus_score,
            severity_label,
            severity_score,
            detection_count: members.len(),
            detecting_agents,
            detection_methods,
            explanation,
            narrative,
            counterfactuals,
            individual_detections: members,
            created_at: Utc::now(),
        })
    }

    /// Writes one accepted report into the graph as a node, deriving its
    /// signature from the representative (highest-confidence) individual
    /// detection.
    fn publish(&self, report: &AnomalyReport) {
        let representative = report
            .individual_detections
            .iter()
            .max_by(|a, b| a.confidence.total_cmp(&b.confidence));

        let deviation = representative
            .and_then(|r| r.auxiliary.get("deviation").and_then(|v| v.as_f64()))
            .unwrap_or(report.severity_score * 10.0);
        let pattern_type = report
            .detection_methods
            .iter()
            .next()
            .cloned()
            .unwrap_or_else(|| "unknown".to_string());

        self.graph.add_anomaly(
            &report.anomaly_id,
            NodeData {
                source: report.source.clone(),
                metric: report.metric.clone(),
                value: report.value,
                confidence: report.consensus_score,
                severity: report.severity_label,
                methods: report.detection_methods.iter().cloned().collect(),
                deviation,
                pattern_type,
                metadata: Metadata::new(),
            },
            report.timestamp,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use sentinel_core::config::GraphConfig;

    fn ts(seconds: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + seconds, 0).unwrap()
    }

    fn anomaly(agent: &str, weight: f64, confidence: f64, severity_score: f64, seconds: i64) -> AgentAnomaly {
        AgentAnomaly {
            agent_name: agent.to_string(),
            agent_weight: weight,
            source: "cryptocurrency".to_string(),
            metric: "price_usd".to_string(),
            symbol: None,
            timestamp: ts(seconds),
            value: 50_000.0,
            confidence,
            severity_label: SeverityLabel::from_score(severity_score),
            severity_score,
            detection_methods: BTreeSet::from(["zscore".to_string()]),
            explanation: format!("{agent} saw it"),
            auxiliary: Metadata::new(),
        }
    }

    fn coordinator() -> (Coordinator, Arc<KnowledgeGraph>) {
        let config = Arc::new(SentinelConfig::default());
        let graph = Arc::new(KnowledgeGraph::new(&GraphConfig::default()).unwrap());
        (Coordinator::new(config, graph.clone()), graph)
    }

    #[test]
    fn accepts_a_group_above_the_consensus_threshold() {
        let (coordinator, graph) = coordinator();
        let anomalies = vec![anomaly("StatisticalAgent", 1.0, 0.9, 0.8, 0)];
        let reports = coordinator.synthesize(anomalies);
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].detecting_agents.len(), 1);
        assert!(graph.get_context(&reports[0].anomaly_id).is_some());
    }

    #[test]
    fn rejects_a_group_below_the_consensus_threshold() {
        let (coordinator, _graph) = coordinator();
        let anomalies = vec![anomaly("ContextAgent", 1.0, 0.2, 0.3, 0)];
        let reports = coordinator.synthesize(anomalies);
        assert!(reports.is_empty());
    }

    #[test]
    fn two_agents_on_the_same_group_combine_into_one_report() {
        let (coordinator, _graph) = coordinator();
        let anomalies = vec![anomaly("StatisticalAgent", 1.0, 0.9, 0.8, 0), anomaly("TemporalAgent", 1.0, 0.8, 0.7, 5)];
        let reports = coordinator.synthesize(anomalies);
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].detection_count, 2);
        assert_eq!(reports[0].detecting_agents.len(), 2);
        assert!(reports[0].explanation.contains("StatisticalAgent"));
        assert!(reports[0].explanation.contains("TemporalAgent"));
    }

    #[test]
    fn same_group_twice_produces_the_same_anomaly_id() {
        let (coordinator, _graph) = coordinator();
        let first = coordinator.synthesize(vec![anomaly("StatisticalAgent", 1.0, 0.9, 0.8, 0)]);
        let (coordinator, _graph) = coordinator();
        let second = coordinator.synthesize(vec![anomaly("StatisticalAgent", 1.0, 0.9, 0.8, 0)]);
        assert_eq!(first[0].anomaly_id, second[0].anomaly_id);
    }

    #[test]
    fn sorts_by_severity_then_consensus_descending() {
        let (coordinator, _graph) = coordinator();
        let mut low = anomaly("StatisticalAgent", 1.0, 0.65, 0.55, 0);
        low.metric = "low".to_string();
        let mut high = anomaly("StatisticalAgent", 1.0, 0.95, 0.95, 120);
        high.metric = "high".to_string();
        let reports = coordinator.synthesize(vec![low, high]);
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].metric, "high");
        assert_eq!(reports[1].metric, "low");
    }
}
