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

//! Relationship derivation (§4.7): for every unordered pair of accepted
//! reports (in their post-sort order), derive zero or more typed edges
//! and write them straight into the knowledge graph.

use sentinel_core::types::{AnomalyReport, EdgeType, Metadata, SeverityLabel};
use sentinel_graph::KnowledgeGraph;

const TEMPORAL_WINDOW_SECONDS: i64 = 300;
const CAUSAL_WINDOW_SECONDS: i64 = 600;
const TEMPORAL_CONFIDENCE: f64 = 0.7;
const CORRELATION_CONFIDENCE: f64 = 0.6;
const CAUSAL_BASE_CONFIDENCE: f64 = 0.5;
const CAUSAL_HIGH_SEVERITY_BONUS: f64 = 0.3;

/// Iterates `reports` in their given (post-sort) order and derives every
/// applicable edge for each `i < j` pair, applying it directly to
/// `graph`. Both endpoints are guaranteed present -- they were just
/// written by the caller -- so every `add_relationship` call here
/// succeeds.
pub fn derive_and_apply(graph: &KnowledgeGraph, reports: &[AnomalyReport]) {
    for i in 0..reports.len() {
        for j in (i + 1)..reports.len() {
            let earlier = &reports[i];
            let later = &reports[j];
            let delta = (later.timestamp - earlier.timestamp).num_seconds().abs();

            if delta <= TEMPORAL_WINDOW_SECONDS {
                graph.add_relationship(
                    &earlier.anomaly_id,
                    &later.anomaly_id,
                    EdgeType::Temporal,
                    TEMPORAL_CONFIDENCE,
                    Metadata::new(),
                );
            }

            if earlier.source == later.source {
                graph.add_relationship(
                    &earlier.anomaly_id,
                    &later.anomaly_id,
                    EdgeType::Correlation,
                    CORRELATION_CONFIDENCE,
                    Metadata::new(),
                );
            }

            let forward_delta = (later.timestamp - earlier.timestamp).num_seconds();
            if forward_delta > 0 && forward_delta <= CAUSAL_WINDOW_SECONDS {
                let mut confidence = CAUSAL_BASE_CONFIDENCE;
                if earlier.severity_label == SeverityLabel::High {
                    confidence += CAUSAL_HIGH_SEVERITY_BONUS;
                }
                let mut metadata = Metadata::new();
                metadata.insert("delta_seconds".to_string(), forward_delta.into());
                graph.add_relationship(&earlier.anomaly_id, &later.anomaly_id, EdgeType::Causal, confidence, metadata);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use sentinel_core::config::GraphConfig;
    use sentinel_graph::NodeData;
    use std::collections::BTreeSet;

    fn ts(seconds: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + seconds, 0).unwrap()
    }

    fn report(id: &str, source: &str, seconds: i64, severity: SeverityLabel) -> AnomalyReport {
        AnomalyReport {
            anomaly_id: id.to_string(),
            source: source.to_string(),
            metric: "price".to_string(),
            timestamp: ts(seconds),
            value: 1.0,
            consensus_score: 0.8,
            severity_label: severity,
            severity_score: 0.8,
            detection_count: 1,
            detecting_agents: BTreeSet::new(),
            detection_methods: BTreeSet::new(),
            explanation: String::new(),
            narrative: String::new(),
            counterfactuals: Vec::new(),
            individual_detections: Vec::new(),
            created_at: ts(seconds),
        }
    }

    fn node() -> NodeData {
        NodeData {
            source: "cryptocurrency".to_string(),
            metric: "price".to_string(),
            value: 1.0,
            confidence: 0.8,
            severity: SeverityLabel::Medium,
            methods: vec!["zscore".to_string()],
            deviation: 4.0,
            pattern_type: "zscore".to_string(),
            metadata: Metadata::new(),
        }
    }

    #[test]
    fn derives_all_three_edge_types_when_conditions_hold() {
        let graph = KnowledgeGraph::new(&GraphConfig::default()).unwrap();
        graph.add_anomaly("a", node(), ts(0));
        graph.add_anomaly("b", node(), ts(10));
        let reports = vec![
            report("a", "cryptocurrency", 0, SeverityLabel::High),
            report("b", "cryptocurrency", 10, SeverityLabel::Medium),
        ];

        derive_and_apply(&graph, &reports);

        let related = graph.find_related("a", 1, 0.0);
        assert_eq!(related.len(), 3, "expected temporal + correlation + causal edges");
    }

    #[test]
    fn skips_causal_edge_beyond_the_window() {
        let graph = KnowledgeGraph::new(&GraphConfig::default()).unwrap();
        graph.add_anomaly("a", node(), ts(0));
        graph.add_anomaly("b", node(), ts(900));
        let reports = vec![
            report("a", "weather", 0, SeverityLabel::Low),
            report("b", "cryptocurrency", 900, SeverityLabel::Low),
        ];

        derive_and_apply(&graph, &reports);

        let related = graph.find_related("a", 1, 0.0);
        assert!(related.is_empty(), "different source, outside every window, should have no edges");
    }
}
