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

//! Deterministic narrative composition (§4.5, §9).
//!
//! The core only ever ships a template narrator: a fixed sequence of
//! sentences built from fields already present on the synthesized report.
//! A richer, LLM-backed generator is a pluggable external collaborator
//! behind the same [`Narrator`] seam -- it must never sit on the hot
//! path of a detection cycle, so nothing here ever awaits I/O.

use std::collections::BTreeSet;

use sentinel_core::{AgentAnomaly, SeverityLabel};

/// Everything [`Narrator::narrate`] needs, gathered by the coordinator
/// once a candidate report's consensus fields are known.
pub struct ReportDraft<'a> {
    pub source: &'a str,
    pub metric: &'a str,
    pub consensus_score: f64,
    pub severity_label: SeverityLabel,
    pub detection_count: usize,
    pub detecting_agents: &'a BTreeSet<String>,
    pub detection_methods: &'a BTreeSet<String>,
    pub representative: &'a AgentAnomaly,
}

/// A narrative generator: turns a [`ReportDraft`] into prose. The core
/// ships [`TemplateNarrator`]; an LLM-backed narrator implements the same
/// trait and can be swapped in by a caller without touching the
/// coordinator.
pub trait Narrator: Send + Sync {
    fn narrate(&self, draft: &ReportDraft<'_>) -> String;
}

/// Deterministic multi-sentence composition: opening, detection detail,
/// consensus (when at least two members agreed), technical footnote, and
/// a severity-dependent impact clause.
pub struct TemplateNarrator;

impl Narrator for TemplateNarrator {
    fn narrate(&self, draft: &ReportDraft<'_>) -> String {
        let mut sentences = Vec::with_capacity(5);

        sentences.push(format!(
            "An anomaly was detected in {} {} with a consensus confidence of {:.2}.",
            draft.source, draft.metric, draft.consensus_score
        ));

        sentences.push(format!(
            "The observed value was {:.4}, flagged by {} independent detection method{}.",
            draft.representative.value,
            draft.detection_methods.len(),
            if draft.detection_methods.len() == 1 { "" } else { "s" }
        ));

        if draft.detection_count >= 2 {
            let agents: Vec<&str> = draft.detecting_agents.iter().map(String::as_str).collect();
            sentences.push(format!(
                "{} separate agents ({}) independently corroborated this finding.",
                draft.detecting_agents.len(),
                agents.join(", ")
            ));
        }

        let methods: Vec<&str> = draft.detection_methods.iter().map(String::as_str).collect();
        sentences.push(format!("Contributing signals: {}.", methods.join(", ")));

        let impact = match draft.severity_label {
            SeverityLabel::Critical => {
                "This is a critical-severity event warranting immediate attention."
            }
            SeverityLabel::High => "This is a high-severity event that should be reviewed promptly.",
            SeverityLabel::Medium => "This is a medium-severity event worth monitoring.",
            SeverityLabel::Low => "This is a low-severity event, likely within expected variability.",
        };
        sentences.push(impact.to_string());

        sentences.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn representative() -> AgentAnomaly {
        AgentAnomaly {
            agent_name: "StatisticalAgent".to_string(),
            agent_weight: 1.0,
            source: "cryptocurrency".to_string(),
            metric: "price_usd".to_string(),
            symbol: None,
            timestamp: DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap(),
            value: 50_000.0,
            confidence: 0.9,
            severity_label: SeverityLabel::High,
            severity_score: 0.8,
            detection_methods: BTreeSet::from(["zscore".to_string()]),
            explanation: "value far from mean".to_string(),
            auxiliary: sentinel_core::Metadata::new(),
        }
    }

    #[test]
    fn mentions_consensus_only_when_multiple_members_agree() {
        let representative = representative();
        let agents = BTreeSet::from(["StatisticalAgent".to_string()]);
        let methods = BTreeSet::from(["zscore".to_string()]);
        let solo = ReportDraft {
            source: "cryptocurrency",
            metric: "price_usd",
            consensus_score: 0.9,
            severity_label: SeverityLabel::High,
            detection_count: 1,
            detecting_agents: &agents,
            detection_methods: &methods,
            representative: &representative,
        };
        let text = TemplateNarrator.narrate(&solo);
        assert!(!text.contains("independently corroborated"));

        let consensus = ReportDraft { detection_count: 2, ..solo_draft(&representative, &agents, &methods) };
        let text = TemplateNarrator.narrate(&consensus);
        assert!(text.contains("independently corroborated"));
    }

    fn solo_draft<'a>(
        representative: &'a AgentAnomaly,
        agents: &'a BTreeSet<String>,
        methods: &'a BTreeSet<String>,
    ) -> ReportDraft<'a> {
        ReportDraft {
            source: "cryptocurrency",
            metric: "price_usd",
            consensus_score: 0.9,
            severity_label: SeverityLabel::High,
            detection_count: 1,
            detecting_agents: agents,
            detection_methods: methods,
            representative,
        }
    }

    #[test]
    fn is_deterministic() {
        let representative = representative();
        let agents = BTreeSet::from(["StatisticalAgent".to_string()]);
        let methods = BTreeSet::from(["zscore".to_string()]);
        let draft = solo_draft(&representative, &agents, &methods);
        assert_eq!(TemplateNarrator.narrate(&draft), TemplateNarrator.narrate(&draft));
    }
}
