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

//! The data model shared by every stage of the pipeline: source adapters
//! produce [`DataPoint`]s, detectors produce [`Detection`]s, agents
//! normalize those into [`AgentAnomaly`]s, and the coordinator synthesizes
//! [`AnomalyReport`]s that cross the system boundary.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Free-form, opaque metadata attached to a [`DataPoint`] or carried
/// through to downstream records. Callers own the shape; the core never
/// interprets specific keys except where a module explicitly documents
/// that it reads one (e.g. the OI agent's `symbol` join).
pub type Metadata = Map<String, Value>;

/// One timestamped observation from a source adapter.
///
/// `source` names a producer class (`"cryptocurrency"`, `"weather"`,
/// `"oi_derivatives"`, `"github"`, ...); `metric` names the measured
/// quantity. Points are immutable once produced and live only within the
/// detection cycle that consumes them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub symbol: Option<String>,
    pub metric: String,
    pub value: f64,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Metadata,
}

impl DataPoint {
    pub fn new(source: impl Into<String>, metric: impl Into<String>, value: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            source: source.into(),
            symbol: None,
            metric: metric.into(),
            value,
            timestamp,
            metadata: Metadata::new(),
        }
    }

    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = Some(symbol.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Typed accessor for a numeric metadata field, used by callers (e.g.
    /// the OI agent reading an auxiliary funding rate) that need more than
    /// the bare `value`/`metric` pair without the core depending on their
    /// specific schema.
    pub fn metadata_f64(&self, key: &str) -> Option<f64> {
        self.metadata.get(key).and_then(Value::as_f64)
    }

    /// `(source, metric)` grouping key used throughout the agent layer.
    pub fn source_metric_key(&self) -> (String, String) {
        (self.source.clone(), self.metric.clone())
    }
}

/// The output of a one-dimensional detector: a single flagged index in a
/// series, tagged with the detector's method identifier and any
/// method-specific fields (`z_score`, `expected_value`,
/// `mean_before`/`mean_after`, `slope`, `residual`, `divergence_type`,
/// `funding_rate`, `long_short_ratio`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub index: usize,
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub timestamp: Option<DateTime<Utc>>,
    pub confidence: f64,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub detection_type: Option<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub fields: Metadata,
}

impl Detection {
    pub fn new(index: usize, value: f64, confidence: f64, method: impl Into<String>) -> Self {
        Self {
            index,
            value,
            timestamp: None,
            confidence: confidence.clamp(0.0, 1.0),
            method: method.into(),
            detection_type: None,
            fields: Metadata::new(),
        }
    }

    pub fn with_timestamp(mut self, timestamp: Option<DateTime<Utc>>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_type(mut self, detection_type: impl Into<String>) -> Self {
        self.detection_type = Some(detection_type.into());
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn field_f64(&self, key: &str) -> Option<f64> {
        self.fields.get(key).and_then(Value::as_f64)
    }
}

/// Monotone severity label, `score`-derived per the cuts in §3 of
/// SPEC_FULL.md: `0.9, 0.75, 0.5 -> {critical, high, medium, low}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeverityLabel {
    Low,
    Medium,
    High,
    Critical,
}

impl SeverityLabel {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.9 {
            SeverityLabel::Critical
        } else if score >= 0.75 {
            SeverityLabel::High
        } else if score >= 0.5 {
            SeverityLabel::Medium
        } else {
            SeverityLabel::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SeverityLabel::Low => "low",
            SeverityLabel::Medium => "medium",
            SeverityLabel::High => "high",
            SeverityLabel::Critical => "critical",
        }
    }
}

impl std::fmt::Display for SeverityLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single agent's normalized finding, ready for the coordinator's
/// consensus pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentAnomaly {
    pub agent_name: String,
    pub agent_weight: f64,
    pub source: String,
    pub metric: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub symbol: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub value: f64,
    pub confidence: f64,
    pub severity_label: SeverityLabel,
    pub severity_score: f64,
    pub detection_methods: BTreeSet<String>,
    pub explanation: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub auxiliary: Metadata,
}

/// A scenario an analyst could compare the observed anomaly against:
/// "what would this have looked like if the expected value had held,"
/// "if the trend had continued," etc. See §4.8 / `sentinel-coordinator::
/// counterfactual`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Counterfactual {
    pub title: String,
    pub description: String,
    pub impacted_quantity: String,
}

/// The externalized, final record: one accepted consensus anomaly,
/// annotated and explained.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnomalyReport {
    pub anomaly_id: String,
    pub source: String,
    pub metric: String,
    pub timestamp: DateTime<Utc>,
    pub value: f64,
    pub consensus_score: f64,
    pub severity_label: SeverityLabel,
    pub severity_score: f64,
    pub detection_count: usize,
    pub detecting_agents: BTreeSet<String>,
    pub detection_methods: BTreeSet<String>,
    pub explanation: String,
    pub narrative: String,
    pub counterfactuals: Vec<Counterfactual>,
    pub individual_detections: Vec<AgentAnomaly>,
    pub created_at: DateTime<Utc>,
}

impl AnomalyReport {
    /// Invariant checks from §3 of SPEC_FULL.md, exercised by property
    /// tests rather than enforced at construction (a report that fails
    /// these was built incorrectly upstream -- this is a diagnostic, not
    /// a validation gate on the hot path).
    pub fn upholds_invariants(&self) -> bool {
        (0.0..=1.0).contains(&self.consensus_score)
            && (0.0..=1.0).contains(&self.severity_score)
            && self.detection_count >= 1
            && SeverityLabel::from_score(self.severity_score) == self.severity_label
    }
}

/// Edge kind in the knowledge graph's directed multigraph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeType {
    Temporal,
    Correlation,
    Causal,
}

impl EdgeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeType::Temporal => "temporal",
            EdgeType::Correlation => "correlation",
            EdgeType::Causal => "causal",
        }
    }
}

/// A directed edge between two anomaly nodes in the knowledge graph. At
/// most one edge exists per `(from, to, type)` triple.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphEdge {
    pub from: String,
    pub to: String,
    pub edge_type: EdgeType,
    pub confidence: f64,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Metadata,
}
