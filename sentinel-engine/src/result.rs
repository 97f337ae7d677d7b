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

//! The externalized [`AnalysisResult`] wire shape (§6): what one
//! completed detection cycle hands back to a caller or broadcasts to
//! subscribers.

use serde::Serialize;
use sentinel_core::AnomalyReport;
use sentinel_graph::GraphStats;

/// Cycle-level bookkeeping: which agents actually contributed, how many
/// raw detections fed the consensus pass, and the threshold that was
/// applied.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisMetadata {
    pub agents_consulted: Vec<String>,
    pub total_detections: usize,
    pub consensus_threshold: f64,
}

/// A compact snapshot of the knowledge graph's size and shape, as of the
/// moment this cycle's reports were published into it.
#[derive(Debug, Clone, Serialize)]
pub struct KnowledgeGraphSummary {
    pub nodes: usize,
    pub edges: usize,
    pub avg_degree: f64,
}

impl From<GraphStats> for KnowledgeGraphSummary {
    fn from(stats: GraphStats) -> Self {
        Self { nodes: stats.num_nodes, edges: stats.num_edges, avg_degree: stats.avg_degree }
    }
}

/// One completed detection cycle's full output. Always parses -- a
/// cycle that finds nothing still returns an `AnalysisResult` with an
/// empty `reports` and a populated `metadata.agents_consulted` (§7).
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    pub total_anomalies: usize,
    pub high_severity_count: usize,
    pub reports: Vec<AnomalyReport>,
    pub metadata: AnalysisMetadata,
    pub knowledge_graph: KnowledgeGraphSummary,
}

impl AnalysisResult {
    /// The watch channel's initial value before any cycle has run, and
    /// the result of a cycle that was cancelled before agents returned.
    pub fn empty(consensus_threshold: f64) -> Self {
        Self {
            total_anomalies: 0,
            high_severity_count: 0,
            reports: Vec::new(),
            metadata: AnalysisMetadata { agents_consulted: Vec::new(), total_detections: 0, consensus_threshold },
            knowledge_graph: KnowledgeGraphSummary { nodes: 0, edges: 0, avg_degree: 0.0 },
        }
    }
}
