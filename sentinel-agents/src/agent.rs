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

//! The collaborator seam every detection family implements: one
//! independent perspective over the same batch of points, normalized
//! into [`AgentAnomaly`]s the coordinator can later reconcile.

use sentinel_core::{AgentAnomaly, DataPoint, Metadata};

/// One agent's output for a single analysis cycle. `metadata` carries
/// whatever extra, agent-specific context is worth keeping around beyond
/// the flattened anomaly list -- e.g. the correlation agent's full
/// pairwise correlation matrix snapshot (§4.4). Most agents leave it
/// empty.
#[derive(Debug, Clone, Default)]
pub struct AgentResult {
    pub agent_name: String,
    pub weight: f64,
    pub anomalies: Vec<AgentAnomaly>,
    pub metadata: Metadata,
}

impl AgentResult {
    pub fn empty(agent_name: impl Into<String>, weight: f64) -> Self {
        Self { agent_name: agent_name.into(), weight, anomalies: Vec::new(), metadata: Metadata::new() }
    }
}

/// A single independent analysis perspective over a batch of data
/// points. Implementors never error out of a cycle -- an agent that
/// finds nothing, or that hits bad input, returns an empty
/// [`AgentResult`] rather than failing the whole cycle (the orchestrator
/// enforces the same rule at the timeout/panic boundary).
#[async_trait::async_trait]
pub trait Agent: Send + Sync {
    /// Stable identifier, also written into [`AgentAnomaly::agent_name`].
    fn name(&self) -> &'static str;

    /// This agent's contribution weight in the coordinator's consensus
    /// average.
    fn weight(&self) -> f64;

    async fn analyze(&self, current: &[DataPoint], historical: &[DataPoint]) -> AgentResult;
}
