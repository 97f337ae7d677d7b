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

//! Concurrent fan-out over the five agents: each runs in its own task with
//! its own timeout, and one agent's panic or timeout only loses that
//! agent's anomalies instead of the cycle.

use std::sync::Arc;
use std::time::Duration;

use sentinel_core::{AgentAnomaly, DataPoint, SentinelConfig};
use tracing::warn;

use crate::agent::{Agent, AgentResult};
use crate::context_agent::ContextAgent;
use crate::correlation_agent::CorrelationAgent;
use crate::oi_agent::OiAgent;
use crate::statistical_agent::StatisticalAgent;
use crate::temporal_agent::TemporalAgent;

/// How long any single agent is allowed to take before the cycle gives up
/// on it specifically -- other agents still in flight are unaffected.
const AGENT_TIMEOUT: Duration = Duration::from_secs(30);

/// One cycle's combined agent anomalies plus which agents actually
/// contributed to it -- an agent that panicked or missed its own timeout
/// is simply absent from `agents_consulted`, per §7's rule that a single
/// agent failure never fails the cycle.
#[derive(Debug, Clone, Default)]
pub struct CycleOutcome {
    pub anomalies: Vec<AgentAnomaly>,
    pub agents_consulted: Vec<&'static str>,
}

pub struct AgentOrchestrator {
    agents: Vec<Arc<dyn Agent>>,
}

impl AgentOrchestrator {
    pub fn new(config: Arc<SentinelConfig>) -> Self {
        let agents: Vec<Arc<dyn Agent>> = vec![
            Arc::new(StatisticalAgent::new(config.clone())),
            Arc::new(TemporalAgent::new(config.clone())),
            Arc::new(CorrelationAgent::new(config.clone())),
            Arc::new(ContextAgent::new(config.clone())),
            Arc::new(OiAgent::new(config)),
        ];
        Self { agents }
    }

    /// Runs every agent concurrently over the same batch and returns their
    /// combined anomalies plus which agents actually contributed. An
    /// agent that panics or doesn't finish within [`AGENT_TIMEOUT`]
    /// contributes nothing rather than failing the whole cycle -- each
    /// agent's timeout is independent, so one slow agent never drops the
    /// others' results (§5, §7).
    pub async fn analyze(&self, current: &[DataPoint], historical: &[DataPoint]) -> CycleOutcome {
        let mut handles = Vec::with_capacity(self.agents.len());
        for agent in &self.agents {
            let agent = Arc::clone(agent);
            let current = current.to_vec();
            let historical = historical.to_vec();
            handles.push(tokio::spawn(async move {
                tokio::time::timeout(AGENT_TIMEOUT, async move { agent.analyze(&current, &historical).await }).await
            }));
        }

        let results = futures::future::join_all(handles).await;

        let mut anomalies = Vec::new();
        let mut agents_consulted = Vec::with_capacity(self.agents.len());
        for (agent, result) in self.agents.iter().zip(results) {
            match result {
                Ok(Ok(AgentResult { anomalies: found, .. })) => {
                    anomalies.extend(found);
                    agents_consulted.push(agent.name());
                }
                Ok(Err(_elapsed)) => {
                    warn!(agent = agent.name(), "agent exceeded its timeout; dropping its anomalies for this cycle");
                }
                Err(join_error) => {
                    warn!(agent = agent.name(), error = %join_error, "agent task panicked; dropping its anomalies for this cycle");
                }
            }
        }
        CycleOutcome { anomalies, agents_consulted }
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
    async fn runs_every_agent_and_combines_their_anomalies() {
        let orchestrator = AgentOrchestrator::new(Arc::new(SentinelConfig::default()));
        let mut points = Vec::new();
        for i in 0..20 {
            let value = if i == 10 { 500.0 } else { 10.0 };
            points.push(DataPoint::new("cryptocurrency", "price_usd", value, ts(i)));
        }
        let outcome = orchestrator.analyze(&points, &[]).await;
        assert!(outcome.anomalies.iter().any(|a| a.agent_name == "StatisticalAgent"));
        assert_eq!(outcome.agents_consulted.len(), 5);
    }

    #[tokio::test]
    async fn empty_batch_yields_no_anomalies_but_still_consults_every_agent() {
        let orchestrator = AgentOrchestrator::new(Arc::new(SentinelConfig::default()));
        let outcome = orchestrator.analyze(&[], &[]).await;
        assert!(outcome.anomalies.is_empty());
        assert_eq!(outcome.agents_consulted.len(), 5);
    }
}
