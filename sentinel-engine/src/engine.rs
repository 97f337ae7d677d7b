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

//! The core's public surface (§6): `ingest`, `analyze`, `subscribe`, and
//! a handle onto the knowledge graph for `query`-style reads. Wraps the
//! agent orchestrator and the coordinator around a process-wide
//! [`KnowledgeGraph`], and fans completed cycles out to subscribers
//! through a `watch` channel -- a slow subscriber simply sees the most
//! recent cycle, per §5's last-write-wins backpressure rule.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use sentinel_agents::AgentOrchestrator;
use sentinel_core::{DataPoint, SentinelConfig, SeverityLabel};
use sentinel_coordinator::Coordinator;
use sentinel_graph::KnowledgeGraph;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::result::{AnalysisMetadata, AnalysisResult};

/// How many ingested points the engine retains as implicit "historical"
/// context for cycles that don't supply their own. Oldest points are
/// dropped once the buffer is full -- this is a convenience window, not
/// the knowledge graph's durable record.
const HISTORY_CAPACITY: usize = 20_000;

/// The process-wide detection engine: one [`AgentOrchestrator`], one
/// [`Coordinator`], one shared [`KnowledgeGraph`], and a bounded
/// historical-context buffer fed by [`Engine::ingest`].
pub struct Engine {
    config: Arc<SentinelConfig>,
    orchestrator: AgentOrchestrator,
    coordinator: Coordinator,
    graph: Arc<KnowledgeGraph>,
    history: Mutex<VecDeque<DataPoint>>,
    next_cycle_id: AtomicU64,
    latest: watch::Sender<Arc<AnalysisResult>>,
}

impl Engine {
    pub fn new(config: Arc<SentinelConfig>) -> sentinel_core::Result<Self> {
        let graph = Arc::new(KnowledgeGraph::new(&config.knowledge_graph)?);
        let orchestrator = AgentOrchestrator::new(config.clone());
        let coordinator = Coordinator::new(config.clone(), graph.clone());
        let (latest, _) = watch::channel(Arc::new(AnalysisResult::empty(config.agents.coordinator.consensus_threshold)));

        Ok(Self {
            config,
            orchestrator,
            coordinator,
            graph,
            history: Mutex::new(VecDeque::with_capacity(HISTORY_CAPACITY)),
            next_cycle_id: AtomicU64::new(1),
            latest,
        })
    }

    /// Accepts a batch of points into the engine's rolling historical
    /// buffer and returns a monotonically increasing cycle id. Does not
    /// itself run a detection cycle -- `ingest` and `analyze` are
    /// separate operations per §6, so a caller batching points from
    /// several source adapters can `ingest` each batch independently and
    /// later `analyze` over whatever window it chooses.
    pub fn ingest(&self, points: Vec<DataPoint>) -> u64 {
        let cycle_id = self.next_cycle_id.fetch_add(1, Ordering::Relaxed);
        let mut history = self.history.lock();
        for point in points {
            if history.len() >= HISTORY_CAPACITY {
                history.pop_front();
            }
            history.push_back(point);
        }
        cycle_id
    }

    /// Runs one full detection cycle: fans `current` out across every
    /// agent concurrently, reconciles their anomalies through the
    /// coordinator's consensus pass, and publishes the result to every
    /// subscriber. `historical` defaults to a snapshot of the engine's
    /// ingested buffer when not supplied.
    pub async fn analyze(&self, current: &[DataPoint], historical: Option<&[DataPoint]>) -> AnalysisResult {
        self.analyze_cancellable(current, historical, None).await
    }

    /// Same as [`Engine::analyze`], but observes `cancellation` at the
    /// agent fan-out's next yield point: if the token fires before the
    /// orchestrator returns, the cycle completes as an empty result
    /// rather than blocking on or propagating a failure (§5, §7) --
    /// already-spawned agent tasks finish in the background but their
    /// anomalies are discarded.
    pub async fn analyze_cancellable(
        &self,
        current: &[DataPoint],
        historical: Option<&[DataPoint]>,
        cancellation: Option<&CancellationToken>,
    ) -> AnalysisResult {
        let owned_snapshot;
        let historical: &[DataPoint] = match historical {
            Some(points) => points,
            None => {
                owned_snapshot = self.history.lock().iter().cloned().collect::<Vec<_>>();
                &owned_snapshot
            }
        };

        let outcome = match cancellation {
            Some(token) => {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        warn!("detection cycle cancelled before agents finished; publishing an empty result");
                        sentinel_agents::CycleOutcome::default()
                    }
                    outcome = self.orchestrator.analyze(current, historical) => outcome,
                }
            }
            None => self.orchestrator.analyze(current, historical).await,
        };

        let total_detections = outcome.anomalies.len();
        let reports = self.coordinator.synthesize(outcome.anomalies);

        let total_anomalies = reports.len();
        let high_severity_count = reports
            .iter()
            .filter(|r| matches!(r.severity_label, SeverityLabel::High | SeverityLabel::Critical))
            .count();

        let result = AnalysisResult {
            total_anomalies,
            high_severity_count,
            reports,
            metadata: AnalysisMetadata {
                agents_consulted: outcome.agents_consulted.iter().map(|name| name.to_string()).collect(),
                total_detections,
                consensus_threshold: self.config.agents.coordinator.consensus_threshold,
            },
            knowledge_graph: self.graph.stats().into(),
        };

        // Last cycle's result supersedes any older unread one (§5
        // backpressure); the graph itself keeps every accepted report up
        // to `max_nodes` regardless of whether anyone reads this cycle.
        let _ = self.latest.send(Arc::new(result.clone()));

        let mut history = self.history.lock();
        for point in current.iter().cloned() {
            if history.len() >= HISTORY_CAPACITY {
                history.pop_front();
            }
            history.push_back(point);
        }

        result
    }

    /// Subscribes to completed cycles. A slow subscriber that misses
    /// cycles simply observes the most recent one next time it polls --
    /// the channel never buffers a backlog.
    pub fn subscribe(&self) -> watch::Receiver<Arc<AnalysisResult>> {
        self.latest.subscribe()
    }

    /// Handle onto the shared knowledge graph for `related`/
    /// `causal_chain`/`similar`/`context`/`export`/`stats` queries.
    pub fn graph(&self) -> Arc<KnowledgeGraph> {
        self.graph.clone()
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
    async fn ingest_returns_increasing_cycle_ids() {
        let engine = Engine::new(Arc::new(SentinelConfig::default())).unwrap();
        let a = engine.ingest(vec![DataPoint::new("cryptocurrency", "price_usd", 1.0, ts(0))]);
        let b = engine.ingest(vec![DataPoint::new("cryptocurrency", "price_usd", 2.0, ts(1))]);
        assert!(b > a);
    }

    #[tokio::test]
    async fn empty_batch_yields_an_empty_but_populated_result() {
        let engine = Engine::new(Arc::new(SentinelConfig::default())).unwrap();
        let result = engine.analyze(&[], None).await;
        assert_eq!(result.total_anomalies, 0);
        assert_eq!(result.metadata.agents_consulted.len(), 5);
    }

    #[tokio::test]
    async fn a_spike_produces_a_report_visible_to_subscribers() {
        let engine = Engine::new(Arc::new(SentinelConfig::default())).unwrap();
        let mut rx = engine.subscribe();
        let mut points = Vec::new();
        for i in 0..20 {
            let value = if i == 10 { 500.0 } else { 10.0 };
            points.push(DataPoint::new("cryptocurrency", "price_usd", value, ts(i)));
        }
        let result = engine.analyze(&points, Some(&[])).await;
        assert!(result.total_anomalies >= 1);

        rx.changed().await.unwrap();
        let latest = rx.borrow().clone();
        assert_eq!(latest.total_anomalies, result.total_anomalies);
    }

    #[tokio::test]
    async fn cancelling_before_agents_finish_yields_an_empty_result() {
        let engine = Engine::new(Arc::new(SentinelConfig::default())).unwrap();
        let token = CancellationToken::new();
        token.cancel();
        let points = vec![DataPoint::new("cryptocurrency", "price_usd", 1.0, ts(0))];
        let result = engine.analyze_cancellable(&points, Some(&[]), Some(&token)).await;
        assert_eq!(result.total_anomalies, 0);
        assert!(result.metadata.agents_consulted.is_empty());
    }

    #[tokio::test]
    async fn graph_reflects_published_reports() {
        let engine = Engine::new(Arc::new(SentinelConfig::default())).unwrap();
        let mut points = Vec::new();
        for i in 0..20 {
            let value = if i == 10 { 500.0 } else { 10.0 };
            points.push(DataPoint::new("cryptocurrency", "price_usd", value, ts(i)));
        }
        let result = engine.analyze(&points, Some(&[])).await;
        assert_eq!(engine.graph().stats().num_nodes, result.total_anomalies);
    }
}
