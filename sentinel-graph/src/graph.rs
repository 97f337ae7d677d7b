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

//! The temporal knowledge graph: a bounded, in-memory directed multigraph
//! of accepted anomalies connected by typed edges (§4.6).
//!
//! A single [`parking_lot::RwLock`] guards all mutable state. Traversal
//! methods collect their results while holding the guard and return only
//! after releasing it -- the `Vec`s they allocate are unavoidable but
//! happen outside the lock scope.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use sentinel_core::config::GraphConfig;
use sentinel_core::error::{Result, SentinelError};
use sentinel_core::types::{EdgeType, GraphEdge, Metadata, SeverityLabel};

/// The data a caller attaches to a node when it calls [`KnowledgeGraph::add_anomaly`].
///
/// `deviation` and `pattern_type` feed the node's [`Signature`]; callers
/// that want meaningful similarity search (rather than every node
/// collapsing into the same `"unknown"` bucket) should populate them with
/// something derived from the originating [`sentinel_core::types::AnomalyReport`]
/// (e.g. `severity_score * 10` and the dominant detection method) --
/// see `sentinel-coordinator`.
#[derive(Debug, Clone)]
pub struct NodeData {
    pub source: String,
    pub metric: String,
    pub value: f64,
    pub confidence: f64,
    pub severity: SeverityLabel,
    pub methods: Vec<String>,
    pub deviation: f64,
    pub pattern_type: String,
    pub metadata: Metadata,
}

/// The compact, comparable structural signature used for similarity
/// search, derived once from a [`NodeData`] at insertion time.
#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    pub source: String,
    pub metric: String,
    pub magnitude: f64,
    pub confidence: f64,
    pub methods: Vec<String>,
    pub pattern_type: String,
}

impl Signature {
    fn from_node_data(data: &NodeData) -> Self {
        Self {
            source: data.source.clone(),
            metric: data.metric.clone(),
            magnitude: data.deviation.abs(),
            confidence: data.confidence,
            methods: data.methods.clone(),
            pattern_type: data.pattern_type.clone(),
        }
    }

    /// Weighted match against another signature: `source` 0.2, `metric`
    /// 0.2, `pattern_type` 0.3, magnitude similarity (`min/max`) x 0.3.
    /// Magnitude only contributes when both sides are strictly positive.
    fn similarity(&self, other: &Signature) -> f64 {
        let mut score = 0.0;
        if self.source == other.source {
            score += 0.2;
        }
        if self.metric == other.metric {
            score += 0.2;
        }
        if self.pattern_type == other.pattern_type {
            score += 0.3;
        }
        if self.magnitude > 0.0 && other.magnitude > 0.0 {
            let ratio = self.magnitude.min(other.magnitude) / self.magnitude.max(other.magnitude);
            score += 0.3 * ratio;
        }
        score
    }
}

#[derive(Debug, Clone)]
struct Node {
    data: NodeData,
    timestamp: DateTime<Utc>,
    signature: Signature,
}

/// One hop of a [`find_related`](KnowledgeGraph::find_related) traversal.
#[derive(Debug, Clone)]
pub struct RelatedAnomaly {
    pub anomaly_id: String,
    pub distance: usize,
    pub path: Vec<(String, String, EdgeType)>,
    pub relationship_type: EdgeType,
    pub confidence: f64,
}

/// One step of a [`find_causal_chain`](KnowledgeGraph::find_causal_chain) path.
#[derive(Debug, Clone)]
pub struct CausalStep {
    pub anomaly_id: String,
    pub edge: Option<GraphEdge>,
}

/// One match from [`find_similar`](KnowledgeGraph::find_similar).
#[derive(Debug, Clone)]
pub struct SimilarAnomaly {
    pub anomaly_id: String,
    pub similarity: f64,
    pub signature: Signature,
}

/// One match from the private `temporal_neighbors` scan.
#[derive(Debug, Clone)]
pub struct TemporalNeighbor {
    pub anomaly_id: String,
    pub timestamp: DateTime<Utc>,
    pub time_diff_seconds: i64,
}

/// Aggregated view returned by [`get_context`](KnowledgeGraph::get_context).
#[derive(Debug, Clone)]
pub struct AnomalyContext {
    pub anomaly_id: String,
    pub node: NodeData,
    pub timestamp: DateTime<Utc>,
    pub signature: Signature,
    pub related: Vec<RelatedAnomaly>,
    pub causal_chains: Vec<Vec<CausalStep>>,
    pub similar: Vec<SimilarAnomaly>,
    pub temporal_neighbors: Vec<TemporalNeighbor>,
}

/// Snapshot of graph-wide counters, see [`KnowledgeGraph::stats`].
#[derive(Debug, Clone, Copy)]
pub struct GraphStats {
    pub num_nodes: usize,
    pub num_edges: usize,
    pub oldest_node: Option<DateTime<Utc>>,
    pub newest_node: Option<DateTime<Utc>>,
    pub avg_degree: f64,
}

/// A flat dump of the graph for visualization / external export.
#[derive(Debug, Clone)]
pub struct GraphExport {
    pub nodes: Vec<(String, NodeData, DateTime<Utc>)>,
    pub edges: Vec<GraphEdge>,
    pub stats: GraphStats,
}

type EdgeKey = (String, String, EdgeType);

#[derive(Default)]
struct GraphInner {
    nodes: HashMap<String, Node>,
    edges: HashMap<EdgeKey, GraphEdge>,
}

/// A bounded, in-memory directed multigraph of anomaly nodes connected by
/// typed edges, with oldest-first eviction and signature-based
/// similarity search. See §4.6.
pub struct KnowledgeGraph {
    max_nodes: usize,
    similarity_threshold: f64,
    inner: RwLock<GraphInner>,
}

impl KnowledgeGraph {
    pub fn new(config: &GraphConfig) -> Result<Self> {
        if config.max_nodes == 0 {
            return Err(SentinelError::InvalidGraphCapacity(
                "max_nodes must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            max_nodes: config.max_nodes,
            similarity_threshold: config.similarity_threshold,
            inner: RwLock::new(GraphInner::default()),
        })
    }

    /// Inserts a node (overwriting any existing node with the same id),
    /// records its signature, then evicts oldest-timestamped nodes (and
    /// their incident edges) until `|nodes| <= max_nodes`.
    pub fn add_anomaly(&self, id: &str, data: NodeData, timestamp: DateTime<Utc>) {
        let signature = Signature::from_node_data(&data);
        let mut inner = self.inner.write();
        inner.nodes.insert(id.to_string(), Node { data, timestamp, signature });
        self.evict_excess(&mut inner);
    }

    fn evict_excess(&self, inner: &mut GraphInner) {
        while inner.nodes.len() > self.max_nodes {
            let oldest = inner
                .nodes
                .iter()
                .min_by_key(|(_, node)| node.timestamp)
                .map(|(id, _)| id.clone());
            let Some(id) = oldest else { break };
            inner.nodes.remove(&id);
            inner.edges.retain(|(from, to, _), _| from != &id && to != &id);
        }
    }

    /// Adds a typed edge; a no-op (logged) if either endpoint is absent.
    /// Overwrites any existing edge with the same `(from, to, type)`.
    pub fn add_relationship(
        &self,
        from: &str,
        to: &str,
        edge_type: EdgeType,
        confidence: f64,
        metadata: Metadata,
    ) {
        let mut inner = self.inner.write();
        if !inner.nodes.contains_key(from) || !inner.nodes.contains_key(to) {
            tracing::warn!(from, to, ?edge_type, "cannot add edge: endpoint missing from graph");
            return;
        }
        let edge = GraphEdge {
            from: from.to_string(),
            to: to.to_string(),
            edge_type,
            confidence: confidence.clamp(0.0, 1.0),
            created_at: Utc::now(),
            metadata,
        };
        inner.edges.insert((from.to_string(), to.to_string(), edge_type), edge);
    }

    /// Breadth-first traversal over outgoing edges whose confidence is at
    /// least `min_confidence`, bounded to `max_distance` hops.
    pub fn find_related(&self, id: &str, max_distance: usize, min_confidence: f64) -> Vec<RelatedAnomaly> {
        let inner = self.inner.read();
        if !inner.nodes.contains_key(id) {
            return Vec::new();
        }

        let mut visited = std::collections::HashSet::new();
        visited.insert(id.to_string());
        let mut queue: std::collections::VecDeque<(String, usize, Vec<(String, String, EdgeType)>)> =
            std::collections::VecDeque::new();
        queue.push_back((id.to_string(), 0, Vec::new()));

        let mut related = Vec::new();
        while let Some((current, distance, path)) = queue.pop_front() {
            if distance >= max_distance {
                continue;
            }
            for ((from, to, edge_type), edge) in inner.edges.iter() {
                if from != &current || visited.contains(to) || edge.confidence < min_confidence {
                    continue;
                }
                visited.insert(to.clone());
                let mut new_path = path.clone();
                new_path.push((from.clone(), to.clone(), *edge_type));
                related.push(RelatedAnomaly {
                    anomaly_id: to.clone(),
                    distance: distance + 1,
                    path: new_path.clone(),
                    relationship_type: *edge_type,
                    confidence: edge.confidence,
                });
                queue.push_back((to.clone(), distance + 1, new_path));
            }
        }
        related
    }

    /// Depth-first enumeration along `causal` edges, bounded by
    /// `max_len`. With `end` set, reports every simple path terminating
    /// there; otherwise reports every simple path prefix of length >= 2,
    /// once per point the recursion unwinds back through it.
    pub fn find_causal_chain(&self, start: &str, end: Option<&str>, max_len: usize) -> Vec<Vec<CausalStep>> {
        let inner = self.inner.read();
        if !inner.nodes.contains_key(start) {
            return Vec::new();
        }
        let mut chains = Vec::new();
        let mut path = vec![CausalStep { anomaly_id: start.to_string(), edge: None }];
        let mut visited = std::collections::HashSet::new();
        visited.insert(start.to_string());
        Self::causal_dfs(&inner, start, end, max_len, &mut path, &mut visited, &mut chains);
        chains
    }

    fn causal_dfs(
        inner: &GraphInner,
        current: &str,
        end: Option<&str>,
        max_len: usize,
        path: &mut Vec<CausalStep>,
        visited: &mut std::collections::HashSet<String>,
        chains: &mut Vec<Vec<CausalStep>>,
    ) {
        if path.len() >= max_len {
            return;
        }
        if let Some(target) = end {
            if current == target {
                chains.push(path.clone());
                return;
            }
        }
        for ((from, to, edge_type), edge) in inner.edges.iter() {
            if from != current || *edge_type != EdgeType::Causal || visited.contains(to) {
                continue;
            }
            visited.insert(to.clone());
            path.push(CausalStep { anomaly_id: to.clone(), edge: Some(edge.clone()) });
            Self::causal_dfs(inner, to, end, max_len, path, visited, chains);
            path.pop();
            visited.remove(to);
        }
        if end.is_none() && path.len() > 1 {
            chains.push(path.clone());
        }
    }

    /// Scores every other node's signature against `id`'s and returns the
    /// top `top_k` whose similarity is at least `similarity_threshold`.
    pub fn find_similar(&self, id: &str, top_k: usize) -> Vec<SimilarAnomaly> {
        let inner = self.inner.read();
        let Some(target) = inner.nodes.get(id) else { return Vec::new() };
        let target_signature = &target.signature;

        let mut matches: Vec<SimilarAnomaly> = inner
            .nodes
            .iter()
            .filter(|(other_id, _)| other_id.as_str() != id)
            .filter_map(|(other_id, node)| {
                let similarity = target_signature.similarity(&node.signature);
                (similarity >= self.similarity_threshold).then(|| SimilarAnomaly {
                    anomaly_id: other_id.clone(),
                    similarity,
                    signature: node.signature.clone(),
                })
            })
            .collect();

        matches.sort_by(|a, b| b.similarity.partial_cmp(&a.similarity).unwrap_or(std::cmp::Ordering::Equal));
        matches.truncate(top_k);
        matches
    }

    /// Aggregates node data, signature, related anomalies, causal
    /// chains, similar signatures, and temporal neighbors using the
    /// default parameters for each sub-query.
    pub fn get_context(&self, id: &str) -> Option<AnomalyContext> {
        let (data, timestamp, signature) = {
            let inner = self.inner.read();
            let node = inner.nodes.get(id)?;
            (node.data.clone(), node.timestamp, node.signature.clone())
        };

        Some(AnomalyContext {
            anomaly_id: id.to_string(),
            node: data,
            timestamp,
            signature,
            related: self.find_related(id, 2, 0.5),
            causal_chains: self.find_causal_chain(id, None, 5),
            similar: self.find_similar(id, 5),
            temporal_neighbors: self.temporal_neighbors(id, 1),
        })
    }

    /// Linear scan of node timestamps within `+/- hours` of `id`'s own
    /// timestamp, sorted by time proximity.
    fn temporal_neighbors(&self, id: &str, hours: i64) -> Vec<TemporalNeighbor> {
        let inner = self.inner.read();
        let Some(target) = inner.nodes.get(id) else { return Vec::new() };
        let target_time = target.timestamp;
        let window = Duration::hours(hours);

        let mut neighbors: Vec<TemporalNeighbor> = inner
            .nodes
            .iter()
            .filter(|(other_id, _)| other_id.as_str() != id)
            .filter_map(|(other_id, node)| {
                let diff = node.timestamp - target_time;
                (diff >= -window && diff <= window).then(|| TemporalNeighbor {
                    anomaly_id: other_id.clone(),
                    timestamp: node.timestamp,
                    time_diff_seconds: diff.num_seconds().abs(),
                })
            })
            .collect();

        neighbors.sort_by_key(|n| n.time_diff_seconds);
        neighbors
    }

    pub fn stats(&self) -> GraphStats {
        let inner = self.inner.read();
        self.compute_stats(&inner)
    }

    fn compute_stats(&self, inner: &GraphInner) -> GraphStats {
        let num_nodes = inner.nodes.len();
        let num_edges = inner.edges.len();
        let oldest_node = inner.nodes.values().map(|n| n.timestamp).min();
        let newest_node = inner.nodes.values().map(|n| n.timestamp).max();

        let mut degree: HashMap<&str, usize> = HashMap::new();
        for (from, to, _) in inner.edges.keys() {
            *degree.entry(from.as_str()).or_insert(0) += 1;
            *degree.entry(to.as_str()).or_insert(0) += 1;
        }
        let avg_degree = if num_nodes > 0 {
            degree.values().sum::<usize>() as f64 / num_nodes as f64
        } else {
            0.0
        };

        GraphStats { num_nodes, num_edges, oldest_node, newest_node, avg_degree }
    }

    /// Flat dump of every node and edge, for visualization or external
    /// reporting.
    pub fn export(&self) -> GraphExport {
        let inner = self.inner.read();
        let nodes = inner
            .nodes
            .iter()
            .map(|(id, node)| (id.clone(), node.data.clone(), node.timestamp))
            .collect();
        let edges = inner.edges.values().cloned().collect();
        let stats = self.compute_stats(&inner);
        GraphExport { nodes, edges, stats }
    }
}
