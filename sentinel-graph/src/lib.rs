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

//! Sentinel Graph
//!
//! The temporal knowledge graph (§4.6): a bounded, in-memory directed
//! multigraph of accepted anomalies, guarded by a single reader-writer
//! lock per the Design Notes in SPEC_FULL.md §9.

pub mod graph;

pub use graph::{
    AnomalyContext, CausalStep, GraphExport, GraphStats, KnowledgeGraph, NodeData,
    RelatedAnomaly, SimilarAnomaly, TemporalNeighbor,
};
