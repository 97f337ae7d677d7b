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

//! Wires the agents, coordinator, and knowledge graph into one engine
//! with an `ingest`/`analyze`/`subscribe` surface (§6).

pub mod engine;
pub mod result;

pub use engine::Engine;
pub use result::{AnalysisMetadata, AnalysisResult, KnowledgeGraphSummary};
