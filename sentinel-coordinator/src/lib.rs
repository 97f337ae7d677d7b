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

//! The consensus and synthesis stage: turns one cycle's flattened agent
//! anomalies into accepted, explained [`AnomalyReport`](sentinel_core::AnomalyReport)s
//! and publishes them (plus their derived relationships) into the
//! knowledge graph.

pub mod coordinator;
pub mod counterfactual;
pub mod narrative;
pub mod relationships;

pub use coordinator::Coordinator;
pub use narrative::{Narrator, ReportDraft, TemplateNarrator};
