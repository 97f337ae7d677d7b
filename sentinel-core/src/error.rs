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

//! Error taxonomy for the detection core.
//!
//! Per §7 of SPEC_FULL.md, most of the taxonomy described in the spec
//! (input deficiency, numeric failure, agent failure, graph
//! inconsistency) is deliberately **not** represented here -- those are
//! empty-result / no-op / logged-warning outcomes, not `Result::Err`
//! paths. `SentinelError` only covers the two things the spec treats as
//! real errors: configuration problems (surfaced once, at construction)
//! and graph-capacity misconfiguration that would make the graph
//! unusable.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SentinelError>;

#[derive(Debug, Error)]
pub enum SentinelError {
    /// A configuration value could not be parsed or was internally
    /// inconsistent. Per §7, configuration errors are surfaced only at
    /// startup -- once a `SentinelConfig` is constructed successfully,
    /// nothing in the core fails due to configuration again.
    #[error("configuration error: {0}")]
    Config(String),

    /// A knowledge graph was constructed with a capacity that can never
    /// hold a single node (e.g. `max_nodes == 0`).
    #[error("invalid knowledge graph capacity: {0}")]
    InvalidGraphCapacity(String),
}
