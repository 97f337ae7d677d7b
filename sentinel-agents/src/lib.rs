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

//! The five concurrent detection specialists and the orchestrator that
//! fans a batch out across all of them: statistical, temporal,
//! correlation, contextual, and open-interest derivatives.

pub mod agent;
pub mod context_agent;
pub mod correlation_agent;
pub mod oi_agent;
pub mod orchestrator;
pub mod statistical_agent;
pub mod temporal_agent;

pub use agent::{Agent, AgentResult};
pub use context_agent::ContextAgent;
pub use correlation_agent::CorrelationAgent;
pub use oi_agent::OiAgent;
pub use orchestrator::{AgentOrchestrator, CycleOutcome};
pub use statistical_agent::StatisticalAgent;
pub use temporal_agent::TemporalAgent;
