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

//! Sentinel Core
//!
//! Data model, configuration, and numeric primitives shared by every
//! detector, agent, and coordinator crate in the workspace.

pub mod config;
pub mod error;
pub mod fingerprint;
pub mod id;
pub mod rate_limiter;
pub mod severity;
pub mod stats;
pub mod types;

pub use config::SentinelConfig;
pub use error::{Result, SentinelError};
pub use fingerprint::{anomaly_signature, bucket_magnitude, fingerprint};
pub use id::anomaly_id;
pub use rate_limiter::RateLimiter;
pub use types::{
    AgentAnomaly, AnomalyReport, Counterfactual, DataPoint, Detection, EdgeType, GraphEdge,
    Metadata, SeverityLabel,
};
