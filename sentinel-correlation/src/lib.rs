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

//! Cross-source correlation analysis: pairwise Pearson/Spearman
//! correlation over aligned series, correlation-break detection against a
//! historical baseline, and simultaneous-anomaly detection across
//! sources sharing a timestamp.

pub mod engine;

pub use engine::{CorrelationAnomaly, CorrelationEngine, CorrelationPair, CorrelationReport};
