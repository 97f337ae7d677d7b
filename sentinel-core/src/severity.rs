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

//! The severity score formula from §4.8: a weighted blend of confidence,
//! magnitude, blast radius ("scope"), and novelty, each normalized to
//! `[0, 1]` before blending so no single input can dominate the sum.

use crate::types::SeverityLabel;

/// `0.4*confidence + 0.3*min(magnitude/10, 1) + 0.2*min(scope/5, 1) + 0.1*novelty`.
///
/// - `confidence` is assumed already in `[0, 1]`.
/// - `magnitude` is an unbounded deviation measure (e.g. a Z-score or a
///   percent change); it saturates the magnitude term once it reaches `10`.
/// - `scope` counts how many sources/agents corroborated the anomaly; it
///   saturates the scope term at `5`.
/// - `novelty` is `None` when the caller's [`AgentConfig::novelty_detection`]
///   is disabled (the default) -- the novelty term then contributes `0`,
///   *not* `0.1`, to the score. See DESIGN.md for why this seam exists.
///
/// [`AgentConfig::novelty_detection`]: crate::config::AgentConfig::novelty_detection
pub fn calculate(confidence: f64, magnitude: f64, scope: f64, novelty: Option<bool>) -> f64 {
    let confidence_term = 0.4 * confidence.clamp(0.0, 1.0);
    let magnitude_term = 0.3 * (magnitude.max(0.0) / 10.0).min(1.0);
    let scope_term = 0.2 * (scope.max(0.0) / 5.0).min(1.0);
    let novelty_term = 0.1 * if novelty.unwrap_or(false) { 1.0 } else { 0.0 };
    (confidence_term + magnitude_term + scope_term + novelty_term).clamp(0.0, 1.0)
}

/// Convenience: `calculate` plus the derived [`SeverityLabel`].
pub fn calculate_with_label(
    confidence: f64,
    magnitude: f64,
    scope: f64,
    novelty: Option<bool>,
) -> (f64, SeverityLabel) {
    let score = calculate(confidence, magnitude, scope, novelty);
    (score, SeverityLabel::from_score(score))
}
