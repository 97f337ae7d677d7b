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

//! The deterministic anomaly ID: `{source}_{metric}_{YYYYMMDD_HHMMSS}`.
//!
//! Unlike the graph's content fingerprints, this ID is meant to be
//! human-legible and stable across re-runs of the same detection cycle --
//! two runs over identical input produce identical IDs, which the
//! coordinator's determinism tests rely on.

use chrono::{DateTime, Utc};

/// Non-alphanumeric characters are replaced with `-` so the ID stays safe
/// to use as a file name or URL path segment.
fn sanitize(component: &str) -> String {
    component
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect()
}

pub fn anomaly_id(source: &str, metric: &str, timestamp: DateTime<Utc>) -> String {
    format!(
        "{}_{}_{}",
        sanitize(source),
        sanitize(metric),
        timestamp.format("%Y%m%d_%H%M%S")
    )
}
