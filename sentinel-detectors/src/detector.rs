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

//! The shared shape every one-dimensional detector implements: a tagged
//! variant over [`Detector`], not a class hierarchy (§9's "tagged variant,
//! not inheritance" design rule).

use chrono::{DateTime, Utc};
use sentinel_core::Detection;

/// A single source/metric's values paired with their domain timestamps.
///
/// `timestamps[i]` is the timestamp of `values[i]`, or `None` if the
/// caller didn't have one -- detectors never synthesize a timestamp of
/// their own (`Utc::now()` never appears in this crate).
#[derive(Debug, Clone, Default)]
pub struct Series {
    pub values: Vec<f64>,
    pub timestamps: Vec<Option<DateTime<Utc>>>,
}

impl Series {
    pub fn new(values: Vec<f64>, timestamps: Vec<Option<DateTime<Utc>>>) -> Self {
        debug_assert_eq!(values.len(), timestamps.len());
        Self { values, timestamps }
    }

    /// Builds a series with no timestamps, for callers that only care
    /// about index-based detection (most unit tests).
    pub fn from_values(values: Vec<f64>) -> Self {
        let timestamps = vec![None; values.len()];
        Self { values, timestamps }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn timestamp_at(&self, index: usize) -> Option<DateTime<Utc>> {
        self.timestamps.get(index).copied().flatten()
    }
}

/// A single one-dimensional anomaly detection method.
///
/// Every detector guards its own minimum sample size and any
/// divide-by-zero condition (constant series, zero IQR, ...) by returning
/// an empty `Vec` -- detectors never error, per §7.
pub trait Detector {
    /// Stable identifier written into `Detection::method`, e.g. `"zscore"`.
    fn method(&self) -> &'static str;

    fn detect(&self, series: &Series) -> Vec<Detection>;
}
