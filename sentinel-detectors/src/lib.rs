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

//! Sentinel Detectors
//!
//! The one-dimensional statistical and temporal detector families, and
//! the ensemble layer that combines the statistical detectors into a
//! consensus pass.

pub mod detector;
pub mod ensemble;
pub mod statistical;
pub mod temporal;

pub use detector::{Detector, Series};
pub use ensemble::EnsembleStatisticalDetector;
pub use statistical::{CusumDetector, IqrDetector, ModifiedZScoreDetector, MovingAverageDetector, ZScoreDetector};
pub use temporal::{
    ChangePointDetector, ExponentialSmoothingDetector, MaCrossoverDetector, SeasonalAnomalyDetector,
    TrendAnomalyDetector,
};
