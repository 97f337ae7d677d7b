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

//! Combines the statistical detector family into a single consensus
//! pass: a point only survives if at least `min_consensus` methods
//! independently flagged it.

use std::collections::BTreeMap;

use sentinel_core::{config::StatisticalConfig, stats, Detection};

use crate::detector::{Detector, Series};
use crate::statistical::{CusumDetector, IqrDetector, ModifiedZScoreDetector, ZScoreDetector};

pub struct EnsembleStatisticalDetector {
    detectors: Vec<Box<dyn Detector>>,
    min_consensus: usize,
}

impl EnsembleStatisticalDetector {
    pub fn new(config: &StatisticalConfig) -> Self {
        let detectors: Vec<Box<dyn Detector>> = vec![
            Box::new(ZScoreDetector::new(config.zscore)),
            Box::new(ModifiedZScoreDetector::new(config.modified_zscore)),
            Box::new(IqrDetector::new(config.iqr)),
            Box::new(CusumDetector::new(config.cusum)),
        ];
        Self { detectors, min_consensus: config.ensemble_min_consensus }
    }

    /// Runs every member detector and keeps only the indices at least
    /// `min_consensus` of them agreed on, with an averaged confidence and
    /// the set of contributing methods recorded on the result.
    pub fn detect(&self, series: &Series) -> Vec<Detection> {
        let mut by_index: BTreeMap<usize, Vec<Detection>> = BTreeMap::new();
        for detector in &self.detectors {
            for detection in detector.detect(series) {
                by_index.entry(detection.index).or_default().push(detection);
            }
        }

        let mut out = Vec::new();
        for (index, group) in by_index {
            if group.len() < self.min_consensus {
                continue;
            }
            let confidences: Vec<f64> = group.iter().map(|d| d.confidence).collect();
            let ensemble_confidence = stats::mean(&confidences);
            let methods: Vec<String> = group.iter().map(|d| d.method.clone()).collect();
            let deviation = group.iter().filter_map(|d| d.field_f64("deviation")).fold(0.0_f64, f64::max);

            let mut detection = Detection::new(index, group[0].value, ensemble_confidence, "ensemble");
            detection = detection
                .with_timestamp(group[0].timestamp)
                .with_field("consensus_count", group.len() as f64)
                .with_field("deviation", deviation)
                .with_field("methods", serde_json::to_value(&methods).unwrap_or_default())
                .with_field("individual_detections", serde_json::to_value(&group).unwrap_or_default());
            out.push(detection);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requires_min_consensus_to_keep_a_point() {
        let mut values = vec![10.0; 20];
        values[10] = 100.0;
        let config = StatisticalConfig::default();
        let ensemble = EnsembleStatisticalDetector::new(&config);
        let detections = ensemble.detect(&Series::from_values(values));
        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].index, 10);
        assert_eq!(detections[0].method, "ensemble");
    }

    #[test]
    fn normal_series_produces_no_ensemble_detections() {
        let values = vec![10.0; 20];
        let config = StatisticalConfig::default();
        let ensemble = EnsembleStatisticalDetector::new(&config);
        assert!(ensemble.detect(&Series::from_values(values)).is_empty());
    }
}
