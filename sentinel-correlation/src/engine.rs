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

//! The pairwise correlation pass: group by `(source, metric)`, align
//! every pair on exact timestamp matches, and surface both static
//! correlation strength and two kinds of cross-source anomaly.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Timelike, Utc};
use sentinel_core::{config::CorrelationConfig, severity, DataPoint, SeverityLabel};

type SeriesKey = (String, String);

/// One entry of the pairwise correlation matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationPair {
    pub source1: String,
    pub metric1: String,
    pub source2: String,
    pub metric2: String,
    pub pearson: f64,
    pub pearson_pvalue: f64,
    pub spearman: f64,
    pub spearman_pvalue: f64,
    pub data_points: usize,
    pub significant: bool,
}

/// A cross-source finding: either a pair's correlation breaking down
/// relative to its historical value, or several sources anomalous at the
/// same moment.
#[derive(Debug, Clone, PartialEq)]
pub enum CorrelationAnomaly {
    CorrelationBreak {
        source1: String,
        metric1: String,
        source2: String,
        metric2: String,
        timestamp: DateTime<Utc>,
        value1: f64,
        value2: f64,
        historical_correlation: f64,
        current_correlation: f64,
        correlation_change: f64,
        confidence: f64,
        severity_score: f64,
        severity_label: SeverityLabel,
        explanation: String,
    },
    SimultaneousAnomaly {
        timestamp: DateTime<Utc>,
        affected_sources: Vec<String>,
        point_count: usize,
        confidence: f64,
        severity_score: f64,
        severity_label: SeverityLabel,
        explanation: String,
    },
}

impl CorrelationAnomaly {
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            CorrelationAnomaly::CorrelationBreak { timestamp, .. } => *timestamp,
            CorrelationAnomaly::SimultaneousAnomaly { timestamp, .. } => *timestamp,
        }
    }

    pub fn confidence(&self) -> f64 {
        match self {
            CorrelationAnomaly::CorrelationBreak { confidence, .. } => *confidence,
            CorrelationAnomaly::SimultaneousAnomaly { confidence, .. } => *confidence,
        }
    }
}

/// The full output of one correlation pass: the pairwise matrix plus
/// whatever anomalies it surfaced.
#[derive(Debug, Clone, Default)]
pub struct CorrelationReport {
    pub matrix: Vec<CorrelationPair>,
    pub anomalies: Vec<CorrelationAnomaly>,
}

/// Detects cross-source correlations and the anomalies they imply.
pub struct CorrelationEngine {
    config: CorrelationConfig,
}

impl CorrelationEngine {
    pub fn new(config: CorrelationConfig) -> Self {
        Self { config }
    }

    /// Runs the full pass: `historical` plus `current` are combined and
    /// grouped before alignment (a correlation break needs a baseline
    /// that predates the window it's broken in), but anomalies are
    /// filtered back down to ones timestamped within `current`'s span.
    pub fn analyze(&self, current: &[DataPoint], historical: &[DataPoint]) -> CorrelationReport {
        let mut all: Vec<&DataPoint> = Vec::with_capacity(current.len() + historical.len());
        all.extend(historical.iter());
        all.extend(current.iter());

        let grouped = Self::group(&all);
        let keys: Vec<&SeriesKey> = grouped.keys().collect();

        let mut matrix = Vec::new();
        let mut anomalies = Vec::new();

        for (i, &key1) in keys.iter().enumerate() {
            for &key2 in keys.iter().skip(i + 1) {
                let aligned = Self::align(&grouped[key1], &grouped[key2]);
                if aligned.len() < self.config.window_size {
                    continue;
                }

                let Some(pair) = self.correlation_pair(key1, key2, &aligned) else {
                    continue;
                };

                for anomaly in self.detect_correlation_breaks(key1, key2, &aligned, pair.pearson) {
                    if self.is_recent(anomaly.timestamp(), current) {
                        anomalies.push(anomaly);
                    }
                }
                matrix.push(pair);
            }
        }

        anomalies.extend(self.detect_simultaneous_anomalies(current));

        CorrelationReport { matrix, anomalies }
    }

    fn group(points: &[&DataPoint]) -> BTreeMap<SeriesKey, Vec<(DateTime<Utc>, f64)>> {
        let mut grouped: BTreeMap<SeriesKey, Vec<(DateTime<Utc>, f64)>> = BTreeMap::new();
        for point in points {
            grouped
                .entry(point.source_metric_key())
                .or_default()
                .push((point.timestamp, point.value));
        }
        for series in grouped.values_mut() {
            series.sort_by_key(|(ts, _)| *ts);
        }
        grouped
    }

    /// Aligns two series on exact timestamp matches, sorted by time.
    fn align(a: &[(DateTime<Utc>, f64)], b: &[(DateTime<Utc>, f64)]) -> Vec<(DateTime<Utc>, f64, f64)> {
        let map_b: HashMap<DateTime<Utc>, f64> = b.iter().copied().map(|(ts, v)| (ts, v)).collect();
        let mut aligned: Vec<(DateTime<Utc>, f64, f64)> = a
            .iter()
            .filter_map(|(ts, v1)| map_b.get(ts).map(|v2| (*ts, *v1, *v2)))
            .collect();
        aligned.sort_by_key(|(ts, _, _)| *ts);
        aligned
    }

    fn correlation_pair(&self, key1: &SeriesKey, key2: &SeriesKey, aligned: &[(DateTime<Utc>, f64, f64)]) -> Option<CorrelationPair> {
        if aligned.len() < 3 {
            return None;
        }
        let values1: Vec<f64> = aligned.iter().map(|(_, v1, _)| *v1).collect();
        let values2: Vec<f64> = aligned.iter().map(|(_, _, v2)| *v2).collect();

        let pearson = sentinel_core::stats::pearson(&values1, &values2);
        let spearman = sentinel_core::stats::spearman(&values1, &values2);
        let n = aligned.len();

        Some(CorrelationPair {
            source1: key1.0.clone(),
            metric1: key1.1.clone(),
            source2: key2.0.clone(),
            metric2: key2.1.clone(),
            pearson,
            pearson_pvalue: sentinel_core::stats::correlation_p_value(pearson, n),
            spearman,
            spearman_pvalue: sentinel_core::stats::correlation_p_value(spearman, n),
            data_points: n,
            significant: pearson.abs() >= self.config.pearson_threshold,
        })
    }

    /// Slides a `window_size` window over `aligned` and flags any window
    /// whose own Pearson correlation has drifted from `historical_pearson`
    /// by at least `break_threshold`.
    ///
    /// `historical_pearson` is the correlation over the *entire* combined
    /// series, including the span the sliding window walks over -- a
    /// window near the end of a long, stable series is compared against a
    /// baseline partly made of itself. This is intentional: a genuinely
    /// out-of-sample baseline would need a held-out history window
    /// disjoint from every window this scan walks, which isn't what's
    /// computed here.
    fn detect_correlation_breaks(
        &self,
        key1: &SeriesKey,
        key2: &SeriesKey,
        aligned: &[(DateTime<Utc>, f64, f64)],
        historical_pearson: f64,
    ) -> Vec<CorrelationAnomaly> {
        let mut out = Vec::new();
        if aligned.len() < self.config.window_size * 2 {
            return out;
        }
        if historical_pearson.abs() < self.config.pearson_threshold {
            return out;
        }

        for i in self.config.window_size..aligned.len() {
            let window = &aligned[i - self.config.window_size..i];
            let values1: Vec<f64> = window.iter().map(|(_, v1, _)| *v1).collect();
            let values2: Vec<f64> = window.iter().map(|(_, _, v2)| *v2).collect();
            let current_corr = sentinel_core::stats::pearson(&values1, &values2);

            let corr_change = (current_corr - historical_pearson).abs();
            if corr_change < self.config.break_threshold {
                continue;
            }
            let confidence = (corr_change / self.config.break_threshold).min(1.0);
            if confidence < self.config.min_confidence {
                continue;
            }

            let (severity_score, severity_label) = severity::calculate_with_label(confidence, corr_change * 10.0, 2.0, None);
            let (timestamp, value1, value2) = aligned[i];

            out.push(CorrelationAnomaly::CorrelationBreak {
                source1: key1.0.clone(),
                metric1: key1.1.clone(),
                source2: key2.0.clone(),
                metric2: key2.1.clone(),
                timestamp,
                value1,
                value2,
                historical_correlation: historical_pearson,
                current_correlation: current_corr,
                correlation_change: corr_change,
                confidence,
                severity_score,
                severity_label,
                explanation: format!(
                    "Correlation between {} {} and {} {} broke down. Historical correlation: {:.2}, current: {:.2}.",
                    key1.0, key1.1, key2.0, key2.1, historical_pearson, current_corr
                ),
            });
        }
        out
    }

    /// Buckets `current` points by minute and flags any bucket touching
    /// at least two distinct sources.
    fn detect_simultaneous_anomalies(&self, current: &[DataPoint]) -> Vec<CorrelationAnomaly> {
        let mut buckets: BTreeMap<DateTime<Utc>, Vec<&DataPoint>> = BTreeMap::new();
        for point in current {
            let bucket = point
                .timestamp
                .with_second(0)
                .and_then(|ts| ts.with_nanosecond(0))
                .unwrap_or(point.timestamp);
            buckets.entry(bucket).or_default().push(point);
        }

        let mut out = Vec::new();
        for (timestamp, points) in buckets {
            if points.len() < 2 {
                continue;
            }
            let sources: std::collections::BTreeSet<&str> = points.iter().map(|p| p.source.as_str()).collect();
            if sources.len() < 2 {
                continue;
            }

            let confidence = (sources.len() as f64 / 3.0).min(1.0);
            if confidence < self.config.min_confidence {
                continue;
            }

            let (severity_score, severity_label) = severity::calculate_with_label(confidence, 5.0, sources.len() as f64, None);
            let affected_sources: Vec<String> = sources.iter().map(|s| s.to_string()).collect();

            out.push(CorrelationAnomaly::SimultaneousAnomaly {
                timestamp,
                point_count: points.len(),
                explanation: format!(
                    "Simultaneous anomaly detected across {} sources: {} at {}.",
                    sources.len(),
                    affected_sources.join(", "),
                    timestamp.format("%Y-%m-%d %H:%M")
                ),
                affected_sources,
                confidence,
                severity_score,
                severity_label,
            });
        }
        out
    }

    /// A break anomaly is kept only if it falls at or after the earliest
    /// timestamp in `current` -- an empty `current` keeps everything.
    fn is_recent(&self, timestamp: DateTime<Utc>, current: &[DataPoint]) -> bool {
        match current.iter().map(|p| p.timestamp).min() {
            Some(earliest) => timestamp >= earliest,
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn point(source: &str, metric: &str, value: f64, ts: DateTime<Utc>) -> DataPoint {
        DataPoint::new(source, metric, value, ts)
    }

    fn base_time() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z").unwrap().with_timezone(&Utc)
    }

    fn engine() -> CorrelationEngine {
        CorrelationEngine::new(CorrelationConfig::default())
    }

    #[test]
    fn strongly_correlated_pair_is_flagged_significant() {
        let t0 = base_time();
        let mut a = Vec::new();
        let mut b = Vec::new();
        for i in 0..40 {
            let ts = t0 + Duration::seconds(i);
            a.push(point("src_a", "m", i as f64, ts));
            b.push(point("src_b", "m", 2.0 * i as f64, ts));
        }
        let all: Vec<DataPoint> = a.into_iter().chain(b).collect();
        let report = engine().analyze(&all, &[]);
        assert_eq!(report.matrix.len(), 1);
        assert!(report.matrix[0].significant);
        assert!((report.matrix[0].pearson - 1.0).abs() < 1e-9);
    }

    #[test]
    fn unrelated_pair_is_not_significant() {
        let t0 = base_time();
        let mut a = Vec::new();
        let mut b = Vec::new();
        let pattern = [1.0, -1.0];
        for i in 0..40 {
            let ts = t0 + Duration::seconds(i);
            a.push(point("src_a", "m", pattern[i % 2], ts));
            b.push(point("src_b", "m", pattern[(i + 1) % 2], ts));
        }
        let all: Vec<DataPoint> = a.into_iter().chain(b).collect();
        let report = engine().analyze(&all, &[]);
        assert_eq!(report.matrix.len(), 1);
        assert!(!report.matrix[0].significant);
    }

    #[test]
    fn short_series_produce_no_matrix_entry() {
        let t0 = base_time();
        let all = vec![
            point("src_a", "m", 1.0, t0),
            point("src_b", "m", 2.0, t0),
        ];
        let report = engine().analyze(&all, &[]);
        assert!(report.matrix.is_empty());
        assert!(report.anomalies.is_empty());
    }

    #[test]
    fn simultaneous_anomaly_requires_two_distinct_sources_same_minute() {
        let t0 = base_time();
        let current = vec![
            point("src_a", "m1", 100.0, t0),
            point("src_b", "m2", 200.0, t0 + Duration::seconds(5)),
        ];
        let report = engine().analyze(&current, &[]);
        let simultaneous: Vec<_> = report
            .anomalies
            .iter()
            .filter(|a| matches!(a, CorrelationAnomaly::SimultaneousAnomaly { .. }))
            .collect();
        assert_eq!(simultaneous.len(), 1);
        if let CorrelationAnomaly::SimultaneousAnomaly { affected_sources, .. } = simultaneous[0] {
            assert_eq!(affected_sources.len(), 2);
        }
    }

    #[test]
    fn same_source_same_minute_is_not_simultaneous() {
        let t0 = base_time();
        let current = vec![
            point("src_a", "m1", 100.0, t0),
            point("src_a", "m2", 200.0, t0 + Duration::seconds(5)),
        ];
        let report = engine().analyze(&current, &[]);
        assert!(report.anomalies.is_empty());
    }

    #[test]
    fn correlation_break_is_detected_when_relationship_decays() {
        let t0 = base_time();
        let mut a = Vec::new();
        let mut b = Vec::new();
        // First half: tightly correlated. Second half: decoupled.
        for i in 0..60 {
            let ts = t0 + Duration::seconds(i);
            let av = i as f64;
            let bv = if i < 30 { 2.0 * i as f64 } else { -2.0 * i as f64 };
            a.push(point("src_a", "price", av, ts));
            b.push(point("src_b", "oi", bv, ts));
        }
        let all: Vec<DataPoint> = a.into_iter().chain(b).collect();
        let engine = CorrelationEngine::new(CorrelationConfig {
            window_size: 10,
            break_threshold: 0.2,
            min_confidence: 0.3,
            ..CorrelationConfig::default()
        });
        let report = engine.analyze(&all, &[]);
        let breaks: Vec<_> = report
            .anomalies
            .iter()
            .filter(|a| matches!(a, CorrelationAnomaly::CorrelationBreak { .. }))
            .collect();
        assert!(!breaks.is_empty());
    }
}
