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

//! Counterfactual scenario generation (§4.5, §4.8): up to five
//! deterministic "what if" scenarios derived from whichever
//! method-specific fields happen to be present on the group's
//! representative anomaly.

use sentinel_core::{AgentAnomaly, Counterfactual};

const MAX_COUNTERFACTUALS: usize = 5;

/// Builds every applicable scenario for `representative`, in the fixed
/// order expected-value, threshold-to-cross, trend-continuation,
/// no-regime-change, seasonal-expected, then truncates to
/// [`MAX_COUNTERFACTUALS`]. A representative missing all the relevant
/// fields (e.g. a context-agent anomaly) yields an empty list.
pub fn derive(representative: &AgentAnomaly) -> Vec<Counterfactual> {
    let mut scenarios = Vec::with_capacity(MAX_COUNTERFACTUALS);
    let aux = &representative.auxiliary;
    let value = representative.value;

    if let Some(expected) = aux.get("expected_value").and_then(|v| v.as_f64()) {
        scenarios.push(Counterfactual {
            title: "Expected value".to_string(),
            description: format!(
                "Had the series followed its expected baseline of {expected:.4} instead of the observed {value:.4}, this would not have been flagged."
            ),
            impacted_quantity: representative.metric.clone(),
        });
    }

    if let Some(threshold) = aux.get("threshold").and_then(|v| v.as_f64()) {
        let deviation = aux.get("deviation").and_then(|v| v.as_f64()).unwrap_or((value).abs());
        let distance = (deviation - threshold).max(0.0);
        scenarios.push(Counterfactual {
            title: "Threshold to cross back".to_string(),
            description: format!(
                "The observed deviation would need to shrink by approximately {distance:.4} to fall back under the {threshold:.4} detection threshold."
            ),
            impacted_quantity: representative.metric.clone(),
        });
    }

    if let (Some(global_slope), Some(local_slope)) = (
        aux.get("global_slope").and_then(|v| v.as_f64()),
        aux.get("local_slope").and_then(|v| v.as_f64()),
    ) {
        scenarios.push(Counterfactual {
            title: "Trend continuation".to_string(),
            description: format!(
                "If the local trend had continued the global slope of {global_slope:.4} instead of shifting to {local_slope:.4}, no deviation would have been observed."
            ),
            impacted_quantity: representative.metric.clone(),
        });
    }

    if let (Some(mean_before), Some(mean_after)) = (
        aux.get("mean_before").and_then(|v| v.as_f64()),
        aux.get("mean_after").and_then(|v| v.as_f64()),
    ) {
        scenarios.push(Counterfactual {
            title: "No regime change".to_string(),
            description: format!(
                "Absent the detected regime change, the series would have stayed near its prior mean of {mean_before:.4} rather than shifting to {mean_after:.4}."
            ),
            impacted_quantity: representative.metric.clone(),
        });
    }

    if let Some(seasonal_component) = aux.get("seasonal_component").and_then(|v| v.as_f64()) {
        scenarios.push(Counterfactual {
            title: "Seasonal expectation".to_string(),
            description: format!(
                "Had the series matched its seasonal profile (expected component {seasonal_component:.4}), the residual would not have crossed the detection threshold."
            ),
            impacted_quantity: representative.metric.clone(),
        });
    }

    scenarios.truncate(MAX_COUNTERFACTUALS);
    scenarios
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use sentinel_core::{Metadata, SeverityLabel};
    use std::collections::BTreeSet;

    fn representative_with(fields: &[(&str, f64)]) -> AgentAnomaly {
        let mut auxiliary = Metadata::new();
        for (key, value) in fields {
            auxiliary.insert(key.to_string(), (*value).into());
        }
        AgentAnomaly {
            agent_name: "StatisticalAgent".to_string(),
            agent_weight: 1.0,
            source: "cryptocurrency".to_string(),
            metric: "price_usd".to_string(),
            symbol: None,
            timestamp: DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap(),
            value: 500.0,
            confidence: 0.9,
            severity_label: SeverityLabel::High,
            severity_score: 0.8,
            detection_methods: BTreeSet::from(["zscore".to_string()]),
            explanation: String::new(),
            auxiliary,
        }
    }

    #[test]
    fn no_known_fields_yields_no_scenarios() {
        let representative = representative_with(&[]);
        assert!(derive(&representative).is_empty());
    }

    #[test]
    fn expected_value_field_yields_one_scenario() {
        let representative = representative_with(&[("expected_value", 10.0)]);
        let scenarios = derive(&representative);
        assert_eq!(scenarios.len(), 1);
        assert_eq!(scenarios[0].title, "Expected value");
    }

    #[test]
    fn every_known_field_combines_up_to_the_cap() {
        let representative = representative_with(&[
            ("expected_value", 10.0),
            ("threshold", 3.0),
            ("deviation", 6.0),
            ("global_slope", 1.0),
            ("local_slope", 5.0),
            ("mean_before", 10.0),
            ("mean_after", 40.0),
            ("seasonal_component", 2.0),
        ]);
        let scenarios = derive(&representative);
        assert_eq!(scenarios.len(), MAX_COUNTERFACTUALS);
    }
}
