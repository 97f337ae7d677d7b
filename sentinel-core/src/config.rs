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

//! Configuration surface for the detection core.
//!
//! Every detector, agent, and the coordinator take an injected, immutable
//! configuration value at construction instead of reading a global --
//! the rewrite rule from the Design Notes. A [`SentinelConfig`] can be
//! built purely in-process (`SentinelConfig::default()`) or loaded once
//! from a TOML document; after construction it is never mutated.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{Result, SentinelError};

/// Z-score detector threshold (default `T = 3.0`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ZScoreConfig {
    pub threshold: f64,
}

impl Default for ZScoreConfig {
    fn default() -> Self {
        Self { threshold: 3.0 }
    }
}

/// Modified Z-score (median/MAD) detector threshold (default `3.5`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ModifiedZScoreConfig {
    pub threshold: f64,
}

impl Default for ModifiedZScoreConfig {
    fn default() -> Self {
        Self { threshold: 3.5 }
    }
}

/// IQR detector multiplier (default `k = 1.5`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct IqrConfig {
    pub multiplier: f64,
}

impl Default for IqrConfig {
    fn default() -> Self {
        Self { multiplier: 1.5 }
    }
}

/// CUSUM threshold and drift allowance (defaults `5.0` / `0.5`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct CusumConfig {
    pub threshold: f64,
    pub drift: f64,
}

impl Default for CusumConfig {
    fn default() -> Self {
        Self {
            threshold: 5.0,
            drift: 0.5,
        }
    }
}

/// Statistical-family moving-average detector (window `W`, threshold `T`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct MovingAverageConfig {
    pub window: usize,
    pub threshold: f64,
}

impl Default for MovingAverageConfig {
    fn default() -> Self {
        Self {
            window: 10,
            threshold: 3.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct StatisticalConfig {
    pub zscore: ZScoreConfig,
    pub modified_zscore: ModifiedZScoreConfig,
    pub iqr: IqrConfig,
    pub cusum: CusumConfig,
    pub moving_average: MovingAverageConfig,
    /// Minimum number of detectors that must agree for the ensemble to
    /// keep a bucket (default `2`).
    pub ensemble_min_consensus: usize,
}

impl Default for StatisticalConfig {
    fn default() -> Self {
        Self {
            zscore: ZScoreConfig::default(),
            modified_zscore: ModifiedZScoreConfig::default(),
            iqr: IqrConfig::default(),
            cusum: CusumConfig::default(),
            moving_average: MovingAverageConfig::default(),
            ensemble_min_consensus: 2,
        }
    }
}

/// Binary-segmentation change-point detector.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ChangePointConfig {
    pub min_size: usize,
    pub penalty: f64,
}

impl Default for ChangePointConfig {
    fn default() -> Self {
        Self {
            min_size: 10,
            penalty: 10.0,
        }
    }
}

/// Trend-deviation detector (local-vs-global regression window).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendConfig {
    pub window: usize,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self { window: 10 }
    }
}

/// Seasonal decomposition detector (autocorrelation lag `P`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct SeasonalConfig {
    pub period: usize,
}

impl Default for SeasonalConfig {
    fn default() -> Self {
        Self { period: 24 }
    }
}

/// Exponential-smoothing residual detector (default `alpha = 0.3`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ExponentialSmoothingConfig {
    pub alpha: f64,
    pub warmup: usize,
}

impl Default for ExponentialSmoothingConfig {
    fn default() -> Self {
        Self {
            alpha: 0.3,
            warmup: 10,
        }
    }
}

/// Moving-average crossover detector (short vs. long window).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct MaCrossoverConfig {
    pub short_window: usize,
    pub long_window: usize,
    pub deviation_threshold: f64,
}

impl Default for MaCrossoverConfig {
    fn default() -> Self {
        Self {
            short_window: 5,
            long_window: 20,
            deviation_threshold: 0.15,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct TemporalConfig {
    pub changepoint: ChangePointConfig,
    pub trend: TrendConfig,
    pub seasonal: SeasonalConfig,
    pub exponential_smoothing: ExponentialSmoothingConfig,
    pub moving_average: MaCrossoverConfig,
}

impl Default for TemporalConfig {
    fn default() -> Self {
        Self {
            changepoint: ChangePointConfig::default(),
            trend: TrendConfig::default(),
            seasonal: SeasonalConfig::default(),
            exponential_smoothing: ExponentialSmoothingConfig::default(),
            moving_average: MaCrossoverConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrelationConfig {
    pub pearson_threshold: f64,
    pub spearman_threshold: f64,
    pub window_size: usize,
    pub break_threshold: f64,
    pub min_confidence: f64,
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self {
            pearson_threshold: 0.7,
            spearman_threshold: 0.7,
            window_size: 30,
            break_threshold: 0.3,
            min_confidence: 0.5,
        }
    }
}

/// `data_sources.oi_derivatives.divergence_detection.*`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct OiDivergenceConfig {
    pub price_threshold: f64,
    pub oi_threshold: f64,
    pub spike_threshold: f64,
}

impl Default for OiDivergenceConfig {
    fn default() -> Self {
        Self {
            price_threshold: 1.0,
            oi_threshold: 2.0,
            spike_threshold: 10.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct FundingConfig {
    pub moderate_threshold: f64,
    pub extreme_threshold: f64,
}

impl Default for FundingConfig {
    fn default() -> Self {
        Self {
            moderate_threshold: 0.05,
            extreme_threshold: 0.10,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct LongShortConfig {
    pub moderate_ratio: f64,
    pub extreme_ratio: f64,
}

impl Default for LongShortConfig {
    fn default() -> Self {
        Self {
            moderate_ratio: 2.0,
            extreme_ratio: 3.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct OiConfig {
    pub divergence: OiDivergenceConfig,
    pub funding: FundingConfig,
    pub long_short: LongShortConfig,
}

impl Default for OiConfig {
    fn default() -> Self {
        Self {
            divergence: OiDivergenceConfig::default(),
            funding: FundingConfig::default(),
            long_short: LongShortConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    pub max_nodes: usize,
    pub edge_expiry_hours: u64,
    pub similarity_threshold: f64,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            max_nodes: 1000,
            edge_expiry_hours: 168,
            similarity_threshold: 0.8,
        }
    }
}

/// Per-agent weight, acceptance threshold, and the (unused-by-default)
/// novelty-detection seam. See the Open Question resolution in DESIGN.md
/// for why `novelty_detection` exists but defaults to `false`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub weight: f64,
    pub min_confidence: f64,
    pub novelty_detection: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            weight: 1.0,
            min_confidence: 0.5,
            novelty_detection: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    pub consensus_threshold: f64,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            consensus_threshold: 0.6,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentsConfig {
    pub coordinator: CoordinatorConfig,
    pub per_agent: HashMap<String, AgentConfig>,
}

impl Default for AgentsConfig {
    fn default() -> Self {
        Self {
            coordinator: CoordinatorConfig::default(),
            per_agent: HashMap::new(),
        }
    }
}

impl AgentsConfig {
    /// Looks up the config for `agent_name`, falling back to
    /// [`AgentConfig::default`] when the caller never overrode it.
    pub fn for_agent(&self, agent_name: &str) -> AgentConfig {
        self.per_agent.get(agent_name).copied().unwrap_or_default()
    }
}

/// The top-level, immutable configuration value threaded through every
/// detector, agent, and the coordinator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SentinelConfig {
    pub agents: AgentsConfig,
    pub statistical: StatisticalConfig,
    pub temporal: TemporalConfig,
    pub correlation: CorrelationConfig,
    pub oi: OiConfig,
    pub knowledge_graph: GraphConfig,
}

impl SentinelConfig {
    /// Loads configuration from a TOML document, falling back to defaults
    /// for any key not present. A parse failure is a configuration error,
    /// surfaced only at startup (see §7 of SPEC_FULL.md) -- once a
    /// `SentinelConfig` exists the core never fails due to configuration
    /// again.
    pub fn from_toml_str(input: &str) -> Result<Self> {
        toml::from_str(input).map_err(|e| SentinelError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_recognized_keys() {
        let cfg = SentinelConfig::default();
        assert_eq!(cfg.agents.coordinator.consensus_threshold, 0.6);
        assert_eq!(cfg.statistical.zscore.threshold, 3.0);
        assert_eq!(cfg.statistical.modified_zscore.threshold, 3.5);
        assert_eq!(cfg.statistical.iqr.multiplier, 1.5);
        assert_eq!(cfg.statistical.cusum.threshold, 5.0);
        assert_eq!(cfg.statistical.cusum.drift, 0.5);
        assert_eq!(cfg.temporal.exponential_smoothing.alpha, 0.3);
        assert_eq!(cfg.correlation.pearson_threshold, 0.7);
        assert_eq!(cfg.correlation.spearman_threshold, 0.7);
        assert_eq!(cfg.correlation.window_size, 30);
        assert_eq!(cfg.correlation.break_threshold, 0.3);
        assert_eq!(cfg.knowledge_graph.max_nodes, 1000);
        assert_eq!(cfg.knowledge_graph.edge_expiry_hours, 168);
        assert_eq!(cfg.knowledge_graph.similarity_threshold, 0.8);
    }

    #[test]
    fn toml_overrides_merge_onto_defaults() {
        let cfg = SentinelConfig::from_toml_str(
            r#"
            [knowledge_graph]
            max_nodes = 50
            "#,
        )
        .unwrap();
        assert_eq!(cfg.knowledge_graph.max_nodes, 50);
        // Untouched keys keep their default.
        assert_eq!(cfg.knowledge_graph.similarity_threshold, 0.8);
        assert_eq!(cfg.correlation.window_size, 30);
    }

    #[test]
    fn agent_config_falls_back_to_default() {
        let cfg = SentinelConfig::default();
        let agent = cfg.agents.for_agent("StatisticalAgent");
        assert_eq!(agent.weight, 1.0);
        assert_eq!(agent.min_confidence, 0.5);
        assert!(!agent.novelty_detection);
    }
}
