//! Runtime configuration, loadable from a TOML file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Top-level configuration. Every field has a default so a missing or empty
/// config file yields a working daemon.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub scorer: ScorerConfig,
    pub orchestrator: OrchestratorConfig,
    pub policy: PolicyConfig,
}

impl Config {
    /// Load configuration from a TOML file. A missing file is not an error;
    /// defaults are used and a note is logged.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!(path = %path.display(), "No config file found, using defaults");
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Config = toml::from_str(&raw)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        Ok(config)
    }
}

/// Anomaly scorer knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScorerConfig {
    /// Sliding history capacity; oldest sample evicted on overflow.
    pub window_size: usize,
    /// Samples required before the first model training. Below this the
    /// scorer stays in cold start and flags nothing.
    pub min_training_samples: usize,
    /// Retrain cadence after the first training.
    pub retrain_every_n_samples: usize,
    /// Expected fraction of training data that is anomalous. Sets the
    /// outlier decision threshold.
    pub contamination: f64,
    /// Verdicts scoring below this are Critical; otherwise Warning. Decision
    /// values bottom out around -(1 + contamination quantile), roughly -0.45
    /// for a tight window, so the default sits well inside that range.
    pub critical_threshold: f64,
    /// Number of trees in the isolation forest.
    pub n_trees: usize,
    /// RNG seed for tree construction, kept fixed for reproducible runs.
    pub random_seed: u64,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            window_size: default_window_size(),
            min_training_samples: default_min_training_samples(),
            retrain_every_n_samples: default_retrain_every(),
            contamination: default_contamination(),
            critical_threshold: default_critical_threshold(),
            n_trees: default_n_trees(),
            random_seed: default_random_seed(),
        }
    }
}

fn default_window_size() -> usize {
    100
}
fn default_min_training_samples() -> usize {
    20
}
fn default_retrain_every() -> usize {
    50
}
fn default_contamination() -> f64 {
    0.1
}
fn default_critical_threshold() -> f64 {
    -0.25
}
fn default_n_trees() -> usize {
    100
}
fn default_random_seed() -> u64 {
    42
}

/// Remediation orchestrator knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Minimum seconds between two dispatches for the same anomaly type.
    pub cooldown_seconds: u64,
    /// Opaque identifier handed to the action handler (e.g. deployment name).
    pub target: String,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            cooldown_seconds: 60,
            target: "default-service".to_string(),
        }
    }
}

/// Metric-value gates for the remediation decision table. A statistically
/// anomalous sample whose triggering value does not clear its gate yields no
/// action.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    pub cpu_scale_up_pct: f64,
    pub memory_scale_up_pct: f64,
    pub response_time_cache_ms: f64,
    pub error_rate_breaker_pct: f64,
    pub throughput_floor_rps: f64,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            cpu_scale_up_pct: 80.0,
            memory_scale_up_pct: 85.0,
            response_time_cache_ms: 800.0,
            error_rate_breaker_pct: 5.0,
            throughput_floor_rps: 10.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let c = Config::default();
        assert_eq!(c.scorer.window_size, 100);
        assert_eq!(c.scorer.min_training_samples, 20);
        assert_eq!(c.scorer.critical_threshold, -0.25);
        assert_eq!(c.orchestrator.cooldown_seconds, 60);
        assert_eq!(c.policy.cpu_scale_up_pct, 80.0);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let c: Config = toml::from_str(
            r#"
            [scorer]
            window_size = 50

            [orchestrator]
            cooldown_seconds = 5
            "#,
        )
        .unwrap();
        assert_eq!(c.scorer.window_size, 50);
        assert_eq!(c.scorer.min_training_samples, 20);
        assert_eq!(c.orchestrator.cooldown_seconds, 5);
        assert_eq!(c.policy.response_time_cache_ms, 800.0);
    }
}
