//! The remediation decision table.
//!
//! Policy is data: each rule pairs an anomaly type with a value gate and the
//! action to take when the gate clears. Dispatch code never inspects metric
//! values directly.

use crate::config::PolicyConfig;
use crate::detect::AnomalyType;
use crate::remediate::ActionType;
use crate::sample::MetricField;

/// Direction of a rule's value gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    /// Rule fires when the triggering value exceeds the threshold.
    Above,
    /// Rule fires when the triggering value falls below the threshold.
    Below,
}

#[derive(Debug, Clone)]
pub struct DecisionRule {
    pub anomaly_type: AnomalyType,
    pub gate: Gate,
    pub threshold: f64,
    pub action: ActionType,
}

impl DecisionRule {
    fn fires(&self, value: f64) -> bool {
        match self.gate {
            Gate::Above => value > self.threshold,
            Gate::Below => value < self.threshold,
        }
    }
}

/// Lookup table from anomaly type + triggering value to an action.
#[derive(Debug, Clone)]
pub struct DecisionTable {
    rules: Vec<DecisionRule>,
}

impl DecisionTable {
    pub fn from_config(policy: &PolicyConfig) -> Self {
        Self {
            rules: vec![
                DecisionRule {
                    anomaly_type: MetricField::CpuUsage,
                    gate: Gate::Above,
                    threshold: policy.cpu_scale_up_pct,
                    action: ActionType::ScaleUp,
                },
                DecisionRule {
                    anomaly_type: MetricField::MemoryUsage,
                    gate: Gate::Above,
                    threshold: policy.memory_scale_up_pct,
                    action: ActionType::ScaleUp,
                },
                DecisionRule {
                    anomaly_type: MetricField::ResponseTime,
                    gate: Gate::Above,
                    threshold: policy.response_time_cache_ms,
                    action: ActionType::EnableCache,
                },
                DecisionRule {
                    anomaly_type: MetricField::ErrorRate,
                    gate: Gate::Above,
                    threshold: policy.error_rate_breaker_pct,
                    action: ActionType::CircuitBreaker,
                },
                DecisionRule {
                    anomaly_type: MetricField::Throughput,
                    gate: Gate::Below,
                    threshold: policy.throughput_floor_rps,
                    action: ActionType::LoadBalance,
                },
            ],
        }
    }

    /// Select the action for an anomaly. Returns the matched rule so the
    /// caller can record which threshold gated the decision, or `None` when
    /// the value does not clear its gate ("anomalous but not actionable").
    pub fn decide(&self, anomaly_type: AnomalyType, value: f64) -> Option<&DecisionRule> {
        self.rules
            .iter()
            .find(|r| r.anomaly_type == anomaly_type && r.fires(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> DecisionTable {
        DecisionTable::from_config(&PolicyConfig::default())
    }

    #[test]
    fn test_decision_table_rows() {
        let t = table();
        let cases = [
            (MetricField::CpuUsage, 81.0, Some(ActionType::ScaleUp)),
            (MetricField::CpuUsage, 79.0, None),
            (MetricField::MemoryUsage, 86.0, Some(ActionType::ScaleUp)),
            (MetricField::MemoryUsage, 85.0, None),
            (MetricField::ResponseTime, 801.0, Some(ActionType::EnableCache)),
            (MetricField::ResponseTime, 500.0, None),
            (MetricField::ErrorRate, 5.1, Some(ActionType::CircuitBreaker)),
            (MetricField::ErrorRate, 4.9, None),
            (MetricField::Throughput, 9.0, Some(ActionType::LoadBalance)),
            (MetricField::Throughput, 11.0, None),
        ];
        for (ty, value, expected) in cases {
            let got = t.decide(ty, value).map(|r| r.action);
            assert_eq!(got, expected, "type={ty:?} value={value}");
        }
    }

    #[test]
    fn test_threshold_boundary_is_exclusive() {
        let t = table();
        assert!(t.decide(MetricField::CpuUsage, 80.0).is_none());
        assert!(t.decide(MetricField::Throughput, 10.0).is_none());
    }
}
