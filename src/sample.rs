//! Metric sample data model and input validation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::detect::DetectError;

/// The five observed metric dimensions, in tie-break order.
///
/// When two fields deviate equally, the one declared first wins the
/// anomaly-type classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricField {
    CpuUsage,
    MemoryUsage,
    ResponseTime,
    ErrorRate,
    Throughput,
}

impl MetricField {
    /// All fields in declaration order.
    pub const ALL: [MetricField; 5] = [
        MetricField::CpuUsage,
        MetricField::MemoryUsage,
        MetricField::ResponseTime,
        MetricField::ErrorRate,
        MetricField::Throughput,
    ];
}

impl std::fmt::Display for MetricField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetricField::CpuUsage => write!(f, "cpu_usage"),
            MetricField::MemoryUsage => write!(f, "memory_usage"),
            MetricField::ResponseTime => write!(f, "response_time"),
            MetricField::ErrorRate => write!(f, "error_rate"),
            MetricField::Throughput => write!(f, "throughput"),
        }
    }
}

/// One metric observation at a point in time. Immutable once constructed.
///
/// `cpu_usage`, `memory_usage`, and `error_rate_pct` are conventionally
/// percentages in [0, 100] but out-of-range values are accepted; the scorer
/// must not choke on them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    pub timestamp: DateTime<Utc>,
    pub cpu_usage: f64,
    pub memory_usage: f64,
    pub response_time_ms: f64,
    pub error_rate_pct: f64,
    pub requests_per_sec: f64,
}

impl MetricSample {
    /// Field values in declaration order (cpu, memory, response_time,
    /// error_rate, throughput).
    pub fn values(&self) -> [f64; 5] {
        [
            self.cpu_usage,
            self.memory_usage,
            self.response_time_ms,
            self.error_rate_pct,
            self.requests_per_sec,
        ]
    }

    /// Value of a single field.
    pub fn value(&self, field: MetricField) -> f64 {
        match field {
            MetricField::CpuUsage => self.cpu_usage,
            MetricField::MemoryUsage => self.memory_usage,
            MetricField::ResponseTime => self.response_time_ms,
            MetricField::ErrorRate => self.error_rate_pct,
            MetricField::Throughput => self.requests_per_sec,
        }
    }

    /// Reject samples with non-finite or negative fields.
    ///
    /// Validation happens before the sample touches the history buffer, so a
    /// rejected sample leaves the scorer state untouched.
    pub fn validate(&self) -> Result<(), DetectError> {
        for (field, value) in MetricField::ALL.iter().zip(self.values()) {
            if !value.is_finite() {
                return Err(DetectError::Validation {
                    field: *field,
                    reason: "value is not a finite number".into(),
                });
            }
            if value < 0.0 {
                return Err(DetectError::Validation {
                    field: *field,
                    reason: format!("value {value} is negative"),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(cpu: f64) -> MetricSample {
        MetricSample {
            timestamp: Utc::now(),
            cpu_usage: cpu,
            memory_usage: 60.0,
            response_time_ms: 200.0,
            error_rate_pct: 1.0,
            requests_per_sec: 100.0,
        }
    }

    #[test]
    fn test_valid_sample_passes() {
        assert!(sample(50.0).validate().is_ok());
        // Out-of-range percentages are accepted, only NaN/negative rejected.
        assert!(sample(250.0).validate().is_ok());
    }

    #[test]
    fn test_nan_and_negative_rejected() {
        assert!(sample(f64::NAN).validate().is_err());
        assert!(sample(f64::INFINITY).validate().is_err());
        assert!(sample(-1.0).validate().is_err());
    }

    #[test]
    fn test_values_follow_declaration_order() {
        let s = MetricSample {
            timestamp: Utc::now(),
            cpu_usage: 1.0,
            memory_usage: 2.0,
            response_time_ms: 3.0,
            error_rate_pct: 4.0,
            requests_per_sec: 5.0,
        };
        assert_eq!(s.values(), [1.0, 2.0, 3.0, 4.0, 5.0]);
        for (i, field) in MetricField::ALL.iter().enumerate() {
            assert_eq!(s.value(*field), (i + 1) as f64);
        }
    }
}
