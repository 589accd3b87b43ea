//! Anomaly detection: sliding-window history, isolation-forest scoring, and
//! verdict classification.

pub mod forest;
pub mod scorer;

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::sample::{MetricField, MetricSample};

#[derive(Debug, Error)]
pub enum DetectError {
    #[error("invalid metric sample: field {field} rejected: {reason}")]
    Validation { field: MetricField, reason: String },
}

/// Severity of a flagged anomaly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Severity {
    Warning,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Warning => write!(f, "WARNING"),
            Severity::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// The metric dimension that deviated most, naming the anomaly category.
pub type AnomalyType = MetricField;

/// Result of scoring one sample.
///
/// `anomaly_type` and `severity` are populated only when `is_anomaly` is
/// true. During cold start `score` holds the 0.0 sentinel.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AnomalyVerdict {
    pub id: Uuid,
    pub sample: MetricSample,
    pub is_anomaly: bool,
    pub anomaly_type: Option<AnomalyType>,
    pub severity: Option<Severity>,
    /// Outlier decision value; lower means more anomalous. Negative values
    /// are flagged.
    pub score: f64,
    pub detected_at: DateTime<Utc>,
}

impl AnomalyVerdict {
    /// A non-anomalous verdict for the cold-start window (model untrained).
    pub fn cold_start(sample: MetricSample) -> Self {
        Self {
            id: Uuid::new_v4(),
            sample,
            is_anomaly: false,
            anomaly_type: None,
            severity: None,
            score: 0.0,
            detected_at: Utc::now(),
        }
    }
}
