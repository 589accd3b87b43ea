//! Metric ingestion and anomaly scoring.
//!
//! The scorer owns a bounded sliding window of recent samples, trains an
//! isolation forest on the standardized window once enough history exists,
//! and classifies each incoming sample against the trained model. Training
//! runs synchronously inside `ingest` on the sample that triggers it.

use std::collections::VecDeque;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::ScorerConfig;
use crate::detect::forest::{IsolationForest, DIMS};
use crate::detect::{AnomalyVerdict, DetectError, Severity};
use crate::sample::{MetricField, MetricSample};

/// Per-field mean/std frozen at training time, used to standardize samples
/// before they reach the forest. Zero-variance fields fall back to std 1.0
/// so a later deviation still produces a meaningful z-score.
struct Standardizer {
    means: [f64; DIMS],
    stds: [f64; DIMS],
}

impl Standardizer {
    fn fit(rows: &[[f64; DIMS]]) -> Self {
        let n = rows.len() as f64;
        let mut means = [0.0; DIMS];
        for row in rows {
            for (m, v) in means.iter_mut().zip(row) {
                *m += v;
            }
        }
        for m in &mut means {
            *m /= n;
        }

        let mut stds = [0.0; DIMS];
        for row in rows {
            for d in 0..DIMS {
                let diff = row[d] - means[d];
                stds[d] += diff * diff;
            }
        }
        for s in &mut stds {
            *s = (*s / n).sqrt();
            if *s == 0.0 {
                *s = 1.0;
            }
        }

        Self { means, stds }
    }

    fn transform(&self, values: &[f64; DIMS]) -> [f64; DIMS] {
        let mut z = [0.0; DIMS];
        for d in 0..DIMS {
            z[d] = (values[d] - self.means[d]) / self.stds[d];
        }
        z
    }
}

struct TrainedModel {
    forest: IsolationForest,
    standardizer: Standardizer,
}

/// Per-field statistics over the current window.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct FieldSummary {
    pub field: MetricField,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

/// Snapshot of scorer state for the summary endpoint. Pure read.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct WindowSummary {
    pub samples_seen: u64,
    pub window_len: usize,
    pub model_trained: bool,
    pub fields: Vec<FieldSummary>,
}

pub struct AnomalyScorer {
    config: ScorerConfig,
    history: VecDeque<MetricSample>,
    model: Option<TrainedModel>,
    samples_seen: u64,
    samples_since_training: usize,
}

impl AnomalyScorer {
    pub fn new(config: ScorerConfig) -> Self {
        let capacity = config.window_size;
        Self {
            config,
            history: VecDeque::with_capacity(capacity),
            model: None,
            samples_seen: 0,
            samples_since_training: 0,
        }
    }

    /// Ingest one sample and score it.
    ///
    /// Validation failures leave the history untouched. For validated input
    /// this never fails: model-side problems degrade to a cold-start verdict
    /// rather than propagating.
    pub fn ingest(&mut self, sample: MetricSample) -> Result<AnomalyVerdict, DetectError> {
        sample.validate()?;

        if self.history.len() == self.config.window_size {
            self.history.pop_front();
        }
        self.history.push_back(sample.clone());
        self.samples_seen += 1;
        self.samples_since_training += 1;

        if self.history.len() >= self.config.min_training_samples {
            let retrain_due = self.samples_since_training >= self.config.retrain_every_n_samples;
            if self.model.is_none() || retrain_due {
                self.train();
            }
        }

        let Some(model) = &self.model else {
            debug!(
                have = self.history.len(),
                need = self.config.min_training_samples,
                "Cold start, sample accepted but not scored"
            );
            return Ok(AnomalyVerdict::cold_start(sample));
        };

        let z = model.standardizer.transform(&sample.values());
        let score = model.forest.decision(&z);
        let is_anomaly = score < 0.0;

        let (anomaly_type, severity) = if is_anomaly {
            let ty = classify(&z);
            let severity = if score < self.config.critical_threshold {
                Severity::Critical
            } else {
                Severity::Warning
            };
            info!(
                anomaly_type = %ty,
                %severity,
                score,
                value = sample.value(ty),
                "Anomaly detected"
            );
            (Some(ty), Some(severity))
        } else {
            (None, None)
        };

        Ok(AnomalyVerdict {
            id: Uuid::new_v4(),
            sample,
            is_anomaly,
            anomaly_type,
            severity,
            score,
            detected_at: Utc::now(),
        })
    }

    /// Train the forest on the full current window. A degenerate window
    /// (zero variance on every field) is logged and skipped; the scorer
    /// stays in cold start.
    fn train(&mut self) {
        let rows: Vec<[f64; DIMS]> = self.history.iter().map(|s| s.values()).collect();

        let degenerate = (0..DIMS).all(|d| {
            let first = rows[0][d];
            rows.iter().all(|r| r[d] == first)
        });
        if degenerate {
            warn!(
                window = rows.len(),
                "Training skipped: history has zero variance on every field"
            );
            return;
        }

        let standardizer = Standardizer::fit(&rows);
        let z_rows: Vec<[f64; DIMS]> = rows.iter().map(|r| standardizer.transform(r)).collect();
        let forest = IsolationForest::fit(
            &z_rows,
            self.config.n_trees,
            self.config.contamination,
            self.config.random_seed,
        );

        info!(window = rows.len(), trees = self.config.n_trees, "Model trained");
        self.model = Some(TrainedModel {
            forest,
            standardizer,
        });
        self.samples_since_training = 0;
    }

    /// Count of samples seen plus mean/min/max per field over the window.
    pub fn summary(&self) -> WindowSummary {
        let fields = MetricField::ALL
            .iter()
            .map(|&field| {
                let mut sum = 0.0;
                let mut min = f64::INFINITY;
                let mut max = f64::NEG_INFINITY;
                for s in &self.history {
                    let v = s.value(field);
                    sum += v;
                    min = min.min(v);
                    max = max.max(v);
                }
                let n = self.history.len();
                FieldSummary {
                    field,
                    mean: if n == 0 { 0.0 } else { sum / n as f64 },
                    min: if n == 0 { 0.0 } else { min },
                    max: if n == 0 { 0.0 } else { max },
                }
            })
            .collect();

        WindowSummary {
            samples_seen: self.samples_seen,
            window_len: self.history.len(),
            model_trained: self.model.is_some(),
            fields,
        }
    }

    #[cfg(test)]
    pub(crate) fn history_len(&self) -> usize {
        self.history.len()
    }
}

/// The field with the largest absolute standardized deviation names the
/// anomaly type. Ties break in declaration order (strictly-greater scan).
fn classify(z: &[f64; DIMS]) -> MetricField {
    let mut best = 0;
    for d in 1..DIMS {
        if z[d].abs() > z[best].abs() {
            best = d;
        }
    }
    MetricField::ALL[best]
}
