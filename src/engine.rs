//! The detection + remediation pipeline.

use std::sync::{Arc, Mutex};

use tracing::warn;

use crate::config::Config;
use crate::detect::scorer::{AnomalyScorer, WindowSummary};
use crate::detect::{AnomalyVerdict, DetectError};
use crate::remediate::orchestrator::Orchestrator;
use crate::remediate::{ActionHandler, RemediationAction};
use crate::sample::MetricSample;
use crate::storage::{self, Pool};

/// Owns the scorer, the orchestrator, and the history pool. One instance per
/// daemon; shared across API handlers via `Arc`.
pub struct Engine {
    scorer: Mutex<AnomalyScorer>,
    orchestrator: Orchestrator,
    pool: Pool,
}

impl Engine {
    pub fn new(config: &Config, handler: Arc<dyn ActionHandler>, pool: Pool) -> Self {
        Self {
            scorer: Mutex::new(AnomalyScorer::new(config.scorer.clone())),
            orchestrator: Orchestrator::new(&config.orchestrator, &config.policy, handler),
            pool,
        }
    }

    /// Run one sample through ingest -> decide -> dispatch and persist the
    /// outcome. Validation errors propagate; everything downstream of a
    /// valid sample is captured as data so the loop never dies on one bad
    /// cycle.
    pub async fn process(
        &self,
        sample: MetricSample,
    ) -> Result<(AnomalyVerdict, Option<RemediationAction>), DetectError> {
        // Ingest is one critical section: append, optionally retrain, score.
        // The lock is dropped before any dispatch I/O.
        let verdict = {
            let mut scorer = self.scorer.lock().unwrap_or_else(|e| e.into_inner());
            scorer.ingest(sample)?
        };

        let action = self.orchestrator.handle(&verdict).await;

        if verdict.is_anomaly {
            if let Err(e) = storage::record_verdict(&self.pool, &verdict) {
                warn!("Failed to persist verdict: {:#}", e);
            }
        }
        if let Some(action) = &action {
            if let Err(e) = storage::record_action(&self.pool, action) {
                warn!("Failed to persist action: {:#}", e);
            }
        }

        Ok((verdict, action))
    }

    /// Window statistics; pure read.
    pub fn summary(&self) -> WindowSummary {
        self.scorer
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .summary()
    }
}
