//! Turns anomaly verdicts into at most one dispatched remediation action.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::json;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::{OrchestratorConfig, PolicyConfig};
use crate::detect::AnomalyVerdict;
use crate::remediate::cooldown::CooldownRegistry;
use crate::remediate::policy::{DecisionRule, DecisionTable};
use crate::remediate::{ActionHandler, ActionStatus, ActionType, RemediationAction};

pub struct Orchestrator {
    table: DecisionTable,
    cooldowns: CooldownRegistry,
    handler: Arc<dyn ActionHandler>,
    target: String,
}

impl Orchestrator {
    pub fn new(
        config: &OrchestratorConfig,
        policy: &PolicyConfig,
        handler: Arc<dyn ActionHandler>,
    ) -> Self {
        Self {
            table: DecisionTable::from_config(policy),
            cooldowns: CooldownRegistry::new(Duration::from_secs(config.cooldown_seconds)),
            handler,
            target: config.target.clone(),
        }
    }

    /// Handle one verdict. Non-anomalies return `None` immediately; this is
    /// the path nearly every call takes in steady state.
    ///
    /// Dispatch failures come back as a `Failed` action, never an error, and
    /// the cooldown stays committed so a failed action is not retried until
    /// the window elapses.
    pub async fn handle(&self, verdict: &AnomalyVerdict) -> Option<RemediationAction> {
        if !verdict.is_anomaly {
            return None;
        }
        let anomaly_type = verdict.anomaly_type?;

        // Cooldown check before any decision work. A skip is an observable
        // outcome, not a silent drop.
        if self.cooldowns.is_cooling(anomaly_type) {
            info!(%anomaly_type, "Anomaly suppressed by cooldown");
            return Some(self.record(verdict, anomaly_type, ActionStatus::Skipped));
        }

        let value = verdict.sample.value(anomaly_type);
        let Some(rule) = self.table.decide(anomaly_type, value) else {
            // Statistically anomalous but below the actionable gate.
            info!(%anomaly_type, value, "Anomaly below action gate, no dispatch");
            return Some(self.record(verdict, anomaly_type, ActionStatus::Completed));
        };

        // Authoritative cooldown commit. Losing the race to a concurrent
        // handler for the same type is a skip.
        if !self.cooldowns.try_acquire(anomaly_type) {
            warn!(%anomaly_type, "Lost cooldown race, suppressing dispatch");
            return Some(self.record(verdict, anomaly_type, ActionStatus::Skipped));
        }

        let mut action = self.decide_action(verdict, anomaly_type, rule);
        info!(
            action = %action.action_type,
            %anomaly_type,
            target = %action.target,
            "Dispatching remediation"
        );
        action.status = ActionStatus::Executing;

        // The handler is the only blocking I/O and runs outside every lock.
        match self.handler.execute(&action).await {
            Ok(()) => {
                action.status = ActionStatus::Completed;
                action.completed_at = Some(Utc::now());
                info!(action = %action.action_type, id = %action.id, "Remediation completed");
            }
            Err(e) => {
                action.status = ActionStatus::Failed;
                action.completed_at = Some(Utc::now());
                error!(action = %action.action_type, id = %action.id, "Remediation failed: {:#}", e);
            }
        }
        Some(action)
    }

    /// Build the action record for a rule that fired. Actions start life in
    /// `Decided` and move to `Executing` only once the cooldown is held.
    fn decide_action(
        &self,
        verdict: &AnomalyVerdict,
        anomaly_type: crate::detect::AnomalyType,
        rule: &DecisionRule,
    ) -> RemediationAction {
        let mut params = serde_json::Map::new();
        params.insert(
            "triggering_value".into(),
            json!(verdict.sample.value(anomaly_type)),
        );
        params.insert("gate_threshold".into(), json!(rule.threshold));
        RemediationAction {
            id: Uuid::new_v4(),
            action_type: rule.action,
            target: self.target.clone(),
            params,
            triggering_verdict: verdict.id,
            anomaly_type,
            status: ActionStatus::Decided,
            decided_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Terminal record for the no-dispatch outcomes (skip and below-gate).
    fn record(
        &self,
        verdict: &AnomalyVerdict,
        anomaly_type: crate::detect::AnomalyType,
        status: ActionStatus,
    ) -> RemediationAction {
        RemediationAction {
            id: Uuid::new_v4(),
            action_type: ActionType::None,
            target: self.target.clone(),
            params: serde_json::Map::new(),
            triggering_verdict: verdict.id,
            anomaly_type,
            status,
            decided_at: Utc::now(),
            completed_at: Some(Utc::now()),
        }
    }
}
