//! Rule-based remediation: decision policy, cooldown tracking, and dispatch
//! to an external action handler.

pub mod cooldown;
pub mod handler;
pub mod orchestrator;
pub mod policy;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::detect::AnomalyType;

/// Corrective operations the orchestrator can select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    ScaleUp,
    RestartService,
    EnableCache,
    LoadBalance,
    CircuitBreaker,
    /// Anomalous but below the actionable gate; nothing is dispatched.
    None,
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionType::ScaleUp => write!(f, "scale_up"),
            ActionType::RestartService => write!(f, "restart_service"),
            ActionType::EnableCache => write!(f, "enable_cache"),
            ActionType::LoadBalance => write!(f, "load_balance"),
            ActionType::CircuitBreaker => write!(f, "circuit_breaker"),
            ActionType::None => write!(f, "none"),
        }
    }
}

/// Status state machine: Decided -> Executing -> {Completed | Failed}.
/// Skipped is terminal and reached only from the decision step when cooldown
/// blocks dispatch. Terminal states are never mutated again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    Decided,
    Executing,
    Completed,
    Failed,
    Skipped,
}

impl std::fmt::Display for ActionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionStatus::Decided => write!(f, "decided"),
            ActionStatus::Executing => write!(f, "executing"),
            ActionStatus::Completed => write!(f, "completed"),
            ActionStatus::Failed => write!(f, "failed"),
            ActionStatus::Skipped => write!(f, "skipped"),
        }
    }
}

/// A remediation decision and its execution record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemediationAction {
    pub id: Uuid,
    pub action_type: ActionType,
    /// Opaque identifier for the remediation target, e.g. a deployment name.
    pub target: String,
    pub params: serde_json::Map<String, serde_json::Value>,
    /// Weak back-reference to the verdict that triggered this action.
    pub triggering_verdict: Uuid,
    pub anomaly_type: AnomalyType,
    pub status: ActionStatus,
    pub decided_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Outbound seam toward the systems that actually perform remediation
/// (Kubernetes scaling, service restarts, cache toggles). Implementations
/// live outside this crate; the built-in [`handler::LogActionHandler`] only
/// logs.
#[async_trait::async_trait]
pub trait ActionHandler: Send + Sync {
    /// Perform the action. An `Err` marks the action Failed; there is no
    /// automatic retry.
    async fn execute(&self, action: &RemediationAction) -> anyhow::Result<()>;
}
