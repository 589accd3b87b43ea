//! Built-in action handler.
//!
//! Real remediation backends (Kubernetes HPA calls, autoscaling-group APIs,
//! service restarts) implement [`ActionHandler`] outside this crate. The
//! default handler just logs what it would have done, which is what the
//! daemon ships with until an integration is wired in.

use tracing::info;

use crate::remediate::{ActionHandler, RemediationAction};

#[derive(Debug, Default)]
pub struct LogActionHandler;

#[async_trait::async_trait]
impl ActionHandler for LogActionHandler {
    async fn execute(&self, action: &RemediationAction) -> anyhow::Result<()> {
        info!(
            action = %action.action_type,
            target = %action.target,
            anomaly_type = %action.anomaly_type,
            "Executing remediation (log-only handler)"
        );
        Ok(())
    }
}
