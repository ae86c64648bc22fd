//! Seam for the external governance/manager service. Only the trait and a
//! no-op default are pinned here; a real manager integration is a
//! peripheral collaborator outside this core.

use async_trait::async_trait;

use crate::error::GovernanceResult;

#[async_trait]
pub trait GovernanceClient: Send + Sync {
    /// Register this service instance with the manager.
    async fn register(&self, service_name: &str, pod_name: &str, pod_ip: &str) -> GovernanceResult<()>;

    /// Deregister on graceful shutdown.
    async fn deregister(&self, service_name: &str, pod_name: &str) -> GovernanceResult<()>;

    /// Push a subscription-change notification to the manager.
    async fn notify(&self, subscription: &str, payload: &str) -> GovernanceResult<()>;
}

/// Default client that performs no network activity; used when
/// `governance.enabled` is false or no real manager integration is wired.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopGovernanceClient;

#[async_trait]
impl GovernanceClient for NoopGovernanceClient {
    async fn register(&self, _service_name: &str, _pod_name: &str, _pod_ip: &str) -> GovernanceResult<()> {
        Ok(())
    }

    async fn deregister(&self, _service_name: &str, _pod_name: &str) -> GovernanceResult<()> {
        Ok(())
    }

    async fn notify(&self, _subscription: &str, _payload: &str) -> GovernanceResult<()> {
        Ok(())
    }
}
