//! `GovernanceHandle`: the explicit long-lived owner of the registration
//! client, held by the top-level service object for the life of the
//! process. Deliberately not a global/static — each test or embedding
//! binary constructs and owns its own instance.

use std::sync::Arc;

use eir_config::GovernanceConfig;

use crate::client::{GovernanceClient, NoopGovernanceClient};
use crate::error::GovernanceResult;

pub struct GovernanceHandle {
    config: GovernanceConfig,
    client: Arc<dyn GovernanceClient>,
}

impl GovernanceHandle {
    pub fn new(config: GovernanceConfig, client: Arc<dyn GovernanceClient>) -> Self {
        Self { config, client }
    }

    /// Convenience constructor when no real manager integration is wired:
    /// `register`/`deregister`/`notify` all succeed as no-ops.
    pub fn noop(config: GovernanceConfig) -> Self {
        Self::new(config, Arc::new(NoopGovernanceClient))
    }

    /// Register with the manager at startup, if `governance.enabled`.
    pub async fn start(&self) -> GovernanceResult<()> {
        if !self.config.enabled {
            log::debug!("governance: disabled, skipping registration");
            return Ok(());
        }
        log::info!(
            "governance: registering {} ({}) at {}",
            self.config.service_name,
            self.config.pod_name,
            self.config.pod_ip
        );
        self.client
            .register(&self.config.service_name, &self.config.pod_name, &self.config.pod_ip)
            .await
    }

    /// Deregister at graceful shutdown. Safe to call even if `start` was
    /// never called or governance is disabled.
    pub async fn shutdown(&self) -> GovernanceResult<()> {
        if !self.config.enabled {
            return Ok(());
        }
        log::info!(
            "governance: deregistering {} ({})",
            self.config.service_name,
            self.config.pod_name
        );
        self.client
            .deregister(&self.config.service_name, &self.config.pod_name)
            .await
    }

    pub async fn notify(&self, subscription: &str, payload: &str) -> GovernanceResult<()> {
        if !self.config.enabled {
            return Ok(());
        }
        self.client.notify(subscription, payload).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disabled_governance_is_a_pure_no_op() {
        let config = GovernanceConfig {
            enabled: false,
            ..GovernanceConfig::default()
        };
        let handle = GovernanceHandle::noop(config);
        handle.start().await.unwrap();
        handle.notify("sub", "payload").await.unwrap();
        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn enabled_governance_round_trips_through_noop_client() {
        let config = GovernanceConfig {
            enabled: true,
            service_name: "eir-core".to_string(),
            pod_name: "eir-core-0".to_string(),
            pod_ip: "10.0.0.5".to_string(),
            ..GovernanceConfig::default()
        };
        let handle = GovernanceHandle::noop(config);
        handle.start().await.unwrap();
        handle.shutdown().await.unwrap();
    }
}
