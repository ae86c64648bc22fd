//! Seam for a remote configuration source (e.g. a config-management
//! service). Only the trait is pinned; no concrete backend ships here.

use crate::error::ConfigResult;
use crate::model::EirConfig;
use async_trait::async_trait;

#[async_trait]
pub trait RemoteConfigSource: Send + Sync {
    /// Apply any remotely-managed overrides on top of `config`, in place.
    async fn apply(&self, config: &mut EirConfig) -> ConfigResult<()>;
}

/// Default source that performs no remote lookup.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopRemoteConfigSource;

#[async_trait]
impl RemoteConfigSource for NoopRemoteConfigSource {
    async fn apply(&self, _config: &mut EirConfig) -> ConfigResult<()> {
        Ok(())
    }
}
