//! Background retention sweep, run on a fixed cadence (default 24h).

use crate::service::AuditService;
use chrono::{Duration as ChronoDuration, Utc};
use std::sync::Arc;
use std::time::Duration;

pub struct RetentionScheduler {
    audit: Arc<AuditService>,
    retention: ChronoDuration,
    interval: Duration,
}

impl RetentionScheduler {
    pub fn new(audit: Arc<AuditService>, retention_days: i64, interval: Duration) -> Self {
        Self {
            audit,
            retention: ChronoDuration::days(retention_days),
            interval,
        }
    }

    /// Spawn the periodic purge task. The returned handle is not awaited
    /// by callers; it runs for the lifetime of the process.
    pub fn spawn(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            loop {
                ticker.tick().await;
                let cutoff = Utc::now() - self.retention;
                match self.audit.purge_older_than(cutoff).await {
                    Ok((audits, history)) => {
                        log::info!(
                            "retention sweep purged {} audit rows and {} history rows older than {}",
                            audits,
                            history,
                            cutoff
                        );
                    }
                    Err(e) => {
                        log::warn!("retention sweep failed: {}", e);
                    }
                }
            }
        })
    }
}
