//! Compliance-grade audit/history facade over the repository layer.
//!
//! The decision engine writes its per-check audit and history rows
//! directly through a `Transaction` so they commit atomically with the
//! `CheckCount` increment (§4.C's ordering guarantee). `AuditService`
//! covers everything else: admin-triggered mutations outside a check
//! flow, statistics queries, and retention purges.

use eir_repository::{
    AuditLog, AuditRecord, AuditRepository, AuditStatistics, ChangeType, EquipmentHistory,
    ExtendedAuditRepository, HistoryRepository, RepositoryBackend,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::AuditResult;

pub struct AuditService {
    backend: Arc<dyn RepositoryBackend>,
}

impl AuditService {
    pub fn new(backend: Arc<dyn RepositoryBackend>) -> Self {
        Self { backend }
    }

    /// Record a plain check, outside of a decision-engine transaction
    /// (e.g. a synthetic audit entry emitted by an operational tool).
    pub async fn record_check(&self, entry: AuditLog) -> AuditResult<Uuid> {
        Ok(self.backend.log_check(entry).await?)
    }

    pub async fn record_check_extended(&self, record: AuditRecord) -> AuditResult<Uuid> {
        Ok(self.backend.log_check_extended(record).await?)
    }

    /// Record an administrative mutation (`CREATE`/`UPDATE`/`DELETE`/
    /// `STATUS_CHANGE`) that happened outside the decision engine's
    /// per-check transaction, e.g. a management API call.
    pub async fn record_mutation(
        &self,
        imei: &str,
        change_type: ChangeType,
        changed_by: &str,
        prev_status: Option<eir_repository::EquipmentStatus>,
        new_status: Option<eir_repository::EquipmentStatus>,
        reason: Option<String>,
    ) -> AuditResult<Uuid> {
        let entry = EquipmentHistory {
            id: Uuid::new_v4(),
            imei: imei.to_string(),
            change_type,
            changed_at: Utc::now(),
            changed_by: changed_by.to_string(),
            prev_status,
            new_status,
            reason,
        };
        Ok(self.backend.record_change(entry).await?)
    }

    pub async fn audit_statistics(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AuditResult<AuditStatistics> {
        Ok(self.backend.get_audit_statistics(start, end).await?)
    }

    pub async fn get_history_by_imei(&self, imei: &str) -> AuditResult<Vec<EquipmentHistory>> {
        Ok(self.backend.get_history_by_imei(imei).await?)
    }

    /// Purge both audit and history rows older than `cutoff`, per the
    /// append-only invariants: only this strict `timestamp < cutoff`
    /// predicate may delete a row. Returns `(audits_removed, history_removed)`.
    pub async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> AuditResult<(u64, u64)> {
        let audits_removed = self.backend.purge_old_audits(cutoff).await?;
        let history_removed = self.backend.purge_old_history(cutoff).await?;
        Ok((audits_removed, history_removed))
    }
}
