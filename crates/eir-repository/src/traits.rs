//! Repository and transaction trait seams. Two adapters exist: a
//! Postgres-backed one (`postgres::PostgresRepository`) and an in-memory
//! one (`memory::InMemoryRepository`); the decision engine is oblivious
//! to which is wired up at startup.

use crate::error::RepositoryResult;
use crate::models::{
    AuditLog, AuditRecord, AuditStatistics, ChangeType, ConnectionStats, Equipment,
    EquipmentHistory, EquipmentSnapshot, EquipmentStatus,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[async_trait]
pub trait EquipmentRepository: Send + Sync {
    async fn create(&self, equipment: Equipment) -> RepositoryResult<Equipment>;
    async fn update(&self, equipment: Equipment) -> RepositoryResult<Equipment>;
    async fn delete(&self, imei: &str) -> RepositoryResult<()>;
    async fn get_by_imei(&self, imei: &str) -> RepositoryResult<Option<Equipment>>;
    async fn list(&self, offset: i64, limit: i64) -> RepositoryResult<Vec<Equipment>>;
    async fn list_by_status(&self, status: EquipmentStatus) -> RepositoryResult<Vec<Equipment>>;
    async fn increment_check_count(&self, imei: &str) -> RepositoryResult<u64>;
}

#[async_trait]
pub trait AuditRepository: Send + Sync {
    async fn log_check(&self, entry: AuditLog) -> RepositoryResult<Uuid>;
    async fn get_audits_by_imei(
        &self,
        imei: &str,
        offset: i64,
        limit: i64,
    ) -> RepositoryResult<Vec<AuditLog>>;
    async fn get_by_time_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        offset: i64,
        limit: i64,
    ) -> RepositoryResult<Vec<AuditLog>>;
}

#[async_trait]
pub trait ExtendedAuditRepository: Send + Sync {
    async fn log_check_extended(&self, record: AuditRecord) -> RepositoryResult<Uuid>;
    async fn get_audit_statistics(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> RepositoryResult<AuditStatistics>;
}

#[async_trait]
pub trait HistoryRepository: Send + Sync {
    async fn record_change(&self, entry: EquipmentHistory) -> RepositoryResult<Uuid>;
    async fn get_history_by_imei(&self, imei: &str) -> RepositoryResult<Vec<EquipmentHistory>>;
    async fn get_by_change_type(&self, change_type: ChangeType) -> RepositoryResult<Vec<EquipmentHistory>>;
    async fn get_by_time_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> RepositoryResult<Vec<EquipmentHistory>>;
}

#[async_trait]
pub trait SnapshotRepository: Send + Sync {
    async fn create_snapshot(&self, snapshot: EquipmentSnapshot) -> RepositoryResult<EquipmentSnapshot>;
    async fn get_snapshots_by_equipment_id(&self, equipment_id: Uuid) -> RepositoryResult<Vec<EquipmentSnapshot>>;
    async fn get_by_imei(&self, imei: &str) -> RepositoryResult<Vec<EquipmentSnapshot>>;
    async fn delete_old_snapshots(&self, before: DateTime<Utc>) -> RepositoryResult<u64>;
}

/// Scopes a set of writes that must commit or roll back as one unit: the
/// `CheckCount` increment, the audit write, and (when the equipment record
/// did not exist) its implicit creation and the `CREATE` history row.
#[async_trait]
pub trait Transaction: Send {
    async fn get_equipment_by_imei(&mut self, imei: &str) -> RepositoryResult<Option<Equipment>>;
    async fn insert_equipment(&mut self, equipment: Equipment) -> RepositoryResult<Equipment>;
    async fn update_equipment_status(
        &mut self,
        imei: &str,
        status: EquipmentStatus,
        reason: Option<String>,
    ) -> RepositoryResult<()>;
    async fn increment_check_count(&mut self, imei: &str) -> RepositoryResult<u64>;
    async fn log_check(&mut self, entry: AuditLog) -> RepositoryResult<Uuid>;
    async fn log_check_extended(&mut self, record: AuditRecord) -> RepositoryResult<Uuid>;
    async fn record_history(&mut self, entry: EquipmentHistory) -> RepositoryResult<Uuid>;

    /// Make all writes in this transaction durable atomically.
    async fn commit(self: Box<Self>) -> RepositoryResult<()>;

    /// Discard all writes. Idempotent, and safe to call after `commit`.
    async fn rollback(self: Box<Self>) -> RepositoryResult<()>;
}

/// Adapter-level operations, implemented once per backend.
#[async_trait]
pub trait RepositoryBackend:
    EquipmentRepository + AuditRepository + ExtendedAuditRepository + HistoryRepository + SnapshotRepository
{
    async fn connect(&self) -> RepositoryResult<()>;
    async fn disconnect(&self) -> RepositoryResult<()>;
    async fn ping(&self) -> RepositoryResult<()>;
    async fn health_check(&self) -> RepositoryResult<()>;
    async fn get_connection_stats(&self) -> RepositoryResult<ConnectionStats>;
    async fn begin_transaction(&self) -> RepositoryResult<Box<dyn Transaction>>;
    async fn purge_old_audits(&self, cutoff: DateTime<Utc>) -> RepositoryResult<u64>;
    async fn purge_old_history(&self, cutoff: DateTime<Utc>) -> RepositoryResult<u64>;
    /// Best-effort maintenance (e.g. `VACUUM ANALYZE`); a no-op is a valid implementation.
    async fn optimize_database(&self) -> RepositoryResult<()>;
}
