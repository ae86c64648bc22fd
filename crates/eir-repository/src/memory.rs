//! In-memory repository adapter, grounded on the `DashMap` + `Arc` pattern
//! used by the quota manager. Exists so integration scenarios and the
//! 5G/Diameter test suites can run without a live Postgres instance.

use crate::error::{RepositoryError, RepositoryResult};
use crate::models::{
    AuditLog, AuditRecord, AuditStatistics, ChangeType, ConnectionStats, Equipment,
    EquipmentHistory, EquipmentSnapshot, EquipmentStatus,
};
use crate::traits::{
    AuditRepository, EquipmentRepository, ExtendedAuditRepository, HistoryRepository,
    RepositoryBackend, SnapshotRepository, Transaction,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Default)]
pub struct InMemoryRepository {
    equipment: Arc<DashMap<String, Equipment>>,
    audit_logs: Arc<DashMap<Uuid, AuditRecord>>,
    history: Arc<DashMap<Uuid, EquipmentHistory>>,
    snapshots: Arc<DashMap<Uuid, EquipmentSnapshot>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EquipmentRepository for InMemoryRepository {
    async fn create(&self, equipment: Equipment) -> RepositoryResult<Equipment> {
        if self.equipment.contains_key(&equipment.imei) {
            return Err(RepositoryError::Conflict(format!(
                "equipment with imei {} already exists",
                equipment.imei
            )));
        }
        self.equipment.insert(equipment.imei.clone(), equipment.clone());
        Ok(equipment)
    }

    async fn update(&self, equipment: Equipment) -> RepositoryResult<Equipment> {
        if !self.equipment.contains_key(&equipment.imei) {
            return Err(RepositoryError::NotFound(format!(
                "equipment with imei {} not found",
                equipment.imei
            )));
        }
        self.equipment.insert(equipment.imei.clone(), equipment.clone());
        Ok(equipment)
    }

    async fn delete(&self, imei: &str) -> RepositoryResult<()> {
        self.equipment.remove(imei);
        Ok(())
    }

    async fn get_by_imei(&self, imei: &str) -> RepositoryResult<Option<Equipment>> {
        Ok(self.equipment.get(imei).map(|e| e.value().clone()))
    }

    async fn list(&self, offset: i64, limit: i64) -> RepositoryResult<Vec<Equipment>> {
        let mut all: Vec<Equipment> = self.equipment.iter().map(|e| e.value().clone()).collect();
        all.sort_by(|a, b| a.imei.cmp(&b.imei));
        Ok(all
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn list_by_status(&self, status: EquipmentStatus) -> RepositoryResult<Vec<Equipment>> {
        Ok(self
            .equipment
            .iter()
            .filter(|e| e.value().status == status)
            .map(|e| e.value().clone())
            .collect())
    }

    async fn increment_check_count(&self, imei: &str) -> RepositoryResult<u64> {
        let mut entry = self
            .equipment
            .get_mut(imei)
            .ok_or_else(|| RepositoryError::NotFound(format!("equipment with imei {} not found", imei)))?;
        entry.increment_check_count();
        Ok(entry.check_count)
    }
}

#[async_trait]
impl AuditRepository for InMemoryRepository {
    async fn log_check(&self, entry: AuditLog) -> RepositoryResult<Uuid> {
        let id = entry.id;
        self.audit_logs.insert(id, AuditRecord::Basic(entry));
        Ok(id)
    }

    async fn get_audits_by_imei(
        &self,
        imei: &str,
        offset: i64,
        limit: i64,
    ) -> RepositoryResult<Vec<AuditLog>> {
        let mut matches: Vec<AuditLog> = self
            .audit_logs
            .iter()
            .map(|e| e.value().base().clone())
            .filter(|log| log.imei == imei)
            .collect();
        matches.sort_by(|a, b| b.check_time.cmp(&a.check_time));
        Ok(matches
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn get_by_time_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        offset: i64,
        limit: i64,
    ) -> RepositoryResult<Vec<AuditLog>> {
        let mut matches: Vec<AuditLog> = self
            .audit_logs
            .iter()
            .map(|e| e.value().base().clone())
            .filter(|log| log.check_time >= start && log.check_time < end)
            .collect();
        matches.sort_by(|a, b| a.check_time.cmp(&b.check_time));
        Ok(matches
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }
}

#[async_trait]
impl ExtendedAuditRepository for InMemoryRepository {
    async fn log_check_extended(&self, record: AuditRecord) -> RepositoryResult<Uuid> {
        let id = record.base().id;
        self.audit_logs.insert(id, record);
        Ok(id)
    }

    async fn get_audit_statistics(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> RepositoryResult<AuditStatistics> {
        let mut stats = AuditStatistics::default();
        let mut unique_imeis = std::collections::HashSet::new();
        let mut processing_times = Vec::new();

        for entry in self.audit_logs.iter() {
            let base = entry.value().base();
            if base.check_time < start || base.check_time >= end {
                continue;
            }
            stats.total_checks += 1;
            unique_imeis.insert(base.imei.clone());
            match base.status {
                EquipmentStatus::Whitelisted => stats.whitelisted_count += 1,
                EquipmentStatus::Greylisted => stats.greylisted_count += 1,
                EquipmentStatus::Blacklisted => stats.blacklisted_count += 1,
            }
            match base.request_source {
                crate::models::RequestSource::DiameterS13 => stats.diameter_checks += 1,
                crate::models::RequestSource::Http5g => stats.http_checks += 1,
                crate::models::RequestSource::AdminUpdate => {}
            }
            if let AuditRecord::Extended { transport, .. } = entry.value() {
                processing_times.push(transport.processing_time_ms as f64);
            }
        }

        stats.unique_imeis = unique_imeis.len() as u64;
        stats.avg_processing_time_ms = if processing_times.is_empty() {
            0.0
        } else {
            processing_times.iter().sum::<f64>() / processing_times.len() as f64
        };

        Ok(stats)
    }
}

#[async_trait]
impl HistoryRepository for InMemoryRepository {
    async fn record_change(&self, entry: EquipmentHistory) -> RepositoryResult<Uuid> {
        let id = entry.id;
        self.history.insert(id, entry);
        Ok(id)
    }

    async fn get_history_by_imei(&self, imei: &str) -> RepositoryResult<Vec<EquipmentHistory>> {
        let mut matches: Vec<EquipmentHistory> = self
            .history
            .iter()
            .map(|e| e.value().clone())
            .filter(|h| h.imei == imei)
            .collect();
        matches.sort_by(|a, b| b.changed_at.cmp(&a.changed_at));
        Ok(matches)
    }

    async fn get_by_change_type(&self, change_type: ChangeType) -> RepositoryResult<Vec<EquipmentHistory>> {
        Ok(self
            .history
            .iter()
            .filter(|e| e.value().change_type == change_type)
            .map(|e| e.value().clone())
            .collect())
    }

    async fn get_by_time_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> RepositoryResult<Vec<EquipmentHistory>> {
        let mut matches: Vec<EquipmentHistory> = self
            .history
            .iter()
            .map(|e| e.value().clone())
            .filter(|h| h.changed_at >= start && h.changed_at < end)
            .collect();
        matches.sort_by(|a, b| a.changed_at.cmp(&b.changed_at));
        Ok(matches)
    }
}

#[async_trait]
impl SnapshotRepository for InMemoryRepository {
    async fn create_snapshot(&self, snapshot: EquipmentSnapshot) -> RepositoryResult<EquipmentSnapshot> {
        self.snapshots.insert(snapshot.id, snapshot.clone());
        Ok(snapshot)
    }

    async fn get_snapshots_by_equipment_id(&self, equipment_id: Uuid) -> RepositoryResult<Vec<EquipmentSnapshot>> {
        Ok(self
            .snapshots
            .iter()
            .filter(|e| e.value().equipment_id == equipment_id)
            .map(|e| e.value().clone())
            .collect())
    }

    async fn get_by_imei(&self, imei: &str) -> RepositoryResult<Vec<EquipmentSnapshot>> {
        Ok(self
            .snapshots
            .iter()
            .filter(|e| e.value().imei == imei)
            .map(|e| e.value().clone())
            .collect())
    }

    async fn delete_old_snapshots(&self, before: DateTime<Utc>) -> RepositoryResult<u64> {
        let stale: Vec<Uuid> = self
            .snapshots
            .iter()
            .filter(|e| e.value().snapshot_time < before)
            .map(|e| *e.key())
            .collect();
        let removed = stale.len() as u64;
        for id in stale {
            self.snapshots.remove(&id);
        }
        Ok(removed)
    }
}

#[async_trait]
impl RepositoryBackend for InMemoryRepository {
    async fn connect(&self) -> RepositoryResult<()> {
        Ok(())
    }

    async fn disconnect(&self) -> RepositoryResult<()> {
        Ok(())
    }

    async fn ping(&self) -> RepositoryResult<()> {
        Ok(())
    }

    async fn health_check(&self) -> RepositoryResult<()> {
        Ok(())
    }

    async fn get_connection_stats(&self) -> RepositoryResult<ConnectionStats> {
        Ok(ConnectionStats {
            open_connections: 1,
            idle_connections: 1,
            in_use_connections: 0,
        })
    }

    async fn begin_transaction(&self) -> RepositoryResult<Box<dyn Transaction>> {
        Ok(Box::new(InMemoryTransaction {
            equipment: self.equipment.clone(),
            audit_logs: self.audit_logs.clone(),
            history: self.history.clone(),
            pending_equipment: HashMap::new(),
            check_count_deltas: HashMap::new(),
            pending_audit: Vec::new(),
            pending_history: Vec::new(),
            closed: false,
        }))
    }

    async fn purge_old_audits(&self, cutoff: DateTime<Utc>) -> RepositoryResult<u64> {
        let stale: Vec<Uuid> = self
            .audit_logs
            .iter()
            .filter(|e| e.value().base().check_time < cutoff)
            .map(|e| *e.key())
            .collect();
        let removed = stale.len() as u64;
        for id in stale {
            self.audit_logs.remove(&id);
        }
        Ok(removed)
    }

    async fn purge_old_history(&self, cutoff: DateTime<Utc>) -> RepositoryResult<u64> {
        let stale: Vec<Uuid> = self
            .history
            .iter()
            .filter(|e| e.value().changed_at < cutoff)
            .map(|e| *e.key())
            .collect();
        let removed = stale.len() as u64;
        for id in stale {
            self.history.remove(&id);
        }
        Ok(removed)
    }

    async fn optimize_database(&self) -> RepositoryResult<()> {
        Ok(())
    }
}

/// Buffers writes against a copy-on-write view of the shared maps; nothing
/// is visible to other readers until `commit` applies the buffer.
struct InMemoryTransaction {
    equipment: Arc<DashMap<String, Equipment>>,
    audit_logs: Arc<DashMap<Uuid, AuditRecord>>,
    history: Arc<DashMap<Uuid, EquipmentHistory>>,
    pending_equipment: HashMap<String, Equipment>,
    /// `CheckCount` bumps this transaction has recorded, kept as a delta
    /// rather than baked into a cloned record: applied at commit against
    /// whatever is live then, so two transactions racing to increment the
    /// same IMEI both land instead of the later commit overwriting the
    /// earlier one's absolute value.
    check_count_deltas: HashMap<String, u64>,
    pending_audit: Vec<(Uuid, AuditRecord)>,
    pending_history: Vec<(Uuid, EquipmentHistory)>,
    closed: bool,
}

impl InMemoryTransaction {
    fn check_open(&self) -> RepositoryResult<()> {
        if self.closed {
            Err(RepositoryError::Transaction("transaction already closed".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Transaction for InMemoryTransaction {
    async fn get_equipment_by_imei(&mut self, imei: &str) -> RepositoryResult<Option<Equipment>> {
        self.check_open()?;
        if let Some(pending) = self.pending_equipment.get(imei) {
            return Ok(Some(pending.clone()));
        }
        Ok(self.equipment.get(imei).map(|e| e.value().clone()))
    }

    async fn insert_equipment(&mut self, equipment: Equipment) -> RepositoryResult<Equipment> {
        self.check_open()?;
        self.pending_equipment.insert(equipment.imei.clone(), equipment.clone());
        Ok(equipment)
    }

    async fn update_equipment_status(
        &mut self,
        imei: &str,
        status: EquipmentStatus,
        reason: Option<String>,
    ) -> RepositoryResult<()> {
        self.check_open()?;
        let mut record = match self.pending_equipment.get(imei) {
            Some(e) => e.clone(),
            None => self
                .equipment
                .get(imei)
                .map(|e| e.value().clone())
                .ok_or_else(|| RepositoryError::NotFound(format!("equipment with imei {} not found", imei)))?,
        };
        record.status = status;
        record.reason = reason;
        record.last_updated = Utc::now();
        self.pending_equipment.insert(imei.to_string(), record);
        Ok(())
    }

    async fn increment_check_count(&mut self, imei: &str) -> RepositoryResult<u64> {
        self.check_open()?;
        let base_count = match self.pending_equipment.get(imei) {
            Some(e) => e.check_count,
            None => self
                .equipment
                .get(imei)
                .map(|e| e.value().check_count)
                .ok_or_else(|| RepositoryError::NotFound(format!("equipment with imei {} not found", imei)))?,
        };
        let delta = self.check_count_deltas.entry(imei.to_string()).or_insert(0);
        *delta += 1;
        Ok(base_count.saturating_add(*delta))
    }

    async fn log_check(&mut self, entry: AuditLog) -> RepositoryResult<Uuid> {
        self.check_open()?;
        let id = entry.id;
        self.pending_audit.push((id, AuditRecord::Basic(entry)));
        Ok(id)
    }

    async fn log_check_extended(&mut self, record: AuditRecord) -> RepositoryResult<Uuid> {
        self.check_open()?;
        let id = record.base().id;
        self.pending_audit.push((id, record));
        Ok(id)
    }

    async fn record_history(&mut self, entry: EquipmentHistory) -> RepositoryResult<Uuid> {
        self.check_open()?;
        let id = entry.id;
        self.pending_history.push((id, entry));
        Ok(id)
    }

    async fn commit(mut self: Box<Self>) -> RepositoryResult<()> {
        self.check_open()?;

        // Full-record upserts (new rows from `insert_equipment`, status
        // rewrites from `update_equipment_status`) land first.
        for (imei, equipment) in self.pending_equipment.drain() {
            self.equipment.insert(imei, equipment);
        }

        // `CheckCount` deltas apply last, as a locked read-modify-write
        // against the live map rather than the possibly-stale snapshot this
        // transaction read when `increment_check_count` was called — the
        // same guarantee the Postgres backend gets from `SET check_count =
        // check_count + 1`.
        for (imei, delta) in self.check_count_deltas.drain() {
            match self.equipment.get_mut(&imei) {
                Some(mut entry) => {
                    entry.check_count = entry.check_count.saturating_add(delta);
                    entry.last_updated = Utc::now();
                }
                None => {
                    return Err(RepositoryError::NotFound(format!(
                        "equipment with imei {} not found at commit",
                        imei
                    )));
                }
            }
        }

        for (id, record) in self.pending_audit.drain(..) {
            self.audit_logs.insert(id, record);
        }
        for (id, entry) in self.pending_history.drain(..) {
            self.history.insert(id, entry);
        }
        self.closed = true;
        Ok(())
    }

    async fn rollback(mut self: Box<Self>) -> RepositoryResult<()> {
        self.pending_equipment.clear();
        self.check_count_deltas.clear();
        self.pending_audit.clear();
        self.pending_history.clear();
        self.closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RequestSource;

    fn sample_equipment(imei: &str) -> Equipment {
        Equipment {
            id: Uuid::new_v4(),
            imei: imei.to_string(),
            status: EquipmentStatus::Whitelisted,
            added_by: "test".to_string(),
            last_updated: Utc::now(),
            check_count: 0,
            manufacturer_tac: Equipment::tac_from_imei(imei),
            manufacturer_name: None,
            reason: None,
            metadata: None,
        }
    }

    #[tokio::test]
    async fn rollback_leaves_no_observable_effect() {
        let repo = InMemoryRepository::new();
        repo.create(sample_equipment("490154203237518")).await.unwrap();

        let mut tx = repo.begin_transaction().await.unwrap();
        tx.increment_check_count("490154203237518").await.unwrap();
        tx.rollback().await.unwrap();

        let equipment = repo.get_by_imei("490154203237518").await.unwrap().unwrap();
        assert_eq!(equipment.check_count, 0);
    }

    #[tokio::test]
    async fn commit_makes_increment_and_audit_visible_together() {
        let repo = InMemoryRepository::new();
        repo.create(sample_equipment("490154203237518")).await.unwrap();

        let mut tx = repo.begin_transaction().await.unwrap();
        tx.increment_check_count("490154203237518").await.unwrap();
        tx.log_check(AuditLog {
            id: Uuid::new_v4(),
            imei: "490154203237518".to_string(),
            status: EquipmentStatus::Whitelisted,
            check_time: Utc::now(),
            request_source: RequestSource::DiameterS13,
            supi: None,
            gpsi: None,
            session_id: None,
            origin_host: None,
            origin_realm: None,
        })
        .await
        .unwrap();
        tx.commit().await.unwrap();

        let equipment = repo.get_by_imei("490154203237518").await.unwrap().unwrap();
        assert_eq!(equipment.check_count, 1);

        let audits = repo.get_audits_by_imei("490154203237518", 0, 10).await.unwrap();
        assert_eq!(audits.len(), 1);
    }

    #[tokio::test]
    async fn second_transaction_sees_first_transactions_committed_writes() {
        let repo = InMemoryRepository::new();
        repo.create(sample_equipment("490154203237518")).await.unwrap();

        let mut tx1 = repo.begin_transaction().await.unwrap();
        tx1.increment_check_count("490154203237518").await.unwrap();
        tx1.commit().await.unwrap();

        let mut tx2 = repo.begin_transaction().await.unwrap();
        let equipment = tx2.get_equipment_by_imei("490154203237518").await.unwrap().unwrap();
        assert_eq!(equipment.check_count, 1);
        tx2.rollback().await.unwrap();
    }

    /// Two transactions that both read the same starting `CheckCount`
    /// before either commits must not lose one of the two `+1`s: this is
    /// the race `engine::check_equipment` hits under concurrent load.
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_transactions_against_same_imei_do_not_lose_increments() {
        let repo = Arc::new(InMemoryRepository::new());
        repo.create(sample_equipment("490154203237518")).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..50 {
            let repo = repo.clone();
            handles.push(tokio::spawn(async move {
                let mut tx = repo.begin_transaction().await.unwrap();
                tx.get_equipment_by_imei("490154203237518").await.unwrap();
                tx.increment_check_count("490154203237518").await.unwrap();
                tx.commit().await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let equipment = repo.get_by_imei("490154203237518").await.unwrap().unwrap();
        assert_eq!(equipment.check_count, 50);
    }
}
