//! Postgres-backed repository adapter.

use crate::error::{RepositoryError, RepositoryResult};
use crate::models::{
    AuditLog, AuditRecord, AuditStatistics, ChangeType, ConnectionStats, Equipment,
    EquipmentHistory, EquipmentSnapshot, EquipmentStatus, RequestSource, SnapshotType,
};
use crate::traits::{
    AuditRepository, EquipmentRepository, ExtendedAuditRepository, HistoryRepository,
    RepositoryBackend, SnapshotRepository, Transaction,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres, Row};
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

const SCHEMA_STATEMENTS: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS equipment (
        id UUID PRIMARY KEY,
        imei TEXT NOT NULL UNIQUE,
        status TEXT NOT NULL,
        added_by TEXT NOT NULL,
        last_updated TIMESTAMPTZ NOT NULL,
        check_count BIGINT NOT NULL DEFAULT 0,
        manufacturer_tac TEXT,
        manufacturer_name TEXT,
        reason TEXT,
        metadata JSONB
    )",
    "CREATE TABLE IF NOT EXISTS audit_logs (
        id UUID PRIMARY KEY,
        imei TEXT NOT NULL,
        status TEXT NOT NULL,
        check_time TIMESTAMPTZ NOT NULL,
        request_source TEXT NOT NULL,
        supi TEXT,
        gpsi TEXT,
        session_id TEXT,
        origin_host TEXT,
        origin_realm TEXT,
        ip_address TEXT,
        user_agent TEXT,
        processing_time_ms BIGINT,
        additional_data JSONB,
        history_id UUID
    )",
    "CREATE INDEX IF NOT EXISTS idx_audit_logs_imei ON audit_logs (imei)",
    "CREATE INDEX IF NOT EXISTS idx_audit_logs_check_time ON audit_logs (check_time)",
    "CREATE TABLE IF NOT EXISTS equipment_history (
        id UUID PRIMARY KEY,
        imei TEXT NOT NULL,
        change_type TEXT NOT NULL,
        changed_at TIMESTAMPTZ NOT NULL,
        changed_by TEXT NOT NULL,
        prev_status TEXT,
        new_status TEXT,
        reason TEXT
    )",
    "CREATE INDEX IF NOT EXISTS idx_equipment_history_imei ON equipment_history (imei)",
    "CREATE TABLE IF NOT EXISTS equipment_snapshots (
        id UUID PRIMARY KEY,
        equipment_id UUID NOT NULL,
        imei TEXT NOT NULL,
        snapshot_time TIMESTAMPTZ NOT NULL,
        status TEXT NOT NULL,
        reason TEXT,
        check_count BIGINT NOT NULL,
        metadata JSONB,
        created_by TEXT NOT NULL,
        snapshot_type TEXT NOT NULL
    )",
];

fn row_to_equipment(row: &sqlx::postgres::PgRow) -> RepositoryResult<Equipment> {
    let status_str: String = row.get("status");
    Ok(Equipment {
        id: row.get("id"),
        imei: row.get("imei"),
        status: EquipmentStatus::from_str(&status_str)
            .map_err(RepositoryError::Internal)?,
        added_by: row.get("added_by"),
        last_updated: row.get("last_updated"),
        check_count: row.get::<i64, _>("check_count") as u64,
        manufacturer_tac: row.get("manufacturer_tac"),
        manufacturer_name: row.get("manufacturer_name"),
        reason: row.get("reason"),
        metadata: row.get("metadata"),
    })
}

fn row_to_audit_log(row: &sqlx::postgres::PgRow) -> RepositoryResult<AuditLog> {
    let status_str: String = row.get("status");
    let source_str: String = row.get("request_source");
    Ok(AuditLog {
        id: row.get("id"),
        imei: row.get("imei"),
        status: EquipmentStatus::from_str(&status_str).map_err(RepositoryError::Internal)?,
        check_time: row.get("check_time"),
        request_source: parse_request_source(&source_str)?,
        supi: row.get("supi"),
        gpsi: row.get("gpsi"),
        session_id: row.get("session_id"),
        origin_host: row.get("origin_host"),
        origin_realm: row.get("origin_realm"),
    })
}

fn parse_request_source(s: &str) -> RepositoryResult<RequestSource> {
    match s {
        "DIAMETER_S13" => Ok(RequestSource::DiameterS13),
        "HTTP_5G" => Ok(RequestSource::Http5g),
        "ADMIN_UPDATE" => Ok(RequestSource::AdminUpdate),
        other => Err(RepositoryError::Internal(format!("unknown request source: {}", other))),
    }
}

fn change_type_to_str(c: ChangeType) -> &'static str {
    match c {
        ChangeType::Create => "CREATE",
        ChangeType::Update => "UPDATE",
        ChangeType::Delete => "DELETE",
        ChangeType::Check => "CHECK",
        ChangeType::StatusChange => "STATUS_CHANGE",
    }
}

fn change_type_from_str(s: &str) -> RepositoryResult<ChangeType> {
    match s {
        "CREATE" => Ok(ChangeType::Create),
        "UPDATE" => Ok(ChangeType::Update),
        "DELETE" => Ok(ChangeType::Delete),
        "CHECK" => Ok(ChangeType::Check),
        "STATUS_CHANGE" => Ok(ChangeType::StatusChange),
        other => Err(RepositoryError::Internal(format!("unknown change type: {}", other))),
    }
}

fn snapshot_type_to_str(t: SnapshotType) -> &'static str {
    match t {
        SnapshotType::Manual => "MANUAL",
        SnapshotType::Auto => "AUTO",
        SnapshotType::Scheduled => "SCHEDULED",
    }
}

/// Postgres-backed adapter. Grounded on `tmf629_customer::db`'s query
/// style and `tmf620_catalog::db::init_db`'s retry-with-backoff connect.
pub struct PostgresRepository {
    pool: Pool<Postgres>,
}

impl PostgresRepository {
    /// Connect with retry and exponential backoff, then ensure the schema
    /// exists.
    pub async fn connect(database_url: &str, max_connections: u32) -> RepositoryResult<Self> {
        let mut retries = 5;
        let mut delay = 1u64;

        let pool = loop {
            match PgPoolOptions::new()
                .max_connections(max_connections)
                .acquire_timeout(Duration::from_secs(10))
                .connect(database_url)
                .await
            {
                Ok(pool) => break pool,
                Err(e) if retries > 0 => {
                    log::warn!(
                        "failed to connect to database ({} retries left): {}",
                        retries,
                        e
                    );
                    retries -= 1;
                    tokio::time::sleep(Duration::from_secs(delay)).await;
                    delay *= 2;
                }
                Err(e) => {
                    return Err(RepositoryError::Database(format!(
                        "failed to connect to database after retries: {}",
                        e
                    )))
                }
            }
        };

        let repo = Self { pool };
        repo.ensure_schema().await?;
        Ok(repo)
    }

    async fn ensure_schema(&self) -> RepositoryResult<()> {
        for statement in SCHEMA_STATEMENTS {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl EquipmentRepository for PostgresRepository {
    async fn create(&self, equipment: Equipment) -> RepositoryResult<Equipment> {
        sqlx::query(
            "INSERT INTO equipment (id, imei, status, added_by, last_updated, check_count,
             manufacturer_tac, manufacturer_name, reason, metadata)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(equipment.id)
        .bind(&equipment.imei)
        .bind(equipment.status.to_string())
        .bind(&equipment.added_by)
        .bind(equipment.last_updated)
        .bind(equipment.check_count as i64)
        .bind(&equipment.manufacturer_tac)
        .bind(&equipment.manufacturer_name)
        .bind(&equipment.reason)
        .bind(&equipment.metadata)
        .execute(&self.pool)
        .await?;

        Ok(equipment)
    }

    async fn update(&self, equipment: Equipment) -> RepositoryResult<Equipment> {
        let result = sqlx::query(
            "UPDATE equipment SET status = $2, added_by = $3, last_updated = $4,
             check_count = $5, manufacturer_tac = $6, manufacturer_name = $7,
             reason = $8, metadata = $9 WHERE imei = $1",
        )
        .bind(&equipment.imei)
        .bind(equipment.status.to_string())
        .bind(&equipment.added_by)
        .bind(equipment.last_updated)
        .bind(equipment.check_count as i64)
        .bind(&equipment.manufacturer_tac)
        .bind(&equipment.manufacturer_name)
        .bind(&equipment.reason)
        .bind(&equipment.metadata)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!(
                "equipment with imei {} not found",
                equipment.imei
            )));
        }
        Ok(equipment)
    }

    async fn delete(&self, imei: &str) -> RepositoryResult<()> {
        sqlx::query("DELETE FROM equipment WHERE imei = $1")
            .bind(imei)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_by_imei(&self, imei: &str) -> RepositoryResult<Option<Equipment>> {
        let row = sqlx::query("SELECT * FROM equipment WHERE imei = $1")
            .bind(imei)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_equipment).transpose()
    }

    async fn list(&self, offset: i64, limit: i64) -> RepositoryResult<Vec<Equipment>> {
        let rows = sqlx::query("SELECT * FROM equipment ORDER BY imei OFFSET $1 LIMIT $2")
            .bind(offset)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_equipment).collect()
    }

    async fn list_by_status(&self, status: EquipmentStatus) -> RepositoryResult<Vec<Equipment>> {
        let rows = sqlx::query("SELECT * FROM equipment WHERE status = $1 ORDER BY imei")
            .bind(status.to_string())
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_equipment).collect()
    }

    async fn increment_check_count(&self, imei: &str) -> RepositoryResult<u64> {
        let row = sqlx::query(
            "UPDATE equipment SET check_count = check_count + 1, last_updated = now()
             WHERE imei = $1 RETURNING check_count",
        )
        .bind(imei)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| RepositoryError::NotFound(format!("equipment with imei {} not found", imei)))?;

        Ok(row.get::<i64, _>("check_count") as u64)
    }
}

#[async_trait]
impl AuditRepository for PostgresRepository {
    async fn log_check(&self, entry: AuditLog) -> RepositoryResult<Uuid> {
        sqlx::query(
            "INSERT INTO audit_logs (id, imei, status, check_time, request_source, supi, gpsi,
             session_id, origin_host, origin_realm)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(entry.id)
        .bind(&entry.imei)
        .bind(entry.status.to_string())
        .bind(entry.check_time)
        .bind(entry.request_source.to_string())
        .bind(&entry.supi)
        .bind(&entry.gpsi)
        .bind(&entry.session_id)
        .bind(&entry.origin_host)
        .bind(&entry.origin_realm)
        .execute(&self.pool)
        .await?;

        Ok(entry.id)
    }

    async fn get_audits_by_imei(
        &self,
        imei: &str,
        offset: i64,
        limit: i64,
    ) -> RepositoryResult<Vec<AuditLog>> {
        let rows = sqlx::query(
            "SELECT * FROM audit_logs WHERE imei = $1 ORDER BY check_time DESC OFFSET $2 LIMIT $3",
        )
        .bind(imei)
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_audit_log).collect()
    }

    async fn get_by_time_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        offset: i64,
        limit: i64,
    ) -> RepositoryResult<Vec<AuditLog>> {
        let rows = sqlx::query(
            "SELECT * FROM audit_logs WHERE check_time >= $1 AND check_time < $2
             ORDER BY check_time OFFSET $3 LIMIT $4",
        )
        .bind(start)
        .bind(end)
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_audit_log).collect()
    }
}

#[async_trait]
impl ExtendedAuditRepository for PostgresRepository {
    async fn log_check_extended(&self, record: AuditRecord) -> RepositoryResult<Uuid> {
        match record {
            AuditRecord::Basic(entry) => self.log_check(entry).await,
            AuditRecord::Extended { base, transport, history } => {
                sqlx::query(
                    "INSERT INTO audit_logs (id, imei, status, check_time, request_source, supi,
                     gpsi, session_id, origin_host, origin_realm, ip_address, user_agent,
                     processing_time_ms, additional_data, history_id)
                     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)",
                )
                .bind(base.id)
                .bind(&base.imei)
                .bind(base.status.to_string())
                .bind(base.check_time)
                .bind(base.request_source.to_string())
                .bind(&base.supi)
                .bind(&base.gpsi)
                .bind(&base.session_id)
                .bind(&base.origin_host)
                .bind(&base.origin_realm)
                .bind(&transport.ip_address)
                .bind(&transport.user_agent)
                .bind(transport.processing_time_ms as i64)
                .bind(&transport.additional_data)
                .bind(history)
                .execute(&self.pool)
                .await?;

                Ok(base.id)
            }
        }
    }

    async fn get_audit_statistics(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> RepositoryResult<AuditStatistics> {
        let row = sqlx::query(
            "SELECT
                COUNT(*) AS total_checks,
                COUNT(DISTINCT imei) AS unique_imeis,
                COUNT(*) FILTER (WHERE status = 'WHITELISTED') AS whitelisted_count,
                COUNT(*) FILTER (WHERE status = 'GREYLISTED') AS greylisted_count,
                COUNT(*) FILTER (WHERE status = 'BLACKLISTED') AS blacklisted_count,
                COUNT(*) FILTER (WHERE request_source = 'DIAMETER_S13') AS diameter_checks,
                COUNT(*) FILTER (WHERE request_source = 'HTTP_5G') AS http_checks,
                COALESCE(AVG(processing_time_ms), 0) AS avg_processing_time_ms
             FROM audit_logs WHERE check_time >= $1 AND check_time < $2",
        )
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await?;

        Ok(AuditStatistics {
            total_checks: row.get::<i64, _>("total_checks") as u64,
            unique_imeis: row.get::<i64, _>("unique_imeis") as u64,
            whitelisted_count: row.get::<i64, _>("whitelisted_count") as u64,
            greylisted_count: row.get::<i64, _>("greylisted_count") as u64,
            blacklisted_count: row.get::<i64, _>("blacklisted_count") as u64,
            diameter_checks: row.get::<i64, _>("diameter_checks") as u64,
            http_checks: row.get::<i64, _>("http_checks") as u64,
            avg_processing_time_ms: row.get::<Option<f64>, _>("avg_processing_time_ms").unwrap_or(0.0),
        })
    }
}

#[async_trait]
impl HistoryRepository for PostgresRepository {
    async fn record_change(&self, entry: EquipmentHistory) -> RepositoryResult<Uuid> {
        sqlx::query(
            "INSERT INTO equipment_history (id, imei, change_type, changed_at, changed_by,
             prev_status, new_status, reason)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(entry.id)
        .bind(&entry.imei)
        .bind(change_type_to_str(entry.change_type))
        .bind(entry.changed_at)
        .bind(&entry.changed_by)
        .bind(entry.prev_status.map(|s| s.to_string()))
        .bind(entry.new_status.map(|s| s.to_string()))
        .bind(&entry.reason)
        .execute(&self.pool)
        .await?;

        Ok(entry.id)
    }

    async fn get_history_by_imei(&self, imei: &str) -> RepositoryResult<Vec<EquipmentHistory>> {
        let rows = sqlx::query("SELECT * FROM equipment_history WHERE imei = $1 ORDER BY changed_at DESC")
            .bind(imei)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_history).collect()
    }

    async fn get_by_change_type(&self, change_type: ChangeType) -> RepositoryResult<Vec<EquipmentHistory>> {
        let rows = sqlx::query("SELECT * FROM equipment_history WHERE change_type = $1 ORDER BY changed_at DESC")
            .bind(change_type_to_str(change_type))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_history).collect()
    }

    async fn get_by_time_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> RepositoryResult<Vec<EquipmentHistory>> {
        let rows = sqlx::query(
            "SELECT * FROM equipment_history WHERE changed_at >= $1 AND changed_at < $2 ORDER BY changed_at",
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_history).collect()
    }
}

fn row_to_history(row: &sqlx::postgres::PgRow) -> RepositoryResult<EquipmentHistory> {
    let prev: Option<String> = row.get("prev_status");
    let new: Option<String> = row.get("new_status");
    Ok(EquipmentHistory {
        id: row.get("id"),
        imei: row.get("imei"),
        change_type: change_type_from_str(&row.get::<String, _>("change_type"))?,
        changed_at: row.get("changed_at"),
        changed_by: row.get("changed_by"),
        prev_status: prev.map(|s| EquipmentStatus::from_str(&s)).transpose().map_err(RepositoryError::Internal)?,
        new_status: new.map(|s| EquipmentStatus::from_str(&s)).transpose().map_err(RepositoryError::Internal)?,
        reason: row.get("reason"),
    })
}

#[async_trait]
impl SnapshotRepository for PostgresRepository {
    async fn create_snapshot(&self, snapshot: EquipmentSnapshot) -> RepositoryResult<EquipmentSnapshot> {
        sqlx::query(
            "INSERT INTO equipment_snapshots (id, equipment_id, imei, snapshot_time, status,
             reason, check_count, metadata, created_by, snapshot_type)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(snapshot.id)
        .bind(snapshot.equipment_id)
        .bind(&snapshot.imei)
        .bind(snapshot.snapshot_time)
        .bind(snapshot.status.to_string())
        .bind(&snapshot.reason)
        .bind(snapshot.check_count as i64)
        .bind(&snapshot.metadata)
        .bind(&snapshot.created_by)
        .bind(snapshot_type_to_str(snapshot.snapshot_type))
        .execute(&self.pool)
        .await?;

        Ok(snapshot)
    }

    async fn get_snapshots_by_equipment_id(&self, equipment_id: Uuid) -> RepositoryResult<Vec<EquipmentSnapshot>> {
        let rows = sqlx::query("SELECT * FROM equipment_snapshots WHERE equipment_id = $1 ORDER BY snapshot_time DESC")
            .bind(equipment_id)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_snapshot).collect()
    }

    async fn get_by_imei(&self, imei: &str) -> RepositoryResult<Vec<EquipmentSnapshot>> {
        let rows = sqlx::query("SELECT * FROM equipment_snapshots WHERE imei = $1 ORDER BY snapshot_time DESC")
            .bind(imei)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_snapshot).collect()
    }

    async fn delete_old_snapshots(&self, before: DateTime<Utc>) -> RepositoryResult<u64> {
        let result = sqlx::query("DELETE FROM equipment_snapshots WHERE snapshot_time < $1")
            .bind(before)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

fn row_to_snapshot(row: &sqlx::postgres::PgRow) -> RepositoryResult<EquipmentSnapshot> {
    let status_str: String = row.get("status");
    let snapshot_type_str: String = row.get("snapshot_type");
    Ok(EquipmentSnapshot {
        id: row.get("id"),
        equipment_id: row.get("equipment_id"),
        imei: row.get("imei"),
        snapshot_time: row.get("snapshot_time"),
        status: EquipmentStatus::from_str(&status_str).map_err(RepositoryError::Internal)?,
        reason: row.get("reason"),
        check_count: row.get::<i64, _>("check_count") as u64,
        metadata: row.get("metadata"),
        created_by: row.get("created_by"),
        snapshot_type: match snapshot_type_str.as_str() {
            "MANUAL" => SnapshotType::Manual,
            "AUTO" => SnapshotType::Auto,
            "SCHEDULED" => SnapshotType::Scheduled,
            other => return Err(RepositoryError::Internal(format!("unknown snapshot type: {}", other))),
        },
    })
}

#[async_trait]
impl RepositoryBackend for PostgresRepository {
    async fn connect(&self) -> RepositoryResult<()> {
        self.ensure_schema().await
    }

    async fn disconnect(&self) -> RepositoryResult<()> {
        self.pool.close().await;
        Ok(())
    }

    async fn ping(&self) -> RepositoryResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn health_check(&self) -> RepositoryResult<()> {
        self.ping().await
    }

    async fn get_connection_stats(&self) -> RepositoryResult<ConnectionStats> {
        Ok(ConnectionStats {
            open_connections: self.pool.size(),
            idle_connections: self.pool.num_idle() as u32,
            in_use_connections: self.pool.size().saturating_sub(self.pool.num_idle() as u32),
        })
    }

    async fn begin_transaction(&self) -> RepositoryResult<Box<dyn Transaction>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgTransaction { tx: Some(tx) }))
    }

    async fn purge_old_audits(&self, cutoff: DateTime<Utc>) -> RepositoryResult<u64> {
        let result = sqlx::query("DELETE FROM audit_logs WHERE check_time < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn purge_old_history(&self, cutoff: DateTime<Utc>) -> RepositoryResult<u64> {
        let result = sqlx::query("DELETE FROM equipment_history WHERE changed_at < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn optimize_database(&self) -> RepositoryResult<()> {
        if let Err(e) = sqlx::query("VACUUM ANALYZE equipment").execute(&self.pool).await {
            log::warn!("optimize_database: best-effort VACUUM failed: {}", e);
        }
        Ok(())
    }
}

/// A single SQL transaction scoping the increment/audit/history writes.
struct PgTransaction {
    tx: Option<sqlx::Transaction<'static, Postgres>>,
}

impl PgTransaction {
    fn tx_mut(&mut self) -> RepositoryResult<&mut sqlx::Transaction<'static, Postgres>> {
        self.tx
            .as_mut()
            .ok_or_else(|| RepositoryError::Transaction("transaction already closed".to_string()))
    }
}

#[async_trait]
impl Transaction for PgTransaction {
    async fn get_equipment_by_imei(&mut self, imei: &str) -> RepositoryResult<Option<Equipment>> {
        let tx = self.tx_mut()?;
        let row = sqlx::query("SELECT * FROM equipment WHERE imei = $1 FOR UPDATE")
            .bind(imei)
            .fetch_optional(&mut **tx)
            .await?;
        row.as_ref().map(row_to_equipment).transpose()
    }

    async fn insert_equipment(&mut self, equipment: Equipment) -> RepositoryResult<Equipment> {
        let tx = self.tx_mut()?;
        sqlx::query(
            "INSERT INTO equipment (id, imei, status, added_by, last_updated, check_count,
             manufacturer_tac, manufacturer_name, reason, metadata)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(equipment.id)
        .bind(&equipment.imei)
        .bind(equipment.status.to_string())
        .bind(&equipment.added_by)
        .bind(equipment.last_updated)
        .bind(equipment.check_count as i64)
        .bind(&equipment.manufacturer_tac)
        .bind(&equipment.manufacturer_name)
        .bind(&equipment.reason)
        .bind(&equipment.metadata)
        .execute(&mut **tx)
        .await?;

        Ok(equipment)
    }

    async fn update_equipment_status(
        &mut self,
        imei: &str,
        status: EquipmentStatus,
        reason: Option<String>,
    ) -> RepositoryResult<()> {
        let tx = self.tx_mut()?;
        sqlx::query("UPDATE equipment SET status = $2, reason = $3, last_updated = now() WHERE imei = $1")
            .bind(imei)
            .bind(status.to_string())
            .bind(&reason)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    async fn increment_check_count(&mut self, imei: &str) -> RepositoryResult<u64> {
        let tx = self.tx_mut()?;
        let row = sqlx::query(
            "UPDATE equipment SET check_count = check_count + 1, last_updated = now()
             WHERE imei = $1 RETURNING check_count",
        )
        .bind(imei)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| RepositoryError::NotFound(format!("equipment with imei {} not found", imei)))?;

        Ok(row.get::<i64, _>("check_count") as u64)
    }

    async fn log_check(&mut self, entry: AuditLog) -> RepositoryResult<Uuid> {
        let tx = self.tx_mut()?;
        sqlx::query(
            "INSERT INTO audit_logs (id, imei, status, check_time, request_source, supi, gpsi,
             session_id, origin_host, origin_realm)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(entry.id)
        .bind(&entry.imei)
        .bind(entry.status.to_string())
        .bind(entry.check_time)
        .bind(entry.request_source.to_string())
        .bind(&entry.supi)
        .bind(&entry.gpsi)
        .bind(&entry.session_id)
        .bind(&entry.origin_host)
        .bind(&entry.origin_realm)
        .execute(&mut **tx)
        .await?;

        Ok(entry.id)
    }

    async fn log_check_extended(&mut self, record: AuditRecord) -> RepositoryResult<Uuid> {
        match record {
            AuditRecord::Basic(entry) => self.log_check(entry).await,
            AuditRecord::Extended { base, transport, history } => {
                let tx = self.tx_mut()?;
                sqlx::query(
                    "INSERT INTO audit_logs (id, imei, status, check_time, request_source, supi,
                     gpsi, session_id, origin_host, origin_realm, ip_address, user_agent,
                     processing_time_ms, additional_data, history_id)
                     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)",
                )
                .bind(base.id)
                .bind(&base.imei)
                .bind(base.status.to_string())
                .bind(base.check_time)
                .bind(base.request_source.to_string())
                .bind(&base.supi)
                .bind(&base.gpsi)
                .bind(&base.session_id)
                .bind(&base.origin_host)
                .bind(&base.origin_realm)
                .bind(&transport.ip_address)
                .bind(&transport.user_agent)
                .bind(transport.processing_time_ms as i64)
                .bind(&transport.additional_data)
                .bind(history)
                .execute(&mut **tx)
                .await?;

                Ok(base.id)
            }
        }
    }

    async fn record_history(&mut self, entry: EquipmentHistory) -> RepositoryResult<Uuid> {
        let tx = self.tx_mut()?;
        sqlx::query(
            "INSERT INTO equipment_history (id, imei, change_type, changed_at, changed_by,
             prev_status, new_status, reason)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(entry.id)
        .bind(&entry.imei)
        .bind(change_type_to_str(entry.change_type))
        .bind(entry.changed_at)
        .bind(&entry.changed_by)
        .bind(entry.prev_status.map(|s| s.to_string()))
        .bind(entry.new_status.map(|s| s.to_string()))
        .bind(&entry.reason)
        .execute(&mut **tx)
        .await?;

        Ok(entry.id)
    }

    async fn commit(mut self: Box<Self>) -> RepositoryResult<()> {
        if let Some(tx) = self.tx.take() {
            tx.commit().await?;
        }
        Ok(())
    }

    async fn rollback(mut self: Box<Self>) -> RepositoryResult<()> {
        if let Some(tx) = self.tx.take() {
            tx.rollback().await?;
        }
        Ok(())
    }
}
