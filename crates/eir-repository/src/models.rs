//! Data model: equipment records, append-only audit/history, snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EquipmentStatus {
    Whitelisted,
    Greylisted,
    Blacklisted,
}

impl EquipmentStatus {
    /// Maps to the Diameter `Equipment-Status` enumerated AVP value.
    pub fn to_diameter_value(self) -> u32 {
        match self {
            EquipmentStatus::Whitelisted => 0,
            EquipmentStatus::Blacklisted => 1,
            EquipmentStatus::Greylisted => 2,
        }
    }

    pub fn from_diameter_value(value: u32) -> Option<Self> {
        match value {
            0 => Some(EquipmentStatus::Whitelisted),
            1 => Some(EquipmentStatus::Blacklisted),
            2 => Some(EquipmentStatus::Greylisted),
            _ => None,
        }
    }
}

impl std::fmt::Display for EquipmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EquipmentStatus::Whitelisted => "WHITELISTED",
            EquipmentStatus::Greylisted => "GREYLISTED",
            EquipmentStatus::Blacklisted => "BLACKLISTED",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for EquipmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "WHITELISTED" => Ok(EquipmentStatus::Whitelisted),
            "GREYLISTED" => Ok(EquipmentStatus::Greylisted),
            "BLACKLISTED" => Ok(EquipmentStatus::Blacklisted),
            other => Err(format!("unknown equipment status: {}", other)),
        }
    }
}

/// Equipment aggregate root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Equipment {
    pub id: Uuid,
    pub imei: String,
    pub status: EquipmentStatus,
    pub added_by: String,
    pub last_updated: DateTime<Utc>,
    pub check_count: u64,
    pub manufacturer_tac: Option<String>,
    pub manufacturer_name: Option<String>,
    pub reason: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

impl Equipment {
    /// `ManufacturerTAC` is the first 8 digits of a normalised IMEI.
    pub fn tac_from_imei(imei: &str) -> Option<String> {
        if imei.len() >= 8 {
            Some(imei[..8].to_string())
        } else {
            None
        }
    }

    /// Saturating increment, per the `CheckCount` invariant: it never wraps.
    pub fn increment_check_count(&mut self) {
        self.check_count = self.check_count.saturating_add(1);
        self.last_updated = Utc::now();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestSource {
    DiameterS13,
    Http5g,
    AdminUpdate,
}

impl std::fmt::Display for RequestSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RequestSource::DiameterS13 => "DIAMETER_S13",
            RequestSource::Http5g => "HTTP_5G",
            RequestSource::AdminUpdate => "ADMIN_UPDATE",
        };
        write!(f, "{}", s)
    }
}

/// Append-only check record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLog {
    pub id: Uuid,
    pub imei: String,
    pub status: EquipmentStatus,
    pub check_time: DateTime<Utc>,
    pub request_source: RequestSource,
    pub supi: Option<String>,
    pub gpsi: Option<String>,
    pub session_id: Option<String>,
    pub origin_host: Option<String>,
    pub origin_realm: Option<String>,
}

/// Transport metadata carried only on the extended form of an audit record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportMeta {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub processing_time_ms: u64,
    pub additional_data: Option<serde_json::Value>,
}

/// An audit record is either the plain check record, or the same record
/// extended with transport metadata and an optional reference to the
/// `EquipmentHistory` row written in the same transaction. The history
/// reference is carried as a `Uuid` rather than an owned `EquipmentHistory`
/// to avoid a cyclic ownership relationship between the two append-only
/// tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum AuditRecord {
    Basic(AuditLog),
    Extended {
        base: AuditLog,
        transport: TransportMeta,
        history: Option<Uuid>,
    },
}

impl AuditRecord {
    pub fn base(&self) -> &AuditLog {
        match self {
            AuditRecord::Basic(log) => log,
            AuditRecord::Extended { base, .. } => base,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeType {
    Create,
    Update,
    Delete,
    Check,
    StatusChange,
}

/// Append-only change-tracking record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EquipmentHistory {
    pub id: Uuid,
    pub imei: String,
    pub change_type: ChangeType,
    pub changed_at: DateTime<Utc>,
    pub changed_by: String,
    pub prev_status: Option<EquipmentStatus>,
    pub new_status: Option<EquipmentStatus>,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SnapshotType {
    Manual,
    Auto,
    Scheduled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EquipmentSnapshot {
    pub id: Uuid,
    pub equipment_id: Uuid,
    pub imei: String,
    pub snapshot_time: DateTime<Utc>,
    pub status: EquipmentStatus,
    pub reason: Option<String>,
    pub check_count: u64,
    pub metadata: Option<serde_json::Value>,
    pub created_by: String,
    pub snapshot_type: SnapshotType,
}

/// Aggregates returned by `GetAuditStatistics`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditStatistics {
    pub total_checks: u64,
    pub unique_imeis: u64,
    pub whitelisted_count: u64,
    pub greylisted_count: u64,
    pub blacklisted_count: u64,
    pub diameter_checks: u64,
    pub http_checks: u64,
    pub avg_processing_time_ms: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConnectionStats {
    pub open_connections: u32,
    pub idle_connections: u32,
    pub in_use_connections: u32,
}
