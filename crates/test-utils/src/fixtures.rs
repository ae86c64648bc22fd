//! Test fixtures and mock data for equipment identity records.

use chrono::Utc;
use eir_repository::{ChangeType, Equipment, EquipmentHistory, EquipmentStatus};
use uuid::Uuid;

/// A syntactically valid, Luhn-passing test IMEI (not allocated to any
/// real device).
pub const TEST_IMEI_WHITELISTED: &str = "490154203237518";
pub const TEST_IMEI_BLACKLISTED: &str = "356938035643809";
pub const TEST_IMEI_UNKNOWN: &str = "353260051111139";

/// Build an `Equipment` fixture with the given IMEI and status.
pub fn test_equipment(imei: &str, status: EquipmentStatus) -> Equipment {
    Equipment {
        id: Uuid::new_v4(),
        imei: imei.to_string(),
        status,
        added_by: "test-fixture".to_string(),
        last_updated: Utc::now(),
        check_count: 0,
        manufacturer_tac: Equipment::tac_from_imei(imei),
        manufacturer_name: None,
        reason: Some(format!("fixture: {}", status)),
        metadata: None,
    }
}

pub fn whitelisted_equipment() -> Equipment {
    test_equipment(TEST_IMEI_WHITELISTED, EquipmentStatus::Whitelisted)
}

pub fn blacklisted_equipment() -> Equipment {
    test_equipment(TEST_IMEI_BLACKLISTED, EquipmentStatus::Blacklisted)
}

/// Build an `EquipmentHistory` row recording a provisioning create.
pub fn test_history_create(imei: &str, status: EquipmentStatus) -> EquipmentHistory {
    EquipmentHistory {
        id: Uuid::new_v4(),
        imei: imei.to_string(),
        change_type: ChangeType::Create,
        changed_at: Utc::now(),
        changed_by: "test-fixture".to_string(),
        prev_status: None,
        new_status: Some(status),
        reason: Some("fixture".to_string()),
    }
}

/// JSON body for `POST /equipment`, matching `ProvisionEquipmentRequest`.
pub fn provision_equipment_json(imei: &str, status: EquipmentStatus) -> serde_json::Value {
    serde_json::json!({
        "imei": imei,
        "status": status.to_string(),
        "reason": "fixture",
        "added_by": "test-fixture",
    })
}
