//! End-to-end scenarios against the decision engine and audit/history
//! subsystem, run over the in-memory repository so they need no external
//! Postgres instance.

use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use eir_audit::AuditService;
use eir_core::{CheckEquipmentRequest, CoreDecisionEngine, DefaultPolicy, EquipmentDecisionEngine};
use eir_repository::{
    ChangeType, Equipment, EquipmentHistory, EquipmentRepository, EquipmentStatus,
    InMemoryRepository, RepositoryBackend, RequestSource,
};
use uuid::Uuid;

fn request(imei: &str, source: RequestSource) -> CheckEquipmentRequest {
    CheckEquipmentRequest {
        imei: imei.to_string(),
        request_source: source,
        supi: None,
        gpsi: None,
        session_id: Some("session;42".to_string()),
        origin_host: Some("mme.example.net".to_string()),
        origin_realm: Some("example.net".to_string()),
        transport: None,
    }
}

async fn seeded_equipment(backend: &Arc<dyn RepositoryBackend>, imei: &str, status: EquipmentStatus) {
    let equipment = Equipment {
        id: Uuid::new_v4(),
        imei: imei.to_string(),
        status,
        added_by: "test-seed".to_string(),
        last_updated: Utc::now(),
        check_count: 0,
        manufacturer_tac: None,
        manufacturer_name: None,
        reason: Some(format!("seeded as {}", status)),
        metadata: None,
    };
    backend.create(equipment).await.unwrap();
}

/// Known whitelisted IMEI resolves to WHITELISTED.
#[tokio::test]
async fn whitelisted_imei_check_succeeds() {
    let backend: Arc<dyn RepositoryBackend> = Arc::new(InMemoryRepository::new());
    seeded_equipment(&backend, "490154203237518", EquipmentStatus::Whitelisted).await;
    let engine = CoreDecisionEngine::new(backend);

    let response = engine
        .check_equipment(request("490154203237518", RequestSource::DiameterS13))
        .await
        .unwrap();

    assert_eq!(response.status, EquipmentStatus::Whitelisted);
    assert!(response.found);
}

/// Known blacklisted IMEI resolves to BLACKLISTED, not overridden by policy.
#[tokio::test]
async fn blacklisted_imei_check_succeeds() {
    let backend: Arc<dyn RepositoryBackend> = Arc::new(InMemoryRepository::new());
    seeded_equipment(&backend, "356938035643809", EquipmentStatus::Blacklisted).await;
    let engine = CoreDecisionEngine::new(backend);

    let response = engine
        .check_equipment(request("356938035643809", RequestSource::DiameterS13))
        .await
        .unwrap();

    assert_eq!(response.status, EquipmentStatus::Blacklisted);
    assert!(response.found);
}

/// Known greylisted IMEI resolves to GREYLISTED.
#[tokio::test]
async fn greylisted_imei_check_succeeds() {
    let backend: Arc<dyn RepositoryBackend> = Arc::new(InMemoryRepository::new());
    seeded_equipment(&backend, "353260051111139", EquipmentStatus::Greylisted).await;
    let engine = CoreDecisionEngine::new(backend);

    let response = engine
        .check_equipment(request("353260051111139", RequestSource::Http5g))
        .await
        .unwrap();

    assert_eq!(response.status, EquipmentStatus::Greylisted);
}

/// An IMEI with no equipment record falls back to the configured default
/// policy and, with implicit insert on, becomes a traceable record.
#[tokio::test]
async fn unknown_imei_falls_back_to_default_policy() {
    let backend: Arc<dyn RepositoryBackend> = Arc::new(InMemoryRepository::new());
    let engine =
        CoreDecisionEngine::new(backend.clone()).with_default_policy(DefaultPolicy::default());

    let response = engine
        .check_equipment(request("490154203237518", RequestSource::DiameterS13))
        .await
        .unwrap();

    assert_eq!(response.status, EquipmentStatus::Whitelisted);
    assert!(!response.found);

    let stored = backend
        .get_by_imei("490154203237518")
        .await
        .unwrap()
        .expect("default policy implicitly inserts the record");
    assert_eq!(stored.check_count, 1);
}

/// A non-Luhn, non-numeric, or too-short string is rejected before any
/// repository access happens.
#[tokio::test]
async fn invalid_imei_is_rejected() {
    let backend: Arc<dyn RepositoryBackend> = Arc::new(InMemoryRepository::new());
    let engine = CoreDecisionEngine::new(backend.clone());

    let err = engine
        .check_equipment(request("123", RequestSource::DiameterS13))
        .await
        .unwrap_err();
    assert!(matches!(err, eir_core::EirError::InvalidImei(_)));

    // Rejected before touching the backend: no record was created.
    assert!(backend.get_by_imei("123").await.unwrap().is_none());
}

/// The same IMEI checked once over Diameter S13 and once over the 5G HTTP
/// surface resolves to the identical status: the decision is a function of
/// the stored record, not of which interface asked.
#[tokio::test]
async fn decision_is_consistent_across_request_sources() {
    let backend: Arc<dyn RepositoryBackend> = Arc::new(InMemoryRepository::new());
    seeded_equipment(&backend, "356938035643809", EquipmentStatus::Blacklisted).await;
    let engine = CoreDecisionEngine::new(backend.clone());

    let via_diameter = engine
        .check_equipment(request("356938035643809", RequestSource::DiameterS13))
        .await
        .unwrap();
    let via_http = engine
        .check_equipment(request("356938035643809", RequestSource::Http5g))
        .await
        .unwrap();

    assert_eq!(via_diameter.status, via_http.status);

    let stored = backend.get_by_imei("356938035643809").await.unwrap().unwrap();
    assert_eq!(stored.check_count, 2);
}

/// 10 clients x 50 requests against one whitelisted IMEI: every answer is
/// WHITELISTED, the final `CheckCount` is exactly `initial + 500`, and
/// exactly 500 audit rows exist. Needs the multi-thread runtime: on the
/// current-thread flavor every spawned task runs `begin->increment->commit`
/// to completion without yielding, so the 20 in-memory repository methods
/// never actually interleave and a lost-update bug would stay invisible.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_checks_increment_check_count_without_loss() {
    const CLIENTS: usize = 10;
    const REQUESTS_PER_CLIENT: usize = 50;

    let backend: Arc<dyn RepositoryBackend> = Arc::new(InMemoryRepository::new());
    seeded_equipment(&backend, "490154203237518", EquipmentStatus::Whitelisted).await;
    let engine = Arc::new(CoreDecisionEngine::new(backend.clone()));

    let mut handles = Vec::new();
    for _ in 0..CLIENTS {
        for _ in 0..REQUESTS_PER_CLIENT {
            let engine = engine.clone();
            handles.push(tokio::spawn(async move {
                let response = engine
                    .check_equipment(request("490154203237518", RequestSource::DiameterS13))
                    .await
                    .unwrap();
                assert_eq!(response.status, EquipmentStatus::Whitelisted);
            }));
        }
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let stored = backend.get_by_imei("490154203237518").await.unwrap().unwrap();
    assert_eq!(stored.check_count, (CLIENTS * REQUESTS_PER_CLIENT) as u64);

    use eir_repository::AuditRepository;
    let audits = backend
        .get_audits_by_imei("490154203237518", 0, (CLIENTS * REQUESTS_PER_CLIENT) as i64)
        .await
        .unwrap();
    assert_eq!(audits.len(), CLIENTS * REQUESTS_PER_CLIENT);
}

/// A transaction that is rolled back before commit leaves no trace: the
/// implicit-insert equipment row and its history entry must not appear.
#[tokio::test]
async fn rolled_back_transaction_leaves_no_trace() {
    let backend: Arc<dyn RepositoryBackend> = Arc::new(InMemoryRepository::new());

    let mut tx = backend.begin_transaction().await.unwrap();
    assert!(tx.get_equipment_by_imei("490154203237518").await.unwrap().is_none());

    let equipment = Equipment {
        id: Uuid::new_v4(),
        imei: "490154203237518".to_string(),
        status: EquipmentStatus::Whitelisted,
        added_by: "system:default-policy".to_string(),
        last_updated: Utc::now(),
        check_count: 0,
        manufacturer_tac: None,
        manufacturer_name: None,
        reason: None,
        metadata: None,
    };
    tx.insert_equipment(equipment).await.unwrap();
    tx.record_history(EquipmentHistory {
        id: Uuid::new_v4(),
        imei: "490154203237518".to_string(),
        change_type: ChangeType::Create,
        changed_at: Utc::now(),
        changed_by: "system:default-policy".to_string(),
        prev_status: None,
        new_status: Some(EquipmentStatus::Whitelisted),
        reason: None,
    })
    .await
    .unwrap();

    tx.rollback().await.unwrap();

    assert!(backend
        .get_by_imei("490154203237518")
        .await
        .unwrap()
        .is_none());
    let audit = AuditService::new(backend.clone());
    assert!(audit
        .get_history_by_imei("490154203237518")
        .await
        .unwrap()
        .is_empty());
}

/// Audit and history rows older than the retention cutoff are purged;
/// rows inside the window survive.
#[tokio::test]
async fn retention_purge_only_removes_rows_older_than_cutoff() {
    let backend: Arc<dyn RepositoryBackend> = Arc::new(InMemoryRepository::new());
    let audit = AuditService::new(backend.clone());

    let now = Utc::now();
    let stale_time = now - ChronoDuration::days(120);

    audit
        .record_mutation(
            "490154203237518",
            ChangeType::Create,
            "system:default-policy",
            None,
            Some(EquipmentStatus::Whitelisted),
            None,
        )
        .await
        .unwrap();

    // A history row backdated well past the 90-day retention window.
    backend
        .record_change(EquipmentHistory {
            id: Uuid::new_v4(),
            imei: "356938035643809".to_string(),
            change_type: ChangeType::Create,
            changed_at: stale_time,
            changed_by: "system:default-policy".to_string(),
            prev_status: None,
            new_status: Some(EquipmentStatus::Blacklisted),
            reason: None,
        })
        .await
        .unwrap();

    let cutoff = now - ChronoDuration::days(90);
    let (_audits_removed, history_removed) = audit.purge_older_than(cutoff).await.unwrap();

    assert_eq!(history_removed, 1);

    let remaining = audit.get_history_by_imei("490154203237518").await.unwrap();
    assert_eq!(remaining.len(), 1);
    let purged = audit.get_history_by_imei("356938035643809").await.unwrap();
    assert!(purged.is_empty());
}
