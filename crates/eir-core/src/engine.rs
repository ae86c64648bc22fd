//! The decision engine: IMEI validation, lookup, default policy, atomic
//! counter increment, audit emission, and status mapping. A trait
//! (`EquipmentDecisionEngine`) plus struct (`CoreDecisionEngine`) pair,
//! shaped like the teacher's `PcfEngineTrait`/`PcfEngine`: the struct holds
//! `Arc`-shared sub-components and drives them through `#[async_trait]`
//! methods.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use uuid::Uuid;

use eir_cache::{CacheGet, CachedEquipmentStatus, EquipmentStatusCache};
use eir_repository::{
    AuditLog, AuditRecord, ChangeType, Equipment, EquipmentHistory, EquipmentStatus,
    RepositoryBackend, RequestSource, TransportMeta,
};

use crate::error::{EirError, EirResult};
use crate::imei::Imei;

/// Policy applied when an IMEI has no equipment record yet.
#[derive(Debug, Clone)]
pub struct DefaultPolicy {
    pub default_status: EquipmentStatus,
    pub default_reason: String,
    /// When true, the first observation of an unknown IMEI is persisted so
    /// it becomes traceable; when false the default verdict is returned
    /// without writing a record.
    pub implicit_insert: bool,
}

impl Default for DefaultPolicy {
    fn default() -> Self {
        Self {
            default_status: EquipmentStatus::Whitelisted,
            default_reason: "Default policy for unknown equipment".to_string(),
            implicit_insert: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CheckEquipmentRequest {
    pub imei: String,
    pub request_source: RequestSource,
    pub supi: Option<String>,
    pub gpsi: Option<String>,
    pub session_id: Option<String>,
    pub origin_host: Option<String>,
    pub origin_realm: Option<String>,
    /// Present only for callers (e.g. the HTTP 5G endpoint) able to observe
    /// transport-level metadata; drives `AuditLog` vs `AuditLogExtended`.
    pub transport: Option<TransportMeta>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckEquipmentResponse {
    pub status: EquipmentStatus,
    pub reason: Option<String>,
    pub found: bool,
    pub processing_time_ms: u64,
}

#[async_trait]
pub trait EquipmentDecisionEngine: Send + Sync {
    async fn check_equipment(
        &self,
        request: CheckEquipmentRequest,
    ) -> EirResult<CheckEquipmentResponse>;
}

pub struct CoreDecisionEngine {
    backend: Arc<dyn RepositoryBackend>,
    cache: Option<Arc<dyn CacheGet>>,
    cache_ttl: Duration,
    default_policy: DefaultPolicy,
}

impl CoreDecisionEngine {
    pub fn new(backend: Arc<dyn RepositoryBackend>) -> Self {
        Self {
            backend,
            cache: None,
            cache_ttl: Duration::from_secs(300),
            default_policy: DefaultPolicy::default(),
        }
    }

    pub fn with_cache(mut self, cache: Arc<dyn CacheGet>, ttl: Duration) -> Self {
        self.cache = Some(cache);
        self.cache_ttl = ttl;
        self
    }

    pub fn with_default_policy(mut self, policy: DefaultPolicy) -> Self {
        self.default_policy = policy;
        self
    }

    fn status_cache(&self) -> Option<EquipmentStatusCache<'_>> {
        self.cache
            .as_ref()
            .map(|c| EquipmentStatusCache::new(c.as_ref(), self.cache_ttl))
    }

    /// One attempt at the full lookup/default-policy/increment/audit unit,
    /// run inside a single repository transaction.
    async fn run_once(
        &self,
        imei: &Imei,
        request: &CheckEquipmentRequest,
    ) -> EirResult<CheckEquipmentResponse> {
        let mut tx = self.backend.begin_transaction().await?;

        let existing = tx.get_equipment_by_imei(imei.as_str()).await?;

        let (status, reason, found) = match existing {
            Some(equipment) => (equipment.status, equipment.reason.clone(), true),
            None => {
                let status = self.default_policy.default_status;
                let reason = Some(self.default_policy.default_reason.clone());
                if self.default_policy.implicit_insert {
                    let now = Utc::now();
                    let equipment = Equipment {
                        id: Uuid::new_v4(),
                        imei: imei.as_str().to_string(),
                        status,
                        added_by: "system:default-policy".to_string(),
                        last_updated: now,
                        check_count: 0,
                        manufacturer_tac: imei.manufacturer_tac(),
                        manufacturer_name: None,
                        reason: reason.clone(),
                        metadata: None,
                    };
                    tx.insert_equipment(equipment).await?;
                    tx.record_history(EquipmentHistory {
                        id: Uuid::new_v4(),
                        imei: imei.as_str().to_string(),
                        change_type: ChangeType::Create,
                        changed_at: now,
                        changed_by: "system:default-policy".to_string(),
                        prev_status: None,
                        new_status: Some(status),
                        reason: reason.clone(),
                    })
                    .await?;
                }
                (status, reason, false)
            }
        };

        tx.increment_check_count(imei.as_str()).await?;

        let base = AuditLog {
            id: Uuid::new_v4(),
            imei: imei.as_str().to_string(),
            status,
            check_time: Utc::now(),
            request_source: request.request_source,
            supi: request.supi.clone(),
            gpsi: request.gpsi.clone(),
            session_id: request.session_id.clone(),
            origin_host: request.origin_host.clone(),
            origin_realm: request.origin_realm.clone(),
        };

        let record = match &request.transport {
            Some(transport) => AuditRecord::Extended {
                base,
                transport: transport.clone(),
                history: None,
            },
            None => AuditRecord::Basic(base),
        };
        tx.log_check_extended(record).await?;

        tx.commit().await?;

        Ok(CheckEquipmentResponse {
            status,
            reason,
            found,
            processing_time_ms: 0,
        })
    }
}

#[async_trait]
impl EquipmentDecisionEngine for CoreDecisionEngine {
    async fn check_equipment(
        &self,
        request: CheckEquipmentRequest,
    ) -> EirResult<CheckEquipmentResponse> {
        let started = std::time::Instant::now();

        let imei = Imei::new(&request.imei)?;

        if let Some(cache) = self.status_cache() {
            if let Some(cached) = cache.probe(imei.as_str()).await.unwrap_or(None) {
                let status = cached
                    .status
                    .parse::<EquipmentStatus>()
                    .map_err(EirError::ProtocolError)?;
                return Ok(CheckEquipmentResponse {
                    status,
                    reason: cached.reason,
                    found: true,
                    processing_time_ms: started.elapsed().as_millis() as u64,
                });
            }
        }

        // §4.C step 7: one retry with jittered 50-200ms backoff on a
        // transient repository failure before surfacing the error.
        let result = match self.run_once(&imei, &request).await {
            Ok(response) => Ok(response),
            Err(e) if e.is_retryable() => {
                let jitter_ms = rand::thread_rng().gen_range(50..=200);
                tokio::time::sleep(Duration::from_millis(jitter_ms)).await;
                self.run_once(&imei, &request).await
            }
            Err(e) => Err(e),
        };

        let mut response = result?;
        response.processing_time_ms = started.elapsed().as_millis() as u64;

        if let Some(cache) = self.status_cache() {
            let cached = CachedEquipmentStatus {
                status: response.status.to_string(),
                reason: response.reason.clone(),
            };
            let _ = cache.populate(imei.as_str(), &cached).await;
        }

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eir_repository::InMemoryRepository;

    fn request(imei: &str) -> CheckEquipmentRequest {
        CheckEquipmentRequest {
            imei: imei.to_string(),
            request_source: RequestSource::DiameterS13,
            supi: None,
            gpsi: None,
            session_id: Some("session;1".to_string()),
            origin_host: Some("mme.example.net".to_string()),
            origin_realm: Some("example.net".to_string()),
            transport: None,
        }
    }

    #[tokio::test]
    async fn unknown_imei_resolves_to_default_policy_and_persists() {
        let backend: Arc<dyn RepositoryBackend> = Arc::new(InMemoryRepository::new());
        let engine = CoreDecisionEngine::new(backend.clone());

        let response = engine
            .check_equipment(request("490154203237518"))
            .await
            .unwrap();

        assert_eq!(response.status, EquipmentStatus::Whitelisted);
        assert!(!response.found);
        assert_eq!(
            response.reason.as_deref(),
            Some("Default policy for unknown equipment")
        );

        use eir_repository::EquipmentRepository;
        let stored = backend
            .get_by_imei("490154203237518")
            .await
            .unwrap()
            .expect("implicit insert");
        assert_eq!(stored.check_count, 1);
    }

    #[tokio::test]
    async fn known_imei_increments_check_count_each_call() {
        let backend: Arc<dyn RepositoryBackend> = Arc::new(InMemoryRepository::new());
        let engine = CoreDecisionEngine::new(backend.clone());

        engine
            .check_equipment(request("490154203237518"))
            .await
            .unwrap();
        let second = engine
            .check_equipment(request("490154203237518"))
            .await
            .unwrap();

        assert!(second.found);

        use eir_repository::EquipmentRepository;
        let stored = backend
            .get_by_imei("490154203237518")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.check_count, 2);
    }

    #[tokio::test]
    async fn malformed_imei_is_rejected_before_touching_the_repository() {
        let backend: Arc<dyn RepositoryBackend> = Arc::new(InMemoryRepository::new());
        let engine = CoreDecisionEngine::new(backend);

        let err = engine
            .check_equipment(request("not-an-imei"))
            .await
            .unwrap_err();

        assert!(matches!(err, EirError::InvalidImei(_)));
    }
}
