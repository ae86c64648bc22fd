//! Shared `web::Data` application state for the HTTP surfaces.

use std::sync::Arc;

use eir_audit::AuditService;
use eir_core::EquipmentDecisionEngine;
use eir_repository::RepositoryBackend;

use crate::metrics::ServerMetrics;

pub struct AppState {
    pub engine: Arc<dyn EquipmentDecisionEngine>,
    pub backend: Arc<dyn RepositoryBackend>,
    pub audit: Arc<AuditService>,
    pub metrics: Arc<ServerMetrics>,
    pub start_version: &'static str,
}
