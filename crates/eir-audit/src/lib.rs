//! Compliance-grade audit/history subsystem: append-only records, change
//! tracking, statistics, and a periodic retention sweep.

pub mod error;
pub mod retention;
pub mod service;

pub use error::{AuditError, AuditResult};
pub use retention::RetentionScheduler;
pub use service::AuditService;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use eir_repository::{ChangeType, EquipmentStatus, InMemoryRepository};
    use std::sync::Arc;

    #[tokio::test]
    async fn purge_older_than_removes_only_stale_rows() {
        let repo = Arc::new(InMemoryRepository::new());
        let audit = AuditService::new(repo.clone());

        audit
            .record_mutation(
                "490154203237518",
                ChangeType::Create,
                "admin",
                None,
                Some(EquipmentStatus::Whitelisted),
                None,
            )
            .await
            .unwrap();

        let (audits_removed, history_removed) = audit
            .purge_older_than(Utc::now() - chrono::Duration::days(90))
            .await
            .unwrap();

        assert_eq!(audits_removed, 0);
        assert_eq!(history_removed, 0);

        let history = audit.get_history_by_imei("490154203237518").await.unwrap();
        assert_eq!(history.len(), 1);
    }
}
