//! Equipment, audit and history repositories behind a transactional
//! facade, with a Postgres-backed adapter and an in-memory adapter the
//! decision engine is oblivious to at call time.

pub mod error;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod traits;

pub use error::{RepositoryError, RepositoryResult};
pub use memory::InMemoryRepository;
pub use models::*;
pub use postgres::PostgresRepository;
pub use traits::{
    AuditRepository, EquipmentRepository, ExtendedAuditRepository, HistoryRepository,
    RepositoryBackend, SnapshotRepository, Transaction,
};

use std::sync::Arc;

/// Selects which adapter backs the repository at startup. The decision
/// engine only ever holds a `Arc<dyn RepositoryBackend>`, so nothing
/// downstream branches on this choice.
#[derive(Clone)]
pub enum RepositoryHandle {
    Postgres(Arc<PostgresRepository>),
    InMemory(Arc<InMemoryRepository>),
}

impl RepositoryHandle {
    pub fn as_backend(&self) -> Arc<dyn RepositoryBackend> {
        match self {
            RepositoryHandle::Postgres(repo) => repo.clone(),
            RepositoryHandle::InMemory(repo) => repo.clone(),
        }
    }
}
