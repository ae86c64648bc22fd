use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuditError {
    #[error("repository error: {0}")]
    Repository(#[from] eir_repository::RepositoryError),
}

pub type AuditResult<T> = Result<T, AuditError>;
