//! Error taxonomy for the decision engine, grounded on `PcfError`'s shape:
//! one variant per failure kind, each carrying context, plus `is_retryable()`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EirError {
    #[error("invalid IMEI: {0}")]
    InvalidImei(String),

    #[error("missing required AVP: {0}")]
    MissingAvp(String),

    #[error("repository unavailable (transient): {0}")]
    RepositoryTransient(String),

    #[error("repository failure: {0}")]
    RepositoryFatal(String),

    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("protocol error: {0}")]
    ProtocolError(String),

    #[error("operation timed out")]
    Timeout,

    #[error("cancellation requested")]
    CancellationRequested,
}

impl EirError {
    /// Used by the one-retry-then-`TOO_BUSY` rule (spec §4.C step 7).
    pub fn is_retryable(&self) -> bool {
        matches!(self, EirError::RepositoryTransient(_) | EirError::Timeout)
    }
}

impl From<eir_repository::RepositoryError> for EirError {
    fn from(err: eir_repository::RepositoryError) -> Self {
        if err.is_retryable() {
            EirError::RepositoryTransient(err.to_string())
        } else {
            EirError::RepositoryFatal(err.to_string())
        }
    }
}

pub type EirResult<T> = Result<T, EirError>;
