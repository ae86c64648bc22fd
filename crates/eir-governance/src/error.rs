use thiserror::Error;

#[derive(Debug, Error)]
pub enum GovernanceError {
    #[error("registration failed: {0}")]
    RegistrationFailed(String),

    #[error("deregistration failed: {0}")]
    DeregistrationFailed(String),
}

pub type GovernanceResult<T> = Result<T, GovernanceError>;
