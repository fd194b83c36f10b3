use thiserror::Error;

/// Errors that can occur during order operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum OrderError {
    #[error("{0}")]
    InvalidTransition(String),
    #[error("order {0} has already been settled")]
    AlreadySettled(String),
    #[error("{0}")]
    Locked(String),
    #[error("{0}")]
    Validation(String),
}
