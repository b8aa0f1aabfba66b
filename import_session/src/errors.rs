//! Error types for import sessions

use import_client::{ImportClientError, ValidationError};
use thiserror::Error;

/// Errors returned synchronously by controller operations.  Failures of a running import
/// are not errors of the call; they end the session in `Phase::Failed`.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("An import is already in progress")]
    AlreadyActive,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Client setup error: {0}")]
    Client(#[from] ImportClientError),
}

pub type Result<T> = std::result::Result<T, SessionError>;

impl PartialEq for SessionError {
    fn eq(&self, other: &SessionError) -> bool {
        match (self, other) {
            (SessionError::Validation(a), SessionError::Validation(b)) => a == b,
            (SessionError::Client(a), SessionError::Client(b)) => a == b,
            (e1, e2) => std::mem::discriminant(e1) == std::mem::discriminant(e2),
        }
    }
}
