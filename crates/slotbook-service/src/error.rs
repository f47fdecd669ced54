use thiserror::Error;

use slotbook_core::error::{CoreError, ErrorKind};
use slotbook_db::error::DbError;

/// Service layer errors - combines all error types
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    DatabaseError(#[from] DbError),

    #[error(transparent)]
    CoreError(#[from] CoreError),

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Authorization error: {0}")]
    AuthorizationError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl ServiceError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::DatabaseError(err) => err.kind(),
            Self::CoreError(err) => err.kind(),
            Self::NotAuthenticated => ErrorKind::Unauthenticated,
            Self::AuthorizationError(_) => ErrorKind::Forbidden,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::InvalidState(_) => ErrorKind::InvalidState,
            Self::ValidationError(_) => ErrorKind::ValidationFailed,
        }
    }

    pub(crate) fn not_found(what: &str, id: uuid::Uuid) -> Self {
        Self::NotFound(format!("{what} {id}"))
    }
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;
