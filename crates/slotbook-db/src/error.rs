use thiserror::Error;

use slotbook_core::error::ErrorKind;

/// Database layer errors
#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] diesel::result::Error),

    #[error("Pool error: {0}")]
    PoolError(#[from] diesel_async::pooled_connection::bb8::RunError),

    #[error("Pool setup error: {0}")]
    PoolSetupError(#[from] diesel_async::pooled_connection::PoolError),

    #[error("Migration error: {0}")]
    MigrationError(String),

    #[error("Invalid stored row in {table}: {reason}")]
    InvalidRow {
        table: &'static str,
        reason: String,
    },

    #[error(transparent)]
    CoreError(#[from] slotbook_core::error::CoreError),
}

impl DbError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::CoreError(err) => err.kind(),
            Self::DatabaseError(_)
            | Self::PoolError(_)
            | Self::PoolSetupError(_)
            | Self::MigrationError(_)
            | Self::InvalidRow { .. } => ErrorKind::Internal,
        }
    }

    pub(crate) fn invalid_row(table: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidRow {
            table,
            reason: reason.into(),
        }
    }
}

pub type DbResult<T> = std::result::Result<T, DbError>;
