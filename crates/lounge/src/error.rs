use thiserror::Error;

/// Errors surfaced by the calendar and the store.
#[derive(Debug, Error)]
pub enum LoungeError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: i64 },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

impl LoungeError {
    pub fn validation(msg: impl Into<String>) -> Self {
        LoungeError::Validation(msg.into())
    }

    pub fn not_found(kind: &'static str, id: i64) -> Self {
        LoungeError::NotFound { kind, id }
    }
}

pub type Result<T, E = LoungeError> = std::result::Result<T, E>;
