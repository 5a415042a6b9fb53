use rusqlite::ffi;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("username already taken")]
    DuplicateUsername,

    #[error("corrupt {field} on row '{row}'")]
    Corrupt { field: &'static str, row: String },

    #[error("database lock poisoned")]
    LockPoisoned,

    #[error(transparent)]
    Store(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, DbError>;

/// True when an insert collided with a primary key or unique index.
/// Foreign key failures are not.
pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(e, _) => matches!(
            e.extended_code,
            ffi::SQLITE_CONSTRAINT_PRIMARYKEY | ffi::SQLITE_CONSTRAINT_UNIQUE
        ),
        _ => false,
    }
}
