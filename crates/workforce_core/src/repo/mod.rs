//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts per aggregate.
//! - Isolate SQLite query details from service orchestration.
//! - Map storage rows to typed records by hand, column by column.
//!
//! # Invariants
//! - Write paths validate payloads before SQL mutations.
//! - Unique-constraint violations surface as `RepoError::Conflict`.
//! - Money and scores are stored as integer hundredths.

use crate::db::DbError;
use crate::model::ValidationError;
use rusqlite::ffi;
use rusqlite::ErrorCode;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod department_repo;
pub mod employee_repo;
pub mod page;
pub mod stats_repo;
pub mod user_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error shared by all aggregates.
#[derive(Debug)]
pub enum RepoError {
    /// Payload failed validation before reaching SQLite.
    Validation(ValidationError),
    Db(DbError),
    /// Row addressed by id does not exist.
    NotFound { entity: &'static str, id: i64 },
    /// Unique constraint rejected the write.
    Conflict(String),
    /// Persisted data cannot be converted to a valid record.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::Conflict(message) => write!(f, "conflict: {message}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound { .. } | Self::Conflict(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Converts a write error into `Conflict`/`Validation` when SQLite reports a
/// unique or foreign-key violation.
pub(crate) fn classify_write_error(
    err: rusqlite::Error,
    conflict_message: impl FnOnce() -> String,
    foreign_key_field: &'static str,
) -> RepoError {
    if let rusqlite::Error::SqliteFailure(failure, _) = &err {
        if failure.code == ErrorCode::ConstraintViolation {
            match failure.extended_code {
                ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                    return RepoError::Conflict(conflict_message());
                }
                ffi::SQLITE_CONSTRAINT_FOREIGNKEY => {
                    return RepoError::Validation(ValidationError::new(
                        foreign_key_field,
                        "references a record that does not exist",
                    ));
                }
                _ => {}
            }
        }
    }
    err.into()
}

pub(crate) fn to_hundredths(field: &'static str, value: Decimal) -> RepoResult<i64> {
    (value.round_dp(2) * Decimal::ONE_HUNDRED)
        .to_i64()
        .ok_or_else(|| RepoError::Validation(ValidationError::new(field, "value out of range")))
}

pub(crate) fn from_hundredths(value: i64) -> Decimal {
    Decimal::new(value, 2)
}

/// Escapes `%`/`_` so user search text matches literally inside `LIKE`.
pub(crate) fn like_pattern(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len() + 2);
    escaped.push('%');
    for ch in text.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}
