//! Domain model for department/employee records and their reviews.
//!
//! # Responsibility
//! - Define the typed records persisted by the record store.
//! - Define write payloads (`New*`, `*Patch`) and their validation rules.
//!
//! # Invariants
//! - Every persisted record is identified by an integer row id.
//! - Money and scores are `Decimal` values with at most two fractional
//!   digits.
//! - Write payloads are validated before any SQL mutation.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod attendance;
pub mod department;
pub mod employee;
pub mod performance;
pub mod user;

/// Field-level validation failure for a write payload or persisted row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Payload field the failure refers to.
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid `{}`: {}", self.field, self.message)
    }
}

impl Error for ValidationError {}

pub(crate) fn require_text(
    field: &'static str,
    value: &str,
    max_chars: usize,
) -> Result<(), ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::new(field, "must not be blank"));
    }
    if trimmed.chars().count() > max_chars {
        return Err(ValidationError::new(
            field,
            format!("must be at most {max_chars} characters"),
        ));
    }
    Ok(())
}

pub(crate) fn require_money(
    field: &'static str,
    value: rust_decimal::Decimal,
) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ValidationError::new(field, "must not be negative"));
    }
    if value.round_dp(2) != value {
        return Err(ValidationError::new(
            field,
            "must have at most two decimal places",
        ));
    }
    Ok(())
}
