//! Department domain model.
//!
//! # Invariants
//! - `name` and `code` are unique across the store (enforced by SQLite).
//! - `budget` is non-negative with at most two fractional digits.
//! - Deleting a department cascades to its employees.

use super::{require_money, require_text, ValidationError};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Row id of a department.
pub type DepartmentId = i64;

pub const DEPARTMENT_NAME_MAX_CHARS: usize = 100;
pub const DEPARTMENT_CODE_MAX_CHARS: usize = 10;
pub const DEPARTMENT_LOCATION_MAX_CHARS: usize = 100;

/// Persisted department record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    pub id: DepartmentId,
    pub name: String,
    pub code: String,
    pub budget: Decimal,
    pub location: String,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

/// Department read model carrying the live employee count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DepartmentSummary {
    #[serde(flatten)]
    pub department: Department,
    pub employee_count: u64,
}

/// Create payload for a department.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewDepartment {
    pub name: String,
    pub code: String,
    pub budget: Decimal,
    pub location: String,
}

impl NewDepartment {
    pub fn new(
        name: impl Into<String>,
        code: impl Into<String>,
        budget: Decimal,
        location: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            code: code.into(),
            budget,
            location: location.into(),
        }
    }

    /// Checks field shapes; uniqueness is left to the store.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name, DEPARTMENT_NAME_MAX_CHARS)?;
        require_text("code", &self.code, DEPARTMENT_CODE_MAX_CHARS)?;
        require_text("location", &self.location, DEPARTMENT_LOCATION_MAX_CHARS)?;
        require_money("budget", self.budget)
    }
}

/// Update payload for a department. Only the budget may change after
/// creation; any other key is rejected while parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DepartmentPatch {
    pub budget: Decimal,
}

impl DepartmentPatch {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_money("budget", self.budget)
    }
}

#[cfg(test)]
mod tests {
    use super::{DepartmentPatch, NewDepartment};
    use rust_decimal::Decimal;

    #[test]
    fn new_department_validation_names_the_failing_field() {
        let mut department = NewDepartment::new("IT", "IT01", Decimal::new(100_000, 0), "Berlin");
        assert!(department.validate().is_ok());

        department.code = "A-VERY-LONG-CODE".to_string();
        assert_eq!(department.validate().unwrap_err().field, "code");

        department.code = "IT01".to_string();
        department.budget = Decimal::new(-5, 0);
        assert_eq!(department.validate().unwrap_err().field, "budget");
    }

    #[test]
    fn department_patch_rejects_fields_other_than_budget() {
        let ok: DepartmentPatch = serde_json::from_str(r#"{"budget": "1500.50"}"#).unwrap();
        assert_eq!(ok.budget, Decimal::new(150_050, 2));

        let err = serde_json::from_str::<DepartmentPatch>(r#"{"budget": 1, "name": "Ops"}"#)
            .unwrap_err();
        assert!(err.to_string().contains("unknown field"));
    }
}
