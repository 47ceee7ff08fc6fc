//! Employee domain model.
//!
//! # Invariants
//! - `employee_id` and `email` are unique across the store.
//! - An employee always belongs to exactly one existing department.
//! - After creation only `position`, `department` and `salary` change.

use super::department::{Department, DepartmentId};
use super::{require_money, require_text, ValidationError};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Row id of an employee (distinct from the business `employee_id` code).
pub type EmployeeId = i64;

pub const EMPLOYEE_CODE_MAX_CHARS: usize = 20;
pub const FULL_NAME_MAX_CHARS: usize = 100;
pub const POSITION_MAX_CHARS: usize = 100;
pub const EMAIL_MAX_CHARS: usize = 254;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

/// Persisted employee record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: EmployeeId,
    pub employee_id: String,
    pub full_name: String,
    pub email: String,
    pub department_id: DepartmentId,
    pub position: String,
    pub salary: Decimal,
    pub hire_date: NaiveDate,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

/// List row: employee fields plus the owning department's name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmployeeListItem {
    pub id: EmployeeId,
    pub employee_id: String,
    pub full_name: String,
    pub email: String,
    pub department_name: String,
    pub position: String,
    pub salary: Decimal,
    pub hire_date: NaiveDate,
}

/// Detail view: employee with its department embedded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmployeeDetail {
    pub id: EmployeeId,
    pub employee_id: String,
    pub full_name: String,
    pub email: String,
    pub department: Department,
    pub position: String,
    pub salary: Decimal,
    pub hire_date: NaiveDate,
    pub created_at: i64,
}

impl EmployeeDetail {
    pub fn from_parts(employee: Employee, department: Department) -> Self {
        Self {
            id: employee.id,
            employee_id: employee.employee_id,
            full_name: employee.full_name,
            email: employee.email,
            department,
            position: employee.position,
            salary: employee.salary,
            hire_date: employee.hire_date,
            created_at: employee.created_at,
        }
    }
}

/// Create payload for an employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewEmployee {
    pub employee_id: String,
    pub full_name: String,
    pub email: String,
    #[serde(alias = "department")]
    pub department_id: DepartmentId,
    pub position: String,
    pub salary: Decimal,
    pub hire_date: NaiveDate,
}

impl NewEmployee {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("employee_id", &self.employee_id, EMPLOYEE_CODE_MAX_CHARS)?;
        require_text("full_name", &self.full_name, FULL_NAME_MAX_CHARS)?;
        require_text("email", &self.email, EMAIL_MAX_CHARS)?;
        if !EMAIL_RE.is_match(self.email.trim()) {
            return Err(ValidationError::new("email", "must be a valid email address"));
        }
        require_text("position", &self.position, POSITION_MAX_CHARS)?;
        require_money("salary", self.salary)
    }
}

/// Partial update payload. Keys other than `position`, `department` and
/// `salary` are rejected while parsing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EmployeePatch {
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default, alias = "department")]
    pub department_id: Option<DepartmentId>,
    #[serde(default)]
    pub salary: Option<Decimal>,
}

impl EmployeePatch {
    pub fn is_empty(&self) -> bool {
        self.position.is_none() && self.department_id.is_none() && self.salary.is_none()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(position) = self.position.as_deref() {
            require_text("position", position, POSITION_MAX_CHARS)?;
        }
        if let Some(salary) = self.salary {
            require_money("salary", salary)?;
        }
        Ok(())
    }

    /// Applies this patch on top of an existing record.
    pub fn apply_to(&self, employee: &mut Employee) {
        if let Some(position) = self.position.as_ref() {
            employee.position = position.trim().to_string();
        }
        if let Some(department_id) = self.department_id {
            employee.department_id = department_id;
        }
        if let Some(salary) = self.salary {
            employee.salary = salary;
        }
    }
}
