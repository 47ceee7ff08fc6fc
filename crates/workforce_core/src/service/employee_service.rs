//! Employee use-case service.
//!
//! # Responsibility
//! - Provide list/get/create/update/delete APIs over employees.
//! - Serve performance and attendance history for one employee.
//!
//! # Invariants
//! - Updates touch only `position`, `department` and `salary`.
//! - Histories are ordered newest first.

use super::{ServiceError, ServiceResult};
use crate::model::attendance::Attendance;
use crate::model::employee::{EmployeeDetail, EmployeeId, EmployeeListItem, EmployeePatch, NewEmployee};
use crate::model::performance::Performance;
use crate::model::ValidationError;
use crate::repo::employee_repo::{EmployeeListQuery, EmployeeRepository};
use crate::repo::page::Paginated;
use chrono::{Days, NaiveDate};
use log::info;
use serde::Serialize;

pub const DEFAULT_ATTENDANCE_HISTORY_DAYS: u32 = 30;

/// Reviews of one employee, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PerformanceHistory {
    pub employee: EmployeeListItem,
    pub reviews: Vec<Performance>,
    pub count: usize,
}

/// Attendance of one employee inside `[from, to]`, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttendanceHistory {
    pub employee: EmployeeListItem,
    /// `"<from> to <to>"`.
    pub period: String,
    pub records: Vec<Attendance>,
    pub count: usize,
}

/// Employee service facade over repository implementations.
pub struct EmployeeService<R: EmployeeRepository> {
    repo: R,
}

impl<R: EmployeeRepository> EmployeeService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn list(&self, query: &EmployeeListQuery) -> ServiceResult<Paginated<EmployeeListItem>> {
        Ok(self.repo.list_employees(query)?)
    }

    pub fn get(&self, id: EmployeeId) -> ServiceResult<EmployeeDetail> {
        self.repo
            .get_employee_detail(id)?
            .ok_or(ServiceError::NotFound {
                entity: "employee",
                id,
            })
    }

    pub fn create(&self, employee: &NewEmployee) -> ServiceResult<EmployeeDetail> {
        let id = self.repo.create_employee(employee)?;
        info!("event=employee_create module=service status=ok employee_id={id}");
        self.repo
            .get_employee_detail(id)?
            .ok_or(ServiceError::InconsistentState(
                "created employee not found in read-back",
            ))
    }

    pub fn update(&self, id: EmployeeId, patch: &EmployeePatch) -> ServiceResult<EmployeeDetail> {
        if patch.is_empty() {
            return Err(ValidationError::new(
                "patch",
                "expected at least one of position, department, salary",
            )
            .into());
        }
        self.repo.update_employee(id, patch)?;
        self.repo
            .get_employee_detail(id)?
            .ok_or(ServiceError::InconsistentState(
                "updated employee not found in read-back",
            ))
    }

    /// Deletes the employee and returns the record as it was.
    pub fn delete(&self, id: EmployeeId) -> ServiceResult<EmployeeDetail> {
        let existing = self.get(id)?;
        self.repo.delete_employee(id)?;
        info!("event=employee_delete module=service status=ok employee_id={id}");
        Ok(existing)
    }

    pub fn performance_history(&self, id: EmployeeId) -> ServiceResult<PerformanceHistory> {
        let employee = self.list_item(id)?;
        let reviews = self.repo.list_performance(id)?;
        Ok(PerformanceHistory {
            employee,
            count: reviews.len(),
            reviews,
        })
    }

    /// Records dated within the trailing `days` days ending at `as_of`.
    pub fn attendance_history(
        &self,
        id: EmployeeId,
        days: u32,
        as_of: NaiveDate,
    ) -> ServiceResult<AttendanceHistory> {
        let from = as_of
            .checked_sub_days(Days::new(u64::from(days)))
            .ok_or_else(|| {
                ValidationError::new("days", format!("{days} days before {as_of} is out of range"))
            })?;
        let employee = self.list_item(id)?;
        let records = self.repo.list_attendance(id, from, as_of)?;
        Ok(AttendanceHistory {
            employee,
            period: format!("{from} to {as_of}"),
            count: records.len(),
            records,
        })
    }

    fn list_item(&self, id: EmployeeId) -> ServiceResult<EmployeeListItem> {
        let detail = self.get(id)?;
        Ok(EmployeeListItem {
            id: detail.id,
            employee_id: detail.employee_id,
            full_name: detail.full_name,
            email: detail.email,
            department_name: detail.department.name,
            position: detail.position,
            salary: detail.salary,
            hire_date: detail.hire_date,
        })
    }
}
