//! Department use-case service.
//!
//! # Responsibility
//! - Provide list/get/create/update/delete APIs over departments.
//! - Expose member listing and per-department statistics.
//!
//! # Invariants
//! - Only `budget` is updatable after creation.
//! - Every write is followed by a read-back; callers get the stored record.
//! - Deleting a department cascades to its employees and their records.

use super::{ServiceError, ServiceResult};
use crate::model::department::{DepartmentId, DepartmentPatch, DepartmentSummary, NewDepartment};
use crate::model::employee::EmployeeListItem;
use crate::repo::department_repo::{
    DepartmentListQuery, DepartmentRepository, DepartmentStatistics,
};
use crate::repo::page::Paginated;
use log::info;
use serde::Serialize;

/// Department detail together with its employees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DepartmentMembers {
    pub department: DepartmentSummary,
    /// Ordered by full name.
    pub employees: Vec<EmployeeListItem>,
}

/// Department service facade over repository implementations.
pub struct DepartmentService<R: DepartmentRepository> {
    repo: R,
}

impl<R: DepartmentRepository> DepartmentService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn list(&self, query: &DepartmentListQuery) -> ServiceResult<Paginated<DepartmentSummary>> {
        Ok(self.repo.list_departments(query)?)
    }

    pub fn get(&self, id: DepartmentId) -> ServiceResult<DepartmentSummary> {
        self.repo.get_department(id)?.ok_or(ServiceError::NotFound {
            entity: "department",
            id,
        })
    }

    pub fn create(&self, department: &NewDepartment) -> ServiceResult<DepartmentSummary> {
        let id = self.repo.create_department(department)?;
        info!("event=department_create module=service status=ok department_id={id}");
        self.repo
            .get_department(id)?
            .ok_or(ServiceError::InconsistentState(
                "created department not found in read-back",
            ))
    }

    pub fn update_budget(
        &self,
        id: DepartmentId,
        patch: &DepartmentPatch,
    ) -> ServiceResult<DepartmentSummary> {
        self.repo.update_department(id, patch)?;
        self.repo
            .get_department(id)?
            .ok_or(ServiceError::InconsistentState(
                "updated department not found in read-back",
            ))
    }

    /// Deletes the department and returns the record as it was.
    pub fn delete(&self, id: DepartmentId) -> ServiceResult<DepartmentSummary> {
        let existing = self.get(id)?;
        self.repo.delete_department(id)?;
        info!(
            "event=department_delete module=service status=ok department_id={id} cascaded_employees={}",
            existing.employee_count
        );
        Ok(existing)
    }

    pub fn employees(&self, id: DepartmentId) -> ServiceResult<DepartmentMembers> {
        let department = self.get(id)?;
        let employees = self.repo.list_members(id)?;
        Ok(DepartmentMembers {
            department,
            employees,
        })
    }

    pub fn statistics(&self, id: DepartmentId) -> ServiceResult<DepartmentStatistics> {
        self.repo
            .department_statistics(id)?
            .ok_or(ServiceError::NotFound {
                entity: "department",
                id,
            })
    }
}
