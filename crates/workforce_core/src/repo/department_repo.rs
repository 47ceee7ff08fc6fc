//! Department repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD and list/search APIs over `departments`.
//! - Compute per-department member listings and statistics.
//!
//! # Invariants
//! - Deleting a department relies on `ON DELETE CASCADE` to remove its
//!   employees and their reviews/attendance.
//! - List ordering is deterministic: the requested key, then `id ASC`.

use super::page::{PageRequest, Paginated};
use super::{classify_write_error, from_hundredths, like_pattern, to_hundredths};
use super::{RepoError, RepoResult};
use crate::model::department::{
    Department, DepartmentId, DepartmentPatch, DepartmentSummary, NewDepartment,
};
use crate::model::employee::EmployeeListItem;
use crate::repo::employee_repo::{parse_employee_list_row, EMPLOYEE_LIST_SELECT_SQL};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;
use serde::Serialize;

const DEPARTMENT_SELECT_SQL: &str = "SELECT
    d.id,
    d.name,
    d.code,
    d.budget_cents,
    d.location,
    d.created_at,
    (SELECT COUNT(*) FROM employees e WHERE e.department_id = d.id) AS employee_count
FROM departments d";

/// Sort keys accepted by department listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DepartmentOrdering {
    #[default]
    NameAsc,
    NameDesc,
    BudgetAsc,
    BudgetDesc,
    CreatedAsc,
    CreatedDesc,
}

impl DepartmentOrdering {
    /// Parses `name|-name|budget|-budget|created_at|-created_at`; anything
    /// else falls back to the default.
    pub fn parse_or_default(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("-name") => Self::NameDesc,
            Some("budget") => Self::BudgetAsc,
            Some("-budget") => Self::BudgetDesc,
            Some("created_at") => Self::CreatedAsc,
            Some("-created_at") => Self::CreatedDesc,
            _ => Self::NameAsc,
        }
    }

    fn sql(self) -> &'static str {
        match self {
            Self::NameAsc => "d.name COLLATE NOCASE ASC, d.id ASC",
            Self::NameDesc => "d.name COLLATE NOCASE DESC, d.id ASC",
            Self::BudgetAsc => "d.budget_cents ASC, d.id ASC",
            Self::BudgetDesc => "d.budget_cents DESC, d.id ASC",
            Self::CreatedAsc => "d.created_at ASC, d.id ASC",
            Self::CreatedDesc => "d.created_at DESC, d.id DESC",
        }
    }
}

/// Filter/sort/page options for department listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DepartmentListQuery {
    /// Case-insensitive substring over name, code and location.
    pub search: Option<String>,
    pub min_budget: Option<Decimal>,
    pub max_budget: Option<Decimal>,
    /// Case-insensitive substring over location.
    pub location: Option<String>,
    pub ordering: DepartmentOrdering,
    pub page: PageRequest,
}

/// Averages of the four review scores across a department.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreAverages {
    pub average_overall: f64,
    pub average_technical: f64,
    pub average_communication: f64,
    pub average_teamwork: f64,
}

/// Salary range inside one department.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SalaryRange {
    pub min: Decimal,
    pub max: Decimal,
}

/// Aggregate view of one department.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DepartmentStatistics {
    pub department: DepartmentSummary,
    pub employee_count: u64,
    pub average_salary: Decimal,
    pub salary_range: SalaryRange,
    /// Distinct positions, sorted.
    pub positions: Vec<String>,
    /// Present only when at least one review exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub performance_stats: Option<ScoreAverages>,
}

/// Repository interface for department operations.
pub trait DepartmentRepository {
    fn create_department(&self, department: &NewDepartment) -> RepoResult<DepartmentId>;
    fn get_department(&self, id: DepartmentId) -> RepoResult<Option<DepartmentSummary>>;
    fn find_by_code(&self, code: &str) -> RepoResult<Option<Department>>;
    fn list_departments(
        &self,
        query: &DepartmentListQuery,
    ) -> RepoResult<Paginated<DepartmentSummary>>;
    fn update_department(&self, id: DepartmentId, patch: &DepartmentPatch) -> RepoResult<()>;
    fn delete_department(&self, id: DepartmentId) -> RepoResult<()>;
    fn list_members(&self, id: DepartmentId) -> RepoResult<Vec<EmployeeListItem>>;
    fn department_statistics(
        &self,
        id: DepartmentId,
    ) -> RepoResult<Option<DepartmentStatistics>>;
}

/// SQLite-backed department repository.
pub struct SqliteDepartmentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteDepartmentRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl DepartmentRepository for SqliteDepartmentRepository<'_> {
    fn create_department(&self, department: &NewDepartment) -> RepoResult<DepartmentId> {
        department.validate()?;
        let budget_cents = to_hundredths("budget", department.budget)?;

        self.conn
            .execute(
                "INSERT INTO departments (name, code, budget_cents, location)
                 VALUES (?1, ?2, ?3, ?4);",
                params![
                    department.name.trim(),
                    department.code.trim(),
                    budget_cents,
                    department.location.trim(),
                ],
            )
            .map_err(|err| {
                classify_write_error(
                    err,
                    || "department with this name or code already exists".to_string(),
                    "department",
                )
            })?;

        Ok(self.conn.last_insert_rowid())
    }

    fn get_department(&self, id: DepartmentId) -> RepoResult<Option<DepartmentSummary>> {
        self.conn
            .query_row(
                &format!("{DEPARTMENT_SELECT_SQL} WHERE d.id = ?1;"),
                [id],
                parse_department_summary_row,
            )
            .optional()
            .map_err(RepoError::from)
    }

    fn find_by_code(&self, code: &str) -> RepoResult<Option<Department>> {
        let summary = self
            .conn
            .query_row(
                &format!("{DEPARTMENT_SELECT_SQL} WHERE d.code = ?1;"),
                [code.trim()],
                parse_department_summary_row,
            )
            .optional()?;
        Ok(summary.map(|summary| summary.department))
    }

    fn list_departments(
        &self,
        query: &DepartmentListQuery,
    ) -> RepoResult<Paginated<DepartmentSummary>> {
        let mut filter = String::from(" WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(search) = non_blank(query.search.as_deref()) {
            filter.push_str(
                " AND (d.name LIKE ? ESCAPE '\\'
                    OR d.code LIKE ? ESCAPE '\\'
                    OR d.location LIKE ? ESCAPE '\\')",
            );
            let pattern = like_pattern(search);
            for _ in 0..3 {
                bind_values.push(Value::Text(pattern.clone()));
            }
        }
        if let Some(min_budget) = query.min_budget {
            filter.push_str(" AND d.budget_cents >= ?");
            bind_values.push(Value::Integer(to_hundredths("min_budget", min_budget)?));
        }
        if let Some(max_budget) = query.max_budget {
            filter.push_str(" AND d.budget_cents <= ?");
            bind_values.push(Value::Integer(to_hundredths("max_budget", max_budget)?));
        }
        if let Some(location) = non_blank(query.location.as_deref()) {
            filter.push_str(" AND d.location LIKE ? ESCAPE '\\'");
            bind_values.push(Value::Text(like_pattern(location)));
        }

        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM departments d{filter};"),
            params_from_iter(bind_values.iter()),
            |row| row.get(0),
        )?;
        let count = count.max(0) as u64;
        let window = query.page.window(count);

        let sql = format!(
            "{DEPARTMENT_SELECT_SQL}{filter} ORDER BY {} LIMIT ? OFFSET ?;",
            query.ordering.sql()
        );
        bind_values.push(Value::Integer(i64::from(window.limit)));
        bind_values.push(Value::Integer(window.offset as i64));

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(bind_values), parse_department_summary_row)?;
        let results = rows.collect::<Result<Vec<_>, _>>()?;

        Ok(Paginated::new(results, count, window))
    }

    fn update_department(&self, id: DepartmentId, patch: &DepartmentPatch) -> RepoResult<()> {
        patch.validate()?;
        let changed = self.conn.execute(
            "UPDATE departments SET budget_cents = ?1 WHERE id = ?2;",
            params![to_hundredths("budget", patch.budget)?, id],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "department",
                id,
            });
        }
        Ok(())
    }

    fn delete_department(&self, id: DepartmentId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM departments WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "department",
                id,
            });
        }
        Ok(())
    }

    fn list_members(&self, id: DepartmentId) -> RepoResult<Vec<EmployeeListItem>> {
        let mut stmt = self.conn.prepare(&format!(
            "{EMPLOYEE_LIST_SELECT_SQL}
             WHERE e.department_id = ?1
             ORDER BY e.full_name COLLATE NOCASE ASC, e.id ASC;"
        ))?;
        let rows = stmt.query_map([id], parse_employee_list_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn department_statistics(
        &self,
        id: DepartmentId,
    ) -> RepoResult<Option<DepartmentStatistics>> {
        let Some(department) = self.get_department(id)? else {
            return Ok(None);
        };

        let (average_cents, min_cents, max_cents): (Option<f64>, Option<i64>, Option<i64>) =
            self.conn.query_row(
                "SELECT AVG(salary_cents), MIN(salary_cents), MAX(salary_cents)
                 FROM employees
                 WHERE department_id = ?1;",
                [id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )?;

        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT position
             FROM employees
             WHERE department_id = ?1
             ORDER BY position ASC;",
        )?;
        let positions = stmt
            .query_map([id], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        let (review_count, performance_stats) = self.conn.query_row(
            "SELECT
                COUNT(*),
                AVG(p.overall_score),
                AVG(p.technical_score),
                AVG(p.communication_score),
                AVG(p.teamwork_score)
             FROM performances p
             INNER JOIN employees e ON e.id = p.employee_id
             WHERE e.department_id = ?1;",
            [id],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    ScoreAverages {
                        average_overall: hundredths_average(row.get(1)?),
                        average_technical: hundredths_average(row.get(2)?),
                        average_communication: hundredths_average(row.get(3)?),
                        average_teamwork: hundredths_average(row.get(4)?),
                    },
                ))
            },
        )?;
        let performance_stats = (review_count > 0).then_some(performance_stats);

        let average_salary = average_cents
            .and_then(Decimal::from_f64_retain)
            .map(|cents| (cents / Decimal::ONE_HUNDRED).round_dp(2))
            .unwrap_or(Decimal::ZERO);

        Ok(Some(DepartmentStatistics {
            employee_count: department.employee_count,
            department,
            average_salary,
            salary_range: SalaryRange {
                min: min_cents.map(from_hundredths).unwrap_or(Decimal::ZERO),
                max: max_cents.map(from_hundredths).unwrap_or(Decimal::ZERO),
            },
            positions,
            performance_stats,
        }))
    }
}

fn parse_department_summary_row(row: &Row<'_>) -> rusqlite::Result<DepartmentSummary> {
    let employee_count: i64 = row.get("employee_count")?;
    Ok(DepartmentSummary {
        department: parse_department_row(row)?,
        employee_count: employee_count.max(0) as u64,
    })
}

pub(crate) fn parse_department_row(row: &Row<'_>) -> rusqlite::Result<Department> {
    Ok(Department {
        id: row.get("id")?,
        name: row.get("name")?,
        code: row.get("code")?,
        budget: from_hundredths(row.get("budget_cents")?),
        location: row.get("location")?,
        created_at: row.get("created_at")?,
    })
}

/// Averages over hundredths columns come back as hundredths; scale to units
/// and round to two places.
pub(crate) fn hundredths_average(value: Option<f64>) -> f64 {
    value.map_or(0.0, |hundredths| hundredths.round() / 100.0)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
