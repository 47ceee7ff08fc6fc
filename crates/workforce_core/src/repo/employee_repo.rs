//! Employee repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD and list/search APIs over `employees`.
//! - Own the employee's performance reviews and attendance rows.
//!
//! # Invariants
//! - Write paths validate payloads before SQL mutations.
//! - Read paths re-validate attendance rows instead of masking bad data.
//! - Deleting an employee relies on `ON DELETE CASCADE` for its reviews and
//!   attendance.

use super::department_repo::parse_department_row;
use super::page::{PageRequest, Paginated};
use super::{classify_write_error, from_hundredths, like_pattern, to_hundredths};
use super::{RepoError, RepoResult};
use crate::model::attendance::{Attendance, AttendanceId, AttendanceStatus, NewAttendance};
use crate::model::department::DepartmentId;
use crate::model::employee::{
    Employee, EmployeeDetail, EmployeeId, EmployeeListItem, EmployeePatch, NewEmployee,
};
use crate::model::performance::{NewPerformance, Performance, PerformanceId};
use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;

const EMPLOYEE_SELECT_SQL: &str = "SELECT
    id,
    employee_id,
    full_name,
    email,
    department_id,
    position,
    salary_cents,
    hire_date,
    created_at
FROM employees";

pub(crate) const EMPLOYEE_LIST_SELECT_SQL: &str = "SELECT
    e.id,
    e.employee_id,
    e.full_name,
    e.email,
    d.name AS department_name,
    e.position,
    e.salary_cents,
    e.hire_date
FROM employees e
INNER JOIN departments d ON d.id = e.department_id";

const PERFORMANCE_SELECT_SQL: &str = "SELECT
    id,
    employee_id,
    review_period,
    overall_score,
    technical_score,
    communication_score,
    teamwork_score,
    review_date,
    created_at
FROM performances";

const ATTENDANCE_SELECT_SQL: &str = "SELECT
    id,
    employee_id,
    date,
    check_in_time,
    check_out_time,
    total_hours,
    status,
    created_at
FROM attendance";

/// Sort keys accepted by employee listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EmployeeOrdering {
    #[default]
    FullNameAsc,
    FullNameDesc,
    SalaryAsc,
    SalaryDesc,
    HireDateAsc,
    HireDateDesc,
}

impl EmployeeOrdering {
    /// Parses `full_name|-full_name|salary|-salary|hire_date|-hire_date`;
    /// anything else falls back to the default.
    pub fn parse_or_default(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("-full_name") => Self::FullNameDesc,
            Some("salary") => Self::SalaryAsc,
            Some("-salary") => Self::SalaryDesc,
            Some("hire_date") => Self::HireDateAsc,
            Some("-hire_date") => Self::HireDateDesc,
            _ => Self::FullNameAsc,
        }
    }

    fn sql(self) -> &'static str {
        match self {
            Self::FullNameAsc => "e.full_name COLLATE NOCASE ASC, e.id ASC",
            Self::FullNameDesc => "e.full_name COLLATE NOCASE DESC, e.id ASC",
            Self::SalaryAsc => "e.salary_cents ASC, e.id ASC",
            Self::SalaryDesc => "e.salary_cents DESC, e.id ASC",
            Self::HireDateAsc => "e.hire_date ASC, e.id ASC",
            Self::HireDateDesc => "e.hire_date DESC, e.id DESC",
        }
    }
}

/// Filter/sort/page options for employee listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmployeeListQuery {
    /// Case-insensitive substring over full name, email, employee id and
    /// position.
    pub search: Option<String>,
    pub department_id: Option<DepartmentId>,
    pub min_salary: Option<Decimal>,
    pub max_salary: Option<Decimal>,
    pub ordering: EmployeeOrdering,
    pub page: PageRequest,
}

/// Repository interface for employee operations.
pub trait EmployeeRepository {
    fn create_employee(&self, employee: &NewEmployee) -> RepoResult<EmployeeId>;
    fn get_employee(&self, id: EmployeeId) -> RepoResult<Option<Employee>>;
    fn get_employee_detail(&self, id: EmployeeId) -> RepoResult<Option<EmployeeDetail>>;
    fn list_employees(&self, query: &EmployeeListQuery)
        -> RepoResult<Paginated<EmployeeListItem>>;
    fn update_employee(&self, id: EmployeeId, patch: &EmployeePatch) -> RepoResult<()>;
    fn delete_employee(&self, id: EmployeeId) -> RepoResult<()>;
    fn count_employees(&self) -> RepoResult<u64>;

    fn create_performance(&self, review: &NewPerformance) -> RepoResult<PerformanceId>;
    /// Reviews ordered by `review_date DESC, id DESC`.
    fn list_performance(&self, employee: EmployeeId) -> RepoResult<Vec<Performance>>;

    fn create_attendance(&self, record: &NewAttendance) -> RepoResult<AttendanceId>;
    /// Rows with `from <= date <= to`, ordered by `date DESC, id DESC`.
    fn list_attendance(
        &self,
        employee: EmployeeId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> RepoResult<Vec<Attendance>>;
}

/// SQLite-backed employee repository.
pub struct SqliteEmployeeRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteEmployeeRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl EmployeeRepository for SqliteEmployeeRepository<'_> {
    fn create_employee(&self, employee: &NewEmployee) -> RepoResult<EmployeeId> {
        employee.validate()?;
        let salary_cents = to_hundredths("salary", employee.salary)?;

        self.conn
            .execute(
                "INSERT INTO employees (
                    employee_id,
                    full_name,
                    email,
                    department_id,
                    position,
                    salary_cents,
                    hire_date
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
                params![
                    employee.employee_id.trim(),
                    employee.full_name.trim(),
                    employee.email.trim(),
                    employee.department_id,
                    employee.position.trim(),
                    salary_cents,
                    employee.hire_date,
                ],
            )
            .map_err(|err| {
                classify_write_error(
                    err,
                    || "employee with this employee_id or email already exists".to_string(),
                    "department",
                )
            })?;

        Ok(self.conn.last_insert_rowid())
    }

    fn get_employee(&self, id: EmployeeId) -> RepoResult<Option<Employee>> {
        self.conn
            .query_row(
                &format!("{EMPLOYEE_SELECT_SQL} WHERE id = ?1;"),
                [id],
                parse_employee_row,
            )
            .optional()
            .map_err(RepoError::from)
    }

    fn get_employee_detail(&self, id: EmployeeId) -> RepoResult<Option<EmployeeDetail>> {
        let Some(employee) = self.get_employee(id)? else {
            return Ok(None);
        };
        let department = self
            .conn
            .query_row(
                "SELECT id, name, code, budget_cents, location, created_at
                 FROM departments
                 WHERE id = ?1;",
                [employee.department_id],
                parse_department_row,
            )
            .optional()?
            .ok_or_else(|| {
                RepoError::InvalidData(format!(
                    "employee {} references missing department {}",
                    employee.id, employee.department_id
                ))
            })?;
        Ok(Some(EmployeeDetail::from_parts(employee, department)))
    }

    fn list_employees(
        &self,
        query: &EmployeeListQuery,
    ) -> RepoResult<Paginated<EmployeeListItem>> {
        let mut filter = String::from(" WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(search) = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
        {
            filter.push_str(
                " AND (e.full_name LIKE ? ESCAPE '\\'
                    OR e.email LIKE ? ESCAPE '\\'
                    OR e.employee_id LIKE ? ESCAPE '\\'
                    OR e.position LIKE ? ESCAPE '\\')",
            );
            let pattern = like_pattern(search);
            for _ in 0..4 {
                bind_values.push(Value::Text(pattern.clone()));
            }
        }
        if let Some(department_id) = query.department_id {
            filter.push_str(" AND e.department_id = ?");
            bind_values.push(Value::Integer(department_id));
        }
        if let Some(min_salary) = query.min_salary {
            filter.push_str(" AND e.salary_cents >= ?");
            bind_values.push(Value::Integer(to_hundredths("min_salary", min_salary)?));
        }
        if let Some(max_salary) = query.max_salary {
            filter.push_str(" AND e.salary_cents <= ?");
            bind_values.push(Value::Integer(to_hundredths("max_salary", max_salary)?));
        }

        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM employees e{filter};"),
            params_from_iter(bind_values.iter()),
            |row| row.get(0),
        )?;
        let count = count.max(0) as u64;
        let window = query.page.window(count);

        let sql = format!(
            "{EMPLOYEE_LIST_SELECT_SQL}{filter} ORDER BY {} LIMIT ? OFFSET ?;",
            query.ordering.sql()
        );
        bind_values.push(Value::Integer(i64::from(window.limit)));
        bind_values.push(Value::Integer(window.offset as i64));

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(bind_values), parse_employee_list_row)?;
        let results = rows.collect::<Result<Vec<_>, _>>()?;

        Ok(Paginated::new(results, count, window))
    }

    fn update_employee(&self, id: EmployeeId, patch: &EmployeePatch) -> RepoResult<()> {
        patch.validate()?;
        let Some(mut employee) = self.get_employee(id)? else {
            return Err(RepoError::NotFound {
                entity: "employee",
                id,
            });
        };
        patch.apply_to(&mut employee);

        self.conn
            .execute(
                "UPDATE employees
                 SET
                    position = ?1,
                    department_id = ?2,
                    salary_cents = ?3
                 WHERE id = ?4;",
                params![
                    employee.position,
                    employee.department_id,
                    to_hundredths("salary", employee.salary)?,
                    id,
                ],
            )
            .map_err(|err| {
                classify_write_error(err, || "employee update conflicts".to_string(), "department")
            })?;
        Ok(())
    }

    fn delete_employee(&self, id: EmployeeId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM employees WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "employee",
                id,
            });
        }
        Ok(())
    }

    fn count_employees(&self) -> RepoResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM employees;", [], |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }

    fn create_performance(&self, review: &NewPerformance) -> RepoResult<PerformanceId> {
        review.validate()?;
        self.conn
            .execute(
                "INSERT INTO performances (
                    employee_id,
                    review_period,
                    overall_score,
                    technical_score,
                    communication_score,
                    teamwork_score,
                    review_date
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
                params![
                    review.employee_id,
                    review.review_period.to_string(),
                    to_hundredths("overall_score", review.overall_score)?,
                    to_hundredths("technical_score", review.technical_score)?,
                    to_hundredths("communication_score", review.communication_score)?,
                    to_hundredths("teamwork_score", review.teamwork_score)?,
                    review.review_date,
                ],
            )
            .map_err(|err| {
                classify_write_error(err, || "duplicate performance review".to_string(), "employee")
            })?;
        Ok(self.conn.last_insert_rowid())
    }

    fn list_performance(&self, employee: EmployeeId) -> RepoResult<Vec<Performance>> {
        let mut stmt = self.conn.prepare(&format!(
            "{PERFORMANCE_SELECT_SQL}
             WHERE employee_id = ?1
             ORDER BY review_date DESC, id DESC;"
        ))?;
        let rows = stmt.query_map([employee], parse_performance_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn create_attendance(&self, record: &NewAttendance) -> RepoResult<AttendanceId> {
        record.validate()?;
        self.conn
            .execute(
                "INSERT INTO attendance (
                    employee_id,
                    date,
                    check_in_time,
                    check_out_time,
                    total_hours,
                    status
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
                params![
                    record.employee_id,
                    record.date,
                    record.check_in_time,
                    record.check_out_time,
                    to_hundredths("total_hours", record.total_hours())?,
                    record.status.as_str(),
                ],
            )
            .map_err(|err| {
                classify_write_error(err, || "duplicate attendance record".to_string(), "employee")
            })?;
        Ok(self.conn.last_insert_rowid())
    }

    fn list_attendance(
        &self,
        employee: EmployeeId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> RepoResult<Vec<Attendance>> {
        let mut stmt = self.conn.prepare(&format!(
            "{ATTENDANCE_SELECT_SQL}
             WHERE employee_id = ?1
               AND date BETWEEN ?2 AND ?3
             ORDER BY date DESC, id DESC;"
        ))?;
        let mut rows = stmt.query(params![employee, from, to])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(parse_attendance_row(row)?);
        }
        Ok(records)
    }
}

fn parse_employee_row(row: &Row<'_>) -> rusqlite::Result<Employee> {
    Ok(Employee {
        id: row.get("id")?,
        employee_id: row.get("employee_id")?,
        full_name: row.get("full_name")?,
        email: row.get("email")?,
        department_id: row.get("department_id")?,
        position: row.get("position")?,
        salary: from_hundredths(row.get("salary_cents")?),
        hire_date: row.get("hire_date")?,
        created_at: row.get("created_at")?,
    })
}

pub(crate) fn parse_employee_list_row(row: &Row<'_>) -> rusqlite::Result<EmployeeListItem> {
    Ok(EmployeeListItem {
        id: row.get("id")?,
        employee_id: row.get("employee_id")?,
        full_name: row.get("full_name")?,
        email: row.get("email")?,
        department_name: row.get("department_name")?,
        position: row.get("position")?,
        salary: from_hundredths(row.get("salary_cents")?),
        hire_date: row.get("hire_date")?,
    })
}

fn parse_performance_row(row: &Row<'_>) -> rusqlite::Result<Performance> {
    Ok(Performance {
        id: row.get("id")?,
        employee_id: row.get("employee_id")?,
        review_period: row.get("review_period")?,
        overall_score: from_hundredths(row.get("overall_score")?),
        technical_score: from_hundredths(row.get("technical_score")?),
        communication_score: from_hundredths(row.get("communication_score")?),
        teamwork_score: from_hundredths(row.get("teamwork_score")?),
        review_date: row.get("review_date")?,
        created_at: row.get("created_at")?,
    })
}

fn parse_attendance_row(row: &Row<'_>) -> RepoResult<Attendance> {
    let status_text: String = row.get("status")?;
    let status = AttendanceStatus::parse(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid attendance status `{status_text}` in attendance.status"
        ))
    })?;

    let record = Attendance {
        id: row.get("id")?,
        employee_id: row.get("employee_id")?,
        date: row.get("date")?,
        check_in_time: row.get("check_in_time")?,
        check_out_time: row.get("check_out_time")?,
        total_hours: from_hundredths(row.get("total_hours")?),
        status,
        created_at: row.get("created_at")?,
    };
    record.validate().map_err(|err| {
        RepoError::InvalidData(format!("attendance row {}: {err}", record.id))
    })?;
    Ok(record)
}
