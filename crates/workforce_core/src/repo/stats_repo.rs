//! Read-only aggregate queries feeding the analytics service.
//!
//! # Responsibility
//! - Run COUNT/AVG/GROUP BY queries across departments, employees, reviews
//!   and attendance.
//! - Return raw (unrounded) values in record units; shaping and rounding
//!   belong to the service.
//!
//! # Invariants
//! - Every query is read-only.
//! - Empty tables yield zero counts, `None` averages and empty groups.
//! - Grouped results are ordered deterministically.

use super::employee_repo::{parse_employee_list_row, EMPLOYEE_LIST_SELECT_SQL};
use super::RepoResult;
use crate::model::employee::EmployeeListItem;
use chrono::NaiveDate;
use rusqlite::{params, Connection, Params, Row};

/// One labelled numeric group (average per department, per period, ...).
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledValue {
    pub label: String,
    pub value: f64,
}

/// One labelled count group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledCount {
    pub label: String,
    pub count: u64,
}

/// Attendance status tally over some range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AttendanceTally {
    pub total: u64,
    pub present: u64,
    pub late: u64,
    pub absent: u64,
}

/// Attendance tally for one `YYYY-MM` bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthlyAttendance {
    pub month: String,
    pub tally: AttendanceTally,
}

/// Repository interface for aggregation queries.
pub trait StatsRepository {
    fn count_employees(&self) -> RepoResult<u64>;
    fn count_departments(&self) -> RepoResult<u64>;
    fn average_salary(&self) -> RepoResult<Option<f64>>;
    fn average_overall_score(&self) -> RepoResult<Option<f64>>;
    /// Tally of rows with `from <= date <= to`.
    fn attendance_tally(&self, from: NaiveDate, to: NaiveDate) -> RepoResult<AttendanceTally>;
    /// Most recent hires, `hire_date DESC, id DESC`.
    fn latest_hires(&self, limit: u32) -> RepoResult<Vec<EmployeeListItem>>;
    /// Every department, including empty ones; `count DESC, name ASC`.
    fn employees_per_department(&self) -> RepoResult<Vec<LabeledCount>>;
    /// Departments with employees only; `average DESC, name ASC`.
    fn average_salary_per_department(&self) -> RepoResult<Vec<LabeledValue>>;
    /// Departments with reviews only; `name ASC`.
    fn average_score_per_department(&self) -> RepoResult<Vec<LabeledValue>>;
    /// `review_period ASC`.
    fn average_score_per_period(&self) -> RepoResult<Vec<LabeledValue>>;
    /// `month ASC`, only months with rows in range.
    fn attendance_per_month(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> RepoResult<Vec<MonthlyAttendance>>;
    /// `month ASC`.
    fn hires_per_month(&self) -> RepoResult<Vec<LabeledCount>>;
}

/// SQLite-backed aggregation queries.
pub struct SqliteStatsRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteStatsRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn scalar_count(&self, sql: &str) -> RepoResult<u64> {
        let count: i64 = self.conn.query_row(sql, [], |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }

    fn labeled_values<P: Params>(&self, sql: &str, params: P) -> RepoResult<Vec<LabeledValue>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, |row| {
            Ok(LabeledValue {
                label: row.get(0)?,
                value: row.get::<_, f64>(1)? / 100.0,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn labeled_counts(&self, sql: &str) -> RepoResult<Vec<LabeledCount>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map([], |row| {
            let count: i64 = row.get(1)?;
            Ok(LabeledCount {
                label: row.get(0)?,
                count: count.max(0) as u64,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

const TALLY_COLUMNS_SQL: &str = "COUNT(*) AS total,
    COALESCE(SUM(CASE WHEN status = 'PRESENT' THEN 1 ELSE 0 END), 0) AS present,
    COALESCE(SUM(CASE WHEN status = 'LATE' THEN 1 ELSE 0 END), 0) AS late,
    COALESCE(SUM(CASE WHEN status = 'ABSENT' THEN 1 ELSE 0 END), 0) AS absent";

impl StatsRepository for SqliteStatsRepository<'_> {
    fn count_employees(&self) -> RepoResult<u64> {
        self.scalar_count("SELECT COUNT(*) FROM employees;")
    }

    fn count_departments(&self) -> RepoResult<u64> {
        self.scalar_count("SELECT COUNT(*) FROM departments;")
    }

    fn average_salary(&self) -> RepoResult<Option<f64>> {
        let average: Option<f64> =
            self.conn
                .query_row("SELECT AVG(salary_cents) FROM employees;", [], |row| {
                    row.get(0)
                })?;
        Ok(average.map(|cents| cents / 100.0))
    }

    fn average_overall_score(&self) -> RepoResult<Option<f64>> {
        let average: Option<f64> = self.conn.query_row(
            "SELECT AVG(overall_score) FROM performances;",
            [],
            |row| row.get(0),
        )?;
        Ok(average.map(|hundredths| hundredths / 100.0))
    }

    fn attendance_tally(&self, from: NaiveDate, to: NaiveDate) -> RepoResult<AttendanceTally> {
        let tally = self.conn.query_row(
            &format!(
                "SELECT {TALLY_COLUMNS_SQL}
                 FROM attendance
                 WHERE date BETWEEN ?1 AND ?2;"
            ),
            params![from, to],
            parse_tally,
        )?;
        Ok(tally)
    }

    fn latest_hires(&self, limit: u32) -> RepoResult<Vec<EmployeeListItem>> {
        let mut stmt = self.conn.prepare(&format!(
            "{EMPLOYEE_LIST_SELECT_SQL}
             ORDER BY e.hire_date DESC, e.id DESC
             LIMIT ?1;"
        ))?;
        let rows = stmt.query_map([i64::from(limit)], parse_employee_list_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn employees_per_department(&self) -> RepoResult<Vec<LabeledCount>> {
        self.labeled_counts(
            "SELECT d.name, COUNT(e.id) AS employee_count
             FROM departments d
             LEFT JOIN employees e ON e.department_id = d.id
             GROUP BY d.id
             ORDER BY employee_count DESC, d.name ASC;",
        )
    }

    fn average_salary_per_department(&self) -> RepoResult<Vec<LabeledValue>> {
        self.labeled_values(
            "SELECT d.name, AVG(e.salary_cents) AS average_cents
             FROM departments d
             INNER JOIN employees e ON e.department_id = d.id
             GROUP BY d.id
             ORDER BY average_cents DESC, d.name ASC;",
            [],
        )
    }

    fn average_score_per_department(&self) -> RepoResult<Vec<LabeledValue>> {
        self.labeled_values(
            "SELECT d.name, AVG(p.overall_score) AS average_score
             FROM departments d
             INNER JOIN employees e ON e.department_id = d.id
             INNER JOIN performances p ON p.employee_id = e.id
             GROUP BY d.id
             ORDER BY d.name ASC;",
            [],
        )
    }

    fn average_score_per_period(&self) -> RepoResult<Vec<LabeledValue>> {
        self.labeled_values(
            "SELECT review_period, AVG(overall_score)
             FROM performances
             GROUP BY review_period
             ORDER BY review_period ASC;",
            [],
        )
    }

    fn attendance_per_month(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> RepoResult<Vec<MonthlyAttendance>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT strftime('%Y-%m', date) AS month, {TALLY_COLUMNS_SQL}
             FROM attendance
             WHERE date BETWEEN ?1 AND ?2
             GROUP BY month
             ORDER BY month ASC;"
        ))?;
        let rows = stmt.query_map(params![from, to], |row| {
            Ok(MonthlyAttendance {
                month: row.get("month")?,
                tally: parse_tally(row)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn hires_per_month(&self) -> RepoResult<Vec<LabeledCount>> {
        self.labeled_counts(
            "SELECT strftime('%Y-%m', hire_date) AS month, COUNT(*)
             FROM employees
             GROUP BY month
             ORDER BY month ASC;",
        )
    }
}

fn parse_tally(row: &Row<'_>) -> rusqlite::Result<AttendanceTally> {
    let count = |column: &str| -> rusqlite::Result<u64> {
        Ok(row.get::<_, i64>(column)?.max(0) as u64)
    };
    Ok(AttendanceTally {
        total: count("total")?,
        present: count("present")?,
        late: count("late")?,
        absent: count("absent")?,
    })
}
