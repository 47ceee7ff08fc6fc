//! Synthetic data bootstrap.
//!
//! # Responsibility
//! - Populate an empty record store with departments, employees, quarterly
//!   reviews and a month of attendance that satisfy every model invariant.
//!
//! # Invariants
//! - Runs at most once: a store that already has employees is left untouched
//!   and the run is reported as skipped.
//! - The whole run is one immediate transaction; a failure leaves no rows.
//! - Generated `employee_id` and `email` values never collide; collisions are
//!   resolved here and never reach the caller.
//! - With a fixed `seed` and `as_of` the generated records are identical
//!   across runs.

pub mod names;

use crate::model::attendance::{AttendanceStatus, NewAttendance};
use crate::model::department::{DepartmentId, NewDepartment};
use crate::model::employee::{EmployeeId, NewEmployee};
use crate::model::performance::{NewPerformance, ReviewPeriod};
use crate::repo::department_repo::{DepartmentRepository, SqliteDepartmentRepository};
use crate::repo::employee_repo::{EmployeeRepository, SqliteEmployeeRepository};
use crate::repo::RepoError;
use chrono::{Duration, NaiveDate, NaiveTime};
use log::{error, info};
use names::{CITIES, EMAIL_DOMAINS, FIRST_NAMES, LAST_NAMES};
use rand::distr::weighted::WeightedIndex;
use rand::distr::Distribution;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rusqlite::{Connection, TransactionBehavior};
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

const MAX_UNIQUE_ATTEMPTS: usize = 32;
/// PRESENT, ABSENT, LATE.
const STATUS_WEIGHTS: [u32; 3] = [80, 10, 10];
const SCORE_CENTER_HUNDREDTHS: i64 = 350;
const SCORE_SPREAD_HUNDREDTHS: i64 = 125;
const SCORE_MAX_HUNDREDTHS: i64 = 500;
/// 08:00 and 09:30 as minutes after midnight; each window is 90 minutes.
const PRESENT_CHECK_IN_START: i64 = 8 * 60;
const LATE_CHECK_IN_START: i64 = 9 * 60 + 30;
const CHECK_IN_WINDOW_MINUTES: i64 = 89;
const SHIFT_MINUTES_MIN: i64 = 6 * 60;
const SHIFT_MINUTES_MAX: i64 = 9 * 60;

/// One department to create (or reuse when the code already exists).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepartmentSeed {
    pub name: String,
    pub code: String,
}

impl DepartmentSeed {
    pub fn new(name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            code: code.into(),
        }
    }
}

/// Job title with the salary range (whole currency units) it pays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionBand {
    pub title: String,
    pub min_salary: u32,
    pub max_salary: u32,
}

impl PositionBand {
    pub fn new(title: impl Into<String>, min_salary: u32, max_salary: u32) -> Self {
        Self {
            title: title.into(),
            min_salary,
            max_salary,
        }
    }

    pub fn contains(&self, salary: Decimal) -> bool {
        Decimal::from(self.min_salary) <= salary && salary <= Decimal::from(self.max_salary)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    pub departments: Vec<DepartmentSeed>,
    pub positions: Vec<PositionBand>,
    pub employee_count: u32,
    /// Completed quarters reviewed per employee, counting back from `as_of`.
    pub review_quarters: u32,
    /// Attendance covers `as_of` plus this many preceding days.
    pub attendance_days: u32,
    /// Hire dates fall within this many days before `as_of`.
    pub hire_window_days: u32,
    pub min_budget: u32,
    pub max_budget: u32,
    /// Fixed seed for reproducible output; `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            departments: vec![
                DepartmentSeed::new("IT", "IT01"),
                DepartmentSeed::new("HR", "HR01"),
                DepartmentSeed::new("Finance", "FN01"),
                DepartmentSeed::new("Marketing", "MK01"),
                DepartmentSeed::new("Operations", "OP01"),
            ],
            positions: vec![
                PositionBand::new("Junior Developer", 30_000, 50_000),
                PositionBand::new("Software Engineer", 50_000, 80_000),
                PositionBand::new("Senior Software Engineer", 80_000, 120_000),
                PositionBand::new("HR Specialist", 35_000, 60_000),
                PositionBand::new("Financial Analyst", 45_000, 75_000),
                PositionBand::new("Marketing Coordinator", 35_000, 55_000),
                PositionBand::new("Operations Manager", 70_000, 110_000),
                PositionBand::new("Department Director", 100_000, 150_000),
            ],
            employee_count: 20,
            review_quarters: 2,
            attendance_days: 30,
            hire_window_days: 730,
            min_budget: 50_000,
            max_budget: 200_000,
            seed: None,
        }
    }
}

impl GeneratorConfig {
    pub fn validate(&self) -> Result<(), GeneratorError> {
        if self.departments.is_empty() {
            return Err(GeneratorError::InvalidConfig(
                "at least one department is required".to_string(),
            ));
        }
        if self.positions.is_empty() {
            return Err(GeneratorError::InvalidConfig(
                "at least one position band is required".to_string(),
            ));
        }
        if let Some(band) = self
            .positions
            .iter()
            .find(|band| band.min_salary > band.max_salary)
        {
            return Err(GeneratorError::InvalidConfig(format!(
                "position `{}` has min salary above max salary",
                band.title
            )));
        }
        if self.min_budget > self.max_budget {
            return Err(GeneratorError::InvalidConfig(
                "min budget exceeds max budget".to_string(),
            ));
        }
        Ok(())
    }
}

/// Row counts written by one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerationReport {
    /// The store already had employees; nothing was written.
    pub skipped: bool,
    pub departments_created: u32,
    pub departments_reused: u32,
    pub employees: u32,
    pub reviews: u32,
    pub attendance: u32,
}

#[derive(Debug)]
pub enum GeneratorError {
    InvalidConfig(String),
    /// Calendar arithmetic left chrono's supported range.
    DateOutOfRange(String),
    Repo(RepoError),
}

impl Display for GeneratorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidConfig(message) => write!(f, "invalid generator config: {message}"),
            Self::DateOutOfRange(message) => write!(f, "date out of range: {message}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for GeneratorError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for GeneratorError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<rusqlite::Error> for GeneratorError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Repo(value.into())
    }
}

/// Everything one generator run needs: target store, random source,
/// configuration and reference date.
pub struct GenerationContext<'conn> {
    conn: &'conn mut Connection,
    rng: StdRng,
    config: GeneratorConfig,
    as_of: NaiveDate,
}

impl<'conn> GenerationContext<'conn> {
    pub fn new(conn: &'conn mut Connection, config: GeneratorConfig, as_of: NaiveDate) -> Self {
        let rng = config
            .seed
            .map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
        Self {
            conn,
            rng,
            config,
            as_of,
        }
    }

    /// Runs the generator once inside a single transaction.
    pub fn run(self) -> Result<GenerationReport, GeneratorError> {
        let started_at = Instant::now();
        info!(
            "event=generate module=generator status=start as_of={} employees={} seeded={}",
            self.as_of,
            self.config.employee_count,
            self.config.seed.is_some()
        );
        let result = self.run_inner();
        match &result {
            Ok(report) if report.skipped => info!(
                "event=generate module=generator status=skipped reason=employees_exist duration_ms={}",
                started_at.elapsed().as_millis()
            ),
            Ok(report) => info!(
                "event=generate module=generator status=ok departments_created={} departments_reused={} employees={} reviews={} attendance={} duration_ms={}",
                report.departments_created,
                report.departments_reused,
                report.employees,
                report.reviews,
                report.attendance,
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=generate module=generator status=error duration_ms={} error={}",
                started_at.elapsed().as_millis(),
                err
            ),
        }
        result
    }

    fn run_inner(self) -> Result<GenerationReport, GeneratorError> {
        self.config.validate()?;
        let Self {
            conn,
            rng,
            config,
            as_of,
        } = self;

        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let report = {
            let mut writer = Writer {
                departments: SqliteDepartmentRepository::new(&tx),
                employees: SqliteEmployeeRepository::new(&tx),
                rng,
                config: &config,
                as_of,
                used_codes: HashSet::new(),
                used_emails: HashSet::new(),
                report: GenerationReport::default(),
            };
            if writer.employees.count_employees()? > 0 {
                None
            } else {
                writer.write_all()?;
                Some(writer.report)
            }
        };

        match report {
            Some(report) => {
                tx.commit()?;
                Ok(report)
            }
            None => Ok(GenerationReport {
                skipped: true,
                ..GenerationReport::default()
            }),
        }
    }
}

/// Generates a dataset with `config` unless the store already has employees.
pub fn generate(
    conn: &mut Connection,
    config: GeneratorConfig,
    as_of: NaiveDate,
) -> Result<GenerationReport, GeneratorError> {
    GenerationContext::new(conn, config, as_of).run()
}

struct Writer<'a, D: DepartmentRepository, E: EmployeeRepository> {
    departments: D,
    employees: E,
    rng: StdRng,
    config: &'a GeneratorConfig,
    as_of: NaiveDate,
    used_codes: HashSet<String>,
    used_emails: HashSet<String>,
    report: GenerationReport,
}

impl<D: DepartmentRepository, E: EmployeeRepository> Writer<'_, D, E> {
    fn write_all(&mut self) -> Result<(), GeneratorError> {
        let department_ids = self.write_departments()?;
        let status_index = WeightedIndex::new(STATUS_WEIGHTS)
            .map_err(|err| GeneratorError::InvalidConfig(err.to_string()))?;

        for _ in 0..self.config.employee_count {
            let department_id = department_ids[self.rng.random_range(0..department_ids.len())];
            let employee_id = self.write_employee(department_id)?;
            self.write_reviews(employee_id)?;
            self.write_attendance(employee_id, &status_index)?;
        }
        Ok(())
    }

    fn write_departments(&mut self) -> Result<Vec<DepartmentId>, GeneratorError> {
        let config = self.config;
        let mut ids = Vec::with_capacity(config.departments.len());
        for seed in &config.departments {
            if let Some(existing) = self.departments.find_by_code(&seed.code)? {
                self.report.departments_reused += 1;
                ids.push(existing.id);
                continue;
            }
            let budget_cents = self.rng.random_range(
                i64::from(config.min_budget) * 100..=i64::from(config.max_budget) * 100,
            );
            let location = CITIES[self.rng.random_range(0..CITIES.len())];
            let id = self.departments.create_department(&NewDepartment::new(
                seed.name.as_str(),
                seed.code.as_str(),
                Decimal::new(budget_cents, 2),
                location,
            ))?;
            self.report.departments_created += 1;
            ids.push(id);
        }
        Ok(ids)
    }

    fn write_employee(&mut self, department_id: DepartmentId) -> Result<EmployeeId, GeneratorError> {
        let config = self.config;
        let band = &config.positions[self.rng.random_range(0..config.positions.len())];
        let salary_cents = self.rng.random_range(
            i64::from(band.min_salary) * 100..=i64::from(band.max_salary) * 100,
        );
        let hire_offset = self
            .rng
            .random_range(0..=i64::from(config.hire_window_days));
        let employee_code = self.unique_employee_code();
        let (full_name, email) = self.unique_person();

        let id = self.employees.create_employee(&NewEmployee {
            employee_id: employee_code,
            full_name,
            email,
            department_id,
            position: band.title.clone(),
            salary: Decimal::new(salary_cents, 2),
            hire_date: shift_days(self.as_of, -hire_offset)?,
        })?;
        self.report.employees += 1;
        Ok(id)
    }

    fn write_reviews(&mut self, employee_id: EmployeeId) -> Result<(), GeneratorError> {
        let mut period = ReviewPeriod::containing(self.as_of);
        for _ in 0..self.config.review_quarters {
            period = period.previous();
            let review_date = self.review_date(period)?;
            let review = NewPerformance {
                employee_id,
                review_period: period,
                overall_score: self.score(),
                technical_score: self.score(),
                communication_score: self.score(),
                teamwork_score: self.score(),
                review_date,
            };
            self.employees.create_performance(&review)?;
            self.report.reviews += 1;
        }
        Ok(())
    }

    fn write_attendance(
        &mut self,
        employee_id: EmployeeId,
        status_index: &WeightedIndex<u32>,
    ) -> Result<(), GeneratorError> {
        let days = i64::from(self.config.attendance_days);
        for offset in (0..=days).rev() {
            let date = shift_days(self.as_of, -offset)?;
            let record = match status_index.sample(&mut self.rng) {
                0 => self.worked_day(employee_id, date, AttendanceStatus::Present)?,
                1 => NewAttendance::absent(employee_id, date),
                _ => self.worked_day(employee_id, date, AttendanceStatus::Late)?,
            };
            self.employees.create_attendance(&record)?;
            self.report.attendance += 1;
        }
        Ok(())
    }

    fn worked_day(
        &mut self,
        employee_id: EmployeeId,
        date: NaiveDate,
        status: AttendanceStatus,
    ) -> Result<NewAttendance, GeneratorError> {
        let window_start = match status {
            AttendanceStatus::Late => LATE_CHECK_IN_START,
            _ => PRESENT_CHECK_IN_START,
        };
        let check_in_minute = window_start + self.rng.random_range(0..=CHECK_IN_WINDOW_MINUTES);
        let shift_minutes = self.rng.random_range(SHIFT_MINUTES_MIN..=SHIFT_MINUTES_MAX);
        let check_in = time_of_day(check_in_minute)?;
        let check_out = time_of_day(check_in_minute + shift_minutes)?;
        Ok(NewAttendance {
            employee_id,
            date,
            check_in_time: Some(check_in),
            check_out_time: Some(check_out),
            status,
        })
    }

    /// A day inside the quarter after `period`, never after `as_of`.
    fn review_date(&mut self, period: ReviewPeriod) -> Result<NaiveDate, GeneratorError> {
        let following = period.next();
        let start = quarter_start(following)?;
        let end = shift_days(quarter_start(following.next())?, -1)?.min(self.as_of);
        let span = (end - start).num_days().max(0);
        shift_days(start, self.rng.random_range(0..=span))
    }

    /// Triangular distribution around 3.50, clamped to the score range.
    fn score(&mut self) -> Decimal {
        let offset = self
            .rng
            .random_range(-SCORE_SPREAD_HUNDREDTHS..=SCORE_SPREAD_HUNDREDTHS)
            + self
                .rng
                .random_range(-SCORE_SPREAD_HUNDREDTHS..=SCORE_SPREAD_HUNDREDTHS);
        Decimal::new(
            (SCORE_CENTER_HUNDREDTHS + offset).clamp(0, SCORE_MAX_HUNDREDTHS),
            2,
        )
    }

    fn unique_employee_code(&mut self) -> String {
        for _ in 0..MAX_UNIQUE_ATTEMPTS {
            let code = format!("EMP-{:04}", self.rng.random_range(0..10_000));
            if self.used_codes.insert(code.clone()) {
                return code;
            }
        }
        for _ in 0..MAX_UNIQUE_ATTEMPTS {
            let code = format!("EMP-{:06}", self.rng.random_range(0..1_000_000));
            if self.used_codes.insert(code.clone()) {
                return code;
            }
        }
        let mut sequence = self.used_codes.len();
        loop {
            let code = format!("EMP-X{sequence:06}");
            if self.used_codes.insert(code.clone()) {
                return code;
            }
            sequence += 1;
        }
    }

    /// Returns `(full_name, email)` with an email not used in this run.
    fn unique_person(&mut self) -> (String, String) {
        let mut candidate = self.random_person();
        for _ in 0..MAX_UNIQUE_ATTEMPTS {
            if self.used_emails.insert(candidate.email()) {
                return (candidate.full_name(), candidate.email());
            }
            candidate = self.random_person();
        }
        let mut suffix = 2usize;
        loop {
            let email = candidate.email_with_suffix(suffix);
            if self.used_emails.insert(email.clone()) {
                return (candidate.full_name(), email);
            }
            suffix += 1;
        }
    }

    fn random_person(&mut self) -> Person {
        Person {
            first: FIRST_NAMES[self.rng.random_range(0..FIRST_NAMES.len())],
            last: LAST_NAMES[self.rng.random_range(0..LAST_NAMES.len())],
            domain: EMAIL_DOMAINS[self.rng.random_range(0..EMAIL_DOMAINS.len())],
        }
    }
}

struct Person {
    first: &'static str,
    last: &'static str,
    domain: &'static str,
}

impl Person {
    fn full_name(&self) -> String {
        format!("{} {}", self.first, self.last)
    }

    fn email(&self) -> String {
        format!("{}.{}@{}", self.first, self.last, self.domain).to_lowercase()
    }

    fn email_with_suffix(&self, suffix: usize) -> String {
        format!("{}.{}{}@{}", self.first, self.last, suffix, self.domain).to_lowercase()
    }
}

fn time_of_day(minute_of_day: i64) -> Result<NaiveTime, GeneratorError> {
    u32::try_from(minute_of_day * 60)
        .ok()
        .and_then(|seconds| NaiveTime::from_num_seconds_from_midnight_opt(seconds, 0))
        .ok_or_else(|| GeneratorError::DateOutOfRange(format!("minute {minute_of_day} of day")))
}

fn quarter_start(period: ReviewPeriod) -> Result<NaiveDate, GeneratorError> {
    period
        .start_date()
        .ok_or_else(|| GeneratorError::DateOutOfRange(period.to_string()))
}

fn shift_days(date: NaiveDate, days: i64) -> Result<NaiveDate, GeneratorError> {
    date.checked_add_signed(Duration::days(days))
        .ok_or_else(|| GeneratorError::DateOutOfRange(format!("{date} shifted by {days} days")))
}
