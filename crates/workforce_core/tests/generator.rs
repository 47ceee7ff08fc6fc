use chrono::{NaiveDate, NaiveTime};
use rusqlite::Connection;
use rust_decimal::Decimal;
use workforce_core::db::open_db_in_memory;
use workforce_core::model::attendance::AttendanceStatus;
use workforce_core::model::department::NewDepartment;
use workforce_core::{
    generate, DepartmentRepository, EmployeeRepository, GeneratorConfig, GeneratorError,
    SqliteDepartmentRepository, SqliteEmployeeRepository,
};

fn as_of() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 15).unwrap()
}

fn seeded(seed: u64) -> GeneratorConfig {
    GeneratorConfig {
        seed: Some(seed),
        ..GeneratorConfig::default()
    }
}

fn count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })
    .unwrap()
}

fn employee_ids(conn: &Connection) -> Vec<i64> {
    let mut stmt = conn.prepare("SELECT id FROM employees ORDER BY id;").unwrap();
    let ids = stmt
        .query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<Vec<i64>, _>>()
        .unwrap();
    ids
}

#[test]
fn default_run_writes_expected_volumes() {
    let mut conn = open_db_in_memory().unwrap();
    let report = generate(&mut conn, seeded(7), as_of()).unwrap();

    assert!(!report.skipped);
    assert_eq!(report.departments_created, 5);
    assert_eq!(report.departments_reused, 0);
    assert_eq!(report.employees, 20);
    assert_eq!(report.reviews, 40);
    assert_eq!(report.attendance, 20 * 31);

    assert_eq!(count(&conn, "departments"), 5);
    assert_eq!(count(&conn, "employees"), 20);
    assert_eq!(count(&conn, "performances"), 40);
    assert_eq!(count(&conn, "attendance"), 620);
}

#[test]
fn generated_employees_respect_bands_and_references() {
    let mut conn = open_db_in_memory().unwrap();
    let config = seeded(11);
    generate(&mut conn, config.clone(), as_of()).unwrap();

    let departments = SqliteDepartmentRepository::new(&conn);
    let employees = SqliteEmployeeRepository::new(&conn);
    let hire_floor = NaiveDate::from_ymd_opt(2022, 5, 15).unwrap();

    for id in employee_ids(&conn) {
        let employee = employees.get_employee(id).unwrap().unwrap();
        assert!(departments
            .get_department(employee.department_id)
            .unwrap()
            .is_some());
        let band = config
            .positions
            .iter()
            .find(|band| band.title == employee.position)
            .unwrap();
        assert!(
            band.contains(employee.salary),
            "{} earns {} outside {}..{}",
            employee.position,
            employee.salary,
            band.min_salary,
            band.max_salary
        );
        assert!(employee.hire_date <= as_of());
        assert!(employee.hire_date >= hire_floor);
        assert!(employee.employee_id.starts_with("EMP-"));
        assert_eq!(employee.email, employee.email.to_lowercase());
    }

    let distinct_emails: i64 = conn
        .query_row("SELECT COUNT(DISTINCT email) FROM employees;", [], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(distinct_emails, 20);
}

#[test]
fn reviews_cover_completed_quarters_and_never_postdate_reference() {
    let mut conn = open_db_in_memory().unwrap();
    generate(&mut conn, seeded(3), as_of()).unwrap();
    let employees = SqliteEmployeeRepository::new(&conn);

    for id in employee_ids(&conn) {
        let reviews = employees.list_performance(id).unwrap();
        let mut periods: Vec<_> = reviews
            .iter()
            .map(|review| review.review_period.as_str())
            .collect();
        periods.sort_unstable();
        assert_eq!(periods, ["2023-Q4", "2024-Q1"]);

        for review in &reviews {
            assert!(review.review_date <= as_of());
            for score in [
                review.overall_score,
                review.technical_score,
                review.communication_score,
                review.teamwork_score,
            ] {
                assert!(score >= Decimal::ZERO && score <= Decimal::new(5, 0));
            }
        }
    }
}

#[test]
fn attendance_times_match_status() {
    let mut conn = open_db_in_memory().unwrap();
    generate(&mut conn, seeded(5), as_of()).unwrap();
    let employees = SqliteEmployeeRepository::new(&conn);
    let late_floor = NaiveTime::from_hms_opt(9, 30, 0).unwrap();
    let window_start = NaiveDate::from_ymd_opt(2024, 4, 15).unwrap();

    for id in employee_ids(&conn) {
        let records = employees.list_attendance(id, window_start, as_of()).unwrap();
        assert_eq!(records.len(), 31);
        for record in records {
            match record.status {
                AttendanceStatus::Absent => {
                    assert!(record.check_in_time.is_none());
                    assert!(record.check_out_time.is_none());
                    assert_eq!(record.total_hours, Decimal::ZERO);
                }
                status => {
                    let check_in = record.check_in_time.unwrap();
                    let check_out = record.check_out_time.unwrap();
                    assert!(check_out > check_in);
                    assert!(record.total_hours > Decimal::ZERO);
                    if status == AttendanceStatus::Late {
                        assert!(check_in >= late_floor);
                    } else {
                        assert!(check_in < late_floor);
                    }
                }
            }
        }
    }
}

#[test]
fn second_run_is_skipped() {
    let mut conn = open_db_in_memory().unwrap();
    generate(&mut conn, seeded(1), as_of()).unwrap();

    let report = generate(&mut conn, seeded(2), as_of()).unwrap();
    assert!(report.skipped);
    assert_eq!(report.employees, 0);
    assert_eq!(count(&conn, "employees"), 20);
    assert_eq!(count(&conn, "attendance"), 620);
}

#[test]
fn existing_department_codes_are_reused() {
    let mut conn = open_db_in_memory().unwrap();
    SqliteDepartmentRepository::new(&conn)
        .create_department(&NewDepartment::new(
            "IT",
            "IT01",
            Decimal::new(75_000, 0),
            "Berlin",
        ))
        .unwrap();

    let report = generate(&mut conn, seeded(9), as_of()).unwrap();
    assert_eq!(report.departments_reused, 1);
    assert_eq!(report.departments_created, 4);
    assert_eq!(count(&conn, "departments"), 5);

    let it = SqliteDepartmentRepository::new(&conn)
        .find_by_code("IT01")
        .unwrap()
        .unwrap();
    assert_eq!(it.location, "Berlin");
}

#[test]
fn fixed_seed_is_reproducible() {
    fn dump(conn: &Connection) -> Vec<(String, String, String, i64, String)> {
        let mut stmt = conn
            .prepare(
                "SELECT employee_id, full_name, email, salary_cents, hire_date
                 FROM employees ORDER BY id;",
            )
            .unwrap();
        let rows = stmt
            .query_map([], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
            })
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        rows
    }

    let mut first = open_db_in_memory().unwrap();
    let mut second = open_db_in_memory().unwrap();
    generate(&mut first, seeded(42), as_of()).unwrap();
    generate(&mut second, seeded(42), as_of()).unwrap();
    assert_eq!(dump(&first), dump(&second));

    let attendance_digest = |conn: &Connection| -> (i64, i64) {
        conn.query_row(
            "SELECT SUM(total_hours), SUM(status = 'LATE') FROM attendance;",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap()
    };
    assert_eq!(attendance_digest(&first), attendance_digest(&second));
}

#[test]
fn invalid_config_writes_nothing() {
    let mut conn = open_db_in_memory().unwrap();
    let config = GeneratorConfig {
        departments: Vec::new(),
        ..GeneratorConfig::default()
    };
    let err = generate(&mut conn, config, as_of()).unwrap_err();
    assert!(matches!(err, GeneratorError::InvalidConfig(_)));
    assert_eq!(count(&conn, "employees"), 0);
    assert_eq!(count(&conn, "departments"), 0);
}

#[test]
fn large_run_resolves_code_and_email_collisions() {
    let mut conn = open_db_in_memory().unwrap();
    let config = GeneratorConfig {
        employee_count: 12_000,
        review_quarters: 0,
        attendance_days: 0,
        ..seeded(11)
    };
    let report = generate(&mut conn, config, as_of()).unwrap();
    assert_eq!(report.employees, 12_000);
    assert_eq!(report.reviews, 0);

    let distinct = |column: &str| -> i64 {
        conn.query_row(
            &format!("SELECT COUNT(DISTINCT {column}) FROM employees;"),
            [],
            |row| row.get(0),
        )
        .unwrap()
    };
    assert_eq!(count(&conn, "employees"), 12_000);
    assert_eq!(distinct("employee_id"), 12_000);
    assert_eq!(distinct("email"), 12_000);

    // More employees than four-digit codes, so some codes had to widen.
    let widened: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM employees WHERE LENGTH(employee_id) > 8;",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert!(widened > 0);
}
