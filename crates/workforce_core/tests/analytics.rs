use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use rusqlite::Connection;
use rust_decimal::Decimal;
use std::collections::HashMap;
use workforce_core::db::open_db_in_memory;
use workforce_core::model::attendance::{AttendanceStatus, NewAttendance};
use workforce_core::model::department::NewDepartment;
use workforce_core::model::employee::NewEmployee;
use workforce_core::model::performance::NewPerformance;
use workforce_core::{
    AnalyticsError, AnalyticsOptions, AnalyticsService, AttendancePolicy, DepartmentRepository,
    EmployeeRepository, ErrorKind, ExportFormat, SqliteDepartmentRepository,
    SqliteEmployeeRepository, SqliteStatsRepository,
};

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

fn as_of() -> NaiveDate {
    date(2024, 6, 30)
}

fn service(conn: &Connection) -> AnalyticsService<SqliteStatsRepository<'_>> {
    AnalyticsService::new(SqliteStatsRepository::new(conn), AnalyticsOptions::as_of(as_of()))
}

fn add_department(conn: &Connection, name: &str, code: &str) -> i64 {
    SqliteDepartmentRepository::new(conn)
        .create_department(&NewDepartment::new(
            name,
            code,
            Decimal::new(100_000, 0),
            "Lisbon",
        ))
        .unwrap()
}

fn add_employee(
    conn: &Connection,
    code: &str,
    department_id: i64,
    salary: i64,
    hire_date: NaiveDate,
) -> i64 {
    SqliteEmployeeRepository::new(conn)
        .create_employee(&NewEmployee {
            employee_id: code.to_string(),
            full_name: format!("Person {code}"),
            email: format!("{}@example.com", code.to_lowercase()),
            department_id,
            position: "Engineer".to_string(),
            salary: Decimal::new(salary, 0),
            hire_date,
        })
        .unwrap()
}

fn add_review(conn: &Connection, employee_id: i64, period: &str, overall: i64) {
    SqliteEmployeeRepository::new(conn)
        .create_performance(&NewPerformance {
            employee_id,
            review_period: period.parse().unwrap(),
            overall_score: Decimal::new(overall, 2),
            technical_score: Decimal::new(300, 2),
            communication_score: Decimal::new(300, 2),
            teamwork_score: Decimal::new(300, 2),
            review_date: date(2024, 5, 1),
        })
        .unwrap();
}

fn add_attendance(conn: &Connection, employee_id: i64, day: NaiveDate, status: AttendanceStatus) {
    let record = match status {
        AttendanceStatus::Absent => NewAttendance::absent(employee_id, day),
        _ => NewAttendance {
            employee_id,
            date: day,
            check_in_time: NaiveTime::from_hms_opt(9, 0, 0),
            check_out_time: NaiveTime::from_hms_opt(17, 0, 0),
            status,
        },
    };
    SqliteEmployeeRepository::new(conn)
        .create_attendance(&record)
        .unwrap();
}

/// Two departments plus an empty one, three reviews periods and attendance
/// inside and outside the summary window.
fn seed_fixture(conn: &Connection) {
    let it = add_department(conn, "IT", "IT");
    let hr = add_department(conn, "HR", "HR");
    add_department(conn, "Legal", "LG");

    let ann = add_employee(conn, "EMP-1", it, 50_000, date(2023, 11, 2));
    let bob = add_employee(conn, "EMP-2", it, 60_000, date(2024, 2, 10));
    add_employee(conn, "EMP-3", it, 70_000, date(2024, 2, 20));
    let cy = add_employee(conn, "EMP-4", hr, 45_000, date(2024, 5, 5));

    add_review(conn, ann, "2023-Q4", 300);
    add_review(conn, ann, "2024-Q1", 400);
    add_review(conn, bob, "2024-Q1", 350);
    add_review(conn, cy, "2024-Q1", 200);

    add_attendance(conn, ann, date(2024, 6, 28), AttendanceStatus::Present);
    add_attendance(conn, ann, date(2024, 6, 29), AttendanceStatus::Late);
    add_attendance(conn, ann, date(2024, 6, 30), AttendanceStatus::Absent);
    add_attendance(conn, bob, date(2024, 6, 30), AttendanceStatus::Present);
    // Outside the 30-day summary window, inside the 180-day trend window.
    add_attendance(conn, bob, date(2024, 4, 2), AttendanceStatus::Absent);
    add_attendance(conn, bob, date(2024, 4, 3), AttendanceStatus::Present);
}

#[test]
fn empty_store_yields_zero_summary_and_empty_series() {
    let conn = open_db_in_memory().unwrap();
    let analytics = service(&conn);

    let summary = analytics.summary().unwrap();
    assert_eq!(summary.total_employees, 0);
    assert_eq!(summary.total_departments, 0);
    assert_eq!(summary.average_salary, None);
    assert_eq!(summary.average_performance, None);
    assert_eq!(summary.attendance_rate, None);
    assert!(summary.latest_hires.is_empty());

    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["total_employees"], 0);
    assert!(json["average_salary"].is_null());
    assert!(json["attendance_rate"].is_null());

    assert!(analytics.department_distribution().unwrap().labels.is_empty());
    assert!(analytics.salary_distribution().unwrap().data.is_empty());
    assert!(analytics.performance_trend().unwrap().labels.is_empty());
    assert!(analytics.attendance_rates().unwrap().labels.is_empty());
    assert!(analytics.hire_timeline().unwrap().labels.is_empty());
    assert!(analytics.performance_by_department().unwrap().labels.is_empty());
}

#[test]
fn salary_distribution_averages_one_department() {
    let conn = open_db_in_memory().unwrap();
    let it = add_department(&conn, "IT", "IT");
    for (code, salary) in [("EMP-1", 50_000), ("EMP-2", 60_000), ("EMP-3", 70_000)] {
        add_employee(&conn, code, it, salary, date(2024, 1, 1));
    }

    let series = service(&conn).salary_distribution().unwrap();
    assert_eq!(series.labels, ["IT"]);
    assert_eq!(series.data, [60_000.0]);
    assert_eq!(series.colors.len(), 1);
}

#[test]
fn summary_counts_averages_and_windowed_attendance() {
    let conn = open_db_in_memory().unwrap();
    seed_fixture(&conn);

    let summary = service(&conn).summary().unwrap();
    let employee_rows: i64 = conn
        .query_row("SELECT COUNT(*) FROM employees;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(summary.total_employees, employee_rows as u64);
    assert_eq!(summary.total_departments, 3);
    assert_eq!(summary.average_salary, Some(56_250.0));
    assert_eq!(summary.average_performance, Some(3.13));
    // 2 PRESENT out of 4 records in the window.
    assert_eq!(summary.attendance_rate, Some(50.0));

    let hires: Vec<_> = summary
        .latest_hires
        .iter()
        .map(|hire| hire.employee_id.as_str())
        .collect();
    assert_eq!(hires, ["EMP-4", "EMP-3", "EMP-2", "EMP-1"]);

    let lenient = AnalyticsService::new(
        SqliteStatsRepository::new(&conn),
        AnalyticsOptions {
            policy: AttendancePolicy::PresentOrLate,
            latest_hires: 2,
            ..AnalyticsOptions::as_of(as_of())
        },
    )
    .summary()
    .unwrap();
    assert_eq!(lenient.attendance_rate, Some(75.0));
    assert_eq!(lenient.latest_hires.len(), 2);
}

#[test]
fn department_distribution_includes_empty_departments() {
    let conn = open_db_in_memory().unwrap();
    seed_fixture(&conn);

    let series = service(&conn).department_distribution().unwrap();
    assert_eq!(series.labels, ["IT", "HR", "Legal"]);
    assert_eq!(series.data, [3, 1, 0]);
    assert_eq!(series.colors, ["#FF6384", "#36A2EB", "#FFCE56"]);
}

#[test]
fn line_and_monthly_series_are_chronological() {
    let conn = open_db_in_memory().unwrap();
    seed_fixture(&conn);
    let analytics = service(&conn);

    let trend = analytics.performance_trend().unwrap();
    assert_eq!(trend.labels, ["2023-Q4", "2024-Q1"]);
    assert_eq!(trend.datasets.len(), 1);
    assert_eq!(trend.datasets[0].data, [3.0, 3.17]);
    let json = serde_json::to_value(&trend).unwrap();
    assert_eq!(json["datasets"][0]["borderColor"], "#36A2EB");
    assert!(json["datasets"][0].get("backgroundColor").is_some());
    assert_eq!(json["datasets"][0]["tension"], 0.4);

    let attendance = analytics.attendance_rates().unwrap();
    assert_eq!(attendance.labels, ["2024-04", "2024-06"]);
    assert_eq!(attendance.data, [50.0, 50.0]);

    let hires = analytics.hire_timeline().unwrap();
    assert_eq!(hires.labels, ["2023-11", "2024-02", "2024-05"]);
    assert_eq!(hires.datasets[0].data, [1, 2, 1]);

    let by_department = analytics.performance_by_department().unwrap();
    assert_eq!(by_department.labels, ["HR", "IT"]);
    assert_eq!(by_department.data, [2.0, 3.5]);
}

#[test]
fn attendance_windows_past_calendar_range_are_rejected() {
    let conn = open_db_in_memory().unwrap();
    seed_fixture(&conn);

    let wide_summary = AnalyticsService::new(
        SqliteStatsRepository::new(&conn),
        AnalyticsOptions {
            attendance_window_days: u32::MAX,
            ..AnalyticsOptions::as_of(as_of())
        },
    );
    let err = wide_summary.summary().unwrap_err();
    assert!(matches!(
        err,
        AnalyticsError::InvalidParameter { name: "attendance_window_days", .. }
    ));
    assert_eq!(err.kind(), ErrorKind::ClientInput);
    assert!(wide_summary.attendance_rates().is_ok());

    let wide_trend = AnalyticsService::new(
        SqliteStatsRepository::new(&conn),
        AnalyticsOptions {
            attendance_trend_days: u32::MAX,
            ..AnalyticsOptions::as_of(as_of())
        },
    );
    let err = wide_trend.attendance_rates().unwrap_err();
    assert!(matches!(
        err,
        AnalyticsError::InvalidParameter { name: "attendance_trend_days", .. }
    ));
}

#[test]
fn export_rejects_unknown_format_before_querying() {
    let conn = open_db_in_memory().unwrap();
    let err = service(&conn)
        .export(Some("xlsx"), Utc::now())
        .unwrap_err();
    assert!(matches!(err, AnalyticsError::InvalidParameter { name: "format", .. }));
    assert_eq!(err.kind(), ErrorKind::ClientInput);
}

#[test]
fn json_and_csv_exports_carry_the_same_values() {
    let conn = open_db_in_memory().unwrap();
    seed_fixture(&conn);
    let analytics = service(&conn);
    let generated_at = Utc.with_ymd_and_hms(2024, 6, 30, 12, 0, 0).unwrap();

    let json_doc = analytics.export(None, generated_at).unwrap();
    assert_eq!(json_doc.format, ExportFormat::Json);
    assert_eq!(json_doc.content_type, "application/json");
    let json: serde_json::Value = serde_json::from_str(&json_doc.body).unwrap();

    let csv_doc = analytics.export(Some(" CSV "), generated_at).unwrap();
    assert_eq!(csv_doc.content_type, "text/csv");
    let mut reader = csv::Reader::from_reader(csv_doc.body.as_bytes());
    assert_eq!(
        reader.headers().unwrap().iter().collect::<Vec<_>>(),
        ["section", "label", "value"]
    );
    let mut rows: HashMap<(String, String), String> = HashMap::new();
    for record in reader.records() {
        let record = record.unwrap();
        rows.insert(
            (record[0].to_string(), record[1].to_string()),
            record[2].to_string(),
        );
    }
    let csv_number = |section: &str, label: &str| -> f64 {
        rows[&(section.to_string(), label.to_string())]
            .parse()
            .unwrap()
    };

    for metric in [
        "total_employees",
        "total_departments",
        "average_salary",
        "average_performance",
        "attendance_rate",
    ] {
        assert_eq!(
            csv_number("summary", metric),
            json["summary"][metric].as_f64().unwrap(),
            "summary.{metric}"
        );
    }

    for section in [
        "department_stats",
        "salary_distribution",
        "attendance_rates",
        "performance_by_department",
    ] {
        let labels = json[section]["labels"].as_array().unwrap();
        let data = json[section]["data"].as_array().unwrap();
        assert_eq!(labels.len(), data.len());
        for (label, value) in labels.iter().zip(data) {
            assert_eq!(
                csv_number(section, label.as_str().unwrap()),
                value.as_f64().unwrap(),
                "{section}.{label}"
            );
        }
    }

    for section in ["performance_trends", "hire_timeline"] {
        let labels = json[section]["labels"].as_array().unwrap();
        let data = json[section]["datasets"][0]["data"].as_array().unwrap();
        for (label, value) in labels.iter().zip(data) {
            assert_eq!(
                csv_number(section, label.as_str().unwrap()),
                value.as_f64().unwrap()
            );
        }
    }

    assert_eq!(
        rows[&("generated_at".to_string(), String::new())],
        json["generated_at"].as_str().unwrap()
    );
}
