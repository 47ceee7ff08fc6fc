use chrono::NaiveDate;
use rust_decimal::Decimal;
use workforce_core::db::open_db_in_memory;
use workforce_core::model::department::{DepartmentPatch, NewDepartment};
use workforce_core::model::employee::NewEmployee;
use workforce_core::model::performance::NewPerformance;
use workforce_core::repo::department_repo::{DepartmentListQuery, DepartmentOrdering};
use workforce_core::{
    DepartmentService, EmployeeRepository, ErrorKind, PageRequest, ServiceError,
    SqliteDepartmentRepository, SqliteEmployeeRepository,
};

fn department(name: &str, code: &str, budget: i64, location: &str) -> NewDepartment {
    NewDepartment::new(name, code, Decimal::new(budget, 0), location)
}

fn employee(code: &str, name: &str, department_id: i64, position: &str, salary: i64) -> NewEmployee {
    NewEmployee {
        employee_id: code.to_string(),
        full_name: name.to_string(),
        email: format!("{}@example.com", code.to_lowercase()),
        department_id,
        position: position.to_string(),
        salary: Decimal::new(salary, 0),
        hire_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
    }
}

#[test]
fn create_reads_back_with_zero_employees() {
    let conn = open_db_in_memory().unwrap();
    let service = DepartmentService::new(SqliteDepartmentRepository::new(&conn));

    let created = service
        .create(&department("Engineering", "ENG", 150_000, "Lisbon"))
        .unwrap();
    assert_eq!(created.department.name, "Engineering");
    assert_eq!(created.department.budget, Decimal::new(150_000, 0));
    assert_eq!(created.employee_count, 0);

    let loaded = service.get(created.department.id).unwrap();
    assert_eq!(loaded, created);
}

#[test]
fn duplicate_code_is_conflict_and_blank_name_is_client_input() {
    let conn = open_db_in_memory().unwrap();
    let service = DepartmentService::new(SqliteDepartmentRepository::new(&conn));
    service
        .create(&department("Engineering", "ENG", 1_000, "Lisbon"))
        .unwrap();

    let err = service
        .create(&department("Platform", "ENG", 1_000, "Porto"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let err = service
        .create(&department("   ", "OPS", 1_000, "Porto"))
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(ref v) if v.field == "name"));

    let err = service
        .create(&department("Ops", "OPS", -5, "Porto"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ClientInput);
}

#[test]
fn missing_department_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service = DepartmentService::new(SqliteDepartmentRepository::new(&conn));
    let err = service.get(404).unwrap_err();
    assert!(matches!(
        err,
        ServiceError::NotFound {
            entity: "department",
            id: 404
        }
    ));
    assert_eq!(service.delete(404).unwrap_err().kind(), ErrorKind::NotFound);
}

#[test]
fn update_budget_only_touches_budget() {
    let conn = open_db_in_memory().unwrap();
    let service = DepartmentService::new(SqliteDepartmentRepository::new(&conn));
    let created = service
        .create(&department("Finance", "FN", 90_000, "London"))
        .unwrap();

    let updated = service
        .update_budget(
            created.department.id,
            &DepartmentPatch {
                budget: Decimal::new(12_345_050, 2),
            },
        )
        .unwrap();
    assert_eq!(updated.department.budget, Decimal::new(12_345_050, 2));
    assert_eq!(updated.department.name, "Finance");
    assert_eq!(updated.department.code, "FN");

    let patch: Result<DepartmentPatch, _> =
        serde_json::from_str(r#"{"budget": "10.00", "name": "Renamed"}"#);
    assert!(patch.is_err());
}

#[test]
fn list_filters_orders_and_paginates() {
    let conn = open_db_in_memory().unwrap();
    let service = DepartmentService::new(SqliteDepartmentRepository::new(&conn));
    for (name, code, budget, location) in [
        ("Engineering", "ENG", 200_000, "Lisbon"),
        ("Finance", "FN", 80_000, "London"),
        ("Human Resources", "HR", 60_000, "Lisbon"),
        ("Marketing", "MK", 120_000, "Madrid"),
    ] {
        service
            .create(&department(name, code, budget, location))
            .unwrap();
    }

    let all = service.list(&DepartmentListQuery::default()).unwrap();
    assert_eq!(all.count, 4);
    let names: Vec<_> = all
        .results
        .iter()
        .map(|summary| summary.department.name.as_str())
        .collect();
    assert_eq!(names, ["Engineering", "Finance", "Human Resources", "Marketing"]);

    let lisbon = service
        .list(&DepartmentListQuery {
            search: Some("lisbon".to_string()),
            ..DepartmentListQuery::default()
        })
        .unwrap();
    assert_eq!(lisbon.count, 2);

    let budget_band = service
        .list(&DepartmentListQuery {
            min_budget: Some(Decimal::new(70_000, 0)),
            max_budget: Some(Decimal::new(150_000, 0)),
            ordering: DepartmentOrdering::parse_or_default(Some("-budget")),
            ..DepartmentListQuery::default()
        })
        .unwrap();
    let names: Vec<_> = budget_band
        .results
        .iter()
        .map(|summary| summary.department.code.as_str())
        .collect();
    assert_eq!(names, ["MK", "FN"]);

    let second_page = service
        .list(&DepartmentListQuery {
            page: PageRequest::new(2, 3),
            ..DepartmentListQuery::default()
        })
        .unwrap();
    assert_eq!(second_page.num_pages, 2);
    assert_eq!(second_page.current_page, 2);
    assert_eq!(second_page.results.len(), 1);
    assert!(second_page.has_previous);
    assert!(!second_page.has_next);

    let clamped = service
        .list(&DepartmentListQuery {
            page: PageRequest::new(99, 3),
            ..DepartmentListQuery::default()
        })
        .unwrap();
    assert_eq!(clamped.current_page, 2);
}

#[test]
fn search_treats_wildcards_literally() {
    let conn = open_db_in_memory().unwrap();
    let service = DepartmentService::new(SqliteDepartmentRepository::new(&conn));
    service
        .create(&department("R&D 100%", "RD", 1_000, "Osaka"))
        .unwrap();
    service
        .create(&department("Research", "RS", 1_000, "Osaka"))
        .unwrap();

    let hits = service
        .list(&DepartmentListQuery {
            search: Some("%".to_string()),
            ..DepartmentListQuery::default()
        })
        .unwrap();
    assert_eq!(hits.count, 1);
    assert_eq!(hits.results[0].department.code, "RD");
}

#[test]
fn members_and_statistics_reflect_employees_and_reviews() {
    let conn = open_db_in_memory().unwrap();
    let departments = DepartmentService::new(SqliteDepartmentRepository::new(&conn));
    let employees = SqliteEmployeeRepository::new(&conn);

    let it = departments
        .create(&department("IT", "IT", 500_000, "Toronto"))
        .unwrap()
        .department
        .id;
    let zoe = employees
        .create_employee(&employee("EMP-3", "Zoe Young", it, "Engineer", 70_000))
        .unwrap();
    employees
        .create_employee(&employee("EMP-1", "Ann Lee", it, "Engineer", 50_000))
        .unwrap();
    employees
        .create_employee(&employee("EMP-2", "Bob Kim", it, "Analyst", 60_000))
        .unwrap();

    let members = departments.employees(it).unwrap();
    assert_eq!(members.department.employee_count, 3);
    let names: Vec<_> = members
        .employees
        .iter()
        .map(|item| item.full_name.as_str())
        .collect();
    assert_eq!(names, ["Ann Lee", "Bob Kim", "Zoe Young"]);

    let stats = departments.statistics(it).unwrap();
    assert_eq!(stats.employee_count, 3);
    assert_eq!(stats.average_salary, Decimal::new(60_000, 0));
    assert_eq!(stats.salary_range.min, Decimal::new(50_000, 0));
    assert_eq!(stats.salary_range.max, Decimal::new(70_000, 0));
    assert_eq!(stats.positions, ["Analyst", "Engineer"]);
    assert!(stats.performance_stats.is_none());

    employees
        .create_performance(&NewPerformance {
            employee_id: zoe,
            review_period: "2024-Q1".parse().unwrap(),
            overall_score: Decimal::new(400, 2),
            technical_score: Decimal::new(450, 2),
            communication_score: Decimal::new(350, 2),
            teamwork_score: Decimal::new(300, 2),
            review_date: NaiveDate::from_ymd_opt(2024, 4, 10).unwrap(),
        })
        .unwrap();
    let scores = departments
        .statistics(it)
        .unwrap()
        .performance_stats
        .unwrap();
    assert_eq!(scores.average_overall, 4.0);
    assert_eq!(scores.average_technical, 4.5);
}
