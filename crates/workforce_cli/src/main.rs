//! `workforce` command-line entry point.
//!
//! # Responsibility
//! - Expose bootstrap, seeding, analytics, export, listing and history use-cases over
//!   one SQLite database file.
//! - Print results as pretty JSON (or raw CSV for CSV exports) on stdout.

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::info;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use workforce_core::db::SchemaStatus;
use workforce_core::repo::department_repo::{DepartmentListQuery, DepartmentOrdering};
use workforce_core::repo::employee_repo::{EmployeeListQuery, EmployeeOrdering};
use workforce_core::service::employee_service::DEFAULT_ATTENDANCE_HISTORY_DAYS;
use workforce_core::{
    generate, init_logging_with, open_db, AnalyticsOptions, AnalyticsService, AttendancePolicy,
    DepartmentService, EmployeeService, GeneratorConfig, LogConfig, PageRequest,
    SqliteDepartmentRepository, SqliteEmployeeRepository, SqliteStatsRepository,
};

/// Employee and department records with chart-ready analytics.
#[derive(Parser, Debug)]
#[command(name = "workforce", author, version, about, long_about = None)]
struct Cli {
    /// SQLite database file; created on first use.
    #[arg(long, global = true, env = "WORKFORCE_DB", default_value = "workforce.db")]
    db: PathBuf,

    /// trace|debug|info|warn|error
    #[arg(long, global = true, env = "WORKFORCE_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Directory for rolling log files; logging is off when unset.
    #[arg(long, global = true, env = "WORKFORCE_LOG_DIR")]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the database and apply migrations.
    Init,
    /// Fill an empty database with synthetic records.
    Seed(SeedArgs),
    /// Dashboard summary.
    Summary(AnalyticsArgs),
    /// One chart series.
    Chart {
        kind: ChartKind,
        #[command(flatten)]
        analytics: AnalyticsArgs,
    },
    /// Every aggregate as JSON or CSV.
    Export {
        /// json|csv
        #[arg(long)]
        format: Option<String>,
        /// Write to this file instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,
        #[command(flatten)]
        analytics: AnalyticsArgs,
    },
    /// List employees.
    Employees {
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        department: Option<i64>,
        /// full_name|-full_name|salary|-salary|hire_date|-hire_date
        #[arg(long)]
        ordering: Option<String>,
        #[command(flatten)]
        page: PageArgs,
    },
    /// One employee with review and attendance history.
    Employee {
        id: i64,
        /// Attendance window in days, ending at `--as-of`.
        #[arg(long, default_value_t = DEFAULT_ATTENDANCE_HISTORY_DAYS)]
        days: u32,
        /// Reference date (YYYY-MM-DD); defaults to today.
        #[arg(long)]
        as_of: Option<NaiveDate>,
    },
    /// List departments.
    Departments {
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        location: Option<String>,
        /// name|-name|budget|-budget|created_at|-created_at
        #[arg(long)]
        ordering: Option<String>,
        #[command(flatten)]
        page: PageArgs,
    },
}

#[derive(Args, Debug)]
struct SeedArgs {
    /// Fixed random seed for reproducible data.
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long, default_value_t = 20)]
    employees: u32,
    /// Completed quarters of reviews per employee.
    #[arg(long, default_value_t = 2)]
    reviews: u32,
    /// Reference date (YYYY-MM-DD); defaults to today.
    #[arg(long)]
    as_of: Option<NaiveDate>,
}

#[derive(Args, Debug)]
struct AnalyticsArgs {
    /// Reference date (YYYY-MM-DD); defaults to today.
    #[arg(long)]
    as_of: Option<NaiveDate>,
    /// present|present-or-late
    #[arg(long, default_value = "present", value_parser = parse_policy)]
    attendance_policy: AttendancePolicy,
}

impl AnalyticsArgs {
    fn options(&self) -> AnalyticsOptions {
        AnalyticsOptions {
            policy: self.attendance_policy,
            ..AnalyticsOptions::as_of(self.as_of.unwrap_or_else(today))
        }
    }
}

fn parse_policy(value: &str) -> Result<AttendancePolicy, String> {
    AttendancePolicy::parse(value).ok_or_else(|| format!("unknown attendance policy `{value}`"))
}

#[derive(Args, Debug)]
struct PageArgs {
    #[arg(long)]
    page: Option<u32>,
    #[arg(long)]
    page_size: Option<u32>,
}

impl PageArgs {
    fn request(&self) -> PageRequest {
        PageRequest {
            page: self.page,
            page_size: self.page_size,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ChartKind {
    Departments,
    Salaries,
    Performance,
    Attendance,
    Hires,
    DeptPerformance,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    if let Some(log_dir) = cli.log_dir.as_deref() {
        start_logging(&cli.log_level, log_dir)?;
    }

    let mut conn = open_db(&cli.db)
        .with_context(|| format!("failed to open database {}", cli.db.display()))?;

    match &cli.command {
        Command::Init => {
            let status = SchemaStatus::read(&conn)?;
            print_json(&serde_json::json!({
                "database": cli.db.display().to_string(),
                "schema": status,
            }))
        }
        Command::Seed(args) => {
            let config = GeneratorConfig {
                employee_count: args.employees,
                review_quarters: args.reviews,
                seed: args.seed,
                ..GeneratorConfig::default()
            };
            let report = generate(&mut conn, config, args.as_of.unwrap_or_else(today))?;
            print_json(&serde_json::json!({
                "skipped": report.skipped,
                "departments_created": report.departments_created,
                "departments_reused": report.departments_reused,
                "employees": report.employees,
                "reviews": report.reviews,
                "attendance": report.attendance,
            }))
        }
        Command::Summary(args) => {
            let service = AnalyticsService::new(SqliteStatsRepository::new(&conn), args.options());
            print_json(&service.summary()?)
        }
        Command::Chart { kind, analytics } => {
            let service =
                AnalyticsService::new(SqliteStatsRepository::new(&conn), analytics.options());
            match kind {
                ChartKind::Departments => print_json(&service.department_distribution()?),
                ChartKind::Salaries => print_json(&service.salary_distribution()?),
                ChartKind::Performance => print_json(&service.performance_trend()?),
                ChartKind::Attendance => print_json(&service.attendance_rates()?),
                ChartKind::Hires => print_json(&service.hire_timeline()?),
                ChartKind::DeptPerformance => print_json(&service.performance_by_department()?),
            }
        }
        Command::Export {
            format,
            output,
            analytics,
        } => {
            let service =
                AnalyticsService::new(SqliteStatsRepository::new(&conn), analytics.options());
            let document = service.export(format.as_deref(), Utc::now())?;
            match output {
                Some(path) => {
                    fs::write(path, &document.body)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    info!(
                        "event=export_write module=cli status=ok format={} bytes={}",
                        document.format.as_str(),
                        document.body.len()
                    );
                }
                None => print!("{}", document.body),
            }
            Ok(())
        }
        Command::Employees {
            search,
            department,
            ordering,
            page,
        } => {
            let service = EmployeeService::new(SqliteEmployeeRepository::new(&conn));
            let query = EmployeeListQuery {
                search: search.clone(),
                department_id: *department,
                ordering: EmployeeOrdering::parse_or_default(ordering.as_deref()),
                page: page.request(),
                ..EmployeeListQuery::default()
            };
            print_json(&service.list(&query)?)
        }
        Command::Employee { id, days, as_of } => {
            let service = EmployeeService::new(SqliteEmployeeRepository::new(&conn));
            print_json(&serde_json::json!({
                "employee": service.get(*id)?,
                "performance": service.performance_history(*id)?,
                "attendance": service.attendance_history(*id, *days, as_of.unwrap_or_else(today))?,
            }))
        }
        Command::Departments {
            search,
            location,
            ordering,
            page,
        } => {
            let service = DepartmentService::new(SqliteDepartmentRepository::new(&conn));
            let query = DepartmentListQuery {
                search: search.clone(),
                location: location.clone(),
                ordering: DepartmentOrdering::parse_or_default(ordering.as_deref()),
                page: page.request(),
                ..DepartmentListQuery::default()
            };
            print_json(&service.list(&query)?)
        }
    }
}

fn start_logging(level: &str, log_dir: &Path) -> Result<()> {
    let log_dir = if log_dir.is_absolute() {
        log_dir.to_path_buf()
    } else {
        std::env::current_dir()?.join(log_dir)
    };
    let config = LogConfig {
        mirror_warnings_to_stderr: true,
        ..LogConfig::new(level, log_dir.to_string_lossy())
    };
    init_logging_with(&config).map_err(anyhow::Error::msg)
}

fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}
