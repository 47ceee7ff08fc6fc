//! Core domain logic for the workforce record store.
//! This crate is the single source of truth for business invariants.

pub mod db;
pub mod generator;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use generator::{generate, GenerationContext, GenerationReport, GeneratorConfig, GeneratorError};
pub use logging::{default_log_level, init_logging, init_logging_with, logging_status, LogConfig};
pub use model::ValidationError;
pub use repo::department_repo::{DepartmentRepository, SqliteDepartmentRepository};
pub use repo::employee_repo::{EmployeeRepository, SqliteEmployeeRepository};
pub use repo::page::{PageRequest, Paginated};
pub use repo::stats_repo::{SqliteStatsRepository, StatsRepository};
pub use repo::user_repo::{SqliteUserRepository, UserRepository};
pub use repo::{RepoError, RepoResult};
pub use service::analytics_service::{
    AnalyticsError, AnalyticsOptions, AnalyticsService, AttendancePolicy,
};
pub use service::auth_service::{AuthConfig, AuthError, AuthService};
pub use service::department_service::DepartmentService;
pub use service::employee_service::EmployeeService;
pub use service::export::{ExportDocument, ExportFormat};
pub use service::{ErrorKind, ServiceError, ServiceResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
