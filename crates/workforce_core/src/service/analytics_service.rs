//! Aggregation service producing summary statistics and chart series.
//!
//! # Responsibility
//! - Shape raw aggregates from [`StatsRepository`] into chart-ready series
//!   (`{labels, data, colors}` or `{labels, datasets}`).
//! - Apply the attendance policy and the reference date consistently.
//!
//! # Invariants
//! - Read-only; never mutates the store.
//! - Every window is anchored at `AnalyticsOptions::as_of`, so results for a
//!   fixed dataset and date are deterministic.
//! - Averages and rates are rounded to two decimal places.
//! - An empty store yields zeros, `None` averages and empty series.
//! - `labels`, `data` and `colors` always have equal length.

use super::ErrorKind;
use crate::model::employee::EmployeeListItem;
use crate::repo::stats_repo::{AttendanceTally, LabeledCount, LabeledValue, StatsRepository};
use crate::repo::RepoError;
use chrono::{DateTime, Days, Local, NaiveDate, Utc};
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Chart colors, assigned to labels in order and cycled when exhausted.
pub const CHART_PALETTE: [&str; 7] = [
    "#FF6384", "#36A2EB", "#FFCE56", "#4BC0C0", "#9966FF", "#FF9F40", "#C9CBCF",
];

const PERFORMANCE_LINE_COLOR: &str = "#36A2EB";
const PERFORMANCE_LINE_FILL: &str = "rgba(54, 162, 235, 0.1)";
const HIRES_LINE_COLOR: &str = "#FF6384";
const HIRES_LINE_FILL: &str = "rgba(255, 99, 132, 0.1)";
const LINE_TENSION: f64 = 0.4;

/// Which attendance statuses count as "attended".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AttendancePolicy {
    #[default]
    PresentOnly,
    PresentOrLate,
}

impl AttendancePolicy {
    pub fn attended(self, tally: &AttendanceTally) -> u64 {
        match self {
            Self::PresentOnly => tally.present,
            Self::PresentOrLate => tally.present + tally.late,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "present" | "present-only" | "present_only" => Some(Self::PresentOnly),
            "present-or-late" | "present_or_late" => Some(Self::PresentOrLate),
            _ => None,
        }
    }
}

/// Aggregation knobs. `as_of` defaults to today's local date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyticsOptions {
    pub as_of: NaiveDate,
    /// Trailing window of the summary attendance rate.
    pub attendance_window_days: u32,
    /// Trailing window of the monthly attendance series.
    pub attendance_trend_days: u32,
    pub latest_hires: u32,
    pub policy: AttendancePolicy,
}

impl Default for AnalyticsOptions {
    fn default() -> Self {
        Self::as_of(Local::now().date_naive())
    }
}

impl AnalyticsOptions {
    pub fn as_of(as_of: NaiveDate) -> Self {
        Self {
            as_of,
            attendance_window_days: 30,
            attendance_trend_days: 180,
            latest_hires: 5,
            policy: AttendancePolicy::default(),
        }
    }
}

/// Aggregation error.
#[derive(Debug)]
pub enum AnalyticsError {
    /// A caller-supplied parameter is not one of the accepted values.
    InvalidParameter { name: &'static str, value: String },
    Repo(RepoError),
    Json(serde_json::Error),
    Csv(csv::Error),
}

impl AnalyticsError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidParameter { .. } => ErrorKind::ClientInput,
            Self::Repo(_) | Self::Json(_) | Self::Csv(_) => ErrorKind::Internal,
        }
    }
}

impl Display for AnalyticsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidParameter { name, value } => {
                write!(f, "invalid parameter `{name}`: `{value}`")
            }
            Self::Repo(err) => write!(f, "{err}"),
            Self::Json(err) => write!(f, "json export failed: {err}"),
            Self::Csv(err) => write!(f, "csv export failed: {err}"),
        }
    }
}

impl Error for AnalyticsError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidParameter { .. } => None,
            Self::Repo(err) => Some(err),
            Self::Json(err) => Some(err),
            Self::Csv(err) => Some(err),
        }
    }
}

impl From<RepoError> for AnalyticsError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<serde_json::Error> for AnalyticsError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl From<csv::Error> for AnalyticsError {
    fn from(value: csv::Error) -> Self {
        Self::Csv(value)
    }
}

pub type AnalyticsResult<T> = Result<T, AnalyticsError>;

/// Dashboard summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub total_employees: u64,
    pub total_departments: u64,
    /// `None` when there are no employees.
    pub average_salary: Option<f64>,
    /// `None` when there are no reviews.
    pub average_performance: Option<f64>,
    /// Percentage; `None` when the window holds no attendance rows.
    pub attendance_rate: Option<f64>,
    pub latest_hires: Vec<EmployeeListItem>,
}

/// Pie/bar/doughnut series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries<T> {
    pub labels: Vec<String>,
    pub data: Vec<T>,
    pub colors: Vec<String>,
}

impl<T> ChartSeries<T> {
    fn from_pairs(pairs: impl IntoIterator<Item = (String, T)>) -> Self {
        let (labels, data): (Vec<_>, Vec<_>) = pairs.into_iter().unzip();
        let colors = palette_colors(labels.len());
        Self {
            labels,
            data,
            colors,
        }
    }
}

/// Line series with one or more datasets.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineChart<T> {
    pub labels: Vec<String>,
    pub datasets: Vec<LineDataset<T>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineDataset<T> {
    pub label: String,
    pub data: Vec<T>,
    pub border_color: String,
    pub background_color: String,
    pub tension: f64,
}

impl<T> LineChart<T> {
    fn single(
        label: &str,
        border_color: &str,
        background_color: &str,
        pairs: impl IntoIterator<Item = (String, T)>,
    ) -> Self {
        let (labels, data): (Vec<_>, Vec<_>) = pairs.into_iter().unzip();
        Self {
            labels,
            datasets: vec![LineDataset {
                label: label.to_string(),
                data,
                border_color: border_color.to_string(),
                background_color: background_color.to_string(),
                tension: LINE_TENSION,
            }],
        }
    }
}

/// Every aggregate in one document; the payload of exports.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsSnapshot {
    pub summary: Summary,
    pub department_stats: ChartSeries<u64>,
    pub salary_distribution: ChartSeries<f64>,
    pub performance_trends: LineChart<f64>,
    pub attendance_rates: ChartSeries<f64>,
    pub hire_timeline: LineChart<u64>,
    pub performance_by_department: ChartSeries<f64>,
    pub generated_at: DateTime<Utc>,
}

/// Aggregation facade over a stats repository.
pub struct AnalyticsService<R: StatsRepository> {
    repo: R,
    options: AnalyticsOptions,
}

impl<R: StatsRepository> AnalyticsService<R> {
    pub fn new(repo: R, options: AnalyticsOptions) -> Self {
        Self { repo, options }
    }

    pub fn options(&self) -> &AnalyticsOptions {
        &self.options
    }

    pub fn summary(&self) -> AnalyticsResult<Summary> {
        let as_of = self.options.as_of;
        let window_start = self.window_start(
            "attendance_window_days",
            self.options.attendance_window_days,
        )?;
        let tally = self.repo.attendance_tally(window_start, as_of)?;

        Ok(Summary {
            total_employees: self.repo.count_employees()?,
            total_departments: self.repo.count_departments()?,
            average_salary: self.repo.average_salary()?.map(round2),
            average_performance: self.repo.average_overall_score()?.map(round2),
            attendance_rate: attendance_rate(self.options.policy, &tally),
            latest_hires: self.repo.latest_hires(self.options.latest_hires)?,
        })
    }

    /// Employee count per department, empty departments included.
    pub fn department_distribution(&self) -> AnalyticsResult<ChartSeries<u64>> {
        let groups = self.repo.employees_per_department()?;
        Ok(ChartSeries::from_pairs(count_pairs(groups)))
    }

    /// Average salary per department with at least one employee.
    pub fn salary_distribution(&self) -> AnalyticsResult<ChartSeries<f64>> {
        let groups = self.repo.average_salary_per_department()?;
        Ok(ChartSeries::from_pairs(rounded_pairs(groups)))
    }

    /// Average overall score per review period, chronological.
    pub fn performance_trend(&self) -> AnalyticsResult<LineChart<f64>> {
        let groups = self.repo.average_score_per_period()?;
        Ok(LineChart::single(
            "Average Performance Score",
            PERFORMANCE_LINE_COLOR,
            PERFORMANCE_LINE_FILL,
            rounded_pairs(groups),
        ))
    }

    /// Attended percentage per `YYYY-MM` over the trailing trend window.
    pub fn attendance_rates(&self) -> AnalyticsResult<ChartSeries<f64>> {
        let as_of = self.options.as_of;
        let from = self.window_start("attendance_trend_days", self.options.attendance_trend_days)?;
        let months = self.repo.attendance_per_month(from, as_of)?;
        let policy = self.options.policy;
        Ok(ChartSeries::from_pairs(months.into_iter().map(|month| {
            let rate = attendance_rate(policy, &month.tally).unwrap_or(0.0);
            (month.month, rate)
        })))
    }

    /// Hires per `YYYY-MM`, chronological.
    pub fn hire_timeline(&self) -> AnalyticsResult<LineChart<u64>> {
        let groups = self.repo.hires_per_month()?;
        Ok(LineChart::single(
            "New Hires",
            HIRES_LINE_COLOR,
            HIRES_LINE_FILL,
            count_pairs(groups),
        ))
    }

    /// Average overall score per department with at least one review.
    pub fn performance_by_department(&self) -> AnalyticsResult<ChartSeries<f64>> {
        let groups = self.repo.average_score_per_department()?;
        Ok(ChartSeries::from_pairs(rounded_pairs(groups)))
    }

    /// First day of a trailing window of `days` days ending at `as_of`.
    fn window_start(&self, name: &'static str, days: u32) -> AnalyticsResult<NaiveDate> {
        self.options
            .as_of
            .checked_sub_days(Days::new(u64::from(days)))
            .ok_or_else(|| AnalyticsError::InvalidParameter {
                name,
                value: days.to_string(),
            })
    }

    pub fn snapshot(&self, generated_at: DateTime<Utc>) -> AnalyticsResult<AnalyticsSnapshot> {
        Ok(AnalyticsSnapshot {
            summary: self.summary()?,
            department_stats: self.department_distribution()?,
            salary_distribution: self.salary_distribution()?,
            performance_trends: self.performance_trend()?,
            attendance_rates: self.attendance_rates()?,
            hire_timeline: self.hire_timeline()?,
            performance_by_department: self.performance_by_department()?,
            generated_at,
        })
    }
}

/// First `len` palette colors, cycling when `len` exceeds the palette.
pub fn palette_colors(len: usize) -> Vec<String> {
    CHART_PALETTE
        .iter()
        .cycle()
        .take(len)
        .map(|color| color.to_string())
        .collect()
}

fn attendance_rate(policy: AttendancePolicy, tally: &AttendanceTally) -> Option<f64> {
    (tally.total > 0).then(|| round2(policy.attended(tally) as f64 * 100.0 / tally.total as f64))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn rounded_pairs(groups: Vec<LabeledValue>) -> impl Iterator<Item = (String, f64)> {
    groups
        .into_iter()
        .map(|group| (group.label, round2(group.value)))
}

fn count_pairs(groups: Vec<LabeledCount>) -> impl Iterator<Item = (String, u64)> {
    groups.into_iter().map(|group| (group.label, group.count))
}
