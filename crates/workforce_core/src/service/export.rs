//! Analytics export as JSON or flat CSV.
//!
//! # Invariants
//! - Format selection is case-insensitive and ignores surrounding whitespace;
//!   a missing format means JSON.
//! - CSV rows are `section,label,value`; `section` equals the JSON key the
//!   value lives under, so both renditions carry the same numbers.
//! - Missing averages are written as an empty CSV cell and `null` in JSON.

use super::analytics_service::{
    AnalyticsError, AnalyticsResult, AnalyticsService, AnalyticsSnapshot, ChartSeries, LineChart,
};
use crate::repo::stats_repo::StatsRepository;
use chrono::{DateTime, SecondsFormat, Utc};
use log::{error, info};
use std::fmt::Display;
use std::time::Instant;

pub const CSV_HEADER: [&str; 3] = ["section", "label", "value"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
}

impl ExportFormat {
    /// Parses a user-supplied format name; `None` selects JSON.
    pub fn parse(value: Option<&str>) -> AnalyticsResult<Self> {
        let Some(raw) = value else {
            return Ok(Self::Json);
        };
        match raw.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            _ => Err(AnalyticsError::InvalidParameter {
                name: "format",
                value: raw.to_string(),
            }),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Csv => "text/csv",
        }
    }

    pub fn file_name(self) -> &'static str {
        match self {
            Self::Json => "analytics_data.json",
            Self::Csv => "analytics_data.csv",
        }
    }
}

/// Rendered export body plus the metadata a transport needs to ship it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportDocument {
    pub format: ExportFormat,
    pub content_type: &'static str,
    pub file_name: &'static str,
    pub body: String,
}

impl<R: StatsRepository> AnalyticsService<R> {
    /// Builds a snapshot and renders it in the requested format.
    ///
    /// # Errors
    /// - `InvalidParameter` for an unknown format, before any query runs.
    pub fn export(
        &self,
        format: Option<&str>,
        generated_at: DateTime<Utc>,
    ) -> AnalyticsResult<ExportDocument> {
        let started_at = Instant::now();
        let format = ExportFormat::parse(format)?;
        let result = self
            .snapshot(generated_at)
            .and_then(|snapshot| render(&snapshot, format));
        match &result {
            Ok(document) => info!(
                "event=analytics_export module=analytics status=ok format={} bytes={} duration_ms={}",
                format.as_str(),
                document.body.len(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=analytics_export module=analytics status=error format={} duration_ms={} error={}",
                format.as_str(),
                started_at.elapsed().as_millis(),
                err
            ),
        }
        result
    }
}

/// Renders an already computed snapshot.
pub fn render(snapshot: &AnalyticsSnapshot, format: ExportFormat) -> AnalyticsResult<ExportDocument> {
    let body = match format {
        ExportFormat::Json => serde_json::to_string_pretty(snapshot)?,
        ExportFormat::Csv => render_csv(snapshot)?,
    };
    Ok(ExportDocument {
        format,
        content_type: format.content_type(),
        file_name: format.file_name(),
        body,
    })
}

fn render_csv(snapshot: &AnalyticsSnapshot) -> AnalyticsResult<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADER)?;

    let summary = &snapshot.summary;
    write_row(&mut writer, "summary", "total_employees", summary.total_employees)?;
    write_row(&mut writer, "summary", "total_departments", summary.total_departments)?;
    write_optional(&mut writer, "summary", "average_salary", summary.average_salary)?;
    write_optional(&mut writer, "summary", "average_performance", summary.average_performance)?;
    write_optional(&mut writer, "summary", "attendance_rate", summary.attendance_rate)?;
    for hire in &summary.latest_hires {
        write_row(&mut writer, "summary", "latest_hire", &hire.employee_id)?;
    }

    write_series(&mut writer, "department_stats", &snapshot.department_stats)?;
    write_series(&mut writer, "salary_distribution", &snapshot.salary_distribution)?;
    write_line(&mut writer, "performance_trends", &snapshot.performance_trends)?;
    write_series(&mut writer, "attendance_rates", &snapshot.attendance_rates)?;
    write_line(&mut writer, "hire_timeline", &snapshot.hire_timeline)?;
    write_series(
        &mut writer,
        "performance_by_department",
        &snapshot.performance_by_department,
    )?;
    write_row(
        &mut writer,
        "generated_at",
        "",
        snapshot
            .generated_at
            .to_rfc3339_opts(SecondsFormat::AutoSi, true),
    )?;

    let bytes = writer
        .into_inner()
        .map_err(|err| csv::Error::from(err.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn write_row(
    writer: &mut csv::Writer<Vec<u8>>,
    section: &str,
    label: &str,
    value: impl Display,
) -> csv::Result<()> {
    writer.write_record([section, label, &value.to_string()])
}

fn write_optional(
    writer: &mut csv::Writer<Vec<u8>>,
    section: &str,
    label: &str,
    value: Option<f64>,
) -> csv::Result<()> {
    match value {
        Some(value) => write_row(writer, section, label, value),
        None => writer.write_record([section, label, ""]),
    }
}

fn write_series<T: Display>(
    writer: &mut csv::Writer<Vec<u8>>,
    section: &str,
    series: &ChartSeries<T>,
) -> csv::Result<()> {
    for (label, value) in series.labels.iter().zip(&series.data) {
        write_row(writer, section, label, value)?;
    }
    Ok(())
}

fn write_line<T: Display>(
    writer: &mut csv::Writer<Vec<u8>>,
    section: &str,
    chart: &LineChart<T>,
) -> csv::Result<()> {
    for dataset in &chart.datasets {
        for (label, value) in chart.labels.iter().zip(&dataset.data) {
            write_row(writer, section, label, value)?;
        }
    }
    Ok(())
}
