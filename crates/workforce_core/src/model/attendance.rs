//! Attendance domain model.
//!
//! # Invariants
//! - `ABSENT` rows carry no check-in/check-out and zero hours.
//! - `PRESENT`/`LATE` rows carry a check-in.
//! - A check-out is strictly after the check-in, and `total_hours` is the
//!   elapsed time between them rounded to two places.
//! - Without a check-out, `total_hours` is zero.

use super::employee::EmployeeId;
use super::ValidationError;
use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Row id of an attendance record.
pub type AttendanceId = i64;

const SECONDS_PER_HOUR: i64 = 3_600;

/// Daily attendance state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
}

impl AttendanceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Present => "PRESENT",
            Self::Absent => "ABSENT",
            Self::Late => "LATE",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "PRESENT" => Some(Self::Present),
            "ABSENT" => Some(Self::Absent),
            "LATE" => Some(Self::Late),
            _ => None,
        }
    }
}

/// Persisted attendance record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attendance {
    pub id: AttendanceId,
    pub employee_id: EmployeeId,
    pub date: NaiveDate,
    pub check_in_time: Option<NaiveTime>,
    pub check_out_time: Option<NaiveTime>,
    pub total_hours: Decimal,
    pub status: AttendanceStatus,
    pub created_at: i64,
}

impl Attendance {
    /// Re-checks the time/hours invariants of a stored row.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_times(self.status, self.check_in_time, self.check_out_time)?;
        let expected = derive_total_hours(self.check_in_time, self.check_out_time);
        if self.total_hours != expected {
            return Err(ValidationError::new(
                "total_hours",
                format!("expected {expected} from check-in/check-out"),
            ));
        }
        Ok(())
    }
}

/// Create payload for an attendance record; `total_hours` is derived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewAttendance {
    #[serde(alias = "employee")]
    pub employee_id: EmployeeId,
    pub date: NaiveDate,
    #[serde(default)]
    pub check_in_time: Option<NaiveTime>,
    #[serde(default)]
    pub check_out_time: Option<NaiveTime>,
    pub status: AttendanceStatus,
}

impl NewAttendance {
    pub fn absent(employee_id: EmployeeId, date: NaiveDate) -> Self {
        Self {
            employee_id,
            date,
            check_in_time: None,
            check_out_time: None,
            status: AttendanceStatus::Absent,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_times(self.status, self.check_in_time, self.check_out_time)
    }

    pub fn total_hours(&self) -> Decimal {
        derive_total_hours(self.check_in_time, self.check_out_time)
    }
}

/// Hours between check-in and check-out, rounded to two places; zero when
/// either side is missing.
pub fn derive_total_hours(check_in: Option<NaiveTime>, check_out: Option<NaiveTime>) -> Decimal {
    match (check_in, check_out) {
        (Some(check_in), Some(check_out)) if check_out > check_in => {
            let seconds = (check_out - check_in).num_seconds();
            (Decimal::from(seconds) / Decimal::from(SECONDS_PER_HOUR)).round_dp(2)
        }
        _ => Decimal::ZERO,
    }
}

fn validate_times(
    status: AttendanceStatus,
    check_in: Option<NaiveTime>,
    check_out: Option<NaiveTime>,
) -> Result<(), ValidationError> {
    match status {
        AttendanceStatus::Absent => {
            if check_in.is_some() || check_out.is_some() {
                return Err(ValidationError::new(
                    "status",
                    "absent records must not carry check-in/check-out times",
                ));
            }
        }
        AttendanceStatus::Present | AttendanceStatus::Late => {
            let Some(check_in) = check_in else {
                return Err(ValidationError::new(
                    "check_in_time",
                    "required unless the status is ABSENT",
                ));
            };
            if let Some(check_out) = check_out {
                if check_out <= check_in {
                    return Err(ValidationError::new(
                        "check_out_time",
                        "must be after check_in_time",
                    ));
                }
            }
        }
    }
    Ok(())
}
