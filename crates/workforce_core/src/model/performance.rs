//! Performance review domain model.
//!
//! # Invariants
//! - `review_period` is a `YYYY-Qn` label, so lexical order is
//!   chronological order.
//! - Every score lies in `SCORE_MIN..=SCORE_MAX` with two fractional digits.

use super::employee::EmployeeId;
use super::ValidationError;
use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Row id of a performance review.
pub type PerformanceId = i64;

pub const SCORE_MIN: Decimal = Decimal::ZERO;
pub const SCORE_MAX: Decimal = Decimal::from_parts(5, 0, 0, false, 0);

static REVIEW_PERIOD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})-Q([1-4])$").expect("valid review period regex"));

/// Year-quarter bucket used to group reviews; serialized as `YYYY-Qn`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ReviewPeriod {
    pub year: i32,
    /// 1..=4
    pub quarter: u32,
}

impl ReviewPeriod {
    /// Returns the quarter containing `date`.
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            quarter: (date.month() - 1) / 3 + 1,
        }
    }

    pub fn previous(self) -> Self {
        if self.quarter == 1 {
            Self {
                year: self.year - 1,
                quarter: 4,
            }
        } else {
            Self {
                year: self.year,
                quarter: self.quarter - 1,
            }
        }
    }

    pub fn next(self) -> Self {
        if self.quarter == 4 {
            Self {
                year: self.year + 1,
                quarter: 1,
            }
        } else {
            Self {
                year: self.year,
                quarter: self.quarter + 1,
            }
        }
    }

    /// First day of the quarter.
    pub fn start_date(self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, (self.quarter - 1) * 3 + 1, 1)
    }
}

impl Display for ReviewPeriod {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-Q{}", self.year, self.quarter)
    }
}

impl FromStr for ReviewPeriod {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::new("review_period", "must look like `2024-Q1`");
        let captures = REVIEW_PERIOD_RE.captures(value.trim()).ok_or_else(invalid)?;
        let year = captures[1].parse::<i32>().map_err(|_| invalid())?;
        let quarter = captures[2].parse::<u32>().map_err(|_| invalid())?;
        Ok(Self { year, quarter })
    }
}

impl TryFrom<String> for ReviewPeriod {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ReviewPeriod> for String {
    fn from(value: ReviewPeriod) -> Self {
        value.to_string()
    }
}

/// Persisted performance review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Performance {
    pub id: PerformanceId,
    pub employee_id: EmployeeId,
    pub review_period: String,
    pub overall_score: Decimal,
    pub technical_score: Decimal,
    pub communication_score: Decimal,
    pub teamwork_score: Decimal,
    pub review_date: NaiveDate,
    pub created_at: i64,
}

/// Create payload for a performance review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewPerformance {
    #[serde(alias = "employee")]
    pub employee_id: EmployeeId,
    /// Parsed on input, so payloads only ever carry the canonical label.
    pub review_period: ReviewPeriod,
    pub overall_score: Decimal,
    pub technical_score: Decimal,
    pub communication_score: Decimal,
    pub teamwork_score: Decimal,
    pub review_date: NaiveDate,
}

impl NewPerformance {
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (field, score) in self.scores() {
            validate_score(field, score)?;
        }
        Ok(())
    }

    fn scores(&self) -> [(&'static str, Decimal); 4] {
        [
            ("overall_score", self.overall_score),
            ("technical_score", self.technical_score),
            ("communication_score", self.communication_score),
            ("teamwork_score", self.teamwork_score),
        ]
    }
}

/// Checks that `score` is inside the bounded review scale.
pub fn validate_score(field: &'static str, score: Decimal) -> Result<(), ValidationError> {
    if score < SCORE_MIN || score > SCORE_MAX {
        return Err(ValidationError::new(
            field,
            format!("must be between {SCORE_MIN} and {SCORE_MAX}"),
        ));
    }
    if score.round_dp(2) != score {
        return Err(ValidationError::new(
            field,
            "must have at most two decimal places",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{validate_score, NewPerformance, ReviewPeriod};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    #[test]
    fn review_period_parses_and_orders_chronologically() {
        let q4: ReviewPeriod = "2023-Q4".parse().unwrap();
        let q1: ReviewPeriod = "2024-Q1".parse().unwrap();
        assert!(q4 < q1);
        assert_eq!(q4.next(), q1);
        assert_eq!(q1.previous(), q4);
        assert_eq!(q1.to_string(), "2024-Q1");
        assert!("2024-Q5".parse::<ReviewPeriod>().is_err());
        assert!("Q1-2024".parse::<ReviewPeriod>().is_err());
    }

    #[test]
    fn review_period_containing_maps_months_to_quarters() {
        let date = NaiveDate::from_ymd_opt(2024, 8, 15).unwrap();
        let period = ReviewPeriod::containing(date);
        assert_eq!(period.to_string(), "2024-Q3");
        assert_eq!(
            period.start_date(),
            NaiveDate::from_ymd_opt(2024, 7, 1)
        );
    }

    #[test]
    fn payload_period_is_canonicalized_on_input() {
        let payload = r#"{
            "employee": 3,
            "review_period": " 2024-Q2 ",
            "overall_score": "4.00",
            "technical_score": "3.50",
            "communication_score": "3.00",
            "teamwork_score": "4.50",
            "review_date": "2024-07-10"
        }"#;
        let review: NewPerformance = serde_json::from_str(payload).unwrap();
        assert_eq!(review.review_period, ReviewPeriod { year: 2024, quarter: 2 });
        assert_eq!(
            serde_json::to_value(&review).unwrap()["review_period"],
            "2024-Q2"
        );

        let bad = payload.replace(" 2024-Q2 ", "2024-Q5");
        let err = serde_json::from_str::<NewPerformance>(&bad).unwrap_err();
        assert!(err.to_string().contains("review_period"), "{err}");
    }

    #[test]
    fn scores_must_stay_within_scale() {
        assert!(validate_score("overall_score", Decimal::new(500, 2)).is_ok());
        assert!(validate_score("overall_score", Decimal::ZERO).is_ok());
        assert!(validate_score("overall_score", Decimal::new(501, 2)).is_err());
        assert!(validate_score("overall_score", Decimal::new(-1, 2)).is_err());
        assert!(validate_score("overall_score", Decimal::new(3333, 3)).is_err());
    }
}
