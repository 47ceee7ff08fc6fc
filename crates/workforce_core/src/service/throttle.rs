//! Sliding-window request throttling.
//!
//! # Invariants
//! - A key is allowed at most `rate.requests` times in any window of
//!   `rate.period`.
//! - Denied requests are not recorded and do not extend the wait.
//! - The caller supplies `now`; the limiter never reads the clock itself.

use crate::model::ValidationError;
use log::debug;
use std::collections::{HashMap, VecDeque};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::time::{Duration, Instant};

/// `requests` per `period`, written `N/unit` (for example `100/day`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottleRate {
    pub requests: u32,
    pub period: Duration,
}

impl ThrottleRate {
    /// Default rate for authenticated callers.
    pub const USER: Self = Self {
        requests: 1000,
        period: Duration::from_secs(86_400),
    };
    /// Default rate for anonymous callers.
    pub const ANON: Self = Self {
        requests: 100,
        period: Duration::from_secs(86_400),
    };

    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        let invalid = || ValidationError::new("rate", format!("expected `N/unit`, got `{value}`"));
        let (count, unit) = value.trim().split_once('/').ok_or_else(invalid)?;
        let requests: u32 = count.trim().parse().map_err(|_| invalid())?;
        if requests == 0 {
            return Err(ValidationError::new("rate", "request count must be positive"));
        }
        let seconds = match unit.trim().to_ascii_lowercase().as_str() {
            "s" | "sec" | "second" => 1,
            "m" | "min" | "minute" => 60,
            "h" | "hour" => 3_600,
            "d" | "day" => 86_400,
            _ => return Err(invalid()),
        };
        Ok(Self {
            requests,
            period: Duration::from_secs(seconds),
        })
    }
}

impl FromStr for ThrottleRate {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl Display for ThrottleRate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let unit = match self.period.as_secs() {
            1 => "second",
            60 => "minute",
            3_600 => "hour",
            86_400 => "day",
            other => return write!(f, "{}/{}s", self.requests, other),
        };
        write!(f, "{}/{}", self.requests, unit)
    }
}

/// Outcome of one throttle check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThrottleDecision {
    Allowed { remaining: u32 },
    /// Retry after `wait`.
    Denied { wait: Duration },
}

impl ThrottleDecision {
    pub fn is_allowed(self) -> bool {
        matches!(self, Self::Allowed { .. })
    }
}

/// Per-key request history for one rate.
#[derive(Debug)]
pub struct RateLimiter {
    rate: ThrottleRate,
    history: HashMap<String, VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(rate: ThrottleRate) -> Self {
        Self {
            rate,
            history: HashMap::new(),
        }
    }

    pub fn rate(&self) -> ThrottleRate {
        self.rate
    }

    /// Checks and, when allowed, records one request for `key` at `now`.
    pub fn check(&mut self, key: &str, now: Instant) -> ThrottleDecision {
        let period = self.rate.period;
        let history = self.history.entry(key.to_string()).or_default();
        while history
            .front()
            .is_some_and(|oldest| now.saturating_duration_since(*oldest) >= period)
        {
            history.pop_front();
        }

        if history.len() >= self.rate.requests as usize {
            let oldest = history.front().copied().unwrap_or(now);
            let wait = period.saturating_sub(now.saturating_duration_since(oldest));
            debug!(
                "event=throttle module=throttle status=denied rate={} wait_ms={}",
                self.rate,
                wait.as_millis()
            );
            return ThrottleDecision::Denied { wait };
        }

        history.push_back(now);
        ThrottleDecision::Allowed {
            remaining: self.rate.requests - history.len() as u32,
        }
    }

    /// Drops keys whose whole history has expired.
    pub fn prune(&mut self, now: Instant) {
        let period = self.rate.period;
        self.history.retain(|_, history| {
            history
                .back()
                .is_some_and(|latest| now.saturating_duration_since(*latest) < period)
        });
    }

    pub fn tracked_keys(&self) -> usize {
        self.history.len()
    }
}
