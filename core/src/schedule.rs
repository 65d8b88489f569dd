//! Posting schedules for a profile.
//!
//! A `Schedule` is a validated pair of lists: weekday codes and `HH:MM`
//! times. Appends are all-or-nothing per call: every candidate is checked
//! before any of them is stored.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::error::ValidationError;
use crate::types::OneOrMany;

pub const WEEKDAYS: [&str; 7] = ["mon", "tue", "wed", "thu", "fri", "sat", "sun"];

static TIME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([01][0-9]|2[0-3]):[0-5][0-9]$").expect("valid time regex"));

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Schedule {
    days: Vec<String>,
    times: Vec<String>,
}

impl Schedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a schedule from initial days and times, validating both.
    pub fn with(
        days: impl Into<OneOrMany<String>>,
        times: impl Into<OneOrMany<String>>,
    ) -> Result<Self, ValidationError> {
        let mut schedule = Self::new();
        schedule.add_day(days)?;
        schedule.add_time(times)?;
        Ok(schedule)
    }

    /// Append one weekday code or a sequence of them.
    pub fn add_day(&mut self, day: impl Into<OneOrMany<String>>) -> Result<&mut Self, ValidationError> {
        let candidates = day.into().into_vec();
        if let Some(bad) = candidates.iter().find(|d| !WEEKDAYS.contains(&d.as_str())) {
            return Err(ValidationError::InvalidDay { value: bad.clone() });
        }
        self.days.extend(candidates);
        Ok(self)
    }

    /// Append one `HH:MM` time or a sequence of them.
    pub fn add_time(&mut self, time: impl Into<OneOrMany<String>>) -> Result<&mut Self, ValidationError> {
        let candidates = time.into().into_vec();
        if let Some(bad) = candidates.iter().find(|t| !TIME_PATTERN.is_match(t)) {
            return Err(ValidationError::InvalidTime { value: bad.clone() });
        }
        self.times.extend(candidates);
        Ok(self)
    }

    pub fn days(&self) -> &[String] {
        &self.days
    }

    pub fn times(&self) -> &[String] {
        &self.times
    }
}

impl From<Schedule> for OneOrMany<Schedule> {
    fn from(schedule: Schedule) -> Self {
        OneOrMany::One(schedule)
    }
}

impl From<Vec<Schedule>> for OneOrMany<Schedule> {
    fn from(schedules: Vec<Schedule>) -> Self {
        OneOrMany::Many(schedules)
    }
}
