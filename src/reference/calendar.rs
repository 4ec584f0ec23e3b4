use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::config::SkipDay;
use crate::errors::{NoteError, Result};

/// longest run of consecutive non-business days a shift may cross
const MAX_SHIFT_DAYS: u32 = 366;

/// organization holiday calendar
pub trait HolidayCalendar: std::fmt::Debug + Send + Sync {
    fn name(&self) -> &str;

    /// true if `date` is an organization holiday
    fn is_holiday(&self, date: NaiveDate) -> bool;

    fn is_weekend(&self, date: NaiveDate) -> bool {
        matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
    }

    /// true if the skip-day policy refuses `date` as a cut date
    fn skips(&self, date: NaiveDate, policy: SkipDay) -> bool {
        match policy {
            SkipDay::Natural => false,
            SkipDay::PreWeekend | SkipDay::PostWeekend => self.is_weekend(date),
            SkipDay::PostHoliday => self.is_holiday(date),
            SkipDay::PostWeekendAndHoliday => self.is_weekend(date) || self.is_holiday(date),
        }
    }

    /// shift a computed cut date according to the skip-day policy
    fn adjust(&self, date: NaiveDate, policy: SkipDay) -> Result<NaiveDate> {
        let step = match policy {
            SkipDay::Natural => return Ok(date),
            SkipDay::PreWeekend => -1,
            _ => 1,
        };

        let mut adjusted = date;
        for _ in 0..MAX_SHIFT_DAYS {
            if !self.skips(adjusted, policy) {
                return Ok(adjusted);
            }
            adjusted = adjusted + Duration::days(step);
        }

        Err(NoteError::NonTerminatingSchedule {
            message: format!(
                "{} has no business day within {} days of {}",
                self.name(),
                MAX_SHIFT_DAYS,
                date
            ),
        })
    }
}

/// calendar without holidays; weekends still count for weekend policies
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHolidays;

impl HolidayCalendar for NoHolidays {
    fn name(&self) -> &str {
        "no holidays"
    }

    fn is_holiday(&self, _date: NaiveDate) -> bool {
        false
    }
}

/// fixed set of holiday dates
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HolidaySet {
    name: String,
    dates: BTreeSet<NaiveDate>,
}

impl HolidaySet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dates: BTreeSet::new(),
        }
    }

    pub fn with_holiday(mut self, date: NaiveDate) -> Self {
        self.dates.insert(date);
        self
    }

    pub fn add(&mut self, date: NaiveDate) {
        self.dates.insert(date);
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

impl HolidayCalendar for HolidaySet {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_holiday(&self, date: NaiveDate) -> bool {
        self.dates.contains(&date)
    }
}
