use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::config::{DayCountAlgorithm, NoteConfiguration};
use crate::decimal::{Money, Rate};
use crate::interval::PlannedInterval;

/// elapsed-day counter for interest rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayCounter {
    pub algorithm: DayCountAlgorithm,
    pub fiscal_year_days: u32,
    pub start_date_excluded: bool,
    pub end_date_excluded: bool,
    pub event_date_included: bool,
}

impl DayCounter {
    pub fn from_configuration(config: &NoteConfiguration) -> Self {
        Self {
            algorithm: config.day_count_algorithm,
            fiscal_year_days: config.fiscal_year_days,
            start_date_excluded: config.start_date_excluded,
            end_date_excluded: config.end_date_excluded,
            event_date_included: config.event_date_included,
        }
    }

    /// days between two dates before boundary adjustments
    pub fn raw_days(&self, start: NaiveDate, end: NaiveDate) -> u32 {
        match self.algorithm {
            DayCountAlgorithm::Natural => (end - start).num_days().max(0) as u32,
            DayCountAlgorithm::ThirtyDays => days_30_360(start, end),
        }
    }

    /// day count for a planned row of a note running `note_start..=note_end`
    pub fn count(&self, interval: &PlannedInterval, note_start: NaiveDate, note_end: NaiveDate) -> u32 {
        if interval.is_zero_length() {
            return 0;
        }

        let mut days = i64::from(self.raw_days(interval.start_date, interval.end_date));
        if interval.start_date == note_start {
            if !self.start_date_excluded {
                days += 1;
            }
        } else if interval.starts_at_event && self.event_date_included {
            days += 1;
        }
        if interval.end_date == note_end && self.end_date_excluded {
            days -= 1;
        }
        days.max(0) as u32
    }

    /// simple interest prorated over a fixed-denominator year
    pub fn accrue(&self, principal: Money, annual_rate: Rate, days: u32) -> Money {
        principal.prorate(annual_rate, days, self.fiscal_year_days)
    }
}

/// 30/360 days where month-end dates count as day 30
fn days_30_360(start: NaiveDate, end: NaiveDate) -> u32 {
    if end <= start {
        return 0;
    }
    let y1 = start.year();
    let y2 = end.year();
    let m1 = start.month() as i32;
    let m2 = end.month() as i32;
    let d1 = day_30(start);
    let d2 = day_30(end);

    let days = 360 * (y2 - y1) + 30 * (m2 - m1) + (d2 - d1);
    days.max(0) as u32
}

fn day_30(date: NaiveDate) -> i32 {
    let is_month_end = date.succ_opt().map(|next| next.month() != date.month()).unwrap_or(true);
    if is_month_end {
        30
    } else {
        date.day().min(30) as i32
    }
}
