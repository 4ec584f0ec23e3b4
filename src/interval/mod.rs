//! partitions a note's life into cut intervals

pub mod cuts;
pub mod planner;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::transaction::Transaction;

pub use cuts::{cut_into_intervals, scheduled_cuts};
pub use planner::plan_intervals;

/// one row of the interval grid before any money is computed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedInterval {
    /// 1-based scheduled period this row belongs to; rows split by events share it
    pub interval_id: u32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// row ends on a scheduled cut (end_date counts as one)
    pub scheduled_cut: bool,
    /// row starts where a transaction split the grid rather than on a cut
    pub starts_at_event: bool,
    /// last row of a note that runs to its end_date
    pub maturity: bool,
    /// row ends on a total withdrawal
    pub terminal: bool,
    /// applied user transactions settling at this row's end
    pub events: Vec<Transaction>,
}

impl PlannedInterval {
    pub fn is_zero_length(&self) -> bool {
        self.start_date == self.end_date
    }
}

/// full grid for a note plus the transactions settling on its start date
#[derive(Debug, Clone, PartialEq)]
pub struct IntervalPlan {
    pub opening_events: Vec<Transaction>,
    pub intervals: Vec<PlannedInterval>,
    pub terminated_on: Option<NaiveDate>,
}

impl IntervalPlan {
    /// true if `date` is a boundary of some row
    pub fn has_boundary(&self, date: NaiveDate) -> bool {
        self.intervals
            .iter()
            .any(|i| i.end_date == date || i.start_date == date)
    }
}
