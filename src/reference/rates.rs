use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::decimal::Rate;

/// a published reference rate value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateFixing {
    pub date: NaiveDate,
    pub value: Rate,
}

/// source of published interbank/treasury rates (tiie, cetes, ...)
pub trait ReferenceRateSource: std::fmt::Debug + Send + Sync {
    /// latest publication of `label` on or before `date`
    fn rate_as_of(&self, label: &str, date: NaiveDate) -> Option<RateFixing>;
}

/// source with no published series, for fixed-rate notes
#[derive(Debug, Clone, Copy, Default)]
pub struct NoReferenceRates;

impl ReferenceRateSource for NoReferenceRates {
    fn rate_as_of(&self, _label: &str, _date: NaiveDate) -> Option<RateFixing> {
        None
    }
}

/// in-memory rate series keyed by label
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RateSeries {
    series: HashMap<String, BTreeMap<NaiveDate, Rate>>,
}

impl RateSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&mut self, label: &str, date: NaiveDate, value: Rate) {
        self.series
            .entry(label.to_lowercase())
            .or_default()
            .insert(date, value);
    }

    pub fn with_fixing(mut self, label: &str, date: NaiveDate, value: Rate) -> Self {
        self.publish(label, date, value);
        self
    }
}

impl ReferenceRateSource for RateSeries {
    fn rate_as_of(&self, label: &str, date: NaiveDate) -> Option<RateFixing> {
        self.series
            .get(&label.to_lowercase())?
            .range(..=date)
            .next_back()
            .map(|(date, value)| RateFixing {
                date: *date,
                value: *value,
            })
    }
}
