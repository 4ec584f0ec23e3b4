//! read-only reference data the schedule engine consults but does not own
//!
//! each lookup is a narrow capability so fixtures can stand in for the real
//! sources in tests

pub mod calendar;
pub mod rates;
pub mod tax_table;

use std::sync::Arc;

pub use calendar::{HolidayCalendar, HolidaySet, NoHolidays};
pub use rates::{NoReferenceRates, RateFixing, RateSeries, ReferenceRateSource};
pub use tax_table::TaxTable;

/// bundle of reference lookups passed into every schedule computation
#[derive(Debug, Clone, Copy)]
pub struct ReferenceData<'a> {
    pub calendar: &'a dyn HolidayCalendar,
    pub tax_table: &'a TaxTable,
    pub rates: &'a dyn ReferenceRateSource,
}

impl<'a> ReferenceData<'a> {
    pub fn new(
        calendar: &'a dyn HolidayCalendar,
        tax_table: &'a TaxTable,
        rates: &'a dyn ReferenceRateSource,
    ) -> Self {
        Self {
            calendar,
            tax_table,
            rates,
        }
    }
}

/// owned reference sources shared between ledgers
#[derive(Debug, Clone)]
pub struct ReferenceBook {
    pub calendar: Arc<dyn HolidayCalendar>,
    pub tax_table: Arc<TaxTable>,
    pub rates: Arc<dyn ReferenceRateSource>,
}

impl ReferenceBook {
    pub fn new(
        calendar: Arc<dyn HolidayCalendar>,
        tax_table: Arc<TaxTable>,
        rates: Arc<dyn ReferenceRateSource>,
    ) -> Self {
        Self {
            calendar,
            tax_table,
            rates,
        }
    }

    /// no holidays, an empty tax table and no published rates
    pub fn empty() -> Self {
        Self::new(
            Arc::new(NoHolidays),
            Arc::new(TaxTable::new()),
            Arc::new(NoReferenceRates),
        )
    }

    pub fn data(&self) -> ReferenceData<'_> {
        ReferenceData::new(
            self.calendar.as_ref(),
            self.tax_table.as_ref(),
            self.rates.as_ref(),
        )
    }
}
