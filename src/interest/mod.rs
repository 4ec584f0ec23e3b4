//! day counting, rate resolution and tax/iva rules for interest rows

pub mod accrual;
pub mod rate;
pub mod tax;

pub use accrual::DayCounter;
pub use rate::{fixing_date, resolve_rate, ResolvedRate};
pub use tax::{TaxBreakdown, TaxCalculator};
