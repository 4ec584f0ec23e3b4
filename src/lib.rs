pub mod config;
pub mod decimal;
pub mod errors;
pub mod events;
pub mod interest;
pub mod interval;
pub mod ledger;
pub mod note;
pub mod payments;
pub mod reference;
pub mod schedule;
pub mod serialization;
pub mod transaction;
pub mod types;

// re-export key types
pub use config::{DayCountAlgorithm, NoteConfiguration, Settings, SkipDay, TaxConfiguration};
pub use decimal::{Money, Rate};
pub use errors::{ErrorKind, NoteError, Result};
pub use events::{Event, EventStore};
pub use interest::{DayCounter, ResolvedRate, TaxBreakdown, TaxCalculator};
pub use interval::{cut_into_intervals, plan_intervals, IntervalPlan, PlannedInterval};
pub use ledger::{MonthlyCut, NoteLedger, SharedNoteLedger};
pub use note::{FloatingRate, MixedPayment, MixedRate, Note, NoteBuilder};
pub use payments::{AmortizationCalculator, AmortizationMethod, PaymentShare};
pub use reference::{
    HolidayCalendar, HolidaySet, NoHolidays, NoReferenceRates, RateFixing, RateSeries,
    ReferenceBook, ReferenceData, ReferenceRateSource, TaxTable,
};
pub use schedule::{
    recalculate_from, recalculate_from_beginning, Interest, Schedule, ScheduleCarry,
    ScheduleEngine, ScheduledTransaction,
};
pub use serialization::{NoteView, ScheduleView};
pub use transaction::Transaction;
pub use types::{NoteId, NoteStatus, NoteType, PaymentType, Status, TransactionId, TransactionType};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
