pub mod engine;
pub mod recalculate;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::interest::TaxBreakdown;
use crate::payments::PaymentShare;
use crate::types::{PaymentType, Status, TransactionType};

pub use engine::ScheduleEngine;
pub use recalculate::{recalculate_from, recalculate_from_beginning};

/// running state handed from one interest row to the next
///
/// stored on every row so generation can resume from any of them
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScheduleCarry {
    /// scheduled cuts reached so far
    pub period: u32,
    /// interest accrued but not yet realized under retention on payment
    pub pending: TaxBreakdown,
    /// realized net interest waiting for a payment row
    pub pending_net: Money,
    /// paid iva included in `pending_net`
    pub pending_net_iva: Money,
    /// interest waiting to be folded into principal
    pub capitalization_pending: Money,
    /// installment in force, cleared by any principal movement
    pub installment: Option<Money>,
    /// promoter commission accrued since the note start
    pub commission_accrued: Money,
}

impl ScheduleCarry {
    /// interest owed to the investor but not yet paid
    pub fn undistributed(&self) -> Money {
        self.pending.gross + self.pending_net + self.capitalization_pending
    }
}

/// one computed cut
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interest {
    pub interval_id: u32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub number_of_days: u32,
    pub rate: Rate,
    pub gross: Money,
    pub tax: Money,
    pub iva: Money,
    pub retained_iva: Money,
    pub paid_iva: Money,
    pub net: Money,
    /// interest disbursed at the end of the row
    pub payment: Money,
    pub capital_payment: Money,
    /// principal after every movement settled at the end of the row
    pub current_balance: Money,
    pub accumulated: Money,
    pub capitalization_accumulated: Money,
    pub commission: Money,
    pub status: Status,
    pub variable_rate_value: Option<Rate>,
    pub variable_rate_date: Option<NaiveDate>,
    pub payment_breakdown: Vec<PaymentShare>,
    /// gross per payment type for mixed-rate notes
    pub rate_breakdown: Vec<(PaymentType, Money)>,
    pub carry: ScheduleCarry,
}

impl Interest {
    pub fn is_zero_length(&self) -> bool {
        self.start_date == self.end_date
    }

    pub fn covers(&self, date: NaiveDate) -> bool {
        self.start_date < date && date <= self.end_date
    }

    pub fn same_period(&self, other: &Interest) -> bool {
        self.start_date == other.start_date && self.end_date == other.end_date
    }

    /// payment plus capital, the amount leaving the note at the end of the row
    pub fn amortization_term(&self) -> Money {
        self.payment + self.capital_payment
    }
}

/// transaction produced by the engine rather than a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledTransaction {
    pub transaction_type: TransactionType,
    pub amount: Money,
    pub date: NaiveDate,
}

/// engine output for one note
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Schedule {
    pub interests: Vec<Interest>,
    pub transactions: Vec<ScheduledTransaction>,
    /// set when a total withdrawal ended the note early
    pub terminated_on: Option<NaiveDate>,
}

impl Schedule {
    pub fn is_empty(&self) -> bool {
        self.interests.is_empty()
    }

    pub fn first(&self) -> Option<&Interest> {
        self.interests.first()
    }

    pub fn last(&self) -> Option<&Interest> {
        self.interests.last()
    }

    /// row whose end settles movements dated `date`
    pub fn row_ending_on(&self, date: NaiveDate) -> Option<&Interest> {
        self.interests
            .iter()
            .rev()
            .find(|i| i.end_date == date && !i.is_zero_length())
            .or_else(|| self.interests.iter().find(|i| i.end_date == date))
    }

    /// last row ending on or before `date`
    pub fn last_settled_by(&self, date: NaiveDate) -> Option<&Interest> {
        self.interests.iter().rev().find(|i| i.end_date <= date)
    }

    pub fn total_gross(&self) -> Money {
        self.interests.iter().map(|i| i.gross).sum()
    }

    pub fn total_net(&self) -> Money {
        self.interests.iter().map(|i| i.net).sum()
    }

    pub fn total_capital_payment(&self) -> Money {
        self.interests.iter().map(|i| i.capital_payment).sum()
    }

    pub fn total_payment(&self) -> Money {
        self.interests.iter().map(|i| i.payment).sum()
    }

    pub fn transactions_of(&self, kind: TransactionType) -> impl Iterator<Item = &ScheduledTransaction> {
        self.transactions.iter().filter(move |t| t.transaction_type == kind)
    }

    /// rows tile `start..=end` without gaps or overlaps
    pub fn is_contiguous(&self, start: NaiveDate, end: NaiveDate) -> bool {
        let mut cursor = start;
        for row in &self.interests {
            if row.start_date != cursor || row.end_date < row.start_date {
                return false;
            }
            cursor = row.end_date;
        }
        cursor == self.terminated_on.unwrap_or(end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn row(start: NaiveDate, end: NaiveDate) -> Interest {
        Interest {
            interval_id: 1,
            start_date: start,
            end_date: end,
            number_of_days: (end - start).num_days() as u32,
            rate: Rate::from_percentage(10),
            gross: Money::from_major(100),
            tax: Money::from_major(10),
            iva: Money::ZERO,
            retained_iva: Money::ZERO,
            paid_iva: Money::ZERO,
            net: Money::from_major(90),
            payment: Money::from_major(90),
            capital_payment: Money::ZERO,
            current_balance: Money::from_major(1_000),
            accumulated: Money::ZERO,
            capitalization_accumulated: Money::ZERO,
            commission: Money::ZERO,
            status: Status::Pending,
            variable_rate_value: None,
            variable_rate_date: None,
            payment_breakdown: Vec::new(),
            rate_breakdown: Vec::new(),
            carry: ScheduleCarry::default(),
        }
    }

    #[test]
    fn test_contiguity_check() {
        let schedule = Schedule {
            interests: vec![
                row(date(2021, 1, 1), date(2021, 2, 1)),
                row(date(2021, 2, 1), date(2021, 3, 1)),
            ],
            transactions: Vec::new(),
            terminated_on: None,
        };
        assert!(schedule.is_contiguous(date(2021, 1, 1), date(2021, 3, 1)));
        assert!(!schedule.is_contiguous(date(2021, 1, 1), date(2021, 4, 1)));
        assert_eq!(schedule.total_net(), Money::from_major(180));
    }

    #[test]
    fn test_row_ending_on_prefers_non_zero_row() {
        let schedule = Schedule {
            interests: vec![
                row(date(2021, 1, 1), date(2021, 2, 1)),
                row(date(2021, 2, 1), date(2021, 2, 1)),
            ],
            transactions: Vec::new(),
            terminated_on: None,
        };
        let found = schedule.row_ending_on(date(2021, 2, 1)).unwrap();
        assert!(!found.is_zero_length());
        assert!(found.covers(date(2021, 1, 15)));
        assert!(!found.covers(date(2021, 1, 1)));
    }
}
