/// serialization support for notes and their schedules
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::ledger::NoteLedger;
use crate::schedule::{Interest, Schedule};
use crate::types::{NoteId, NoteStatus, NoteType, Status, TransactionId, TransactionType};

/// serializable view of a note ledger
#[derive(Debug, Serialize, Deserialize)]
pub struct NoteView {
    pub id: NoteId,
    pub type_of: NoteType,
    pub status: NoteStatus,
    pub currency: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub initial_amount: Money,
    pub interest_rate: Option<Rate>,
    pub parent_id: Option<NoteId>,
    pub closing_date: Option<NaiveDate>,
    pub schedule: ScheduleView,
    pub transactions: Vec<TransactionView>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ScheduleView {
    pub terminated_on: Option<NaiveDate>,
    pub totals: TotalsView,
    pub interests: Vec<InterestView>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TotalsView {
    pub gross: Money,
    pub net: Money,
    pub payment: Money,
    pub capital_payment: Money,
}

/// one interest row, rounded to cents
#[derive(Debug, Serialize, Deserialize)]
pub struct InterestView {
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
    pub payment: Money,
    pub capital_payment: Money,
    pub current_balance: Money,
    pub accumulated: Money,
    pub capitalization_accumulated: Money,
    pub commission: Money,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variable_rate_value: Option<Rate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variable_rate_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TransactionView {
    pub id: TransactionId,
    pub transaction_type: TransactionType,
    pub amount: Money,
    pub date: NaiveDate,
    pub status: Status,
    pub system_generated: bool,
}

impl InterestView {
    pub fn from_interest(interest: &Interest) -> Self {
        InterestView {
            interval_id: interest.interval_id,
            start_date: interest.start_date,
            end_date: interest.end_date,
            number_of_days: interest.number_of_days,
            rate: interest.rate,
            gross: interest.gross.round_cents(),
            tax: interest.tax.round_cents(),
            iva: interest.iva.round_cents(),
            retained_iva: interest.retained_iva.round_cents(),
            paid_iva: interest.paid_iva.round_cents(),
            net: interest.net.round_cents(),
            payment: interest.payment.round_cents(),
            capital_payment: interest.capital_payment.round_cents(),
            current_balance: interest.current_balance.round_cents(),
            accumulated: interest.accumulated.round_cents(),
            capitalization_accumulated: interest.capitalization_accumulated.round_cents(),
            commission: interest.commission.round_cents(),
            status: interest.status,
            variable_rate_value: interest.variable_rate_value,
            variable_rate_date: interest.variable_rate_date,
        }
    }
}

impl ScheduleView {
    pub fn from_schedule(schedule: &Schedule) -> Self {
        ScheduleView {
            terminated_on: schedule.terminated_on,
            totals: TotalsView {
                gross: schedule.total_gross().round_cents(),
                net: schedule.total_net().round_cents(),
                payment: schedule.total_payment().round_cents(),
                capital_payment: schedule.total_capital_payment().round_cents(),
            },
            interests: schedule.interests.iter().map(InterestView::from_interest).collect(),
        }
    }

    /// convert to pretty-printed json string
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl NoteView {
    pub fn from_ledger(ledger: &NoteLedger) -> Self {
        let note = ledger.note();
        NoteView {
            id: note.id,
            type_of: note.type_of,
            status: ledger.status(),
            currency: note.currency.clone(),
            start_date: note.start_date,
            end_date: note.end_date,
            initial_amount: note.initial_amount,
            interest_rate: note.interest_rate,
            parent_id: note.parent_id,
            closing_date: ledger.closing_date(),
            schedule: ScheduleView::from_schedule(ledger.schedule()),
            transactions: ledger
                .transactions()
                .iter()
                .map(|t| TransactionView {
                    id: t.id,
                    transaction_type: t.transaction_type,
                    amount: t.amount,
                    date: t.date,
                    status: t.status,
                    system_generated: t.is_system_generated(),
                })
                .collect(),
        }
    }

    /// convert to pretty-printed json string
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
