use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::types::{NoteId, NoteStatus, Status, TransactionId, TransactionType};

/// all events that can be emitted by a note ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    // lifecycle events
    NoteStatusChanged {
        note_id: NoteId,
        old_status: NoteStatus,
        new_status: NoteStatus,
        timestamp: DateTime<Utc>,
    },
    NoteRenewed {
        parent_id: NoteId,
        child_id: NoteId,
        initial_amount: Money,
        timestamp: DateTime<Utc>,
    },
    NoteTerminated {
        note_id: NoteId,
        terminated_on: NaiveDate,
        settlement: Money,
        timestamp: DateTime<Utc>,
    },

    // schedule events
    ScheduleGenerated {
        note_id: NoteId,
        rows: usize,
        timestamp: DateTime<Utc>,
    },
    ScheduleRecalculated {
        note_id: NoteId,
        from: NaiveDate,
        rows: usize,
        timestamp: DateTime<Utc>,
    },
    InterestCapitalized {
        note_id: NoteId,
        amount: Money,
        date: NaiveDate,
        timestamp: DateTime<Utc>,
    },
    InterestStatusChanged {
        note_id: NoteId,
        end_date: NaiveDate,
        old_status: Status,
        new_status: Status,
        timestamp: DateTime<Utc>,
    },

    // transaction events
    TransactionCreated {
        note_id: NoteId,
        transaction_id: TransactionId,
        transaction_type: TransactionType,
        amount: Money,
        date: NaiveDate,
        timestamp: DateTime<Utc>,
    },
    TransactionApplied {
        note_id: NoteId,
        transaction_id: TransactionId,
        transaction_type: TransactionType,
        amount: Money,
        date: NaiveDate,
        timestamp: DateTime<Utc>,
    },
    TransactionCanceled {
        note_id: NoteId,
        transaction_id: TransactionId,
        previous_status: Status,
        timestamp: DateTime<Utc>,
    },
    TransactionAmended {
        note_id: NoteId,
        transaction_id: TransactionId,
        old_amount: Money,
        new_amount: Money,
        timestamp: DateTime<Utc>,
    },

    // period close
    MonthlyCutCompleted {
        note_id: NoteId,
        closing_date: NaiveDate,
        interests_applied: usize,
        transactions_applied: usize,
        timestamp: DateTime<Utc>,
    },
}

/// event store for collecting events during operations
#[derive(Debug, Default)]
pub struct EventStore {
    events: Vec<Event>,
}

impl EventStore {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
