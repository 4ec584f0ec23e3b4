use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Money;
use crate::errors::{NoteError, Result};
use crate::types::{NoteId, Status, TransactionId, TransactionType};

/// money movement against a note
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub note_id: NoteId,
    pub transaction_type: TransactionType,
    pub amount: Money,
    pub date: NaiveDate,
    pub status: Status,
    /// position in the note's application order, set when applied
    pub applied_sequence: Option<u64>,
}

impl Transaction {
    /// new user transaction awaiting application
    pub fn new(
        note_id: NoteId,
        transaction_type: TransactionType,
        amount: Money,
        date: NaiveDate,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            note_id,
            transaction_type,
            amount,
            date,
            status: Status::Pending,
            applied_sequence: None,
        }
    }

    pub fn is_system_generated(&self) -> bool {
        self.transaction_type.is_system_generated()
    }

    pub fn is_applied(&self) -> bool {
        self.status == Status::Applied
    }

    /// counts toward balances and splits the interval grid
    pub fn drives_schedule(&self) -> bool {
        self.is_applied() && !self.is_system_generated()
    }

    /// move to `to` if the lifecycle allows it
    ///
    /// pending -> applied, pending -> canceled and applied -> canceled are the only
    /// legal moves; recency and closing checks belong to the ledger
    pub fn transition(&mut self, to: Status) -> Result<()> {
        match (self.status, to) {
            (Status::Pending, Status::Applied)
            | (Status::Pending, Status::Canceled)
            | (Status::Applied, Status::Canceled) => {
                self.status = to;
                if to == Status::Canceled {
                    self.applied_sequence = None;
                }
                Ok(())
            }
            (from, to) => Err(NoteError::InvalidTransition { from, to }),
        }
    }

    /// record an amount change while still pending
    pub fn amend_amount(&mut self, amount: Money) -> Result<()> {
        if self.status != Status::Pending {
            return Err(NoteError::FrozenTransaction {
                id: self.id,
                status: self.status,
            });
        }
        if !amount.is_positive() {
            return Err(NoteError::InvalidAmount {
                field: "amount".to_string(),
                amount,
            });
        }
        self.amount = amount;
        Ok(())
    }
}
