use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

use crate::decimal::{Money, Rate};
use crate::types::{NoteStatus, Status};

/// broad classification used by callers to decide how to surface an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// bad input, render as a field error
    Validation,
    /// mutation rejected to protect settled state
    StateIntegrity,
    /// missing reference data or malformed configuration, abort
    Fatal,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum NoteError {
    // validation
    #[error("insufficient balance: available {available}, requested {requested}")]
    InsufficientBalance {
        available: Money,
        requested: Money,
    },

    #[error("insufficient pending interest: available {available}, requested {requested}")]
    InsufficientInterest {
        available: Money,
        requested: Money,
    },

    #[error("{field} exceeds 100%: {total}")]
    PercentageExceeded {
        field: String,
        total: Rate,
    },

    #[error("{field} must be numeric, got {value:?}")]
    NotNumeric {
        field: String,
        value: String,
    },

    #[error("invalid amount for {field}: {amount}")]
    InvalidAmount {
        field: String,
        amount: Money,
    },

    #[error("invalid date for refinance: {date} is not a cut date")]
    InvalidRefinanceDate {
        date: NaiveDate,
    },

    #[error("invalid date {date}: {message}")]
    InvalidDate {
        date: NaiveDate,
        message: String,
    },

    #[error("invalid value for {field}: {message}")]
    InvalidField {
        field: String,
        message: String,
    },

    #[error("unknown configuration key: {key}")]
    UnknownConfigurationKey {
        key: String,
    },

    // state integrity
    #[error("transaction {id} is not the most recent one for this note")]
    NotMostRecentTransaction {
        id: Uuid,
    },

    #[error("transaction {id} was generated by the schedule and cannot be modified")]
    SystemGeneratedTransaction {
        id: Uuid,
    },

    #[error("{date} falls within a completed monthly cut closing on {closing_date}")]
    ClosedPeriod {
        date: NaiveDate,
        closing_date: NaiveDate,
    },

    #[error("note is locked: current status is {status:?}")]
    NoteLocked {
        status: NoteStatus,
    },

    #[error("interest for {start_date}..{end_date} is frozen")]
    FrozenInterest {
        start_date: NaiveDate,
        end_date: NaiveDate,
    },

    #[error("transaction {id} is frozen: current status is {status}")]
    FrozenTransaction {
        id: Uuid,
        status: Status,
    },

    #[error("invalid transition from {from} to {to}")]
    InvalidTransition {
        from: Status,
        to: Status,
    },

    #[error("transaction not found: {id}")]
    TransactionNotFound {
        id: Uuid,
    },

    #[error("interest not found for period ending {end_date}")]
    InterestNotFound {
        end_date: NaiveDate,
    },

    // fatal
    #[error("no published {label} rate on or before {date}")]
    MissingReferenceRate {
        label: String,
        date: NaiveDate,
    },

    #[error("no tax percentage for year {year} and no override")]
    MissingTaxRate {
        year: i32,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        message: String,
    },

    #[error("interval sequence does not terminate: {message}")]
    NonTerminatingSchedule {
        message: String,
    },

    #[error("schedule terminated by total withdrawal on {terminated_on}; transaction on {date} rejected")]
    ScheduleTerminated {
        terminated_on: NaiveDate,
        date: NaiveDate,
    },

    #[error("calculation error: {message}")]
    CalculationError {
        message: String,
    },
}

impl NoteError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            NoteError::InsufficientBalance { .. }
            | NoteError::InsufficientInterest { .. }
            | NoteError::PercentageExceeded { .. }
            | NoteError::NotNumeric { .. }
            | NoteError::InvalidAmount { .. }
            | NoteError::InvalidRefinanceDate { .. }
            | NoteError::InvalidDate { .. }
            | NoteError::InvalidField { .. }
            | NoteError::UnknownConfigurationKey { .. } => ErrorKind::Validation,

            NoteError::NotMostRecentTransaction { .. }
            | NoteError::SystemGeneratedTransaction { .. }
            | NoteError::ClosedPeriod { .. }
            | NoteError::NoteLocked { .. }
            | NoteError::FrozenInterest { .. }
            | NoteError::FrozenTransaction { .. }
            | NoteError::InvalidTransition { .. }
            | NoteError::TransactionNotFound { .. }
            | NoteError::InterestNotFound { .. } => ErrorKind::StateIntegrity,

            NoteError::MissingReferenceRate { .. }
            | NoteError::MissingTaxRate { .. }
            | NoteError::InvalidConfiguration { .. }
            | NoteError::NonTerminatingSchedule { .. }
            | NoteError::ScheduleTerminated { .. }
            | NoteError::CalculationError { .. } => ErrorKind::Fatal,
        }
    }

    /// offending input for validation errors
    pub fn field(&self) -> Option<&str> {
        match self {
            NoteError::InsufficientBalance { .. } | NoteError::InsufficientInterest { .. } => {
                Some("amount")
            }
            NoteError::InvalidRefinanceDate { .. } | NoteError::InvalidDate { .. } => Some("date"),
            NoteError::PercentageExceeded { field, .. }
            | NoteError::NotNumeric { field, .. }
            | NoteError::InvalidAmount { field, .. }
            | NoteError::InvalidField { field, .. } => Some(field),
            NoteError::UnknownConfigurationKey { key } => Some(key),
            _ => None,
        }
    }

    pub fn is_recoverable(&self) -> bool {
        self.kind() != ErrorKind::Fatal
    }
}

pub type Result<T> = std::result::Result<T, NoteError>;
