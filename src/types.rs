use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// unique identifier for a note
pub type NoteId = Uuid;

/// unique identifier for a transaction
pub type TransactionId = Uuid;

/// note variant, drives how capital is scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteType {
    /// interest paid per cut, principal returned at maturity
    Simple,
    /// equal principal per cut
    Amortization,
    /// equal installment per cut
    FrenchAmortization,
    /// interest folded into principal
    Capitalization,
}

impl NoteType {
    /// capital is paid down on every scheduled cut
    pub fn is_amortizing(&self) -> bool {
        matches!(self, NoteType::Amortization | NoteType::FrenchAmortization)
    }
}

/// note lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteStatus {
    /// terms may still be amended
    Draft,
    /// schedule generated, transactions accepted
    Active,
    /// matured, renewed or fully withdrawn
    Settled,
}

/// settlement status shared by transactions and interest rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Pending,
    Applied,
    Canceled,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Status::Pending => "pending",
            Status::Applied => "applied",
            Status::Canceled => "canceled",
        };
        f.write_str(label)
    }
}

/// transaction kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Deposit,
    Withdrawal,
    TotalWithdrawal,
    InterestWithdrawal,
    Capitalization,
    CapitalPayment,
    InterestDeposit,
}

impl TransactionType {
    /// created by the schedule engine rather than a user
    pub fn is_system_generated(&self) -> bool {
        matches!(
            self,
            TransactionType::Capitalization
                | TransactionType::CapitalPayment
                | TransactionType::InterestDeposit
        )
    }

    /// moves principal when applied
    pub fn moves_principal(&self) -> bool {
        matches!(
            self,
            TransactionType::Deposit | TransactionType::Withdrawal | TransactionType::TotalWithdrawal
        )
    }

    /// signed effect on principal for a given amount
    pub fn principal_effect(&self, amount: crate::decimal::Money) -> crate::decimal::Money {
        match self {
            TransactionType::Deposit | TransactionType::Capitalization => amount,
            TransactionType::Withdrawal
            | TransactionType::TotalWithdrawal
            | TransactionType::CapitalPayment => -amount,
            TransactionType::InterestWithdrawal | TransactionType::InterestDeposit => {
                crate::decimal::Money::ZERO
            }
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TransactionType::Deposit => "deposit",
            TransactionType::Withdrawal => "withdrawal",
            TransactionType::TotalWithdrawal => "total_withdrawal",
            TransactionType::InterestWithdrawal => "interest_withdrawal",
            TransactionType::Capitalization => "capitalization",
            TransactionType::CapitalPayment => "capital_payment",
            TransactionType::InterestDeposit => "interest_deposit",
        };
        f.write_str(label)
    }
}

/// channel through which interest is paid
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    ElectronicTransfer,
    Cash,
    Check,
    Reinvestment,
    Other(String),
}

impl Default for PaymentType {
    fn default() -> Self {
        PaymentType::ElectronicTransfer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::Money;

    #[test]
    fn test_system_generated_types() {
        assert!(TransactionType::Capitalization.is_system_generated());
        assert!(TransactionType::InterestDeposit.is_system_generated());
        assert!(!TransactionType::Deposit.is_system_generated());
        assert!(!TransactionType::TotalWithdrawal.is_system_generated());
    }

    #[test]
    fn test_principal_effect() {
        let amount = Money::from_major(500);
        assert_eq!(TransactionType::Deposit.principal_effect(amount), amount);
        assert_eq!(TransactionType::Withdrawal.principal_effect(amount), -amount);
        assert_eq!(TransactionType::InterestWithdrawal.principal_effect(amount), Money::ZERO);
    }

    #[test]
    fn test_serde_labels() {
        let json = serde_json::to_string(&TransactionType::TotalWithdrawal).unwrap();
        assert_eq!(json, "\"total_withdrawal\"");
        let parsed: NoteType = serde_json::from_str("\"french_amortization\"").unwrap();
        assert_eq!(parsed, NoteType::FrenchAmortization);
    }
}
