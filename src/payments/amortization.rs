use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::errors::{NoteError, Result};
use crate::types::NoteType;

/// how principal is returned over the life of a note
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AmortizationMethod {
    /// equal principal per scheduled cut
    DecliningPrincipal,
    /// equal installment (principal + interest) per scheduled cut
    EqualInstallments,
    /// principal returned at maturity
    Bullet,
}

impl From<NoteType> for AmortizationMethod {
    fn from(type_of: NoteType) -> Self {
        match type_of {
            NoteType::Amortization => AmortizationMethod::DecliningPrincipal,
            NoteType::FrenchAmortization => AmortizationMethod::EqualInstallments,
            NoteType::Simple | NoteType::Capitalization => AmortizationMethod::Bullet,
        }
    }
}

/// per-cut capital calculator
#[derive(Debug, Clone, Copy)]
pub struct AmortizationCalculator {
    method: AmortizationMethod,
}

impl AmortizationCalculator {
    pub fn new(method: AmortizationMethod) -> Self {
        Self { method }
    }

    pub fn for_note_type(type_of: NoteType) -> Self {
        Self::new(type_of.into())
    }

    pub fn method(&self) -> AmortizationMethod {
        self.method
    }

    /// installment for the remaining cuts
    ///
    /// `factors` holds the per-unit gross term of each remaining scheduled cut,
    /// only read by the equal-installment method
    pub fn installment(&self, balance: Money, factors: &[Decimal]) -> Result<Option<Money>> {
        if factors.is_empty() {
            return Ok(None);
        }
        match self.method {
            AmortizationMethod::Bullet => Ok(None),
            AmortizationMethod::DecliningPrincipal => Ok(Some(
                balance / Decimal::from(factors.len() as u64),
            )),
            AmortizationMethod::EqualInstallments => french_installment(balance, factors).map(Some),
        }
    }

    /// capital returned at one scheduled cut
    ///
    /// `term` is the interest part of the installment already owed for the row;
    /// the last cut always takes whatever balance remains
    pub fn capital_for(&self, installment: Option<Money>, balance: Money, term: Money, last: bool) -> Money {
        if last {
            return balance;
        }
        let capital = match (self.method, installment) {
            (AmortizationMethod::DecliningPrincipal, Some(installment)) => installment,
            (AmortizationMethod::EqualInstallments, Some(installment)) => installment - term,
            _ => Money::ZERO,
        };
        capital.max(Money::ZERO).min(balance)
    }
}

/// constant installment that pays `balance` down to zero over the given rows
///
/// with g_k the gross per unit of balance for row k:
/// A = B * prod(1 + g_k) / sum_j prod_{k > j}(1 + g_k)
pub fn french_installment(balance: Money, factors: &[Decimal]) -> Result<Money> {
    if factors.is_empty() {
        return Err(NoteError::CalculationError {
            message: "no remaining cuts to amortize".to_string(),
        });
    }

    let mut tail = Decimal::ONE;
    let mut denominator = Decimal::ZERO;
    for factor in factors.iter().rev() {
        denominator += tail;
        tail = tail
            .checked_mul(Decimal::ONE + *factor)
            .ok_or_else(|| NoteError::CalculationError {
                message: "installment growth factor overflowed".to_string(),
            })?;
    }

    Ok(Money::from_decimal(balance.as_decimal() * tail / denominator))
}
