pub mod amortization;

use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::note::MixedPayment;
use crate::types::PaymentType;

pub use amortization::{french_installment, AmortizationCalculator, AmortizationMethod};

/// part of a row payment routed to one payment type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentShare {
    pub payment_type: PaymentType,
    pub amount: Money,
}

/// split a payment across the note's payment types
///
/// every configured type gets its percentage, the remainder goes to the
/// default type; an unsplit note yields an empty breakdown
pub fn split_payment(payment: Money, mixed: &[MixedPayment]) -> Vec<PaymentShare> {
    if mixed.is_empty() || payment.is_zero() {
        return Vec::new();
    }

    let mut remaining = payment;
    let mut shares: Vec<PaymentShare> = Vec::with_capacity(mixed.len() + 1);
    for entry in mixed {
        let amount = payment.apply(entry.percentage).min(remaining);
        remaining -= amount;
        push_share(&mut shares, entry.payment_type.clone(), amount);
    }
    if remaining.is_positive() {
        push_share(&mut shares, PaymentType::default(), remaining);
    }
    shares
}

fn push_share(shares: &mut Vec<PaymentShare>, payment_type: PaymentType, amount: Money) {
    match shares.iter_mut().find(|s| s.payment_type == payment_type) {
        Some(existing) => existing.amount += amount,
        None => shares.push(PaymentShare { payment_type, amount }),
    }
}
