use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::decimal::Rate;
use crate::errors::{NoteError, Result};
use crate::note::Note;
use crate::reference::ReferenceRateSource;
use crate::types::PaymentType;

/// annual rate in force for one interest row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedRate {
    pub annual: Rate,
    /// published reference value before clamping and spread
    pub variable_rate_value: Option<Rate>,
    pub variable_rate_date: Option<NaiveDate>,
    /// per payment type split of `annual` for mixed-rate notes
    pub components: Vec<(PaymentType, Rate)>,
}

/// resolve the annual rate for a row fixed on `fixing_date`
pub fn resolve_rate(
    note: &Note,
    fixing_date: NaiveDate,
    rates: &dyn ReferenceRateSource,
) -> Result<ResolvedRate> {
    if let Some(floating) = &note.floating_rate {
        let fixing = rates.rate_as_of(&floating.label, fixing_date).ok_or_else(|| {
            NoteError::MissingReferenceRate {
                label: floating.label.clone(),
                date: fixing_date,
            }
        })?;

        let mut reference = fixing.value;
        if let Some(floor) = floating.floor {
            reference = reference.max(floor);
        }
        if let Some(ceiling) = floating.ceiling {
            reference = reference.min(ceiling);
        }

        return Ok(ResolvedRate {
            annual: reference + floating.additional_rate,
            variable_rate_value: Some(fixing.value),
            variable_rate_date: Some(fixing_date),
            components: Vec::new(),
        });
    }

    let components: Vec<(PaymentType, Rate)> = note
        .mixed_rates
        .iter()
        .map(|m| (m.payment_type.clone(), m.percentage))
        .collect();
    let annual = match note.interest_rate {
        Some(rate) => rate,
        None if !components.is_empty() => components.iter().map(|(_, r)| *r).sum(),
        None => {
            return Err(NoteError::InvalidField {
                field: "interest_rate".to_string(),
                message: "required for fixed-rate notes".to_string(),
            })
        }
    };

    Ok(ResolvedRate {
        annual,
        variable_rate_value: None,
        variable_rate_date: None,
        components,
    })
}

/// fixing date for a row: the note's variable_rate_date first, then each row start
pub fn fixing_date(note: &Note, row_start: NaiveDate) -> NaiveDate {
    match &note.floating_rate {
        Some(floating) if row_start <= note.start_date => floating.variable_rate_date,
        _ => row_start,
    }
}
