use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::NoteConfiguration;
use crate::decimal::{Money, Rate};
use crate::errors::{NoteError, Result};
use crate::types::{NoteId, NoteType, PaymentType};

/// floating-rate terms resolved against a published reference series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloatingRate {
    /// series label, e.g. "tiie" or "cetes"
    pub label: String,
    /// spread added on top of the clamped reference rate
    pub additional_rate: Rate,
    pub floor: Option<Rate>,
    pub ceiling: Option<Rate>,
    /// fixing date for the first interval
    pub variable_rate_date: NaiveDate,
}

/// share of the annual rate paid through one payment type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixedRate {
    pub payment_type: PaymentType,
    pub percentage: Rate,
}

/// share of every interest payment routed to one payment type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixedPayment {
    pub payment_type: PaymentType,
    pub percentage: Rate,
}

/// promissory note terms
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub type_of: NoteType,
    pub initial_amount: Money,
    pub interest_rate: Option<Rate>,
    pub tax_percentage: Option<Rate>,
    pub iva_percentage: Option<Rate>,
    pub iva_retention_percentage: Option<Rate>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub cut_day: u32,
    pub monthly_periodicity: Option<u32>,
    pub capitalization_periodicity: Option<u32>,
    pub currency: String,
    pub configuration: NoteConfiguration,
    /// read from the issuing society; financial entities carry no IVA
    pub financial_entity: bool,
    pub floating_rate: Option<FloatingRate>,
    pub mixed_rates: Vec<MixedRate>,
    pub mixed_payments: Vec<MixedPayment>,
    pub promoter_commission: Option<Rate>,
    pub parent_id: Option<NoteId>,
}

impl Note {
    pub fn builder() -> NoteBuilder {
        NoteBuilder::new()
    }

    /// months between scheduled cuts
    ///
    /// a capitalization note paying out less often than it capitalizes cuts on
    /// the capitalization periodicity
    pub fn step_months(&self) -> Result<u32> {
        let months = match (self.monthly_periodicity, self.type_of) {
            (Some(0), _) => {
                return Err(NoteError::InvalidField {
                    field: "monthly_periodicity".to_string(),
                    message: "must be positive".to_string(),
                })
            }
            (Some(months), _) => months,
            (None, NoteType::Capitalization) => 1,
            (None, _) if self.configuration.n_days.is_some() => 1,
            (None, _) => {
                return Err(NoteError::InvalidConfiguration {
                    message: format!("{:?} notes require monthly_periodicity", self.type_of),
                })
            }
        };
        match self.capitalization_months() {
            Some(capitalization) if capitalization < months => Ok(capitalization),
            _ => Ok(months),
        }
    }

    /// number of scheduled cuts between capitalizations, `None` when interest is never capitalized
    pub fn capitalization_every(&self) -> Result<Option<u32>> {
        if self.type_of != NoteType::Capitalization {
            return Ok(None);
        }
        let months = match self.capitalization_periodicity {
            None | Some(0) => return Ok(None),
            Some(months) => months,
        };
        let step = self.step_months()?;
        if months % step != 0 {
            return Err(NoteError::InvalidConfiguration {
                message: format!(
                    "capitalization_periodicity {} is not a multiple of the {}-month cut step",
                    months, step
                ),
            });
        }
        Ok(Some(months / step))
    }

    /// number of scheduled cuts between interest payouts of a capitalization note
    ///
    /// `None` unless `monthly_periodicity` is longer than the capitalization periodicity
    pub fn payout_every(&self) -> Result<Option<u32>> {
        let (capitalization, months) = match (self.capitalization_months(), self.monthly_periodicity) {
            (Some(capitalization), Some(months)) if months > capitalization => (capitalization, months),
            _ => return Ok(None),
        };
        if months % capitalization != 0 {
            return Err(NoteError::InvalidConfiguration {
                message: format!(
                    "monthly_periodicity {} is not a multiple of the {}-month capitalization periodicity",
                    months, capitalization
                ),
            });
        }
        Ok(Some(months / capitalization))
    }

    fn capitalization_months(&self) -> Option<u32> {
        match (self.type_of, self.capitalization_periodicity) {
            (NoteType::Capitalization, Some(months)) if months > 0 => Some(months),
            _ => None,
        }
    }

    /// iva percentage, note value over configuration
    pub fn effective_iva_percentage(&self) -> Rate {
        self.iva_percentage
            .or(self.configuration.iva_percentage)
            .unwrap_or(Rate::ZERO)
    }

    pub fn effective_iva_retention_percentage(&self) -> Rate {
        self.iva_retention_percentage
            .or(self.configuration.iva_retention_percentage)
            .unwrap_or(Rate::ZERO)
    }

    /// iva is charged on interest
    pub fn applies_iva(&self) -> bool {
        !self.financial_entity && !self.effective_iva_percentage().is_zero()
    }

    /// true when the rate is split across payment types
    pub fn has_mixed_rates(&self) -> bool {
        !self.mixed_rates.is_empty()
    }

    pub fn validate(&self) -> Result<()> {
        if !self.initial_amount.is_positive() {
            return Err(NoteError::InvalidAmount {
                field: "initial_amount".to_string(),
                amount: self.initial_amount,
            });
        }
        if self.start_date >= self.end_date {
            return Err(NoteError::InvalidDate {
                date: self.end_date,
                message: format!("end_date must be after start_date {}", self.start_date),
            });
        }
        if !(1..=31).contains(&self.cut_day) {
            return Err(NoteError::InvalidField {
                field: "cut_day".to_string(),
                message: format!("expected 1..=31, got {}", self.cut_day),
            });
        }

        self.configuration.validate()?;
        self.step_months()?;
        self.capitalization_every()?;
        self.payout_every()?;
        self.validate_rates()?;

        for (field, rate) in [
            ("tax_percentage", self.tax_percentage),
            ("iva_percentage", self.iva_percentage),
            ("iva_retention_percentage", self.iva_retention_percentage),
            ("promoter_commission", self.promoter_commission),
        ] {
            if let Some(rate) = rate {
                check_percentage(field, rate)?;
            }
        }

        let payment_total: Rate = self.mixed_payments.iter().map(|p| p.percentage).sum();
        check_percentage("mixed_payments", payment_total)?;

        Ok(())
    }

    fn validate_rates(&self) -> Result<()> {
        if let Some(rate) = self.interest_rate {
            check_percentage("interest_rate", rate)?;
        }

        if self.has_mixed_rates() {
            for mixed in &self.mixed_rates {
                check_percentage("mixed_rates", mixed.percentage)?;
            }
            let total: Rate = self.mixed_rates.iter().map(|m| m.percentage).sum();
            check_percentage("mixed_rates", total)?;
            if let Some(rate) = self.interest_rate {
                if rate != total {
                    return Err(NoteError::InvalidField {
                        field: "mixed_rates".to_string(),
                        message: format!("rates sum to {} but interest_rate is {}", total, rate),
                    });
                }
            }
        }

        if let Some(floating) = &self.floating_rate {
            if let (Some(floor), Some(ceiling)) = (floating.floor, floating.ceiling) {
                if floor > ceiling {
                    return Err(NoteError::InvalidField {
                        field: "interest_rate_floor".to_string(),
                        message: format!("floor {} above ceiling {}", floor, ceiling),
                    });
                }
            }
        } else if self.interest_rate.is_none() && !self.has_mixed_rates() {
            return Err(NoteError::InvalidField {
                field: "interest_rate".to_string(),
                message: "required for fixed-rate notes".to_string(),
            });
        }

        Ok(())
    }
}

fn check_percentage(field: &str, rate: Rate) -> Result<()> {
    if rate > Rate::ONE {
        return Err(NoteError::PercentageExceeded {
            field: field.to_string(),
            total: rate,
        });
    }
    if rate < Rate::ZERO {
        return Err(NoteError::InvalidField {
            field: field.to_string(),
            message: "must not be negative".to_string(),
        });
    }
    Ok(())
}

/// builder for notes
pub struct NoteBuilder {
    type_of: NoteType,
    initial_amount: Option<Money>,
    raw_initial_amount: Option<String>,
    interest_rate: Option<Rate>,
    raw_interest_rate: Option<String>,
    tax_percentage: Option<Rate>,
    iva_percentage: Option<Rate>,
    iva_retention_percentage: Option<Rate>,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    cut_day: Option<u32>,
    monthly_periodicity: Option<u32>,
    capitalization_periodicity: Option<u32>,
    currency: String,
    configuration: NoteConfiguration,
    financial_entity: bool,
    floating_rate: Option<FloatingRate>,
    mixed_rates: Vec<MixedRate>,
    mixed_payments: Vec<MixedPayment>,
    promoter_commission: Option<Rate>,
    parent_id: Option<NoteId>,
}

impl NoteBuilder {
    pub fn new() -> Self {
        Self {
            type_of: NoteType::Simple,
            initial_amount: None,
            raw_initial_amount: None,
            interest_rate: None,
            raw_interest_rate: None,
            tax_percentage: None,
            iva_percentage: None,
            iva_retention_percentage: None,
            start_date: None,
            end_date: None,
            cut_day: None,
            monthly_periodicity: None,
            capitalization_periodicity: None,
            currency: "MXN".to_string(),
            configuration: NoteConfiguration::default(),
            financial_entity: true,
            floating_rate: None,
            mixed_rates: Vec::new(),
            mixed_payments: Vec::new(),
            promoter_commission: None,
            parent_id: None,
        }
    }

    pub fn type_of(mut self, type_of: NoteType) -> Self {
        self.type_of = type_of;
        self
    }

    pub fn initial_amount(mut self, amount: Money) -> Self {
        self.initial_amount = Some(amount);
        self
    }

    /// amount as typed by a user; parsed at build time
    pub fn initial_amount_str(mut self, raw: &str) -> Self {
        self.raw_initial_amount = Some(raw.to_string());
        self
    }

    pub fn interest_rate(mut self, rate: Rate) -> Self {
        self.interest_rate = Some(rate);
        self
    }

    /// annual percentage as typed by a user; parsed at build time
    pub fn interest_rate_str(mut self, raw: &str) -> Self {
        self.raw_interest_rate = Some(raw.to_string());
        self
    }

    pub fn tax_percentage(mut self, rate: Rate) -> Self {
        self.tax_percentage = Some(rate);
        self
    }

    pub fn iva_percentage(mut self, rate: Rate) -> Self {
        self.iva_percentage = Some(rate);
        self
    }

    pub fn iva_retention_percentage(mut self, rate: Rate) -> Self {
        self.iva_retention_percentage = Some(rate);
        self
    }

    pub fn dates(mut self, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        self.start_date = Some(start_date);
        self.end_date = Some(end_date);
        self
    }

    pub fn cut_day(mut self, day: u32) -> Self {
        self.cut_day = Some(day);
        self
    }

    pub fn monthly_periodicity(mut self, months: u32) -> Self {
        self.monthly_periodicity = Some(months);
        self
    }

    pub fn capitalization_periodicity(mut self, months: u32) -> Self {
        self.capitalization_periodicity = Some(months);
        self
    }

    pub fn currency(mut self, currency: &str) -> Self {
        self.currency = currency.to_string();
        self
    }

    pub fn configuration(mut self, configuration: NoteConfiguration) -> Self {
        self.configuration = configuration;
        self
    }

    pub fn financial_entity(mut self, financial_entity: bool) -> Self {
        self.financial_entity = financial_entity;
        self
    }

    pub fn floating_rate(mut self, floating: FloatingRate) -> Self {
        self.floating_rate = Some(floating);
        self
    }

    pub fn mixed_rate(mut self, payment_type: PaymentType, percentage: Rate) -> Self {
        self.mixed_rates.push(MixedRate {
            payment_type,
            percentage,
        });
        self
    }

    pub fn mixed_payment(mut self, payment_type: PaymentType, percentage: Rate) -> Self {
        self.mixed_payments.push(MixedPayment {
            payment_type,
            percentage,
        });
        self
    }

    pub fn promoter_commission(mut self, rate: Rate) -> Self {
        self.promoter_commission = Some(rate);
        self
    }

    pub fn parent(mut self, parent_id: NoteId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn build(self) -> Result<Note> {
        let initial_amount = match (self.initial_amount, self.raw_initial_amount) {
            (Some(amount), _) => amount,
            (None, Some(raw)) => Money::from_str_exact(&raw).map_err(|_| NoteError::NotNumeric {
                field: "initial_amount".to_string(),
                value: raw.clone(),
            })?,
            (None, None) => {
                return Err(NoteError::InvalidField {
                    field: "initial_amount".to_string(),
                    message: "required".to_string(),
                })
            }
        };

        let interest_rate = match (self.interest_rate, self.raw_interest_rate) {
            (Some(rate), _) => Some(rate),
            (None, Some(raw)) => Some(Rate::from_percent_str(&raw).map_err(|_| NoteError::NotNumeric {
                field: "interest_rate".to_string(),
                value: raw.clone(),
            })?),
            (None, None) => None,
        };

        let (start_date, end_date) = match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => (start, end),
            _ => {
                return Err(NoteError::InvalidField {
                    field: "start_date".to_string(),
                    message: "start_date and end_date are required".to_string(),
                })
            }
        };

        let note = Note {
            id: Uuid::new_v4(),
            type_of: self.type_of,
            initial_amount,
            interest_rate,
            tax_percentage: self.tax_percentage,
            iva_percentage: self.iva_percentage,
            iva_retention_percentage: self.iva_retention_percentage,
            start_date,
            end_date,
            cut_day: self.cut_day.unwrap_or_else(|| start_date.day()),
            monthly_periodicity: self.monthly_periodicity,
            capitalization_periodicity: self.capitalization_periodicity,
            currency: self.currency,
            configuration: self.configuration,
            financial_entity: self.financial_entity,
            floating_rate: self.floating_rate,
            mixed_rates: self.mixed_rates,
            mixed_payments: self.mixed_payments,
            promoter_commission: self.promoter_commission,
            parent_id: self.parent_id,
        };

        note.validate()?;
        Ok(note)
    }
}

impl Default for NoteBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PaymentType;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn base() -> NoteBuilder {
        Note::builder()
            .initial_amount(Money::from_major(1_000_000))
            .interest_rate(Rate::from_percentage(12))
            .dates(date(2020, 1, 1), date(2021, 1, 1))
            .cut_day(31)
            .monthly_periodicity(1)
    }

    #[test]
    fn test_build_simple_note() {
        let note = base().tax_percentage(Rate::from_percent_str("1.04").unwrap()).build().unwrap();
        assert_eq!(note.type_of, NoteType::Simple);
        assert_eq!(note.step_months().unwrap(), 1);
        assert!(!note.applies_iva());
    }

    #[test]
    fn test_zero_initial_amount_rejected() {
        let err = base().initial_amount(Money::ZERO).build().unwrap_err();
        assert_eq!(err.field(), Some("initial_amount"));
    }

    #[test]
    fn test_non_numeric_amount_rejected() {
        let err = Note::builder()
            .initial_amount_str("ten thousand")
            .interest_rate(Rate::from_percentage(12))
            .dates(date(2020, 1, 1), date(2021, 1, 1))
            .monthly_periodicity(1)
            .build()
            .unwrap_err();
        assert!(matches!(err, NoteError::NotNumeric { .. }));
        assert_eq!(err.field(), Some("initial_amount"));
    }

    #[test]
    fn test_dates_must_be_ordered() {
        let err = base().dates(date(2021, 1, 1), date(2021, 1, 1)).build().unwrap_err();
        assert!(matches!(err, NoteError::InvalidDate { .. }));
    }

    #[test]
    fn test_mixed_rates_must_match_interest_rate() {
        let note = base()
            .interest_rate(Rate::from_percentage(10))
            .mixed_rate(PaymentType::ElectronicTransfer, Rate::from_percentage(5))
            .mixed_rate(PaymentType::Cash, Rate::from_percentage(5))
            .build();
        assert!(note.is_ok());

        let err = base()
            .interest_rate(Rate::from_percentage(12))
            .mixed_rate(PaymentType::ElectronicTransfer, Rate::from_percentage(5))
            .mixed_rate(PaymentType::Cash, Rate::from_percentage(5))
            .build()
            .unwrap_err();
        assert_eq!(err.field(), Some("mixed_rates"));
    }

    #[test]
    fn test_payment_percentages_over_100_rejected() {
        let err = base()
            .mixed_payment(PaymentType::Cash, Rate::from_percentage(60))
            .mixed_payment(PaymentType::Check, Rate::from_percentage(50))
            .build()
            .unwrap_err();
        assert!(matches!(err, NoteError::PercentageExceeded { .. }));
    }

    #[test]
    fn test_capitalization_periodicity_must_divide() {
        let err = base()
            .type_of(NoteType::Capitalization)
            .monthly_periodicity(2)
            .capitalization_periodicity(3)
            .build()
            .unwrap_err();
        assert!(matches!(err, NoteError::InvalidConfiguration { .. }));

        let note = base()
            .type_of(NoteType::Capitalization)
            .monthly_periodicity(1)
            .capitalization_periodicity(3)
            .build()
            .unwrap();
        assert_eq!(note.capitalization_every().unwrap(), Some(3));
        assert_eq!(note.payout_every().unwrap(), None);
    }

    #[test]
    fn test_capitalization_with_payments_cuts_on_capitalization_step() {
        let note = base()
            .type_of(NoteType::Capitalization)
            .monthly_periodicity(3)
            .capitalization_periodicity(1)
            .build()
            .unwrap();
        assert_eq!(note.step_months().unwrap(), 1);
        assert_eq!(note.capitalization_every().unwrap(), Some(1));
        assert_eq!(note.payout_every().unwrap(), Some(3));

        let err = base()
            .type_of(NoteType::Capitalization)
            .monthly_periodicity(3)
            .capitalization_periodicity(2)
            .build()
            .unwrap_err();
        assert!(matches!(err, NoteError::InvalidConfiguration { .. }));
    }

    #[test]
    fn test_periodicity_required_for_simple_notes() {
        let err = Note::builder()
            .initial_amount(Money::from_major(1_000))
            .interest_rate(Rate::from_percentage(12))
            .dates(date(2020, 1, 1), date(2021, 1, 1))
            .build()
            .unwrap_err();
        assert!(matches!(err, NoteError::InvalidConfiguration { .. }));
    }
}
