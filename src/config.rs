use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::str::FromStr;

use crate::decimal::Rate;
use crate::errors::{NoteError, Result};

/// loosely-typed attribute bag as stored by organizations and notes
pub type Settings = Map<String, Value>;

/// how a computed cut date is shifted when it lands on a non-business day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipDay {
    Natural,
    PreWeekend,
    PostWeekend,
    PostHoliday,
    PostWeekendAndHoliday,
}

impl FromStr for SkipDay {
    type Err = NoteError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "natural" => Ok(SkipDay::Natural),
            "pre_weekend" => Ok(SkipDay::PreWeekend),
            "post_weekend" => Ok(SkipDay::PostWeekend),
            "post_holiday" => Ok(SkipDay::PostHoliday),
            "post_weekend_and_holiday" => Ok(SkipDay::PostWeekendAndHoliday),
            other => Err(invalid("interval_skip_day", other)),
        }
    }
}

/// elapsed-day convention
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DayCountAlgorithm {
    /// actual calendar days
    #[serde(rename = "natural")]
    Natural,
    /// every month counts 30 days
    #[serde(rename = "30 days")]
    ThirtyDays,
}

impl FromStr for DayCountAlgorithm {
    type Err = NoteError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "natural" => Ok(DayCountAlgorithm::Natural),
            "30 days" | "thirty_days" => Ok(DayCountAlgorithm::ThirtyDays),
            other => Err(invalid("day_count_algorithm", other)),
        }
    }
}

/// whether the note rate is quoted before or after tax
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxConfiguration {
    /// rate yields gross, tax is deducted from it
    InterestPreTax,
    /// rate yields the net amount, gross is grossed up by tax
    InterestPostTax,
}

impl FromStr for TaxConfiguration {
    type Err = NoteError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "interest_pre_tax" => Ok(TaxConfiguration::InterestPreTax),
            "interest_post_tax" => Ok(TaxConfiguration::InterestPostTax),
            other => Err(invalid("tax_configuration", other)),
        }
    }
}

/// per-note calculation policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteConfiguration {
    pub interval_skip_day: SkipDay,
    pub day_count_algorithm: DayCountAlgorithm,
    pub fiscal_year_days: u32,
    pub start_date_excluded: bool,
    pub end_date_excluded: bool,
    pub event_date_included: bool,
    pub fixed_retention: bool,
    pub retention_on_payment: bool,
    pub payment_on_subscription_date: bool,
    pub pay_on_expiration: bool,
    pub add_interests_from_parent: bool,
    pub n_days: Option<u32>,
    pub tax_configuration: TaxConfiguration,
    pub iva_on_amortization_term: bool,
    pub iva_percentage: Option<Rate>,
    pub iva_retention_percentage: Option<Rate>,
    pub single_commission_payment: bool,
}

impl Default for NoteConfiguration {
    fn default() -> Self {
        Self {
            interval_skip_day: SkipDay::Natural,
            day_count_algorithm: DayCountAlgorithm::Natural,
            fiscal_year_days: 360,
            start_date_excluded: true,
            end_date_excluded: false,
            event_date_included: false,
            fixed_retention: true,
            retention_on_payment: false,
            payment_on_subscription_date: false,
            pay_on_expiration: false,
            add_interests_from_parent: false,
            n_days: None,
            tax_configuration: TaxConfiguration::InterestPreTax,
            iva_on_amortization_term: false,
            iva_percentage: None,
            iva_retention_percentage: None,
            single_commission_payment: false,
        }
    }
}

impl NoteConfiguration {
    /// merge organization defaults with note overrides into a validated configuration
    ///
    /// keys in `overrides` win; `null` resets a key to its built-in default
    pub fn resolve(organization: &Settings, overrides: &Settings) -> Result<Self> {
        let mut merged = organization.clone();
        for (key, value) in overrides {
            merged.insert(key.clone(), value.clone());
        }
        Self::from_settings(&merged)
    }

    /// build from a single attribute bag
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let mut config = Self::default();

        for (key, value) in settings {
            if value.is_null() {
                continue;
            }
            match key.as_str() {
                "interval_skip_day" => config.interval_skip_day = text(key, value)?.parse()?,
                "day_count_algorithm" => config.day_count_algorithm = text(key, value)?.parse()?,
                "fiscal_year_days" => config.fiscal_year_days = integer(key, value)?,
                "start_date_excluded" => config.start_date_excluded = flag(key, value)?,
                "end_date_excluded" => config.end_date_excluded = flag(key, value)?,
                "start_date_included" => config.start_date_excluded = !flag(key, value)?,
                "end_date_included" => config.end_date_excluded = !flag(key, value)?,
                "event_date_included" => config.event_date_included = flag(key, value)?,
                "fixed_retention" => config.fixed_retention = flag(key, value)?,
                "retention_on_payment" => config.retention_on_payment = flag(key, value)?,
                "payment_on_subscription_date" => {
                    config.payment_on_subscription_date = flag(key, value)?
                }
                "pay_on_expiration" => config.pay_on_expiration = flag(key, value)?,
                "add_interests_from_parent" => config.add_interests_from_parent = flag(key, value)?,
                "n_days" => config.n_days = Some(integer(key, value)?),
                "tax_configuration" => config.tax_configuration = text(key, value)?.parse()?,
                "iva_on_amortization_term" => config.iva_on_amortization_term = flag(key, value)?,
                "iva_percentage" => config.iva_percentage = Some(percentage(key, value)?),
                "iva_retention_percentage" => {
                    config.iva_retention_percentage = Some(percentage(key, value)?)
                }
                "single_commission_payment" => config.single_commission_payment = flag(key, value)?,
                _ => return Err(NoteError::UnknownConfigurationKey { key: key.clone() }),
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// reject values and combinations the engine cannot schedule
    pub fn validate(&self) -> Result<()> {
        if self.fiscal_year_days != 360 && self.fiscal_year_days != 365 {
            return Err(NoteError::InvalidField {
                field: "fiscal_year_days".to_string(),
                message: format!("expected 360 or 365, got {}", self.fiscal_year_days),
            });
        }

        match self.n_days {
            Some(0) => {
                return Err(NoteError::NonTerminatingSchedule {
                    message: "n_days must be positive".to_string(),
                })
            }
            Some(n) if n < 3 && self.interval_skip_day == SkipDay::PreWeekend => {
                return Err(NoteError::NonTerminatingSchedule {
                    message: format!("pre_weekend shifting cannot advance a {}-day step", n),
                })
            }
            _ => {}
        }

        for (field, rate) in [
            ("iva_percentage", self.iva_percentage),
            ("iva_retention_percentage", self.iva_retention_percentage),
        ] {
            if let Some(rate) = rate {
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
            }
        }

        Ok(())
    }
}

fn invalid(field: &str, value: &str) -> NoteError {
    NoteError::InvalidField {
        field: field.to_string(),
        message: format!("unrecognized option {:?}", value),
    }
}

fn text<'a>(key: &str, value: &'a Value) -> Result<&'a str> {
    value.as_str().ok_or_else(|| NoteError::InvalidField {
        field: key.to_string(),
        message: format!("expected a string, got {}", value),
    })
}

fn flag(key: &str, value: &Value) -> Result<bool> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::String(s) if s == "true" || s == "1" => Ok(true),
        Value::String(s) if s == "false" || s == "0" => Ok(false),
        other => Err(NoteError::InvalidField {
            field: key.to_string(),
            message: format!("expected a boolean, got {}", other),
        }),
    }
}

fn decimal(key: &str, value: &Value) -> Result<Decimal> {
    let raw = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    Decimal::from_str(raw.trim())
        .or_else(|_| Decimal::from_scientific(raw.trim()))
        .map_err(|_| NoteError::NotNumeric {
            field: key.to_string(),
            value: raw,
        })
}

fn integer(key: &str, value: &Value) -> Result<u32> {
    let d = decimal(key, value)?;
    if d.fract() != Decimal::ZERO || d < Decimal::ZERO {
        return Err(NoteError::InvalidField {
            field: key.to_string(),
            message: format!("expected a non-negative whole number, got {}", d),
        });
    }
    u32::from_str(&d.trunc().to_string()).map_err(|_| NoteError::InvalidField {
        field: key.to_string(),
        message: format!("out of range: {}", d),
    })
}

fn percentage(key: &str, value: &Value) -> Result<Rate> {
    Ok(Rate::from_percent_decimal(decimal(key, value)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn settings(value: Value) -> Settings {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = NoteConfiguration::default();
        assert_eq!(config.fiscal_year_days, 360);
        assert!(config.start_date_excluded);
        assert!(!config.end_date_excluded);
        assert_eq!(config.interval_skip_day, SkipDay::Natural);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_note_overrides_organization() {
        let organization = settings(json!({
            "fiscal_year_days": 360,
            "interval_skip_day": "post_weekend",
            "retention_on_payment": false,
        }));
        let note = settings(json!({
            "fiscal_year_days": "365",
            "retention_on_payment": true,
            "day_count_algorithm": "30 days",
            "iva_percentage": 16,
        }));

        let config = NoteConfiguration::resolve(&organization, &note).unwrap();
        assert_eq!(config.fiscal_year_days, 365);
        assert!(config.retention_on_payment);
        assert_eq!(config.interval_skip_day, SkipDay::PostWeekend);
        assert_eq!(config.day_count_algorithm, DayCountAlgorithm::ThirtyDays);
        assert_eq!(config.iva_percentage.unwrap().as_decimal(), dec!(0.16));
    }

    #[test]
    fn test_null_resets_to_default() {
        let organization = settings(json!({ "interval_skip_day": "pre_weekend" }));
        let note = settings(json!({ "interval_skip_day": null }));

        let config = NoteConfiguration::resolve(&organization, &note).unwrap();
        assert_eq!(config.interval_skip_day, SkipDay::Natural);
    }

    #[test]
    fn test_included_keys_invert_excluded() {
        let config = NoteConfiguration::from_settings(&settings(json!({
            "start_date_included": true,
            "end_date_included": false,
        })))
        .unwrap();
        assert!(!config.start_date_excluded);
        assert!(config.end_date_excluded);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let result = NoteConfiguration::from_settings(&settings(json!({ "skip_weekends": true })));
        assert!(matches!(result, Err(NoteError::UnknownConfigurationKey { key }) if key == "skip_weekends"));
    }

    #[test]
    fn test_non_numeric_rejected() {
        let result = NoteConfiguration::from_settings(&settings(json!({ "fiscal_year_days": "abc" })));
        let err = result.unwrap_err();
        assert_eq!(err.field(), Some("fiscal_year_days"));
        assert!(matches!(err, NoteError::NotNumeric { .. }));
    }

    #[test]
    fn test_invalid_fiscal_year() {
        let result = NoteConfiguration::from_settings(&settings(json!({ "fiscal_year_days": 300 })));
        assert!(matches!(result, Err(NoteError::InvalidField { .. })));
    }

    #[test]
    fn test_conflicting_step_rejected() {
        let result = NoteConfiguration::from_settings(&settings(json!({
            "n_days": 1,
            "interval_skip_day": "pre_weekend",
        })));
        assert!(matches!(result, Err(NoteError::NonTerminatingSchedule { .. })));

        let result = NoteConfiguration::from_settings(&settings(json!({ "n_days": 0 })));
        assert!(matches!(result, Err(NoteError::NonTerminatingSchedule { .. })));
    }

    #[test]
    fn test_iva_percentage_over_100() {
        let result = NoteConfiguration::from_settings(&settings(json!({ "iva_retention_percentage": 120 })));
        assert!(matches!(result, Err(NoteError::PercentageExceeded { .. })));
    }
}
