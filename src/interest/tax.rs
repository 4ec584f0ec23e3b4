use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::TaxConfiguration;
use crate::decimal::{Money, Rate};
use crate::errors::{NoteError, Result};
use crate::note::Note;
use crate::reference::TaxTable;

/// interest split into its tax components
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TaxBreakdown {
    pub gross: Money,
    pub tax: Money,
    pub iva: Money,
    pub retained_iva: Money,
    pub paid_iva: Money,
}

impl TaxBreakdown {
    /// amount the investor receives
    pub fn net(&self) -> Money {
        self.gross - self.tax + self.paid_iva
    }

    /// amount that may be folded into principal; iva is always paid out
    pub fn capitalizable(&self) -> Money {
        self.gross - self.tax
    }

    pub fn add(&mut self, other: &TaxBreakdown) {
        self.gross += other.gross;
        self.tax += other.tax;
        self.iva += other.iva;
        self.retained_iva += other.retained_iva;
        self.paid_iva += other.paid_iva;
    }

    pub fn is_zero(&self) -> bool {
        self.gross.is_zero() && self.tax.is_zero() && self.iva.is_zero()
    }
}

/// withholding tax and iva rules for one note
pub struct TaxCalculator<'a> {
    note: &'a Note,
    table: &'a TaxTable,
}

impl<'a> TaxCalculator<'a> {
    pub fn new(note: &'a Note, table: &'a TaxTable) -> Self {
        Self { note, table }
    }

    /// withholding percentage for a row ending in `year`
    pub fn tax_percentage(&self, year: i32) -> Result<Rate> {
        let from_table = self.table.percentage_for(year);
        let resolved = if self.note.configuration.fixed_retention {
            self.note.tax_percentage.or(from_table)
        } else {
            from_table.or(self.note.tax_percentage)
        };
        resolved.ok_or(NoteError::MissingTaxRate { year })
    }

    /// gross, tax and iva for `days` of interest on `balance`
    pub fn compute(&self, balance: Money, annual_rate: Rate, days: u32, year: i32) -> Result<TaxBreakdown> {
        let basis = self.note.configuration.fiscal_year_days;
        let tax_rate = self.tax_percentage(year)?;
        let base = balance.prorate(annual_rate, days, basis);

        let (gross, tax) = match (self.note.financial_entity, self.note.configuration.tax_configuration) {
            (true, TaxConfiguration::InterestPreTax) => (base, balance.prorate(tax_rate, days, basis)),
            (true, TaxConfiguration::InterestPostTax) => {
                let tax = balance.prorate(tax_rate, days, basis);
                (base + tax, tax)
            }
            (false, TaxConfiguration::InterestPreTax) => (base, base.apply(tax_rate)),
            (false, TaxConfiguration::InterestPostTax) => {
                let gross = base / self.net_share(tax_rate)?;
                (gross, gross - base)
            }
        };

        let (iva, retained_iva, paid_iva) = self.iva_on(gross);
        Ok(TaxBreakdown {
            gross,
            tax,
            iva,
            retained_iva,
            paid_iva,
        })
    }

    /// iva, retained iva and paid iva charged on `gross`
    pub fn iva_on(&self, gross: Money) -> (Money, Money, Money) {
        if !self.note.applies_iva() {
            return (Money::ZERO, Money::ZERO, Money::ZERO);
        }
        let iva = gross.apply(self.note.effective_iva_percentage());
        let retained = iva.apply(self.note.effective_iva_retention_percentage());
        (iva, retained, iva - retained)
    }

    /// gross interest per unit of balance for a row, unrounded
    ///
    /// with `include_iva` the paid iva share is folded in, which is what the
    /// installment of a french schedule has to cover
    pub fn gross_factor(&self, annual_rate: Rate, days: u32, year: i32, include_iva: bool) -> Result<Decimal> {
        let basis = Decimal::from(self.note.configuration.fiscal_year_days);
        let period = Decimal::from(days) / basis;
        let tax_rate = self.tax_percentage(year)?;

        let gross = match (self.note.financial_entity, self.note.configuration.tax_configuration) {
            (_, TaxConfiguration::InterestPreTax) => annual_rate.as_decimal() * period,
            (true, TaxConfiguration::InterestPostTax) => {
                (annual_rate.as_decimal() + tax_rate.as_decimal()) * period
            }
            (false, TaxConfiguration::InterestPostTax) => {
                annual_rate.as_decimal() * period / self.net_share(tax_rate)?
            }
        };

        if include_iva && self.note.applies_iva() {
            let iva = self.note.effective_iva_percentage().as_decimal();
            let kept = Decimal::ONE - self.note.effective_iva_retention_percentage().as_decimal();
            Ok(gross * (Decimal::ONE + iva * kept))
        } else {
            Ok(gross)
        }
    }

    fn net_share(&self, tax_rate: Rate) -> Result<Decimal> {
        let share = Decimal::ONE - tax_rate.as_decimal();
        if share <= Decimal::ZERO {
            return Err(NoteError::InvalidConfiguration {
                message: format!("post-tax interest cannot be grossed up by a {} tax", tax_rate),
            });
        }
        Ok(share)
    }
}
