use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::decimal::Money;
use crate::errors::{NoteError, Result};
use crate::interest::{fixing_date, resolve_rate, DayCounter, ResolvedRate, TaxBreakdown, TaxCalculator};
use crate::interval::{plan_intervals, scheduled_cuts, IntervalPlan, PlannedInterval};
use crate::note::Note;
use crate::payments::{split_payment, AmortizationCalculator, AmortizationMethod};
use crate::reference::ReferenceData;
use crate::schedule::{Interest, Schedule, ScheduleCarry, ScheduledTransaction};
use crate::transaction::Transaction;
use crate::types::{NoteType, Status, TransactionType};

/// computes interest rows for one note against fixed reference data
pub struct ScheduleEngine<'a> {
    note: &'a Note,
    reference: ReferenceData<'a>,
    counter: DayCounter,
    taxes: TaxCalculator<'a>,
    amortization: AmortizationCalculator,
    capitalization_every: Option<u32>,
    payout_every: Option<u32>,
}

impl<'a> ScheduleEngine<'a> {
    pub fn new(note: &'a Note, reference: ReferenceData<'a>) -> Result<Self> {
        note.validate()?;
        Ok(Self {
            note,
            reference,
            counter: DayCounter::from_configuration(&note.configuration),
            taxes: TaxCalculator::new(note, reference.tax_table),
            amortization: AmortizationCalculator::for_note_type(note.type_of),
            capitalization_every: note.capitalization_every()?,
            payout_every: note.payout_every()?,
        })
    }

    pub fn note(&self) -> &Note {
        self.note
    }

    pub fn reference(&self) -> ReferenceData<'a> {
        self.reference
    }

    /// interval grid for the given transactions, checked for refinance dates
    pub fn plan(&self, transactions: &[Transaction]) -> Result<IntervalPlan> {
        let plan = plan_intervals(self.note, transactions, self.reference.calendar)?;
        for event in plan
            .opening_events
            .iter()
            .chain(plan.intervals.iter().flat_map(|row| row.events.iter()))
        {
            self.check_refinance_date_for(event)?;
        }
        Ok(plan)
    }

    /// refinance check for a deposit or partial withdrawal
    pub fn check_refinance_date_for(&self, transaction: &Transaction) -> Result<()> {
        match transaction.transaction_type {
            TransactionType::Deposit | TransactionType::Withdrawal => {
                self.check_refinance_date(transaction.date)
            }
            _ => Ok(()),
        }
    }

    /// french notes only move principal on a scheduled cut before maturity
    pub fn check_refinance_date(&self, date: NaiveDate) -> Result<()> {
        if self.note.type_of != NoteType::FrenchAmortization {
            return Ok(());
        }
        let cuts = scheduled_cuts(self.note, self.reference.calendar)?;
        if date >= self.note.end_date || !cuts.contains(&date) {
            return Err(NoteError::InvalidRefinanceDate { date });
        }
        Ok(())
    }

    /// full schedule from the note start
    pub fn generate(&self, transactions: &[Transaction]) -> Result<Schedule> {
        let plan = self.plan(transactions)?;
        self.generate_plan(&plan)
    }

    pub fn generate_plan(&self, plan: &IntervalPlan) -> Result<Schedule> {
        let mut balance = self.note.initial_amount;
        for event in &plan.opening_events {
            balance = settle_principal(balance, event)?;
        }

        let mut schedule = self.run(plan, 0, balance, ScheduleCarry::default())?;
        book_single_commission(self.note, &mut schedule.interests);

        info!(
            note_id = %self.note.id,
            rows = schedule.interests.len(),
            generated = schedule.transactions.len(),
            terminated_on = ?schedule.terminated_on,
            "generated schedule"
        );
        Ok(schedule)
    }

    /// regenerate the rows of `plan` from index `from`, continuing after `last`
    pub fn resume(&self, plan: &IntervalPlan, from: usize, last: &Interest) -> Result<Schedule> {
        self.run(plan, from, last.current_balance, last.carry.clone())
    }

    fn run(
        &self,
        plan: &IntervalPlan,
        from: usize,
        mut balance: Money,
        mut carry: ScheduleCarry,
    ) -> Result<Schedule> {
        let mut interests = Vec::with_capacity(plan.intervals.len().saturating_sub(from));
        let mut transactions = Vec::new();

        for index in from..plan.intervals.len() {
            let interest = self.generate_row(
                &plan.intervals,
                index,
                &mut balance,
                &mut carry,
                &mut transactions,
            )?;
            interests.push(interest);
        }

        Ok(Schedule {
            interests,
            transactions,
            terminated_on: plan.terminated_on,
        })
    }

    fn generate_row(
        &self,
        rows: &[PlannedInterval],
        index: usize,
        balance: &mut Money,
        carry: &mut ScheduleCarry,
        generated: &mut Vec<ScheduledTransaction>,
    ) -> Result<Interest> {
        let note = self.note;
        let config = &note.configuration;
        let row = &rows[index];
        let opening = *balance;

        let days = self.counter.count(row, note.start_date, note.end_date);
        let resolved = resolve_rate(note, fixing_date(note, row.start_date), self.reference.rates)?;
        let accrued = self
            .taxes
            .compute(opening, resolved.annual, days, row.end_date.year())?;

        let commission = note
            .promoter_commission
            .map(|c| opening.prorate(c, days, config.fiscal_year_days))
            .unwrap_or(Money::ZERO);
        carry.commission_accrued += commission;

        if row.scheduled_cut {
            carry.period += 1;
        }
        let payout_cut = match self.payout_every {
            Some(every) => row.scheduled_cut && carry.period % every == 0,
            None => false,
        };
        let capitalizes = match self.capitalization_every {
            Some(every) => {
                row.scheduled_cut
                    && !row.maturity
                    && !row.terminal
                    && !payout_cut
                    && carry.period % every == 0
            }
            None => false,
        };
        let withdraws_interest = row
            .events
            .iter()
            .any(|e| e.transaction_type == TransactionType::InterestWithdrawal);
        let pays_out = row.maturity
            || capitalizes
            || (row.scheduled_cut
                && match note.type_of {
                    NoteType::Simple => !config.pay_on_expiration,
                    NoteType::Amortization | NoteType::FrenchAmortization => true,
                    NoteType::Capitalization => payout_cut,
                });

        // realization
        let realized = if config.retention_on_payment {
            carry.pending.add(&accrued);
            if pays_out || withdraws_interest || row.terminal {
                std::mem::take(&mut carry.pending)
            } else {
                TaxBreakdown::default()
            }
        } else {
            accrued
        };

        if note.type_of == NoteType::Capitalization {
            carry.capitalization_pending += realized.capitalizable();
            carry.pending_net += realized.paid_iva;
        } else {
            carry.pending_net += realized.net();
        }
        carry.pending_net_iva += realized.paid_iva;

        // interest withdrawals, then regular payouts
        let mut payment = Money::ZERO;
        if !row.terminal {
            for event in row
                .events
                .iter()
                .filter(|e| e.transaction_type == TransactionType::InterestWithdrawal)
            {
                let available = carry.pending_net + carry.capitalization_pending;
                if event.amount > available {
                    return Err(NoteError::InsufficientInterest {
                        available,
                        requested: event.amount,
                    });
                }
                let from_net = event.amount.min(carry.pending_net);
                carry.pending_net -= from_net;
                carry.pending_net_iva = carry.pending_net_iva.min(carry.pending_net);
                carry.capitalization_pending -= event.amount - from_net;
                payment += event.amount;
            }
        }

        let mut disbursed = Money::ZERO;
        if pays_out {
            disbursed += carry.pending_net;
            carry.pending_net = Money::ZERO;
            carry.pending_net_iva = Money::ZERO;
            if row.maturity || payout_cut {
                disbursed += carry.capitalization_pending;
                carry.capitalization_pending = Money::ZERO;
            }
        }
        payment += disbursed;

        // capitalization
        let mut capitalized = Money::ZERO;
        if capitalizes {
            capitalized = std::mem::take(&mut carry.capitalization_pending);
            *balance += capitalized;
            if capitalized.is_positive() {
                generated.push(ScheduledTransaction {
                    transaction_type: TransactionType::Capitalization,
                    amount: capitalized,
                    date: row.end_date,
                });
            }
        }

        // capital
        let remaining_cuts = rows[index..].iter().filter(|r| r.scheduled_cut).count();
        let capital = if row.terminal {
            Money::ZERO
        } else if row.maturity {
            *balance
        } else if row.scheduled_cut && note.type_of.is_amortizing() {
            if carry.installment.is_none() {
                carry.installment = self.installment(rows, index, *balance)?;
            }
            let term = if config.iva_on_amortization_term {
                accrued.gross + accrued.paid_iva
            } else {
                accrued.gross
            };
            self.amortization
                .capital_for(carry.installment, *balance, term, remaining_cuts == 1)
        } else {
            Money::ZERO
        };
        *balance -= capital;
        if capital.is_positive() {
            generated.push(ScheduledTransaction {
                transaction_type: TransactionType::CapitalPayment,
                amount: capital,
                date: row.end_date,
            });
        }

        // user movements settle after capitalization and capital
        for event in &row.events {
            *balance = settle_principal(*balance, event)?;
            if event.transaction_type.moves_principal() {
                carry.installment = None;
            }
        }

        if row.terminal {
            let settlement = carry.pending_net + carry.capitalization_pending;
            carry.pending_net = Money::ZERO;
            carry.pending_net_iva = Money::ZERO;
            carry.capitalization_pending = Money::ZERO;
            if settlement.is_positive() {
                generated.push(ScheduledTransaction {
                    transaction_type: TransactionType::InterestDeposit,
                    amount: settlement,
                    date: row.end_date,
                });
            }
        } else if disbursed.is_positive() {
            generated.push(ScheduledTransaction {
                transaction_type: TransactionType::InterestDeposit,
                amount: disbursed,
                date: row.end_date,
            });
        }

        debug!(
            interval_id = row.interval_id,
            start = %row.start_date,
            end = %row.end_date,
            days,
            gross = %accrued.gross,
            payment = %payment,
            capital = %capital,
            balance = %*balance,
            "generated interest row"
        );

        Ok(Interest {
            interval_id: row.interval_id,
            start_date: row.start_date,
            end_date: row.end_date,
            number_of_days: days,
            rate: resolved.annual,
            gross: accrued.gross,
            tax: realized.tax,
            iva: realized.iva,
            retained_iva: realized.retained_iva,
            paid_iva: realized.paid_iva,
            net: realized.net(),
            payment,
            capital_payment: capital,
            current_balance: *balance,
            accumulated: carry.pending.gross + carry.pending_net,
            capitalization_accumulated: if capitalizes {
                capitalized
            } else {
                carry.capitalization_pending
            },
            commission: if config.single_commission_payment {
                Money::ZERO
            } else {
                commission
            },
            status: Status::Pending,
            variable_rate_value: resolved.variable_rate_value,
            variable_rate_date: resolved.variable_rate_date,
            payment_breakdown: split_payment(payment, &note.mixed_payments),
            rate_breakdown: rate_breakdown(&resolved, accrued.gross),
            carry: carry.clone(),
        })
    }

    /// installment for the scheduled cuts from `index` on
    fn installment(&self, rows: &[PlannedInterval], index: usize, balance: Money) -> Result<Option<Money>> {
        let remaining = rows[index..].iter().filter(|r| r.scheduled_cut);
        let factors = match self.amortization.method() {
            AmortizationMethod::EqualInstallments => {
                let mut factors = Vec::new();
                for row in remaining {
                    let days = self.counter.count(row, self.note.start_date, self.note.end_date);
                    let rate = resolve_rate(
                        self.note,
                        fixing_date(self.note, row.start_date),
                        self.reference.rates,
                    )?;
                    factors.push(self.taxes.gross_factor(
                        rate.annual,
                        days,
                        row.end_date.year(),
                        self.note.configuration.iva_on_amortization_term,
                    )?);
                }
                factors
            }
            _ => vec![Decimal::ZERO; remaining.count()],
        };
        self.amortization.installment(balance, &factors)
    }
}

/// apply a user movement to the principal
fn settle_principal(balance: Money, event: &Transaction) -> Result<Money> {
    match event.transaction_type {
        TransactionType::Deposit => Ok(balance + event.amount),
        TransactionType::Withdrawal | TransactionType::TotalWithdrawal => {
            if event.amount > balance {
                return Err(NoteError::InsufficientBalance {
                    available: balance,
                    requested: event.amount,
                });
            }
            if event.transaction_type == TransactionType::TotalWithdrawal {
                Ok(Money::ZERO)
            } else {
                Ok(balance - event.amount)
            }
        }
        _ => Ok(balance),
    }
}

fn rate_breakdown(resolved: &ResolvedRate, gross: Money) -> Vec<(crate::types::PaymentType, Money)> {
    if resolved.annual.is_zero() {
        return Vec::new();
    }
    resolved
        .components
        .iter()
        .map(|(payment_type, rate)| {
            (
                payment_type.clone(),
                gross * (rate.as_decimal() / resolved.annual.as_decimal()),
            )
        })
        .collect()
}

/// move the whole commission onto the first row
pub(crate) fn book_single_commission(note: &Note, interests: &mut [Interest]) {
    if !note.configuration.single_commission_payment {
        return;
    }
    let total = interests
        .last()
        .map(|i| i.carry.commission_accrued)
        .unwrap_or(Money::ZERO);
    for (index, interest) in interests.iter_mut().enumerate() {
        interest.commission = if index == 0 { total } else { Money::ZERO };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{NoteConfiguration, SkipDay};
    use crate::decimal::Rate;
    use crate::reference::{HolidaySet, NoHolidays, NoReferenceRates, TaxTable};
    use crate::types::PaymentType;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn money(s: &str) -> Money {
        Money::from_str_exact(s).unwrap()
    }

    fn pct(s: &str) -> Rate {
        Rate::from_percent_str(s).unwrap()
    }

    fn applied(note: &Note, kind: TransactionType, amount: &str, on: NaiveDate, seq: u64) -> Transaction {
        let mut tx = Transaction::new(note.id, kind, money(amount), on);
        tx.status = Status::Applied;
        tx.applied_sequence = Some(seq);
        tx
    }

    fn simple_note() -> Note {
        Note::builder()
            .type_of(NoteType::Simple)
            .initial_amount(Money::from_major(10_000_000))
            .interest_rate(Rate::from_percentage(12))
            .tax_percentage(pct("1.04"))
            .dates(date(2019, 1, 15), date(2020, 1, 15))
            .cut_day(31)
            .monthly_periodicity(1)
            .build()
            .unwrap()
    }

    fn generate(note: &Note, transactions: &[Transaction]) -> Result<Schedule> {
        let table = TaxTable::new();
        let reference = ReferenceData::new(&NoHolidays, &table, &NoReferenceRates);
        ScheduleEngine::new(note, reference)?.generate(transactions)
    }

    #[test]
    fn test_simple_note_rows() {
        let note = simple_note();
        let schedule = generate(&note, &[]).unwrap();

        assert_eq!(schedule.interests.len(), 12);
        assert!(schedule.is_contiguous(note.start_date, note.end_date));

        let first = &schedule.interests[0];
        assert_eq!(first.end_date, date(2019, 2, 28));
        assert_eq!(first.number_of_days, 44);
        assert_eq!(first.gross.round_dp(2), money("146666.67"));
        assert_eq!(first.tax.round_dp(2), money("12711.11"));
        assert_eq!(first.net.round_dp(2), money("133955.56"));
        assert_eq!(first.payment.round_dp(2), money("133955.56"));
        assert_eq!(first.accumulated, Money::ZERO);

        let march = &schedule.interests[1];
        assert_eq!(march.number_of_days, 31);
        assert_eq!(march.gross.round_dp(2), money("103333.33"));
        assert_eq!(march.net.round_dp(2), money("94377.78"));

        let april = &schedule.interests[2];
        assert_eq!(april.number_of_days, 30);
        assert_eq!(april.gross.round_dp(2), money("100000.00"));
        assert_eq!(april.tax.round_dp(2), money("8666.67"));

        let last = schedule.last().unwrap();
        assert_eq!(last.number_of_days, 15);
        assert_eq!(last.gross.round_dp(2), money("50000.00"));
        assert_eq!(last.net.round_dp(2), money("45666.67"));
        assert_eq!(last.capital_payment, Money::from_major(10_000_000));
        assert_eq!(last.current_balance, Money::ZERO);

        let days: u32 = schedule.interests.iter().map(|i| i.number_of_days).sum();
        assert_eq!(days, 365);
        assert_eq!(
            schedule.transactions_of(TransactionType::InterestDeposit).count(),
            12
        );
        assert_eq!(
            schedule.transactions_of(TransactionType::CapitalPayment).count(),
            1
        );
    }

    #[test]
    fn test_pay_on_expiration_accumulates() {
        let mut note = simple_note();
        note.configuration.pay_on_expiration = true;
        let schedule = generate(&note, &[]).unwrap();

        let first = &schedule.interests[0];
        assert_eq!(first.payment, Money::ZERO);
        assert_eq!(first.accumulated, first.net);

        let last = schedule.last().unwrap();
        assert_eq!(last.payment, schedule.total_net());
        assert_eq!(last.accumulated, Money::ZERO);
        assert_eq!(schedule.transactions_of(TransactionType::InterestDeposit).count(), 1);
    }

    #[test]
    fn test_retention_on_payment_defers_tax() {
        let mut note = simple_note();
        note.configuration.pay_on_expiration = true;
        note.configuration.retention_on_payment = true;
        let schedule = generate(&note, &[]).unwrap();

        let first = &schedule.interests[0];
        assert_eq!(first.tax, Money::ZERO);
        assert_eq!(first.net, Money::ZERO);
        assert_eq!(first.accumulated, first.gross);

        let plain = generate(&simple_note(), &[]).unwrap();
        let last = schedule.last().unwrap();
        let realized_tax: Money = plain.interests.iter().map(|i| i.tax).sum();
        assert_eq!(last.tax, realized_tax);
        assert_eq!(last.payment, plain.total_net());
    }

    #[test]
    fn test_mid_row_deposit_changes_balance_at_row_end() {
        let note = simple_note();
        let deposit = applied(&note, TransactionType::Deposit, "1000000", date(2019, 3, 15), 1);
        let schedule = generate(&note, &[deposit]).unwrap();

        assert_eq!(schedule.interests.len(), 13);
        let split = &schedule.interests[1];
        assert_eq!(split.end_date, date(2019, 3, 15));
        assert_eq!(split.number_of_days, 15);
        assert_eq!(split.current_balance, Money::from_major(11_000_000));

        let rest = &schedule.interests[2];
        assert_eq!(rest.number_of_days, 16);
        assert_eq!(rest.interval_id, split.interval_id);
        assert_eq!(
            rest.gross.round_dp(2),
            money("58666.67")
        );
        assert_eq!(schedule.last().unwrap().capital_payment, Money::from_major(11_000_000));
    }

    #[test]
    fn test_withdrawal_above_balance_rejected() {
        let note = simple_note();
        let withdrawal = applied(&note, TransactionType::Withdrawal, "10000001", date(2019, 3, 15), 1);
        let err = generate(&note, &[withdrawal]).unwrap_err();
        assert_eq!(err.field(), Some("amount"));
    }

    #[test]
    fn test_interest_withdrawal_limited_to_pending() {
        let mut note = simple_note();
        note.configuration.pay_on_expiration = true;

        let ok = applied(&note, TransactionType::InterestWithdrawal, "100000", date(2019, 3, 31), 1);
        let schedule = generate(&note, &[ok]).unwrap();
        let row = schedule.row_ending_on(date(2019, 3, 31)).unwrap();
        assert_eq!(row.payment, Money::from_major(100_000));
        assert_eq!(
            row.accumulated.round_dp(2),
            money("128333.33")
        );

        let too_much = applied(&note, TransactionType::InterestWithdrawal, "500000", date(2019, 3, 31), 1);
        let err = generate(&note, &[too_much]).unwrap_err();
        assert!(matches!(err, NoteError::InsufficientInterest { .. }));
    }

    fn capitalization_note() -> Note {
        Note::builder()
            .type_of(NoteType::Capitalization)
            .initial_amount(Money::from_major(1_000_000))
            .interest_rate(Rate::from_percentage(20))
            .tax_percentage(pct("1.04"))
            .dates(date(2020, 4, 8), date(2021, 4, 8))
            .cut_day(8)
            .capitalization_periodicity(1)
            .build()
            .unwrap()
    }

    #[test]
    fn test_capitalization_note_with_mid_row_deposit() {
        let note = capitalization_note();
        let deposit = applied(&note, TransactionType::Deposit, "50000", date(2020, 11, 15), 1);
        let schedule = generate(&note, &[deposit]).unwrap();

        assert_eq!(schedule.transactions_of(TransactionType::Capitalization).count(), 11);
        assert_eq!(schedule.transactions_of(TransactionType::CapitalPayment).count(), 1);

        let first = &schedule.interests[0];
        assert_eq!(first.payment, Money::ZERO);
        assert_eq!(first.capitalization_accumulated, first.gross - first.tax);
        assert_eq!(first.current_balance, Money::from_major(1_000_000) + first.gross - first.tax);

        // balance only grows until maturity
        for pair in schedule.interests.windows(2) {
            if !pair[1].capital_payment.is_positive() {
                assert!(pair[1].current_balance >= pair[0].current_balance);
            }
        }
        let last = schedule.last().unwrap();
        assert_eq!(last.current_balance, Money::ZERO);
        assert_eq!(last.capital_payment, schedule.interests[schedule.interests.len() - 2].current_balance);
    }

    #[test]
    fn test_deposit_on_capitalization_date_keeps_both() {
        let note = Note::builder()
            .type_of(NoteType::Capitalization)
            .initial_amount(Money::from_major(1_000_000))
            .interest_rate(Rate::from_percentage(20))
            .tax_percentage(pct("1.04"))
            .dates(date(2021, 1, 1), date(2022, 1, 1))
            .cut_day(31)
            .capitalization_periodicity(1)
            .build()
            .unwrap();
        let deposit = applied(&note, TransactionType::Deposit, "10000", date(2021, 2, 28), 1);
        let schedule = generate(&note, &[deposit]).unwrap();

        let first = &schedule.interests[0];
        assert_eq!(first.end_date, date(2021, 2, 28));
        assert_eq!(first.number_of_days, 58);
        assert_eq!(first.capitalization_accumulated.round_dp(2), money("30546.67"));
        assert_eq!(first.current_balance.round_dp(2), money("1040546.67"));

        let same_day: Vec<_> = schedule
            .transactions
            .iter()
            .filter(|t| t.date == date(2021, 2, 28))
            .collect();
        assert_eq!(same_day.len(), 1);
        assert_eq!(same_day[0].transaction_type, TransactionType::Capitalization);
    }

    fn capitalization_with_payments_note() -> Note {
        Note::builder()
            .type_of(NoteType::Capitalization)
            .initial_amount(Money::from_major(450_000))
            .interest_rate(Rate::from_percentage(18))
            .tax_percentage(pct("1.04"))
            .dates(date(2019, 8, 6), date(2020, 8, 6))
            .cut_day(31)
            .monthly_periodicity(3)
            .capitalization_periodicity(1)
            .build()
            .unwrap()
    }

    #[test]
    fn test_capitalization_with_quarterly_payments() {
        let note = capitalization_with_payments_note();
        let schedule = generate(&note, &[]).unwrap();

        assert_eq!(schedule.interests.len(), 12);
        assert!(schedule.is_contiguous(note.start_date, note.end_date));

        let first = &schedule.interests[0];
        assert_eq!(first.end_date, date(2019, 9, 30));
        assert_eq!(first.number_of_days, 55);
        assert_eq!(first.gross, money("12375"));
        assert_eq!(first.tax, money("715"));
        assert_eq!(first.payment, Money::ZERO);
        assert_eq!(first.capitalization_accumulated, money("11660"));
        assert_eq!(first.current_balance, money("461660"));

        let second = &schedule.interests[1];
        assert_eq!(second.gross.round_dp(2), money("7155.73"));
        assert_eq!(second.current_balance.round_dp(2), money("468402.29"));

        // every third cut pays the quarter's interest instead of capitalizing it
        let payout = &schedule.interests[2];
        assert_eq!(payout.end_date, date(2019, 11, 30));
        assert_eq!(payout.payment, payout.gross - payout.tax);
        assert_eq!(payout.payment.round_dp(2), money("6620.09"));
        assert_eq!(payout.current_balance, second.current_balance);
        assert_eq!(payout.capitalization_accumulated, Money::ZERO);

        let payout_dates: Vec<NaiveDate> = schedule
            .transactions_of(TransactionType::InterestDeposit)
            .map(|t| t.date)
            .collect();
        assert_eq!(
            payout_dates,
            vec![date(2019, 11, 30), date(2020, 2, 29), date(2020, 5, 31), date(2020, 8, 6)]
        );
        assert_eq!(schedule.transactions_of(TransactionType::Capitalization).count(), 8);

        let last = schedule.last().unwrap();
        assert_eq!(last.capital_payment, schedule.interests[10].current_balance);
        assert_eq!(last.current_balance, Money::ZERO);
    }

    #[test]
    fn test_capitalization_with_payments_and_deposit() {
        let note = capitalization_with_payments_note();
        let deposit = applied(&note, TransactionType::Deposit, "500000", date(2020, 2, 15), 1);
        let schedule = generate(&note, &[deposit]).unwrap();

        assert_eq!(schedule.interests.len(), 13);
        let january = schedule.row_ending_on(date(2020, 1, 31)).unwrap();
        let split = schedule.row_ending_on(date(2020, 2, 15)).unwrap();
        let payout = schedule.row_ending_on(date(2020, 2, 29)).unwrap();

        assert_eq!(split.payment, Money::ZERO);
        assert_eq!(split.capitalization_accumulated, split.gross - split.tax);
        assert_eq!(split.current_balance, january.current_balance + Money::from_major(500_000));

        // the payout cut pays both halves of the split period
        assert_eq!(
            payout.payment,
            (split.gross - split.tax) + (payout.gross - payout.tax)
        );
        assert_eq!(payout.current_balance, split.current_balance);
        assert_eq!(schedule.transactions_of(TransactionType::Capitalization).count(), 8);

        let table = TaxTable::new();
        let engine = ScheduleEngine::new(&note, ReferenceData::new(&NoHolidays, &table, &NoReferenceRates)).unwrap();
        let before = engine.generate(&[]).unwrap();
        let deposit = applied(&note, TransactionType::Deposit, "500000", date(2020, 2, 15), 1);
        let resumed = crate::schedule::recalculate_from(&engine, &before, &[deposit], date(2020, 2, 15)).unwrap();
        assert_eq!(resumed, schedule);
    }

    #[test]
    fn test_total_withdrawal_terminates_capitalization_note() {
        let note = capitalization_note();
        let total = applied(&note, TransactionType::TotalWithdrawal, "1000000", date(2020, 6, 20), 1);
        let schedule = generate(&note, &[total]).unwrap();

        assert_eq!(schedule.terminated_on, Some(date(2020, 6, 20)));
        let last = schedule.last().unwrap();
        assert_eq!(last.end_date, date(2020, 6, 20));
        assert_eq!(last.payment, Money::ZERO);
        assert_eq!(last.current_balance, Money::ZERO);
        assert_eq!(last.capitalization_accumulated, Money::ZERO);

        let settlement = schedule
            .transactions_of(TransactionType::InterestDeposit)
            .last()
            .unwrap();
        assert_eq!(settlement.date, date(2020, 6, 20));
        assert_eq!(settlement.amount, last.gross - last.tax);
    }

    fn amortization_note(type_of: NoteType) -> Note {
        Note::builder()
            .type_of(type_of)
            .initial_amount(Money::from_major(120_000))
            .interest_rate(Rate::from_percentage(12))
            .tax_percentage(pct("1.04"))
            .dates(date(2022, 1, 15), date(2023, 1, 15))
            .cut_day(15)
            .monthly_periodicity(1)
            .build()
            .unwrap()
    }

    #[test]
    fn test_straight_line_amortization() {
        let note = amortization_note(NoteType::Amortization);
        let schedule = generate(&note, &[]).unwrap();

        assert_eq!(schedule.interests.len(), 12);
        for row in &schedule.interests {
            assert_eq!(row.capital_payment, Money::from_major(10_000));
        }
        assert_eq!(schedule.total_capital_payment(), note.initial_amount);
        assert_eq!(schedule.last().unwrap().current_balance, Money::ZERO);
    }

    #[test]
    fn test_straight_line_rederived_after_deposit() {
        let note = amortization_note(NoteType::Amortization);
        let deposit = applied(&note, TransactionType::Deposit, "11000", date(2022, 2, 15), 1);
        let schedule = generate(&note, &[deposit]).unwrap();

        assert_eq!(schedule.interests[0].capital_payment, Money::from_major(10_000));
        // 121,000 left over 11 cuts
        assert_eq!(schedule.interests[1].capital_payment, Money::from_major(11_000));
        assert!(schedule
            .total_capital_payment()
            .is_close_to(Money::from_major(131_000), Money::CENT));
    }

    #[test]
    fn test_french_constant_installment() {
        let note = amortization_note(NoteType::FrenchAmortization);
        let schedule = generate(&note, &[]).unwrap();

        let term = schedule.interests[0].capital_payment + schedule.interests[0].gross;
        for row in &schedule.interests {
            assert!((row.capital_payment + row.gross).is_close_to(term, Money::CENT));
        }
        assert!(schedule
            .total_capital_payment()
            .is_close_to(note.initial_amount, Money::CENT));
        assert_eq!(schedule.last().unwrap().current_balance, Money::ZERO);
    }

    #[test]
    fn test_french_term_includes_paid_iva() {
        let mut note = amortization_note(NoteType::FrenchAmortization);
        note.financial_entity = false;
        note.iva_percentage = Some(Rate::from_percentage(16));
        note.iva_retention_percentage = Some(pct("66.6667"));
        note.configuration.iva_on_amortization_term = true;
        let schedule = generate(&note, &[]).unwrap();

        let first = &schedule.interests[0];
        assert!(first.paid_iva.is_positive());
        let term = first.capital_payment + first.gross + first.paid_iva;
        for row in &schedule.interests {
            assert!((row.capital_payment + row.gross + row.paid_iva).is_close_to(term, Money::CENT));
        }
        assert!(schedule
            .total_capital_payment()
            .is_close_to(note.initial_amount, Money::CENT));

        // without the flag the iva rides on top of a smaller term
        note.configuration.iva_on_amortization_term = false;
        let plain = generate(&note, &[]).unwrap();
        assert!(plain.interests[0].capital_payment > first.capital_payment);
    }

    #[test]
    fn test_french_refinance_off_cut_rejected() {
        let note = amortization_note(NoteType::FrenchAmortization);
        let deposit = applied(&note, TransactionType::Deposit, "1000", date(2022, 2, 20), 1);
        let err = generate(&note, &[deposit]).unwrap_err();
        assert_eq!(err, NoteError::InvalidRefinanceDate { date: date(2022, 2, 20) });
        assert_eq!(err.field(), Some("date"));

        let at_end = applied(&note, TransactionType::Deposit, "1000", date(2023, 1, 15), 1);
        assert!(generate(&note, &[at_end]).is_err());

        let on_cut = applied(&note, TransactionType::Deposit, "1000", date(2022, 3, 15), 1);
        let schedule = generate(&note, &[on_cut]).unwrap();
        assert!(schedule
            .total_capital_payment()
            .is_close_to(Money::from_major(121_000), Money::CENT));
    }

    #[test]
    fn test_non_financial_entity_pays_iva() {
        let mut note = simple_note();
        note.financial_entity = false;
        note.iva_percentage = Some(Rate::from_percentage(16));
        note.iva_retention_percentage = Some(pct("66.6667"));
        let schedule = generate(&note, &[]).unwrap();

        let row = &schedule.interests[2];
        assert_eq!(row.gross.round_dp(2), money("100000.00"));
        assert_eq!(row.tax.round_dp(2), money("1040.00"));
        assert_eq!(row.iva.round_dp(2), money("16000.00"));
        assert_eq!(row.net, row.gross - row.tax + row.paid_iva);
        assert_eq!(row.payment, row.net);
    }

    #[test]
    fn test_single_commission_payment() {
        let mut note = simple_note();
        note.promoter_commission = Some(Rate::from_percentage(1));
        let spread = generate(&note, &[]).unwrap();
        let per_row: Money = spread.interests.iter().map(|i| i.commission).sum();
        assert!(spread.interests[1].commission.is_positive());

        note.configuration.single_commission_payment = true;
        let single = generate(&note, &[]).unwrap();
        assert_eq!(single.interests[0].commission, per_row);
        assert!(single.interests[1..].iter().all(|i| i.commission.is_zero()));
    }

    #[test]
    fn test_mixed_rates_and_payments() {
        let note = Note::builder()
            .type_of(NoteType::Simple)
            .initial_amount(Money::from_major(100_000))
            .interest_rate(Rate::from_percentage(10))
            .tax_percentage(Rate::ZERO)
            .dates(date(2021, 1, 1), date(2021, 4, 1))
            .cut_day(1)
            .monthly_periodicity(1)
            .mixed_rate(PaymentType::Cash, Rate::from_percentage(4))
            .mixed_rate(PaymentType::Reinvestment, Rate::from_percentage(6))
            .mixed_payment(PaymentType::Check, Rate::from_percentage(25))
            .build()
            .unwrap();
        let schedule = generate(&note, &[]).unwrap();

        let row = &schedule.interests[0];
        assert_eq!(row.rate_breakdown.len(), 2);
        let split: Money = row.rate_breakdown.iter().map(|(_, m)| *m).sum();
        assert!(split.is_close_to(row.gross, Money::CENT));

        assert_eq!(row.payment_breakdown[0].payment_type, PaymentType::Check);
        assert_eq!(row.payment_breakdown[0].amount, row.payment.apply(Rate::from_percentage(25)));
    }

    #[test]
    fn test_skip_day_shifts_cuts_only() {
        let mut note = simple_note();
        note.configuration.interval_skip_day = SkipDay::PostWeekendAndHoliday;
        let calendar = HolidaySet::new("mx").with_holiday(date(2019, 4, 1));
        let table = TaxTable::new();
        let reference = ReferenceData::new(&calendar, &table, &NoReferenceRates);
        let schedule = ScheduleEngine::new(&note, reference).unwrap().generate(&[]).unwrap();

        // 2019-03-31 is a sunday, 2019-04-01 a holiday
        assert_eq!(schedule.interests[1].end_date, date(2019, 4, 2));
        assert_eq!(schedule.interests[0].start_date, note.start_date);
        assert_eq!(schedule.last().unwrap().end_date, note.end_date);
    }

    #[test]
    fn test_default_configuration_is_used() {
        let note = simple_note();
        assert_eq!(note.configuration, NoteConfiguration::default());
    }
}
