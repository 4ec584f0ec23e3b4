use chrono::{Datelike, Months, NaiveDate};
use hourglass_rs::SafeTimeProvider;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tracing::{info, warn};
use uuid::Uuid;

use crate::decimal::Money;
use crate::errors::{NoteError, Result};
use crate::events::{Event, EventStore};
use crate::note::Note;
use crate::payments::AmortizationMethod;
use crate::reference::ReferenceBook;
use crate::schedule::{recalculate_from, Interest, Schedule, ScheduleEngine, ScheduledTransaction};
use crate::transaction::Transaction;
use crate::types::{NoteStatus, Status, TransactionId, TransactionType};

/// monthly period close for a note
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyCut {
    pub year: i32,
    pub month: u32,
    pub cut_day: u32,
}

impl MonthlyCut {
    pub fn new(year: i32, month: u32, cut_day: u32) -> Self {
        Self {
            year,
            month,
            cut_day,
        }
    }

    /// cut day of the month, clamped to its last day
    pub fn closing_date(&self) -> Result<NaiveDate> {
        let first = NaiveDate::from_ymd_opt(self.year, self.month, 1).ok_or_else(|| {
            NoteError::InvalidField {
                field: "month".to_string(),
                message: format!("{}-{} is not a calendar month", self.year, self.month),
            }
        })?;
        let last_day = first
            .checked_add_months(Months::new(1))
            .and_then(|next| next.pred_opt())
            .map(|d| d.day())
            .unwrap_or(28);
        NaiveDate::from_ymd_opt(self.year, self.month, self.cut_day.clamp(1, last_day)).ok_or_else(|| {
            NoteError::InvalidField {
                field: "cut_day".to_string(),
                message: format!("{} is not a day of {}-{}", self.cut_day, self.year, self.month),
            }
        })
    }
}

/// owns one note, its transactions and its current schedule
pub struct NoteLedger {
    note: Note,
    status: NoteStatus,
    reference: ReferenceBook,
    transactions: Vec<Transaction>,
    schedule: Schedule,
    monthly_cuts: Vec<MonthlyCut>,
    next_sequence: u64,
    pub events: EventStore,
}

impl NoteLedger {
    /// draft ledger, nothing is computed until `activate`
    pub fn new(note: Note, reference: ReferenceBook) -> Self {
        Self {
            note,
            status: NoteStatus::Draft,
            reference,
            transactions: Vec::new(),
            schedule: Schedule::default(),
            monthly_cuts: Vec::new(),
            next_sequence: 1,
            events: EventStore::new(),
        }
    }

    pub fn note(&self) -> &Note {
        &self.note
    }

    pub fn status(&self) -> NoteStatus {
        self.status
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn interests(&self) -> &[Interest] {
        &self.schedule.interests
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn transaction(&self, id: TransactionId) -> Result<&Transaction> {
        self.transactions
            .iter()
            .find(|t| t.id == id)
            .ok_or(NoteError::TransactionNotFound { id })
    }

    pub fn monthly_cuts(&self) -> &[MonthlyCut] {
        &self.monthly_cuts
    }

    /// latest completed closing date
    pub fn closing_date(&self) -> Option<NaiveDate> {
        self.monthly_cuts
            .iter()
            .filter_map(|cut| cut.closing_date().ok())
            .max()
    }

    /// change note terms while still in draft
    pub fn amend<F>(&mut self, change: F) -> Result<()>
    where
        F: FnOnce(&mut Note),
    {
        if self.status != NoteStatus::Draft {
            warn!(note_id = %self.note.id, status = ?self.status, "rejected amendment");
            return Err(NoteError::NoteLocked {
                status: self.status,
            });
        }
        let mut amended = self.note.clone();
        change(&mut amended);
        amended.id = self.note.id;
        amended.validate()?;
        self.note = amended;
        Ok(())
    }

    /// generate the first schedule and start accepting transactions
    pub fn activate(&mut self, time: &SafeTimeProvider) -> Result<&Schedule> {
        if self.status != NoteStatus::Draft {
            return Err(NoteError::NoteLocked {
                status: self.status,
            });
        }

        let schedule = {
            let engine = ScheduleEngine::new(&self.note, self.reference.data())?;
            engine.generate(&self.transactions)?
        };
        self.schedule = schedule;
        self.sync_generated(time);
        self.set_status(NoteStatus::Active, time);

        self.events.emit(Event::ScheduleGenerated {
            note_id: self.note.id,
            rows: self.schedule.interests.len(),
            timestamp: time.now(),
        });
        Ok(&self.schedule)
    }

    /// record a pending user transaction
    pub fn create_transaction(
        &mut self,
        transaction_type: TransactionType,
        amount: Money,
        date: NaiveDate,
        time: &SafeTimeProvider,
    ) -> Result<TransactionId> {
        if transaction_type.is_system_generated() {
            return Err(NoteError::InvalidField {
                field: "transaction_type".to_string(),
                message: format!("{} is generated by the schedule", transaction_type),
            });
        }
        self.check_terminated(date)?;
        self.require_active()?;
        self.check_amount(amount)?;
        self.check_date(date, time)?;

        let transaction = Transaction::new(self.note.id, transaction_type, amount, date);
        let id = transaction.id;
        self.events.emit(Event::TransactionCreated {
            note_id: self.note.id,
            transaction_id: id,
            transaction_type,
            amount,
            date,
            timestamp: time.now(),
        });
        self.transactions.push(transaction);
        Ok(id)
    }

    /// apply a pending transaction and recalculate from its date
    pub fn apply_transaction(&mut self, id: TransactionId, time: &SafeTimeProvider) -> Result<&Schedule> {
        let transaction = self.transaction(id)?.clone();
        if transaction.is_system_generated() {
            return Err(NoteError::SystemGeneratedTransaction { id });
        }
        if transaction.status != Status::Pending {
            return Err(NoteError::FrozenTransaction {
                id,
                status: transaction.status,
            });
        }
        self.check_terminated(transaction.date)?;
        self.require_active()?;
        self.check_open_period(transaction.date)?;
        self.check_frozen_interest(transaction.date)?;
        self.check_date(transaction.date, time)?;
        {
            let engine = ScheduleEngine::new(&self.note, self.reference.data())?;
            engine.check_refinance_date_for(&transaction)?;
        }
        if matches!(
            transaction.transaction_type,
            TransactionType::Withdrawal | TransactionType::TotalWithdrawal
        ) {
            let available = self.theoretical_balance(transaction.date);
            if transaction.amount > available {
                warn!(note_id = %self.note.id, %available, requested = %transaction.amount, "rejected withdrawal");
                return Err(NoteError::InsufficientBalance {
                    available,
                    requested: transaction.amount,
                });
            }
        }

        let mut transactions = self.transactions.clone();
        if let Some(candidate) = transactions.iter_mut().find(|t| t.id == id) {
            candidate.transition(Status::Applied)?;
            candidate.applied_sequence = Some(self.next_sequence);
        }
        self.recalculate(transactions, transaction.date, time)?;
        self.next_sequence += 1;

        info!(
            note_id = %self.note.id,
            transaction_id = %id,
            kind = %transaction.transaction_type,
            amount = %transaction.amount,
            date = %transaction.date,
            "applied transaction"
        );
        self.events.emit(Event::TransactionApplied {
            note_id: self.note.id,
            transaction_id: id,
            transaction_type: transaction.transaction_type,
            amount: transaction.amount,
            date: transaction.date,
            timestamp: time.now(),
        });

        if transaction.transaction_type == TransactionType::TotalWithdrawal {
            let settlement: Money = self
                .schedule
                .transactions_of(TransactionType::InterestDeposit)
                .filter(|t| t.date == transaction.date)
                .map(|t| t.amount)
                .sum();
            self.events.emit(Event::NoteTerminated {
                note_id: self.note.id,
                terminated_on: transaction.date,
                settlement,
                timestamp: time.now(),
            });
            self.set_status(NoteStatus::Settled, time);
        }
        Ok(&self.schedule)
    }

    /// cancel a pending transaction, or the most recent applied one
    pub fn cancel_transaction(&mut self, id: TransactionId, time: &SafeTimeProvider) -> Result<()> {
        let transaction = self.transaction(id)?.clone();
        if transaction.is_system_generated() {
            return Err(NoteError::SystemGeneratedTransaction { id });
        }

        let reopens = transaction.transaction_type == TransactionType::TotalWithdrawal
            && transaction.is_applied()
            && self.schedule.terminated_on == Some(transaction.date);
        if !reopens {
            self.require_active()?;
        }

        match transaction.status {
            Status::Pending => {
                if let Some(pending) = self.transactions.iter_mut().find(|t| t.id == id) {
                    pending.transition(Status::Canceled)?;
                }
            }
            Status::Applied => {
                if self.most_recent_applied() != Some(id) {
                    warn!(note_id = %self.note.id, transaction_id = %id, "rejected cancel of older transaction");
                    return Err(NoteError::NotMostRecentTransaction { id });
                }
                self.check_open_period(transaction.date)?;
                self.check_frozen_interest(transaction.date)?;

                let mut transactions = self.transactions.clone();
                if let Some(candidate) = transactions.iter_mut().find(|t| t.id == id) {
                    candidate.transition(Status::Canceled)?;
                }
                self.recalculate(transactions, transaction.date, time)?;
                if reopens {
                    self.set_status(NoteStatus::Active, time);
                }
            }
            Status::Canceled => {
                return Err(NoteError::FrozenTransaction {
                    id,
                    status: Status::Canceled,
                })
            }
        }

        info!(note_id = %self.note.id, transaction_id = %id, "canceled transaction");
        self.events.emit(Event::TransactionCanceled {
            note_id: self.note.id,
            transaction_id: id,
            previous_status: transaction.status,
            timestamp: time.now(),
        });
        Ok(())
    }

    /// change the amount of a pending user transaction
    pub fn update_transaction_amount(
        &mut self,
        id: TransactionId,
        amount: Money,
        time: &SafeTimeProvider,
    ) -> Result<()> {
        let note_id = self.note.id;
        let transaction = self
            .transactions
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(NoteError::TransactionNotFound { id })?;
        if transaction.is_system_generated() {
            return Err(NoteError::SystemGeneratedTransaction { id });
        }
        let old_amount = transaction.amount;
        transaction.amend_amount(amount)?;

        self.events.emit(Event::TransactionAmended {
            note_id,
            transaction_id: id,
            old_amount,
            new_amount: amount,
            timestamp: time.now(),
        });
        Ok(())
    }

    /// mark the interest row ending on `end_date` as applied
    pub fn apply_interest(&mut self, end_date: NaiveDate, time: &SafeTimeProvider) -> Result<()> {
        let note_id = self.note.id;
        let interest = self
            .schedule
            .interests
            .iter_mut()
            .find(|i| i.end_date == end_date)
            .ok_or(NoteError::InterestNotFound { end_date })?;
        if interest.status != Status::Pending {
            return Err(NoteError::FrozenInterest {
                start_date: interest.start_date,
                end_date: interest.end_date,
            });
        }
        interest.status = Status::Applied;

        self.events.emit(Event::InterestStatusChanged {
            note_id,
            end_date,
            old_status: Status::Pending,
            new_status: Status::Applied,
            timestamp: time.now(),
        });
        Ok(())
    }

    /// close a month: rows and generated transactions up to its closing date become applied
    pub fn complete_monthly_cut(&mut self, year: i32, month: u32, time: &SafeTimeProvider) -> Result<NaiveDate> {
        self.require_active()?;
        let cut = MonthlyCut::new(year, month, self.note.cut_day);
        let closing_date = cut.closing_date()?;
        if closing_date > time.now().date_naive() {
            return Err(NoteError::InvalidDate {
                date: closing_date,
                message: "monthly cut cannot close in the future".to_string(),
            });
        }

        let mut interests_applied = 0;
        for interest in self
            .schedule
            .interests
            .iter_mut()
            .filter(|i| i.end_date <= closing_date && i.status == Status::Pending)
        {
            interest.status = Status::Applied;
            interests_applied += 1;
        }

        let mut capitalized = Vec::new();
        let mut transactions_applied = 0;
        for transaction in self
            .transactions
            .iter_mut()
            .filter(|t| t.is_system_generated() && t.date <= closing_date && t.status == Status::Pending)
        {
            transaction.transition(Status::Applied)?;
            transactions_applied += 1;
            if transaction.transaction_type == TransactionType::Capitalization {
                capitalized.push((transaction.amount, transaction.date));
            }
        }
        for (amount, date) in capitalized {
            self.emit_capitalized(amount, date, time);
        }

        self.monthly_cuts.push(cut);
        info!(
            note_id = %self.note.id,
            %closing_date,
            interests_applied,
            transactions_applied,
            "completed monthly cut"
        );
        self.events.emit(Event::MonthlyCutCompleted {
            note_id: self.note.id,
            closing_date,
            interests_applied,
            transactions_applied,
            timestamp: time.now(),
        });
        Ok(closing_date)
    }

    /// principal per the schedule at `date`, ignoring the maturity payout
    pub fn theoretical_balance(&self, date: NaiveDate) -> Money {
        match self.schedule.last_settled_by(date) {
            Some(row) => {
                let bullet = AmortizationMethod::from(self.note.type_of) == AmortizationMethod::Bullet;
                if bullet && row.end_date == self.note.end_date {
                    row.current_balance + row.capital_payment
                } else {
                    row.current_balance
                }
            }
            None => self
                .transactions
                .iter()
                .filter(|t| t.drives_schedule() && t.date == self.note.start_date)
                .fold(self.note.initial_amount, |balance, t| {
                    balance + t.transaction_type.principal_effect(t.amount)
                }),
        }
    }

    /// theoretical balance plus pending user movements dated on or before `date`
    pub fn current_balance(&self, date: NaiveDate) -> Money {
        self.transactions
            .iter()
            .filter(|t| t.status == Status::Pending && !t.is_system_generated() && t.date <= date)
            .fold(self.theoretical_balance(date), |balance, t| {
                balance + t.transaction_type.principal_effect(t.amount)
            })
    }

    /// interest accrued and not yet paid as of the last row settled by `date`
    pub fn pending_interest(&self, date: NaiveDate) -> Money {
        self.schedule
            .last_settled_by(date)
            .map(|row| row.carry.undistributed())
            .unwrap_or(Money::ZERO)
    }

    /// open `child` as the renewal of `parent` at its maturity
    ///
    /// the child's principal is the parent's balance at maturity, plus the
    /// maturity interest net of iva when the child adds parent interests
    pub fn renew_from_parent(
        parent: &mut NoteLedger,
        mut child: Note,
        time: &SafeTimeProvider,
    ) -> Result<NoteLedger> {
        parent.require_active()?;
        let maturity = parent.note.end_date;
        if maturity > time.now().date_naive() {
            return Err(NoteError::InvalidDate {
                date: maturity,
                message: "parent note has not matured".to_string(),
            });
        }
        let last = parent
            .schedule
            .last()
            .filter(|row| row.end_date == maturity)
            .cloned()
            .ok_or(NoteError::InterestNotFound { end_date: maturity })?;

        let mut initial_amount = parent.theoretical_balance(maturity);
        if child.configuration.add_interests_from_parent {
            initial_amount += last.payment - last.paid_iva;
        }
        child.initial_amount = initial_amount;
        child.parent_id = Some(parent.note.id);
        child.validate()?;

        for transaction in parent.transactions.iter_mut().filter(|t| {
            t.date == maturity
                && t.status == Status::Pending
                && matches!(
                    t.transaction_type,
                    TransactionType::CapitalPayment | TransactionType::InterestDeposit
                )
        }) {
            transaction.transition(Status::Applied)?;
        }
        parent.set_status(NoteStatus::Settled, time);

        let event = Event::NoteRenewed {
            parent_id: parent.note.id,
            child_id: child.id,
            initial_amount,
            timestamp: time.now(),
        };
        parent.events.emit(event.clone());

        let mut renewed = NoteLedger::new(child, parent.reference.clone());
        renewed.events.emit(event);
        renewed.activate(time)?;
        info!(parent_id = %parent.note.id, child_id = %renewed.note.id, %initial_amount, "renewed note");
        Ok(renewed)
    }

    fn recalculate(&mut self, transactions: Vec<Transaction>, from: NaiveDate, time: &SafeTimeProvider) -> Result<()> {
        let schedule = {
            let engine = ScheduleEngine::new(&self.note, self.reference.data())?;
            recalculate_from(&engine, &self.schedule, &transactions, from)?
        };
        self.transactions = transactions;
        self.schedule = schedule;
        self.sync_generated(time);

        self.events.emit(Event::ScheduleRecalculated {
            note_id: self.note.id,
            from,
            rows: self.schedule.interests.len(),
            timestamp: time.now(),
        });
        Ok(())
    }

    /// mirror the schedule's generated transactions into the ledger
    ///
    /// records keep their id and status across recalculations; those dated on or
    /// before today are applied. an applied record is never rewritten: when its
    /// amount changes it is canceled and a replacement is booked
    fn sync_generated(&mut self, time: &SafeTimeProvider) {
        let today = time.now().date_naive();
        let note_id = self.note.id;
        let (mut previous, user): (Vec<Transaction>, Vec<Transaction>) = std::mem::take(&mut self.transactions)
            .into_iter()
            .partition(|t| t.is_system_generated());

        let fresh = |scheduled: &ScheduledTransaction| Transaction {
            id: Uuid::new_v4(),
            note_id,
            transaction_type: scheduled.transaction_type,
            amount: scheduled.amount,
            date: scheduled.date,
            status: Status::Pending,
            applied_sequence: None,
        };

        let mut generated = Vec::with_capacity(self.schedule.transactions.len());
        let mut superseded = Vec::new();
        let mut capitalized = Vec::new();
        for scheduled in &self.schedule.transactions {
            let matched = previous.iter().position(|t| {
                t.status != Status::Canceled
                    && t.transaction_type == scheduled.transaction_type
                    && t.date == scheduled.date
            });
            let mut record = match matched {
                Some(index) if previous[index].is_applied() && previous[index].amount != scheduled.amount => {
                    let mut old = previous.remove(index);
                    warn!(
                        note_id = %note_id,
                        transaction_id = %old.id,
                        old_amount = %old.amount,
                        new_amount = %scheduled.amount,
                        "replacing applied generated transaction"
                    );
                    old.status = Status::Canceled;
                    superseded.push(old);
                    fresh(scheduled)
                }
                Some(index) => {
                    let mut record = previous.remove(index);
                    record.amount = scheduled.amount;
                    record
                }
                None => fresh(scheduled),
            };
            if record.status == Status::Pending && record.date <= today {
                record.status = Status::Applied;
                if record.transaction_type == TransactionType::Capitalization {
                    capitalized.push((record.amount, record.date));
                }
            }
            generated.push(record);
        }

        for stale in previous.iter_mut().filter(|t| t.status != Status::Canceled) {
            stale.status = Status::Canceled;
        }

        self.transactions = user;
        self.transactions.extend(generated);
        self.transactions.extend(previous.into_iter());
        self.transactions.extend(superseded);
        for (amount, date) in capitalized {
            self.emit_capitalized(amount, date, time);
        }
    }

    fn emit_capitalized(&mut self, amount: Money, date: NaiveDate, time: &SafeTimeProvider) {
        self.events.emit(Event::InterestCapitalized {
            note_id: self.note.id,
            amount,
            date,
            timestamp: time.now(),
        });
    }

    fn most_recent_applied(&self) -> Option<TransactionId> {
        self.transactions
            .iter()
            .filter(|t| t.drives_schedule())
            .max_by_key(|t| t.applied_sequence)
            .map(|t| t.id)
    }

    fn set_status(&mut self, status: NoteStatus, time: &SafeTimeProvider) {
        if self.status == status {
            return;
        }
        let old_status = self.status;
        self.status = status;
        info!(note_id = %self.note.id, from = ?old_status, to = ?status, "note status changed");
        self.events.emit(Event::NoteStatusChanged {
            note_id: self.note.id,
            old_status,
            new_status: status,
            timestamp: time.now(),
        });
    }

    fn require_active(&self) -> Result<()> {
        if self.status != NoteStatus::Active {
            return Err(NoteError::NoteLocked {
                status: self.status,
            });
        }
        Ok(())
    }

    fn check_terminated(&self, date: NaiveDate) -> Result<()> {
        match self.schedule.terminated_on {
            Some(terminated_on) if date > terminated_on => {
                Err(NoteError::ScheduleTerminated { terminated_on, date })
            }
            _ => Ok(()),
        }
    }

    fn check_amount(&self, amount: Money) -> Result<()> {
        if !amount.is_positive() {
            return Err(NoteError::InvalidAmount {
                field: "amount".to_string(),
                amount,
            });
        }
        Ok(())
    }

    fn check_date(&self, date: NaiveDate, time: &SafeTimeProvider) -> Result<()> {
        if date < self.note.start_date || date > self.note.end_date {
            return Err(NoteError::InvalidDate {
                date,
                message: format!(
                    "must fall within {}..={}",
                    self.note.start_date, self.note.end_date
                ),
            });
        }
        if date > time.now().date_naive() {
            return Err(NoteError::InvalidDate {
                date,
                message: "cannot be in the future".to_string(),
            });
        }
        Ok(())
    }

    /// rows already applied cannot be reshaped by a movement dated inside them
    fn check_frozen_interest(&self, date: NaiveDate) -> Result<()> {
        match self
            .schedule
            .interests
            .iter()
            .find(|i| i.status == Status::Applied && date < i.end_date)
        {
            Some(interest) => {
                warn!(note_id = %self.note.id, %date, end_date = %interest.end_date, "rejected change under applied interest");
                Err(NoteError::FrozenInterest {
                    start_date: interest.start_date,
                    end_date: interest.end_date,
                })
            }
            None => Ok(()),
        }
    }

    fn check_open_period(&self, date: NaiveDate) -> Result<()> {
        match self.closing_date() {
            Some(closing_date) if date <= closing_date => {
                warn!(note_id = %self.note.id, %date, %closing_date, "rejected change in closed period");
                Err(NoteError::ClosedPeriod { date, closing_date })
            }
            _ => Ok(()),
        }
    }
}

/// ledger behind a lock, one writer per note at a time
#[derive(Clone)]
pub struct SharedNoteLedger {
    inner: Arc<Mutex<NoteLedger>>,
}

impl SharedNoteLedger {
    pub fn new(ledger: NoteLedger) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ledger)),
        }
    }

    /// run `f` with exclusive access to the ledger
    pub fn with<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut NoteLedger) -> Result<R>,
    {
        let mut guard = self.inner.lock().map_err(|_| NoteError::CalculationError {
            message: "note ledger lock poisoned".to_string(),
        })?;
        f(&mut guard)
    }
}
