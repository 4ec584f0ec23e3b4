use chrono::NaiveDate;
use tracing::info;

use crate::errors::Result;
use crate::interval::IntervalPlan;
use crate::schedule::engine::book_single_commission;
use crate::schedule::{Interest, Schedule, ScheduleEngine};
use crate::transaction::Transaction;

/// regenerate `previous` for a changed transaction set, keeping rows that end before `date`
///
/// a row ending on `date` is regenerated since movements dated `date` settle at
/// its end; kept rows are trimmed back until the last one ends on a boundary of
/// the new grid
pub fn recalculate_from(
    engine: &ScheduleEngine<'_>,
    previous: &Schedule,
    transactions: &[Transaction],
    date: NaiveDate,
) -> Result<Schedule> {
    let plan = engine.plan(transactions)?;

    let mut kept: Vec<Interest> = previous
        .interests
        .iter()
        .take_while(|i| i.end_date < date)
        .cloned()
        .collect();

    while let Some(last) = kept.last() {
        if let Some(from) = resume_index(&plan, last) {
            let tail = engine.resume(&plan, from, last)?;
            let resumed_at = last.end_date;

            let mut transactions: Vec<_> = previous
                .transactions
                .iter()
                .filter(|t| t.date <= resumed_at)
                .cloned()
                .collect();
            transactions.extend(tail.transactions);

            let mut interests = kept;
            interests.extend(tail.interests);
            carry_statuses(previous, &mut interests);
            book_single_commission(engine.note(), &mut interests);

            info!(
                note_id = %engine.note().id,
                from = %date,
                resumed_at = %resumed_at,
                rows = interests.len(),
                "recalculated schedule"
            );
            return Ok(Schedule {
                interests,
                transactions,
                terminated_on: plan.terminated_on,
            });
        }
        kept.pop();
    }

    let mut schedule = engine.generate_plan(&plan)?;
    carry_statuses(previous, &mut schedule.interests);
    Ok(schedule)
}

/// regenerate every row, keeping the status of rows whose period is unchanged
pub fn recalculate_from_beginning(
    engine: &ScheduleEngine<'_>,
    previous: &Schedule,
    transactions: &[Transaction],
) -> Result<Schedule> {
    let mut schedule = engine.generate(transactions)?;
    carry_statuses(previous, &mut schedule.interests);
    Ok(schedule)
}

/// index of the first planned row after `last`, if `last` is a row of `plan`
fn resume_index(plan: &IntervalPlan, last: &Interest) -> Option<usize> {
    let from = plan
        .intervals
        .iter()
        .take_while(|row| row.end_date <= last.end_date)
        .count();
    let aligned = from
        .checked_sub(1)
        .and_then(|i| plan.intervals.get(i))
        .map(|row| row.start_date == last.start_date && row.end_date == last.end_date)
        .unwrap_or(false);
    aligned.then_some(from)
}

fn carry_statuses(previous: &Schedule, interests: &mut [Interest]) {
    for interest in interests.iter_mut() {
        if let Some(old) = previous.interests.iter().find(|old| old.same_period(interest)) {
            interest.status = old.status;
        }
    }
}
