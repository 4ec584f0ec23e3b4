use chrono::NaiveDate;
use std::collections::BTreeSet;
use tracing::debug;

use crate::errors::{NoteError, Result};
use crate::interval::{scheduled_cuts, IntervalPlan, PlannedInterval};
use crate::note::Note;
use crate::reference::HolidayCalendar;
use crate::transaction::Transaction;
use crate::types::TransactionType;

/// split the cut grid at every applied user transaction
///
/// transactions settle at the end of the row that ends on their date; a total
/// withdrawal truncates the grid; a transaction on end_date adds a zero-length
/// maturity row after it
pub fn plan_intervals(
    note: &Note,
    transactions: &[Transaction],
    calendar: &dyn HolidayCalendar,
) -> Result<IntervalPlan> {
    let cuts = scheduled_cuts(note, calendar)?;

    let mut events: Vec<Transaction> = transactions
        .iter()
        .filter(|t| t.drives_schedule() && t.note_id == note.id)
        .cloned()
        .collect();
    events.sort_by_key(|t| (t.date, t.applied_sequence.unwrap_or(u64::MAX)));

    for event in &events {
        if event.date < note.start_date || event.date > note.end_date {
            return Err(NoteError::InvalidDate {
                date: event.date,
                message: format!(
                    "{} must fall within {}..={}",
                    event.transaction_type, note.start_date, note.end_date
                ),
            });
        }
    }

    let terminated_on = events
        .iter()
        .find(|t| t.transaction_type == TransactionType::TotalWithdrawal)
        .map(|t| t.date);
    if let Some(terminated_on) = terminated_on {
        if let Some(late) = events.iter().find(|t| t.date > terminated_on) {
            return Err(NoteError::ScheduleTerminated {
                terminated_on,
                date: late.date,
            });
        }
    }
    let effective_end = terminated_on.unwrap_or(note.end_date);

    let (opening_events, events): (Vec<Transaction>, Vec<Transaction>) = events
        .into_iter()
        .partition(|t| t.date == note.start_date && terminated_on != Some(note.start_date));

    let cut_set: BTreeSet<NaiveDate> = cuts.iter().copied().collect();
    let mut boundaries: BTreeSet<NaiveDate> = cuts
        .iter()
        .copied()
        .filter(|d| *d <= effective_end)
        .collect();
    boundaries.extend(events.iter().map(|t| t.date).filter(|d| *d > note.start_date));
    boundaries.insert(effective_end);

    let mut intervals = Vec::with_capacity(boundaries.len() + 1);
    let mut start = note.start_date;
    let mut start_is_event = false;

    for end in boundaries {
        let interval_id = cut_set.range(..end).count() as u32 + 1;
        let settling: Vec<Transaction> = events.iter().filter(|t| t.date == end).cloned().collect();
        let is_event = !settling.is_empty();

        intervals.push(PlannedInterval {
            interval_id,
            start_date: start,
            end_date: end,
            scheduled_cut: cut_set.contains(&end),
            starts_at_event: start_is_event,
            maturity: false,
            terminal: terminated_on == Some(end),
            events: settling,
        });

        start_is_event = is_event && !cut_set.contains(&end);
        start = end;
    }

    match intervals.last_mut() {
        Some(last) if terminated_on.is_none() && !last.events.is_empty() => {
            let interval_id = last.interval_id;
            intervals.push(PlannedInterval {
                interval_id,
                start_date: note.end_date,
                end_date: note.end_date,
                scheduled_cut: false,
                starts_at_event: true,
                maturity: true,
                terminal: false,
                events: Vec::new(),
            });
        }
        Some(last) if terminated_on.is_none() => last.maturity = true,
        _ => {}
    }

    debug!(
        note_id = %note.id,
        rows = intervals.len(),
        events = transactions.len(),
        "planned interval grid"
    );

    Ok(IntervalPlan {
        opening_events,
        intervals,
        terminated_on,
    })
}
