use chrono::{Datelike, Duration, Months, NaiveDate};

use crate::errors::{NoteError, Result};
use crate::note::Note;
use crate::reference::HolidayCalendar;

/// upper bound on scheduled cuts for one note
pub const MAX_CUTS: u32 = 10_000;

/// scheduled cut dates after `start_date`, always ending with `end_date`
pub fn scheduled_cuts(note: &Note, calendar: &dyn HolidayCalendar) -> Result<Vec<NaiveDate>> {
    let config = &note.configuration;
    let step = note.step_months()?;
    let anchor_day = if config.payment_on_subscription_date {
        note.start_date.day()
    } else {
        note.cut_day
    };

    let mut cuts = Vec::new();
    let mut previous = note.start_date;

    for k in 1..=MAX_CUTS + 1 {
        if k > MAX_CUTS {
            return Err(NoteError::NonTerminatingSchedule {
                message: format!("more than {} cuts between {} and {}", MAX_CUTS, note.start_date, note.end_date),
            });
        }

        let raw = match config.n_days {
            Some(days) => note.start_date + Duration::days(i64::from(days) * i64::from(step) * i64::from(k)),
            None => month_anchor(note.start_date, step * k, anchor_day)?,
        };
        if raw >= note.end_date {
            break;
        }

        let cut = calendar.adjust(raw, config.interval_skip_day)?;
        if cut >= note.end_date {
            break;
        }
        // a cut pulled back onto the previous boundary merges into the next row
        if cut <= previous {
            continue;
        }

        cuts.push(cut);
        previous = cut;
    }

    cuts.push(note.end_date);
    Ok(cuts)
}

/// consecutive (start, end) pairs from start_date to end_date, before event splitting
pub fn cut_into_intervals(
    note: &Note,
    calendar: &dyn HolidayCalendar,
) -> Result<Vec<(NaiveDate, NaiveDate)>> {
    let cuts = scheduled_cuts(note, calendar)?;
    let mut start = note.start_date;
    Ok(cuts
        .into_iter()
        .map(|end| {
            let pair = (start, end);
            start = end;
            pair
        })
        .collect())
}

/// day `anchor_day` of the month `months` after `start`, clamped to month end
fn month_anchor(start: NaiveDate, months: u32, anchor_day: u32) -> Result<NaiveDate> {
    let first = NaiveDate::from_ymd_opt(start.year(), start.month(), 1)
        .and_then(|d| d.checked_add_months(Months::new(months)))
        .ok_or_else(|| NoteError::CalculationError {
            message: format!("date overflow stepping {} months from {}", months, start),
        })?;
    let last_day = last_day_of_month(first)?;
    first
        .with_day(anchor_day.min(last_day))
        .ok_or_else(|| NoteError::CalculationError {
            message: format!("invalid anchor day {} for {}", anchor_day, first),
        })
}

fn last_day_of_month(first: NaiveDate) -> Result<u32> {
    first
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .map(|last| last.day())
        .ok_or_else(|| NoteError::CalculationError {
            message: format!("date overflow at {}", first),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{NoteConfiguration, SkipDay};
    use crate::decimal::{Money, Rate};
    use crate::reference::{HolidaySet, NoHolidays};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn note(start: NaiveDate, end: NaiveDate, cut_day: u32, config: NoteConfiguration) -> Note {
        Note::builder()
            .initial_amount(Money::from_major(10_000_000))
            .interest_rate(Rate::from_percentage(12))
            .dates(start, end)
            .cut_day(cut_day)
            .monthly_periodicity(1)
            .configuration(config)
            .build()
            .unwrap()
    }

    #[test]
    fn test_month_end_cuts() {
        let note = note(date(2019, 1, 15), date(2020, 1, 15), 31, NoteConfiguration::default());
        let intervals = cut_into_intervals(&note, &NoHolidays).unwrap();

        assert_eq!(intervals.len(), 12);
        let ends: Vec<NaiveDate> = intervals.iter().map(|(_, end)| *end).collect();
        assert_eq!(
            ends,
            vec![
                date(2019, 2, 28),
                date(2019, 3, 31),
                date(2019, 4, 30),
                date(2019, 5, 31),
                date(2019, 6, 30),
                date(2019, 7, 31),
                date(2019, 8, 31),
                date(2019, 9, 30),
                date(2019, 10, 31),
                date(2019, 11, 30),
                date(2019, 12, 31),
                date(2020, 1, 15),
            ]
        );
        assert_eq!(intervals[0].0, date(2019, 1, 15));
        for pair in intervals.windows(2) {
            assert_eq!(pair[0].1, pair[1].0);
        }
    }

    #[test]
    fn test_pre_weekend_shift() {
        let config = NoteConfiguration {
            interval_skip_day: SkipDay::PreWeekend,
            ..NoteConfiguration::default()
        };
        let note = note(date(2019, 7, 15), date(2019, 10, 15), 31, config);
        let cuts = scheduled_cuts(&note, &NoHolidays).unwrap();

        // 2019-08-31 is a saturday
        assert_eq!(cuts, vec![date(2019, 8, 30), date(2019, 9, 30), date(2019, 10, 15)]);
    }

    #[test]
    fn test_pre_weekend_cut_onto_start_merges_into_next_row() {
        let config = NoteConfiguration {
            interval_skip_day: SkipDay::PreWeekend,
            ..NoteConfiguration::default()
        };
        // friday start; saturday 2020-02-01 pulls back onto it, sunday 2020-03-01 onto friday 28th
        let note = note(date(2020, 1, 31), date(2020, 4, 30), 1, config);
        let cuts = scheduled_cuts(&note, &NoHolidays).unwrap();

        assert_eq!(cuts, vec![date(2020, 2, 28), date(2020, 4, 1), date(2020, 4, 30)]);
        let intervals = cut_into_intervals(&note, &NoHolidays).unwrap();
        assert_eq!(intervals[0], (date(2020, 1, 31), date(2020, 2, 28)));
    }

    #[test]
    fn test_post_weekend_and_holiday_shift() {
        let config = NoteConfiguration {
            interval_skip_day: SkipDay::PostWeekendAndHoliday,
            ..NoteConfiguration::default()
        };
        let calendar = HolidaySet::new("mx").with_holiday(date(2019, 9, 16));
        let note = note(date(2019, 8, 14), date(2019, 10, 1), 14, config);
        let cuts = scheduled_cuts(&note, &calendar).unwrap();

        // 2019-09-14 saturday -> monday 16th is a holiday -> tuesday
        assert_eq!(cuts, vec![date(2019, 9, 17), date(2019, 10, 1)]);
    }

    #[test]
    fn test_n_days_override() {
        let config = NoteConfiguration {
            n_days: Some(28),
            ..NoteConfiguration::default()
        };
        let note = note(date(2020, 1, 1), date(2020, 3, 1), 31, config);
        let cuts = scheduled_cuts(&note, &NoHolidays).unwrap();

        assert_eq!(cuts, vec![date(2020, 1, 29), date(2020, 2, 26), date(2020, 3, 1)]);
    }

    #[test]
    fn test_subscription_day_anchor() {
        let config = NoteConfiguration {
            payment_on_subscription_date: true,
            ..NoteConfiguration::default()
        };
        let note = note(date(2020, 1, 10), date(2020, 4, 10), 31, config);
        let cuts = scheduled_cuts(&note, &NoHolidays).unwrap();

        assert_eq!(cuts, vec![date(2020, 2, 10), date(2020, 3, 10), date(2020, 4, 10)]);
    }

    #[test]
    fn test_cut_shifted_past_end_is_dropped() {
        let config = NoteConfiguration {
            interval_skip_day: SkipDay::PostWeekend,
            ..NoteConfiguration::default()
        };
        // 2019-08-31 saturday shifts to monday 2019-09-02, past the end
        let note = note(date(2019, 7, 31), date(2019, 9, 1), 31, config);
        let cuts = scheduled_cuts(&note, &NoHolidays).unwrap();

        assert_eq!(cuts, vec![date(2019, 9, 1)]);
    }
}
