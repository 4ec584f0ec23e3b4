/// json schedule - floating rate note rendered as json
use chrono::{NaiveDate, TimeZone, Utc};
use std::sync::Arc;
use promissory_note_rs::{
    FloatingRate, Money, Note, NoteLedger, NoteType, NoteView, NoHolidays, Rate, RateSeries,
    ReferenceBook, SafeTimeProvider, TaxTable, TimeSource,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2021, 2, 1, 0, 0, 0).unwrap(),
    ));

    let start = NaiveDate::from_ymd_opt(2021, 1, 4).ok_or("bad date")?;
    let rates = RateSeries::new()
        .with_fixing("tiie", NaiveDate::from_ymd_opt(2020, 12, 30).ok_or("bad date")?, Rate::from_percent_str("4.48")?)
        .with_fixing("tiie", NaiveDate::from_ymd_opt(2021, 2, 3).ok_or("bad date")?, Rate::from_percent_str("4.36")?)
        .with_fixing("tiie", NaiveDate::from_ymd_opt(2021, 3, 3).ok_or("bad date")?, Rate::from_percent_str("4.25")?);
    let taxes = TaxTable::new().with_year(2021, Rate::from_percent_str("0.97")?);
    let reference = ReferenceBook::new(Arc::new(NoHolidays), Arc::new(taxes), Arc::new(rates));

    let mut note = Note::builder()
        .type_of(NoteType::Simple)
        .initial_amount(Money::from_major(500_000))
        .floating_rate(FloatingRate {
            label: "TIIE".to_string(),
            additional_rate: Rate::from_percentage(2),
            floor: Some(Rate::from_percent_str("4.4")?),
            ceiling: None,
            variable_rate_date: start,
        })
        .dates(start, NaiveDate::from_ymd_opt(2021, 4, 4).ok_or("bad date")?)
        .cut_day(4)
        .monthly_periodicity(1)
        .build()?;
    note.configuration.fixed_retention = false;

    let mut ledger = NoteLedger::new(note, reference);
    ledger.activate(&time)?;

    println!("{}", NoteView::from_ledger(&ledger).to_json_pretty()?);

    Ok(())
}
