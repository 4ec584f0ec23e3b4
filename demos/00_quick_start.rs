/// quick start - minimal example to get started
use chrono::NaiveDate;
use promissory_note_rs::{Money, Note, NoteType, Rate, ReferenceBook, ScheduleEngine};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // a one-year simple note paying interest on the last day of every month
    let note = Note::builder()
        .type_of(NoteType::Simple)
        .initial_amount(Money::from_major(10_000_000))
        .interest_rate(Rate::from_percentage(12))
        .tax_percentage(Rate::from_percent_str("1.04")?)
        .dates(
            NaiveDate::from_ymd_opt(2019, 1, 15).ok_or("bad date")?,
            NaiveDate::from_ymd_opt(2020, 1, 15).ok_or("bad date")?,
        )
        .cut_day(31)
        .monthly_periodicity(1)
        .build()?;

    let reference = ReferenceBook::empty();
    let schedule = ScheduleEngine::new(&note, reference.data())?.generate(&[])?;

    for row in &schedule.interests {
        println!(
            "{} -> {}  {:>3} days  gross {:>12}  tax {:>10}  net {:>12}",
            row.start_date,
            row.end_date,
            row.number_of_days,
            row.gross.round_cents(),
            row.tax.round_cents(),
            row.net.round_cents(),
        );
    }
    println!("total net interest: {}", schedule.total_net().round_cents());

    Ok(())
}
