/// capitalization - interest folded into principal every month
use chrono::NaiveDate;
use promissory_note_rs::{
    Money, Note, NoteType, Rate, ReferenceBook, ScheduleEngine, Status, Transaction,
    TransactionType,
};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let note = Note::builder()
        .type_of(NoteType::Capitalization)
        .initial_amount(Money::from_major(1_000_000))
        .interest_rate(Rate::from_percentage(20))
        .tax_percentage(Rate::from_percent_str("1.04")?)
        .dates(
            NaiveDate::from_ymd_opt(2020, 4, 8).ok_or("bad date")?,
            NaiveDate::from_ymd_opt(2021, 4, 8).ok_or("bad date")?,
        )
        .cut_day(8)
        .capitalization_periodicity(1)
        .build()?;

    // a deposit in the middle of a period splits that period in two
    let mut deposit = Transaction::new(
        note.id,
        TransactionType::Deposit,
        Money::from_major(50_000),
        NaiveDate::from_ymd_opt(2020, 11, 15).ok_or("bad date")?,
    );
    deposit.transition(Status::Applied)?;
    deposit.applied_sequence = Some(1);

    let reference = ReferenceBook::empty();
    let schedule = ScheduleEngine::new(&note, reference.data())?.generate(&[deposit])?;

    println!("=== capitalization note ===\n");
    for row in &schedule.interests {
        println!(
            "#{:<2} {} -> {}  capitalized {:>11}  balance {:>14}",
            row.interval_id,
            row.start_date,
            row.end_date,
            row.capitalization_accumulated.round_cents(),
            row.current_balance.round_cents(),
        );
    }

    println!("\ngenerated transactions:");
    for tx in &schedule.transactions {
        println!("  {} {:<16} {}", tx.date, tx.transaction_type.to_string(), tx.amount.round_cents());
    }

    Ok(())
}
