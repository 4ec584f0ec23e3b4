/// transactions - ledger lifecycle with test time
use chrono::{Duration, NaiveDate, TimeZone, Utc};
use promissory_note_rs::{
    Money, Note, NoteLedger, NoteType, Rate, ReferenceBook, SafeTimeProvider, TimeSource,
    TransactionType,
};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2022, 1, 10, 9, 0, 0).unwrap(),
    ));
    let controller = time.test_control().unwrap();

    let note = Note::builder()
        .type_of(NoteType::Simple)
        .initial_amount(Money::from_major(250_000))
        .interest_rate(Rate::from_percentage(11))
        .tax_percentage(Rate::from_percent_str("0.97")?)
        .dates(
            NaiveDate::from_ymd_opt(2022, 1, 10).ok_or("bad date")?,
            NaiveDate::from_ymd_opt(2022, 7, 10).ok_or("bad date")?,
        )
        .cut_day(10)
        .monthly_periodicity(1)
        .build()?;

    let mut ledger = NoteLedger::new(note, ReferenceBook::empty());
    ledger.activate(&time)?;

    controller.advance(Duration::days(60));
    let on = NaiveDate::from_ymd_opt(2022, 2, 25).ok_or("bad date")?;
    let deposit = ledger.create_transaction(TransactionType::Deposit, Money::from_major(50_000), on, &time)?;
    ledger.apply_transaction(deposit, &time)?;
    println!("balance after deposit: {}", ledger.theoretical_balance(on));

    // more than the balance is rejected on the amount field
    let withdrawal = ledger.create_transaction(
        TransactionType::Withdrawal,
        Money::from_major(400_000),
        NaiveDate::from_ymd_opt(2022, 3, 1).ok_or("bad date")?,
        &time,
    )?;
    if let Err(err) = ledger.apply_transaction(withdrawal, &time) {
        println!("withdrawal rejected on {:?}: {}", err.field(), err);
        ledger.cancel_transaction(withdrawal, &time)?;
    }

    let closing = ledger.complete_monthly_cut(2022, 2, &time)?;
    println!("closed february on {}", closing);

    for event in ledger.events.take_events() {
        println!("{:?}", event);
    }

    Ok(())
}
