/// french amortization - constant installment with a refinance on a cut date
use chrono::NaiveDate;
use promissory_note_rs::{
    Money, Note, NoteType, Rate, ReferenceBook, ScheduleEngine, Status, Transaction,
    TransactionType,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let note = Note::builder()
        .type_of(NoteType::FrenchAmortization)
        .initial_amount(Money::from_major(120_000))
        .interest_rate(Rate::from_percentage(12))
        .tax_percentage(Rate::from_percent_str("1.04")?)
        .dates(
            NaiveDate::from_ymd_opt(2022, 1, 15).ok_or("bad date")?,
            NaiveDate::from_ymd_opt(2023, 1, 15).ok_or("bad date")?,
        )
        .cut_day(15)
        .monthly_periodicity(1)
        .build()?;

    let reference = ReferenceBook::empty();
    let engine = ScheduleEngine::new(&note, reference.data())?;

    println!("=== initial plan ===");
    print_rows(&engine.generate(&[])?.interests);

    // refinancing is only allowed on a cut date
    let off_cut = NaiveDate::from_ymd_opt(2022, 6, 20).ok_or("bad date")?;
    if let Err(err) = engine.check_refinance_date(off_cut) {
        println!("\n{} rejected: {}", off_cut, err);
    }

    let mut deposit = Transaction::new(
        note.id,
        TransactionType::Deposit,
        Money::from_major(30_000),
        NaiveDate::from_ymd_opt(2022, 6, 15).ok_or("bad date")?,
    );
    deposit.transition(Status::Applied)?;
    deposit.applied_sequence = Some(1);

    println!("\n=== after a 30,000 deposit on 2022-06-15 ===");
    print_rows(&engine.generate(&[deposit])?.interests);

    Ok(())
}

fn print_rows(rows: &[promissory_note_rs::Interest]) {
    for row in rows {
        println!(
            "{}  interest {:>9}  capital {:>10}  term {:>10}  balance {:>11}",
            row.end_date,
            row.gross.round_cents(),
            row.capital_payment.round_cents(),
            (row.gross + row.capital_payment).round_cents(),
            row.current_balance.round_cents(),
        );
    }
}
