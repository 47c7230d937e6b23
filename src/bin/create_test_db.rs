use std::{error::Error, path::Path, process::exit, str::FromStr};

use clap::Parser;
use email_address::EmailAddress;
use rusqlite::Connection;
use time::{Duration, OffsetDateTime};

use tally::{
    AccountKind, CategoryKind, CategoryName, DayOfMonth, MonthlyPaymentBuilder, PasswordHash,
    TransactionBuilder, TransactionKind, ValidatedPassword, create_account, create_category,
    create_monthly_payment, create_transaction, create_user, initialize_db,
};

/// A utility for creating a test database for the tally web server.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Creating test user...");

    let password_hash = PasswordHash::new(
        ValidatedPassword::new_unchecked("test"),
        PasswordHash::DEFAULT_COST,
    )?;
    let user = create_user(EmailAddress::from_str("test@example.com")?, password_hash, &conn)?;

    println!("Creating categories and an account...");

    let salary = create_category(user.id, CategoryName::new("Salary")?, CategoryKind::Income, &conn)?;
    let rent = create_category(user.id, CategoryName::new("Rent")?, CategoryKind::Expense, &conn)?;
    let groceries =
        create_category(user.id, CategoryName::new("Groceries")?, CategoryKind::Expense, &conn)?;
    let streaming =
        create_category(user.id, CategoryName::new("Streaming")?, CategoryKind::Expense, &conn)?;
    let account = create_account(user.id, "Everyday", AccountKind::Debit, 1500.0, &conn)?;

    println!("Creating monthly payments...");

    create_monthly_payment(
        user.id,
        MonthlyPaymentBuilder::new("Rent", 1200.0, DayOfMonth::new(1)?)?
            .category_id(Some(rent.id))
            .account_id(Some(account.id)),
        &conn,
    )?;
    create_monthly_payment(
        user.id,
        MonthlyPaymentBuilder::new("Streaming subscription", 15.99, DayOfMonth::new(20)?)?
            .category_id(Some(streaming.id))
            .account_id(Some(account.id))
            .notes(Some("Family plan")),
        &conn,
    )?;

    println!("Creating transactions...");

    let today = OffsetDateTime::now_utc().date();
    let transactions = [
        (TransactionKind::Income, 3200.0, 20, "Pay", Some(salary.id)),
        (TransactionKind::Expense, 1200.0, 15, "Rent", Some(rent.id)),
        (TransactionKind::Expense, 84.2, 9, "Supermarket", Some(groceries.id)),
        (TransactionKind::Expense, 42.75, 2, "Farmers market", Some(groceries.id)),
        (TransactionKind::Transfer, 300.0, 1, "To savings", None),
    ];

    for (kind, amount, days_ago, description, category_id) in transactions {
        create_transaction(
            user.id,
            TransactionBuilder::new(kind, amount, account.id)
                .date(today - Duration::days(days_ago))
                .description(description)
                .category_id(category_id),
            &conn,
        )?;
    }

    println!("Success! Log in with test@example.com and the password \"test\".");

    Ok(())
}
