use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use time::{Duration, OffsetDateTime};

use budget_tracker::{
    CategoryName, Frequency, NewRecurringRule, Transaction, TransactionType, UserID,
    stores::{CategoryStore, RecurringRuleStore, TransactionStore, sqlite::SQLiteStores},
};

/// A utility for creating a test database for the budget tracker.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,

    /// The user that owns the sample records.
    #[arg(long, default_value_t = 1)]
    user_id: i64,
}

const CATEGORIES: [(&str, TransactionType); 6] = [
    ("Salary", TransactionType::Income),
    ("Freelance", TransactionType::Income),
    ("Groceries", TransactionType::Expense),
    ("Rent", TransactionType::Expense),
    ("Eating Out", TransactionType::Expense),
    ("Subscriptions", TransactionType::Expense),
];

/// (days ago, type, amount, category, description)
const TRANSACTIONS: [(i64, TransactionType, f64, &str, Option<&str>); 8] = [
    (0, TransactionType::Expense, 12.5, "Eating Out", Some("Coffee and a bagel")),
    (1, TransactionType::Expense, 84.3, "Groceries", Some("Weekly shop")),
    (3, TransactionType::Income, 450.0, "Freelance", Some("Logo design")),
    (6, TransactionType::Expense, 1200.0, "Rent", None),
    (8, TransactionType::Expense, 67.95, "Groceries", None),
    (14, TransactionType::Income, 3200.0, "Salary", Some("Fortnightly pay")),
    (20, TransactionType::Expense, 45.0, "Eating Out", Some("Dinner with friends")),
    (40, TransactionType::Expense, 1200.0, "Rent", None),
];

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
    let stores = SQLiteStores::new(Connection::open(output_path)?)?;
    let owner_id = UserID::new(args.user_id);
    let today = OffsetDateTime::now_utc().date();

    println!("Creating categories...");
    for (name, kind) in CATEGORIES {
        stores
            .categories
            .create(owner_id, CategoryName::new(name)?, kind)?;
    }

    println!("Creating transactions...");
    for (days_ago, kind, amount, category, description) in TRANSACTIONS {
        let builder = Transaction::build(
            owner_id,
            kind,
            amount,
            today - Duration::days(days_ago),
            category,
        )?
        .description(description);

        stores.transactions.create(builder)?;
    }

    println!("Creating recurring rule...");
    let rule = NewRecurringRule::new(
        owner_id,
        TransactionType::Expense,
        15.99,
        "Subscriptions",
        Frequency::Monthly,
        today - Duration::days(10),
        false,
    )?
    .description(Some("Music streaming"));
    stores.recurring_rules.create(rule)?;

    println!("Success!");

    Ok(())
}
