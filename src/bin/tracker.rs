use std::{
    fs::{File, OpenOptions},
    io::{self, Write},
    path::PathBuf,
    process::ExitCode,
    sync::Arc,
};

use clap::{Args as ClapArgs, Parser, Subcommand};
use rusqlite::Connection;
use serde::Serialize;
use time::{Date, Duration, macros::format_description};
use tracing_subscriber::{EnvFilter, Layer, filter, layer::SubscriberExt, util::SubscriberInitExt};

use budget_tracker::{
    CategoryFilter, CategoryName, Error, Filters, Sort, SortDirection, SortKey, Timeframe,
    TransactionForm, TransactionType, UserID, compute_next_occurrence,
    create_transaction_from_form, export::write_csv, format::format_currency, format::format_date,
    get_local_offset, local_today, query_transactions,
    stores::{CategoryStore, RecurringRuleStore, TransactionStore, sqlite::SQLiteStores},
};

/// Record and review income and expenses from the command line.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long)]
    db_path: PathBuf,

    /// The canonical name of the timezone that decides what "today" is, e.g.
    /// "Pacific/Auckland".
    #[arg(long, default_value = "Etc/UTC")]
    timezone: String,

    /// The user that owns the records.
    #[arg(long, default_value_t = 1)]
    user_id: i64,

    /// The log level used when `RUST_LOG` is not set.
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Also write debug logs to this file.
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Print results as JSON.
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Manage categories.
    #[command(subcommand)]
    Category(CategoryCommand),

    /// Record a transaction, optionally repeating.
    Add {
        /// Either "income" or "expense".
        #[arg(long = "type")]
        kind: String,

        /// The amount, a number greater than zero.
        #[arg(long)]
        amount: String,

        /// The category name.
        #[arg(long)]
        category: String,

        /// The date in the format YYYY-MM-DD, defaults to today.
        #[arg(long)]
        date: Option<String>,

        /// What the transaction was for.
        #[arg(long)]
        description: Option<String>,

        /// Repeat the transaction at this frequency: weekly, monthly or yearly.
        #[arg(long)]
        repeat: Option<String>,
    },

    /// List transactions.
    List(QueryArgs),

    /// Delete a transaction.
    Delete {
        /// The ID of the transaction.
        id: i64,
    },

    /// Write transactions as CSV.
    Export {
        #[command(flatten)]
        query: QueryArgs,

        /// The file to write to, defaults to standard output.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Review recurring transactions.
    #[command(subcommand)]
    Recurring(RecurringCommand),

    /// Print the date after `date` for a frequency.
    Next {
        /// A date in the format YYYY-MM-DD.
        #[arg(value_parser = parse_date)]
        date: Date,

        /// One of weekly, monthly or yearly.
        frequency: String,
    },
}

#[derive(Subcommand, Debug)]
enum CategoryCommand {
    /// Create a category.
    Add {
        /// The display name.
        name: CategoryName,

        /// Either "income" or "expense".
        #[arg(long = "type")]
        kind: TransactionType,
    },

    /// List categories.
    List {
        /// Only list categories of this type.
        #[arg(long = "type")]
        kind: Option<TransactionType>,
    },

    /// Rename a category. Recorded transactions keep the old name.
    Rename {
        /// The ID of the category.
        id: i64,

        /// The new display name.
        name: CategoryName,
    },

    /// Delete a category. Recorded transactions keep its name.
    Delete {
        /// The ID of the category.
        id: i64,
    },
}

#[derive(Subcommand, Debug)]
enum RecurringCommand {
    /// List recurring rules.
    List,

    /// List the due dates of active rules.
    Upcoming {
        /// The last date to list, defaults to 30 days from today.
        #[arg(long, value_parser = parse_date)]
        until: Option<Date>,
    },
}

#[derive(ClapArgs, Debug)]
struct QueryArgs {
    /// Only show transactions containing this text.
    #[arg(long, default_value = "")]
    search: String,

    /// Only show this category, "all" shows every category.
    #[arg(long, default_value = CategoryFilter::ALL)]
    category: CategoryFilter,

    /// One of week, month or all.
    #[arg(long, default_value = "all")]
    timeframe: Timeframe,

    /// Only show income or only show expenses.
    #[arg(long = "type")]
    kind: Option<TransactionType>,

    /// One of date, amount, category or description.
    #[arg(long, default_value = "date")]
    sort: SortKey,

    /// Either asc or desc.
    #[arg(long, default_value = "desc")]
    direction: SortDirection,
}

impl QueryArgs {
    fn filters(&self) -> Filters {
        Filters {
            search: self.search.clone(),
            category: self.category.clone(),
            timeframe: self.timeframe,
            kind: self.kind,
        }
    }

    fn sort(&self) -> Sort {
        Sort::new(self.sort, self.direction)
    }
}

fn parse_date(text: &str) -> Result<Date, Error> {
    Date::parse(text, format_description!("[year]-[month]-[day]"))
        .map_err(|_| Error::InvalidDate(text.to_owned()))
}

fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(error) = setup_logging(&args.log_level, args.log_file.as_ref()) {
        eprintln!("Could not open log file: {error}");
        return ExitCode::FAILURE;
    }

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::debug!("command failed: {error:?}");
            eprintln!("Error: {error}");
            ExitCode::FAILURE
        }
    }
}

fn setup_logging(log_level: &str, log_file: Option<&PathBuf>) -> Result<(), io::Error> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let stderr_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_writer(io::stderr)
        .with_filter(env_filter);

    let debug_log = match log_file {
        Some(path) => {
            let log_file = OpenOptions::new().create(true).append(true).open(path)?;

            Some(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_ansi(false)
                    .with_writer(Arc::new(log_file))
                    .with_filter(filter::LevelFilter::DEBUG),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(stderr_log)
        .with(debug_log)
        .init();

    Ok(())
}

fn print<T: Serialize>(json: bool, value: &T, text: impl FnOnce() -> String) -> Result<(), Error> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        println!("{}", text());
    }

    Ok(())
}

fn run(args: Args) -> Result<(), Error> {
    let local_offset = get_local_offset(&args.timezone)?;
    let today = local_today(local_offset);
    let owner_id = UserID::new(args.user_id);
    let json = args.json;

    // Pure date arithmetic needs no database.
    if let Command::Next { date, frequency } = &args.command {
        let next = compute_next_occurrence(*date, frequency)?;
        return print(json, &next, || next.to_string());
    }

    let connection = Connection::open(&args.db_path)?;
    let stores = SQLiteStores::new(connection)?;

    tracing::debug!(
        "opened {} for user {} on {}",
        args.db_path.display(),
        owner_id,
        today
    );

    match args.command {
        Command::Category(command) => run_category(command, owner_id, json, &stores),
        Command::Add {
            kind,
            amount,
            category,
            date,
            description,
            repeat,
        } => {
            let form = TransactionForm {
                kind,
                amount,
                category,
                date: date.unwrap_or_else(|| today.to_string()),
                description,
                recurring: repeat.is_some(),
                frequency: repeat,
            };

            let created = create_transaction_from_form(&form, owner_id, today, &stores)?;

            print(json, &created, || {
                let mut lines = Vec::new();

                if let Some(transaction) = &created.transaction {
                    lines.push(format!("Recorded transaction {}", transaction.id));
                }

                if let Some(rule) = &created.recurring_rule {
                    lines.push(format!(
                        "Saved {} rule {}, next due {}",
                        rule.frequency,
                        rule.id,
                        format_date(rule.next_due_date)
                    ));
                }

                lines.join("\n")
            })
        }
        Command::List(query) => {
            let transactions = stores.transactions.get_by_owner(owner_id)?;
            let result = query_transactions(&transactions, &query.filters(), query.sort(), today);

            print(json, &result, || {
                let mut lines: Vec<String> = result
                    .rows
                    .iter()
                    .map(|transaction| {
                        format!(
                            "{:>5}  {:<10}  {:<7}  {:<16}  {:>12}  {}",
                            transaction.id,
                            format_date(transaction.date),
                            transaction.kind,
                            transaction.category,
                            format_currency(transaction.amount),
                            transaction.description.as_deref().unwrap_or_default()
                        )
                    })
                    .collect();

                lines.push(format!("Total: {}", format_currency(result.total)));
                lines.extend(result.totals_by_category.iter().map(|total| {
                    format!("  {}: {}", total.category, format_currency(total.amount))
                }));

                lines.join("\n")
            })
        }
        Command::Delete { id } => {
            stores.transactions.delete(owner_id, id)?;

            print(json, &id, || format!("Deleted transaction {id}"))
        }
        Command::Export { query, output } => {
            let transactions = stores.transactions.get_by_owner(owner_id)?;
            let result = query_transactions(&transactions, &query.filters(), query.sort(), today);

            match output {
                Some(path) => {
                    let file = File::create(&path)
                        .map_err(|error| Error::CsvError(error.to_string()))?;
                    write_csv(file, &result)?;
                    tracing::info!(
                        "exported {} transactions to {}",
                        result.rows.len(),
                        path.display()
                    );
                    Ok(())
                }
                None => {
                    let stdout = io::stdout();
                    let mut handle = stdout.lock();
                    write_csv(&mut handle, &result)?;
                    handle
                        .flush()
                        .map_err(|error| Error::CsvError(error.to_string()))
                }
            }
        }
        Command::Recurring(command) => {
            let rules = stores.recurring_rules.get_by_owner(owner_id)?;

            match command {
                RecurringCommand::List => print(json, &rules, || {
                    rules
                        .iter()
                        .map(|rule| {
                            format!(
                                "{:>5}  {:<7}  {:<7}  {:<16}  {:>12}  next {}{}",
                                rule.id,
                                rule.frequency,
                                rule.kind,
                                rule.category,
                                format_currency(rule.amount),
                                format_date(rule.next_due_date),
                                if rule.active { "" } else { " (inactive)" }
                            )
                        })
                        .collect::<Vec<_>>()
                        .join("\n")
                }),
                RecurringCommand::Upcoming { until } => {
                    let until = until.unwrap_or(today + Duration::days(30));

                    let mut upcoming: Vec<UpcomingOccurrence> = rules
                        .iter()
                        .flat_map(|rule| {
                            rule.occurrences_until(until)
                                .map(move |date| UpcomingOccurrence {
                                    date,
                                    rule_id: rule.id,
                                    category: rule.category.clone(),
                                    amount: rule.amount,
                                })
                        })
                        .collect();
                    upcoming.sort_by(|a, b| a.date.cmp(&b.date).then(a.rule_id.cmp(&b.rule_id)));

                    print(json, &upcoming, || {
                        upcoming
                            .iter()
                            .map(|occurrence| {
                                format!(
                                    "{:<10}  rule {:>5}  {:<16}  {:>12}",
                                    format_date(occurrence.date),
                                    occurrence.rule_id,
                                    occurrence.category,
                                    format_currency(occurrence.amount)
                                )
                            })
                            .collect::<Vec<_>>()
                            .join("\n")
                    })
                }
            }
        }
        // Handled before the database is opened.
        Command::Next { .. } => Ok(()),
    }
}

#[derive(Debug, Serialize)]
struct UpcomingOccurrence {
    date: Date,
    rule_id: i64,
    category: String,
    amount: f64,
}

fn run_category(
    command: CategoryCommand,
    owner_id: UserID,
    json: bool,
    stores: &SQLiteStores,
) -> Result<(), Error> {
    match command {
        CategoryCommand::Add { name, kind } => {
            let category = stores.categories.create(owner_id, name, kind)?;

            print(json, &category, || {
                format!("Created {} category {} ({})", category.kind, category.name, category.id)
            })
        }
        CategoryCommand::List { kind } => {
            let categories = stores.categories.get_by_owner(owner_id, kind)?;

            print(json, &categories, || {
                categories
                    .iter()
                    .map(|category| {
                        format!("{:>5}  {:<7}  {}", category.id, category.kind, category.name)
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            })
        }
        CategoryCommand::Rename { id, name } => {
            let category = stores.categories.rename(owner_id, id, name)?;

            print(json, &category, || {
                format!("Renamed category {} to {}", category.id, category.name)
            })
        }
        CategoryCommand::Delete { id } => {
            stores.categories.delete(owner_id, id)?;

            print(json, &id, || format!("Deleted category {id}"))
        }
    }
}
