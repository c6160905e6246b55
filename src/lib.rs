//! A personal finance tracker core.
//!
//! Users record income and expenses, classify them with categories and save
//! recurring transactions. This library provides:
//! - [next_occurrence] and friends for the due dates of recurring transactions,
//! - [query_transactions] for filtering, sorting and totalling a list of
//!   transactions,
//! - [create_transaction_from_form] for validating and recording the
//!   add-transaction form,
//! - and the [stores] that persist everything in SQLite.

#![warn(missing_docs)]

mod category;
mod database_id;
mod db;
mod error;
pub mod export;
pub mod format;
pub mod query;
mod recurrence;
pub mod stores;
mod timezone;
mod transaction;
mod user;

pub use category::{Category, CategoryName};
pub use database_id::{CategoryId, DatabaseId, RecurringRuleId, TransactionId};
pub use db::initialize as initialize_db;
pub use error::Error;
pub use query::{
    CategoryFilter, CategoryTotal, Filters, QueryResult, Sort, SortDirection, SortKey, Timeframe,
    query_transactions, query_transactions_now,
};
pub use recurrence::{
    Frequency, NewRecurringRule, Occurrences, RecurringRule, checked_next_occurrence,
    compute_next_occurrence, next_occurrence, next_occurrence_at,
};
pub use timezone::{get_local_offset, local_today};
pub use transaction::{
    CreatedTransaction, Transaction, TransactionBuilder, TransactionForm, TransactionType,
    create_transaction_from_form, validate_amount,
};
pub use user::UserID;
