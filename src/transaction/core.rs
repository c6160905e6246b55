//! Defines the core data models for transactions.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{Error, category::CategoryName, database_id::TransactionId, user::UserID};

// ============================================================================
// MODELS
// ============================================================================

/// Whether money was earned or spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money earned, e.g. wages.
    Income,
    /// Money spent, e.g. groceries.
    Expense,
}

impl TransactionType {
    /// The lowercase name used in forms and the database.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            _ => Err(Error::InvalidTransactionType(s.to_owned())),
        }
    }
}

impl ToSql for TransactionType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error| FromSqlError::Other(Box::new(error)))
    }
}

/// An expense or income, i.e. an event where money was either spent or earned.
///
/// To create a new `Transaction`, use [Transaction::build].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The user that recorded the transaction.
    pub owner_id: UserID,
    /// Whether the transaction is income or an expense.
    pub kind: TransactionType,
    /// The amount of money spent or earned in this transaction, always greater than zero.
    pub amount: f64,
    /// The name of the category the transaction belongs to.
    ///
    /// This is a label copied from the category when the transaction was
    /// recorded, renaming or deleting the category does not change it.
    pub category: String,
    /// When the transaction happened.
    pub date: Date,
    /// A text description of what the transaction was for.
    pub description: Option<String>,
    /// When the transaction was recorded.
    pub created_at: OffsetDateTime,
}

impl Transaction {
    /// Create a new transaction.
    ///
    /// Shortcut for [TransactionBuilder::new] for discoverability.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::InvalidAmount] if `amount` is not a finite number greater than zero,
    /// - or [Error::EmptyCategoryName] if `category` is empty.
    pub fn build(
        owner_id: UserID,
        kind: TransactionType,
        amount: f64,
        date: Date,
        category: &str,
    ) -> Result<TransactionBuilder, Error> {
        TransactionBuilder::new(owner_id, kind, amount, date, category)
    }
}

/// A builder for creating [Transaction] instances.
///
/// The amount and category are validated when the builder is created, so a
/// builder that exists is always safe to hand to a
/// [TransactionStore](crate::stores::TransactionStore).
///
/// # Examples
///
/// ```ignore
/// use time::macros::date;
///
/// use crate::{Transaction, TransactionType, UserID};
///
/// let builder = Transaction::build(
///         UserID::new(1),
///         TransactionType::Expense,
///         45.99,
///         date!(2025-01-15),
///         "Eating Out",
///     )?
///     .description(Some("Coffee shop purchase"));
/// ```
#[derive(Debug, PartialEq, Clone)]
pub struct TransactionBuilder {
    pub(crate) owner_id: UserID,
    pub(crate) kind: TransactionType,
    pub(crate) amount: f64,
    pub(crate) date: Date,
    pub(crate) category: CategoryName,
    pub(crate) description: Option<String>,
}

impl TransactionBuilder {
    /// Create a builder with no description.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::InvalidAmount] if `amount` is not a finite number greater than zero,
    /// - or [Error::EmptyCategoryName] if `category` is empty.
    pub fn new(
        owner_id: UserID,
        kind: TransactionType,
        amount: f64,
        date: Date,
        category: &str,
    ) -> Result<Self, Error> {
        Ok(Self {
            owner_id,
            kind,
            amount: validate_amount(amount)?,
            date,
            category: CategoryName::new(category)?,
            description: None,
        })
    }

    /// Set the description for the transaction.
    ///
    /// Blank descriptions are stored as no description.
    pub fn description(mut self, description: Option<&str>) -> Self {
        self.description = description
            .map(str::trim)
            .filter(|description| !description.is_empty())
            .map(str::to_owned);
        self
    }

    /// The date the transaction will be recorded with.
    pub fn date(&self) -> Date {
        self.date
    }
}

/// Check that `amount` is a finite number greater than zero.
///
/// # Errors
/// Returns an [Error::InvalidAmount] if `amount` is zero, negative, NaN or infinite.
pub fn validate_amount(amount: f64) -> Result<f64, Error> {
    if amount.is_finite() && amount > 0.0 {
        Ok(amount)
    } else {
        Err(Error::InvalidAmount(amount.to_string()))
    }
}
