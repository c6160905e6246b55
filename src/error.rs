//! Defines the crate level error type.
use time::Date;

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The amount was not a finite number greater than zero.
    ///
    /// Callers should pass in the raw amount text so that it can be shown
    /// back to the user.
    #[error("\"{0}\" is not a valid amount, amounts must be a number greater than zero")]
    InvalidAmount(String),

    /// An empty string was used to create a category name.
    #[error("category name cannot be empty")]
    EmptyCategoryName,

    /// The frequency of a recurring transaction was not one of "weekly",
    /// "monthly" or "yearly".
    #[error("\"{0}\" is not a valid frequency, expected one of weekly, monthly or yearly")]
    InvalidFrequency(String),

    /// A recurring transaction was requested without a frequency.
    #[error("a frequency is required for recurring transactions")]
    MissingFrequency,

    /// The transaction type was not one of "income" or "expense".
    #[error("\"{0}\" is not a valid transaction type, expected income or expense")]
    InvalidTransactionType(String),

    /// A date string could not be parsed as a `YYYY-MM-DD` calendar date.
    #[error("\"{0}\" is not a valid date, expected the format YYYY-MM-DD")]
    InvalidDate(String),

    /// A date in the future was used to create a transaction.
    ///
    /// Transactions record events that have already happened, therefore future
    /// dates are not allowed.
    #[error("{0} is a date in the future, which is not allowed")]
    FutureDate(Date),

    /// The timeframe of a transaction query was not one of "week", "month" or "all".
    #[error("\"{0}\" is not a valid timeframe, expected one of week, month or all")]
    InvalidTimeframe(String),

    /// The sort key of a transaction query was not a sortable column.
    #[error("\"{0}\" is not a valid sort key, expected one of date, amount, category or description")]
    InvalidSortKey(String),

    /// The sort direction of a transaction query was not "asc" or "desc".
    #[error("\"{0}\" is not a valid sort direction, expected asc or desc")]
    InvalidSortDirection(String),

    /// A recurring rule was given a next due date before its start date.
    #[error("the next due date cannot be before the start date")]
    NextDueBeforeStart,

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// Tried to update a transaction that does not exist
    #[error("tried to update a transaction that is not in the database")]
    UpdateMissingTransaction,

    /// Tried to delete a transaction that does not exist
    #[error("tried to delete a transaction that is not in the database")]
    DeleteMissingTransaction,

    /// Tried to rename a category that does not exist
    #[error("tried to update a category that is not in the database")]
    UpdateMissingCategory,

    /// Tried to delete a category that does not exist
    #[error("tried to delete a category that is not in the database")]
    DeleteMissingCategory,

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezone(String),

    /// An error occurred while writing CSV output.
    #[error("could not write CSV: {0}")]
    CsvError(String),

    /// An error occurred while serializing a struct as JSON
    #[error("could not serialize as JSON: {0}")]
    JsonError(String),
}

impl Error {
    /// Whether the error is a rejection of user input, as opposed to a failure
    /// of the database or environment.
    ///
    /// Validation errors are always produced before any store is called.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::InvalidAmount(_)
                | Error::EmptyCategoryName
                | Error::InvalidFrequency(_)
                | Error::MissingFrequency
                | Error::InvalidTransactionType(_)
                | Error::InvalidDate(_)
                | Error::FutureDate(_)
                | Error::InvalidTimeframe(_)
                | Error::InvalidSortKey(_)
                | Error::InvalidSortDirection(_)
                | Error::NextDueBeforeStart
        )
    }
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl From<csv::Error> for Error {
    fn from(value: csv::Error) -> Self {
        Error::CsvError(value.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Error::JsonError(value.to_string())
    }
}
