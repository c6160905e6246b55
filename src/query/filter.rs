//! Filters for narrowing a list of transactions.

use std::{convert::Infallible, fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use time::{Date, Duration};

use crate::{
    Error,
    format::{format_currency, format_date},
    transaction::{Transaction, TransactionType},
};

/// A view level restriction of transactions to a period ending today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Timeframe {
    /// From the most recent Sunday up to today.
    Week,
    /// From the first day of the current month up to today.
    Month,
    /// No restriction.
    #[default]
    All,
}

impl Timeframe {
    /// The lowercase name used in query strings and on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Week => "week",
            Self::Month => "month",
            Self::All => "all",
        }
    }

    /// The inclusive date range covered by the timeframe when `today` is the
    /// current date, or `None` for [Timeframe::All].
    pub fn date_range(self, today: Date) -> Option<DateRange> {
        match self {
            Self::Week => Some(DateRange {
                start: week_start(today),
                end: today,
            }),
            Self::Month => Some(DateRange {
                start: month_start(today),
                end: today,
            }),
            Self::All => None,
        }
    }
}

impl Display for Timeframe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "all" => Ok(Self::All),
            _ => Err(Error::InvalidTimeframe(s.to_owned())),
        }
    }
}

/// An inclusive range of dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    /// The first date in the range.
    pub start: Date,
    /// The last date in the range.
    pub end: Date,
}

impl DateRange {
    /// Whether `date` falls within the range, including both ends.
    pub fn contains(&self, date: Date) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Weeks start on Sunday.
fn week_start(date: Date) -> Date {
    date - Duration::days(i64::from(date.weekday().number_days_from_sunday()))
}

fn month_start(date: Date) -> Date {
    date - Duration::days(i64::from(date.day()) - 1)
}

/// Restricts transactions to a single category.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    /// Every category.
    #[default]
    All,
    /// Only the category with exactly this name, compared case-sensitively.
    Named(String),
}

impl CategoryFilter {
    /// The sentinel value that selects every category.
    pub const ALL: &str = "all";

    /// Create a filter from an optional category name where `None` and
    /// `"all"` select every category.
    pub fn new(category: Option<&str>) -> Self {
        match category {
            None | Some(Self::ALL) => Self::All,
            Some(name) => Self::Named(name.to_owned()),
        }
    }

    fn matches(&self, category: &str) -> bool {
        match self {
            Self::All => true,
            Self::Named(name) => name == category,
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(Some(s)))
    }
}

/// The filters applied by [query_transactions](crate::query::query_transactions).
///
/// All filters must match for a transaction to be kept. The default value
/// keeps every transaction.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Filters {
    /// Case-insensitive text to look for in the description, the displayed
    /// amount, the displayed date and, for expenses, the category.
    pub search: String,
    /// Keep only transactions in this category.
    pub category: CategoryFilter,
    /// Keep only transactions in this period.
    pub timeframe: Timeframe,
    /// Keep only income or only expenses.
    pub kind: Option<TransactionType>,
}

/// [Filters] prepared for matching many transactions against the same date.
pub(crate) struct TransactionMatcher<'a> {
    needle: String,
    category: &'a CategoryFilter,
    date_range: Option<DateRange>,
    kind: Option<TransactionType>,
}

impl<'a> TransactionMatcher<'a> {
    pub(crate) fn new(filters: &'a Filters, today: Date) -> Self {
        Self {
            needle: filters.search.trim().to_lowercase(),
            category: &filters.category,
            date_range: filters.timeframe.date_range(today),
            kind: filters.kind,
        }
    }

    pub(crate) fn matches(&self, transaction: &Transaction) -> bool {
        self.kind.is_none_or(|kind| kind == transaction.kind)
            && self.category.matches(&transaction.category)
            && self
                .date_range
                .is_none_or(|range| range.contains(transaction.date))
            && self.matches_search(transaction)
    }

    fn matches_search(&self, transaction: &Transaction) -> bool {
        if self.needle.is_empty() {
            return true;
        }

        let contains = |text: &str| text.to_lowercase().contains(&self.needle);

        transaction.description.as_deref().is_some_and(contains)
            || contains(&format_currency(transaction.amount))
            || contains(&format_date(transaction.date))
            || (transaction.kind == TransactionType::Expense && contains(&transaction.category))
    }
}
