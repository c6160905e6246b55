//! Sorting for transaction lists.

use std::{cmp::Ordering, fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{Error, transaction::Transaction};

/// The column to sort transactions by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    /// When the transaction happened.
    #[default]
    Date,
    /// The amount of the transaction.
    Amount,
    /// The category name.
    Category,
    /// The description, missing descriptions sort as empty text.
    Description,
}

impl SortKey {
    /// The lowercase name used in query strings and on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::Amount => "amount",
            Self::Category => "category",
            Self::Description => "description",
        }
    }
}

impl Display for SortKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "date" => Ok(Self::Date),
            "amount" => Ok(Self::Amount),
            "category" => Ok(Self::Category),
            "description" => Ok(Self::Description),
            _ => Err(Error::InvalidSortKey(s.to_owned())),
        }
    }
}

/// The order to sort transactions in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Sort in order of increasing value.
    #[serde(rename = "asc")]
    Ascending,
    /// Sort in order of decreasing value.
    #[default]
    #[serde(rename = "desc")]
    Descending,
}

impl SortDirection {
    /// The other direction.
    pub fn reversed(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }
}

impl FromStr for SortDirection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "asc" | "ascending" => Ok(Self::Ascending),
            "desc" | "descending" => Ok(Self::Descending),
            _ => Err(Error::InvalidSortDirection(s.to_owned())),
        }
    }
}

/// How to order the rows of a transaction query.
///
/// The default is newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Sort {
    /// The column to sort by.
    pub key: SortKey,
    /// The order to sort in.
    pub direction: SortDirection,
}

impl Sort {
    /// Sort by `key` in `direction`.
    pub fn new(key: SortKey, direction: SortDirection) -> Self {
        Self { key, direction }
    }

    /// The sort that results from selecting the column `key`, e.g. by
    /// clicking its table header.
    ///
    /// Selecting the current key flips the direction, selecting another key
    /// sorts by that key in ascending order.
    pub fn toggle(self, key: SortKey) -> Self {
        if self.key == key {
            Self {
                key,
                direction: self.direction.reversed(),
            }
        } else {
            Self {
                key,
                direction: SortDirection::Ascending,
            }
        }
    }

    /// Compare two transactions under this sort.
    ///
    /// Ties on the sort key are broken by transaction ID so that the order is
    /// total and a descending sort is the exact reverse of an ascending one.
    pub fn compare(&self, a: &Transaction, b: &Transaction) -> Ordering {
        let ordering = match self.key {
            SortKey::Date => a.date.cmp(&b.date),
            SortKey::Amount => a.amount.total_cmp(&b.amount),
            SortKey::Category => compare_text(&a.category, &b.category),
            SortKey::Description => compare_text(
                a.description.as_deref().unwrap_or_default(),
                b.description.as_deref().unwrap_or_default(),
            ),
        }
        .then_with(|| a.id.cmp(&b.id));

        match self.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }
}

/// Order text the way people expect to see it in a list: letters compare
/// regardless of case first, and only words that differ by case alone are
/// ordered by the exact characters.
fn compare_text(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
        .then_with(|| a.cmp(b))
}

/// Sort `transactions` in place.
pub fn sort_transactions(transactions: &mut [Transaction], sort: Sort) {
    transactions.sort_by(|a, b| sort.compare(a, b));
}
