//! Recurring transactions and the calendar arithmetic for their due dates.
//!
//! A [RecurringRule] is a saved template for a transaction that repeats every
//! week, month or year. This module only computes dates, advancing a rule's
//! `next_due_date` as time passes is left to whatever scheduler runs the
//! rules.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::{Date, Duration, Month, PrimitiveDateTime};

use crate::{
    Error, category::CategoryName, database_id::RecurringRuleId, transaction::TransactionType,
    transaction::validate_amount, user::UserID,
};

/// How often a recurring rule produces a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    /// Every seven days.
    Weekly,
    /// On the same day every calendar month.
    Monthly,
    /// On the same day and month every year.
    Yearly,
}

impl Frequency {
    /// The lowercase name used in forms and the database.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }
}

impl Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "yearly" => Ok(Self::Yearly),
            _ => Err(Error::InvalidFrequency(s.to_owned())),
        }
    }
}

impl ToSql for Frequency {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Frequency {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error| FromSqlError::Other(Box::new(error)))
    }
}

// ============================================================================
// DATE ARITHMETIC
// ============================================================================

/// The date one `frequency` period after `date`.
///
/// Monthly and yearly steps keep the day of the month, clamped to the last
/// day of the target month: January 31 steps to February 28 (or 29 in a
/// leap year) and February 29 steps to February 28 of the next year.
///
/// # Panics
/// Panics if the result is later than [Date::MAX]. Use
/// [checked_next_occurrence] for dates supplied by users.
pub fn next_occurrence(date: Date, frequency: Frequency) -> Date {
    checked_next_occurrence(date, frequency).expect("next occurrence is past the maximum date")
}

/// The date one `frequency` period after `date`, or `None` if that is later
/// than [Date::MAX].
pub fn checked_next_occurrence(date: Date, frequency: Frequency) -> Option<Date> {
    checked_add_periods(date, frequency, 1)
}

/// Same as [next_occurrence], keeping the time of day of `datetime`.
///
/// # Panics
/// Panics if the result is later than [Date::MAX].
pub fn next_occurrence_at(datetime: PrimitiveDateTime, frequency: Frequency) -> PrimitiveDateTime {
    datetime.replace_date(next_occurrence(datetime.date(), frequency))
}

/// Compute the next occurrence for a frequency given as text, e.g. from a
/// form or command line argument.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidFrequency] if `frequency` is not "weekly", "monthly" or "yearly",
/// - or [Error::InvalidDate] if the next occurrence is past the maximum date.
pub fn compute_next_occurrence(date: Date, frequency: &str) -> Result<Date, Error> {
    let frequency: Frequency = frequency.parse()?;

    checked_next_occurrence(date, frequency).ok_or_else(|| Error::InvalidDate(date.to_string()))
}

/// Add `periods` steps of `frequency` to `date` in one go.
///
/// Stepping from the original date avoids the drift that repeated clamping
/// causes, e.g. January 31 plus two months is March 31, not March 29.
fn checked_add_periods(date: Date, frequency: Frequency, periods: u32) -> Option<Date> {
    match frequency {
        Frequency::Weekly => date.checked_add(Duration::weeks(i64::from(periods))),
        Frequency::Monthly => add_months(date, i64::from(periods)),
        Frequency::Yearly => add_months(date, i64::from(periods) * 12),
    }
}

fn add_months(date: Date, months: i64) -> Option<Date> {
    let month_index = i64::from(u8::from(date.month()) - 1) + months;
    let year = i32::try_from(i64::from(date.year()) + month_index / 12).ok()?;
    let month = Month::try_from((month_index % 12 + 1) as u8).ok()?;
    let day = date.day().min(last_day_of_month(year, month));

    Date::from_calendar_date(year, month, day).ok()
}

pub(crate) fn last_day_of_month(year: i32, month: Month) -> u8 {
    match month {
        Month::January
        | Month::March
        | Month::May
        | Month::July
        | Month::August
        | Month::October
        | Month::December => 31,
        Month::April | Month::June | Month::September | Month::November => 30,
        Month::February => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
    }
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || (year % 400 == 0)
}

// ============================================================================
// MODELS
// ============================================================================

/// A saved template that defines a repeating transaction and its next due date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringRule {
    /// The ID of the rule.
    pub id: RecurringRuleId,
    /// The user that owns the rule.
    pub owner_id: UserID,
    /// Whether the generated transactions are income or expenses.
    pub kind: TransactionType,
    /// The amount of each generated transaction.
    pub amount: f64,
    /// The category label of each generated transaction.
    pub category: String,
    /// The description of each generated transaction.
    pub description: Option<String>,
    /// How often the rule repeats.
    pub frequency: Frequency,
    /// The date of the first occurrence.
    pub start_date: Date,
    /// The date the next transaction is due, never before `start_date`.
    pub next_due_date: Date,
    /// Inactive rules do not produce transactions.
    pub active: bool,
}

impl RecurringRule {
    /// The due dates of this rule from `next_due_date` up to and including
    /// `end`.
    ///
    /// Dates are counted from `start_date` so that clamped months do not
    /// shift later occurrences. Inactive rules have no occurrences.
    pub fn occurrences_until(&self, end: Date) -> Occurrences {
        Occurrences {
            start_date: self.start_date,
            frequency: self.frequency,
            from: self.next_due_date,
            end,
            period: 0,
            done: !self.active,
        }
    }
}

/// Iterator over the due dates of a [RecurringRule].
///
/// Created by [RecurringRule::occurrences_until].
#[derive(Debug, Clone)]
pub struct Occurrences {
    start_date: Date,
    frequency: Frequency,
    from: Date,
    end: Date,
    period: u32,
    done: bool,
}

impl Iterator for Occurrences {
    type Item = Date;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            let Some(date) = checked_add_periods(self.start_date, self.frequency, self.period)
            else {
                self.done = true;
                break;
            };

            if date > self.end {
                self.done = true;
                break;
            }

            // Dates run out long before the period count can overflow.
            self.period += 1;

            if date >= self.from {
                return Some(date);
            }
        }

        None
    }
}

/// The details needed to create a [RecurringRule].
///
/// To create one, use [NewRecurringRule::new].
#[derive(Debug, Clone, PartialEq)]
pub struct NewRecurringRule {
    pub(crate) owner_id: UserID,
    pub(crate) kind: TransactionType,
    pub(crate) amount: f64,
    pub(crate) category: CategoryName,
    pub(crate) description: Option<String>,
    pub(crate) frequency: Frequency,
    pub(crate) start_date: Date,
    pub(crate) next_due_date: Date,
}

impl NewRecurringRule {
    /// Describe a new, active recurring rule.
    ///
    /// `initial_transaction_created` should be `true` when a transaction for
    /// `start_date` is recorded at the same time as the rule. That
    /// transaction covers the first occurrence, so the rule is next due one
    /// period later. Otherwise the rule is first due on `start_date`.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::InvalidAmount] if `amount` is not a finite number greater than zero,
    /// - [Error::EmptyCategoryName] if `category` is empty,
    /// - or [Error::InvalidDate] if the next due date is past the maximum date.
    pub fn new(
        owner_id: UserID,
        kind: TransactionType,
        amount: f64,
        category: &str,
        frequency: Frequency,
        start_date: Date,
        initial_transaction_created: bool,
    ) -> Result<Self, Error> {
        let next_due_date = if initial_transaction_created {
            checked_next_occurrence(start_date, frequency)
                .ok_or_else(|| Error::InvalidDate(start_date.to_string()))?
        } else {
            start_date
        };

        Self::with_next_due_date(
            owner_id,
            kind,
            amount,
            category,
            frequency,
            start_date,
            next_due_date,
        )
    }

    /// Describe a new, active recurring rule with an explicit next due date.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::InvalidAmount] if `amount` is not a finite number greater than zero,
    /// - [Error::EmptyCategoryName] if `category` is empty,
    /// - or [Error::NextDueBeforeStart] if `next_due_date` is before `start_date`.
    pub fn with_next_due_date(
        owner_id: UserID,
        kind: TransactionType,
        amount: f64,
        category: &str,
        frequency: Frequency,
        start_date: Date,
        next_due_date: Date,
    ) -> Result<Self, Error> {
        if next_due_date < start_date {
            return Err(Error::NextDueBeforeStart);
        }

        Ok(Self {
            owner_id,
            kind,
            amount: validate_amount(amount)?,
            category: CategoryName::new(category)?,
            description: None,
            frequency,
            start_date,
            next_due_date,
        })
    }

    /// Set the description copied to each generated transaction.
    pub fn description(mut self, description: Option<&str>) -> Self {
        self.description = description
            .map(str::trim)
            .filter(|description| !description.is_empty())
            .map(str::to_owned);
        self
    }

    /// The date the rule is first due.
    pub fn next_due_date(&self) -> Date {
        self.next_due_date
    }
}
