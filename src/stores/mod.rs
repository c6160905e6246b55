//! Contains traits and implementations for objects that store the domain models.
//!
//! The traits are the seam between the application and whatever persists its
//! records. Every operation is keyed by the [UserID](crate::UserID) of the
//! records' owner and fails with a crate [Error](crate::Error) that is passed
//! on to the caller unchanged, stores never retry.

mod category;
mod recurring_rule;
mod transaction;

pub mod sqlite;

pub use category::CategoryStore;
pub use recurring_rule::RecurringRuleStore;
pub use transaction::TransactionStore;
