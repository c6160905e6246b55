//! Transaction management for the budget tracker.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model and `TransactionBuilder` for creating transactions
//! - The add-transaction form and its validation

mod core;
mod form;

pub use core::{Transaction, TransactionBuilder, TransactionType, validate_amount};
pub use form::{CreatedTransaction, TransactionForm, create_transaction_from_form};
