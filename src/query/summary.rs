//! Aggregates over a filtered set of transactions.

use std::collections::HashMap;

use serde::Serialize;

use crate::transaction::Transaction;

/// The summed amount of the transactions in one category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    /// The category label shared by the transactions.
    pub category: String,
    /// The sum of the transaction amounts.
    pub amount: f64,
}

/// Sum of the amounts of `transactions`.
pub fn total_amount(transactions: &[Transaction]) -> f64 {
    transactions
        .iter()
        .map(|transaction| transaction.amount)
        .sum()
}

/// Sum the amounts of `transactions` per category.
///
/// The totals are ordered from the largest amount to the smallest, ties are
/// ordered by category name.
pub fn totals_by_category(transactions: &[Transaction]) -> Vec<CategoryTotal> {
    let mut totals: HashMap<&str, f64> = HashMap::new();

    for transaction in transactions {
        *totals.entry(transaction.category.as_str()).or_default() += transaction.amount;
    }

    let mut totals: Vec<CategoryTotal> = totals
        .into_iter()
        .map(|(category, amount)| CategoryTotal {
            category: category.to_owned(),
            amount,
        })
        .collect();

    totals.sort_by(|a, b| {
        b.amount
            .total_cmp(&a.amount)
            .then_with(|| a.category.cmp(&b.category))
    });

    totals
}
