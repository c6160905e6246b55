//! Filtering, sorting and summarising a user's transactions for display.
//!
//! Everything here works on transactions that are already in memory and
//! never touches a store. The whole result is recomputed on every call.

mod filter;
mod sort;
mod summary;

pub use filter::{CategoryFilter, DateRange, Filters, Timeframe};
pub use sort::{Sort, SortDirection, SortKey, sort_transactions};
pub use summary::{CategoryTotal, total_amount, totals_by_category};

use serde::Serialize;
use time::{Date, UtcOffset};

use crate::{timezone::local_today, transaction::Transaction};

use filter::TransactionMatcher;

/// The rows and aggregates produced by [query_transactions].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    /// The transactions that matched the filters, in sorted order.
    pub rows: Vec<Transaction>,
    /// The sum of the amounts in `rows`.
    pub total: f64,
    /// The sum of the amounts in `rows` for each category, largest first.
    pub totals_by_category: Vec<CategoryTotal>,
}

impl QueryResult {
    /// The total for `category`, or `None` if no row has that category.
    pub fn category_total(&self, category: &str) -> Option<f64> {
        self.totals_by_category
            .iter()
            .find(|total| total.category == category)
            .map(|total| total.amount)
    }
}

/// Select the transactions that match `filters`, sort them and compute their
/// totals.
///
/// `today` is the date that the week and month timeframes end on. The totals
/// do not depend on `sort`.
pub fn query_transactions(
    transactions: &[Transaction],
    filters: &Filters,
    sort: Sort,
    today: Date,
) -> QueryResult {
    let matcher = TransactionMatcher::new(filters, today);

    let mut rows: Vec<Transaction> = transactions
        .iter()
        .filter(|transaction| matcher.matches(transaction))
        .cloned()
        .collect();

    let total = total_amount(&rows);
    let totals_by_category = totals_by_category(&rows);

    sort_transactions(&mut rows, sort);

    tracing::debug!(
        "query matched {} of {} transactions, sorted by {} {:?}",
        rows.len(),
        transactions.len(),
        sort.key,
        sort.direction
    );

    QueryResult {
        rows,
        total,
        totals_by_category,
    }
}

/// [query_transactions] with today's date in the timezone at `local_offset`.
pub fn query_transactions_now(
    transactions: &[Transaction],
    filters: &Filters,
    sort: Sort,
    local_offset: UtcOffset,
) -> QueryResult {
    query_transactions(transactions, filters, sort, local_today(local_offset))
}

#[cfg(test)]
mod tests {
    use time::{Date, OffsetDateTime, macros::date};

    use crate::{
        transaction::{Transaction, TransactionType},
        user::UserID,
    };

    use super::{
        CategoryFilter, Filters, Sort, SortDirection, SortKey, Timeframe, query_transactions,
    };

    const TODAY: Date = date!(2024 - 03 - 20);

    fn transaction(
        id: i64,
        kind: TransactionType,
        amount: f64,
        category: &str,
        date: Date,
        description: Option<&str>,
    ) -> Transaction {
        Transaction {
            id,
            owner_id: UserID::new(1),
            kind,
            amount,
            category: category.to_owned(),
            date,
            description: description.map(str::to_owned),
            created_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    fn sample_transactions() -> Vec<Transaction> {
        vec![
            transaction(
                1,
                TransactionType::Income,
                100.0,
                "Salary",
                date!(2024 - 03 - 01),
                Some("March pay"),
            ),
            transaction(
                2,
                TransactionType::Income,
                50.0,
                "Freelance",
                date!(2024 - 03 - 15),
                None,
            ),
            transaction(
                3,
                TransactionType::Expense,
                12.5,
                "Groceries",
                date!(2024 - 02 - 28),
                Some("Milk and eggs"),
            ),
            transaction(
                4,
                TransactionType::Expense,
                12.5,
                "groceries",
                date!(2024 - 03 - 18),
                Some("bread"),
            ),
            transaction(
                5,
                TransactionType::Expense,
                1200.0,
                "Rent",
                date!(2024 - 03 - 19),
                Some("Flat"),
            ),
        ]
    }

    fn ids(transactions: &[Transaction]) -> Vec<i64> {
        transactions.iter().map(|transaction| transaction.id).collect()
    }

    #[test]
    fn month_scenario_totals_salary_and_freelance() {
        let transactions = vec![
            transaction(
                1,
                TransactionType::Income,
                100.0,
                "Salary",
                date!(2024 - 03 - 01),
                None,
            ),
            transaction(
                2,
                TransactionType::Income,
                50.0,
                "Freelance",
                date!(2024 - 03 - 15),
                None,
            ),
        ];
        let filters = Filters {
            timeframe: Timeframe::Month,
            ..Default::default()
        };

        let got = query_transactions(&transactions, &filters, Sort::default(), TODAY);

        assert_eq!(got.rows.len(), 2);
        assert_eq!(got.total, 150.0);
        assert_eq!(got.category_total("Salary"), Some(100.0));
        assert_eq!(got.category_total("Freelance"), Some(50.0));
        assert_eq!(got.totals_by_category.len(), 2);
    }

    #[test]
    fn empty_input_gives_empty_result() {
        let got = query_transactions(&[], &Filters::default(), Sort::default(), TODAY);

        assert!(got.rows.is_empty());
        assert_eq!(got.total, 0.0);
        assert!(got.totals_by_category.is_empty());
    }

    #[test]
    fn search_matches_displayed_amount() {
        let transactions = sample_transactions();
        let filters = Filters {
            search: "50".to_owned(),
            ..Default::default()
        };

        let got = query_transactions(&transactions, &filters, Sort::default(), TODAY);

        // $50.00, $12.50 and $12.50.
        assert_eq!(ids(&got.rows), [4, 2, 3]);
    }

    #[test]
    fn search_matches_fraction_of_a_cent_as_rounded_amount() {
        let transactions = vec![transaction(
            1,
            TransactionType::Expense,
            0.001,
            "Fees",
            date!(2024 - 03 - 01),
            None,
        )];
        let search = |text: &str| {
            let filters = Filters {
                search: text.to_owned(),
                ..Default::default()
            };
            query_transactions(&transactions, &filters, Sort::default(), TODAY).rows
        };

        assert_eq!(ids(&search("$0.00")), [1]);
        assert!(search("10").is_empty());
        assert!(search("e-").is_empty());
    }

    #[test]
    fn search_is_case_insensitive_over_description() {
        let transactions = sample_transactions();
        let filters = Filters {
            search: "MILK".to_owned(),
            ..Default::default()
        };

        let got = query_transactions(&transactions, &filters, Sort::default(), TODAY);

        assert_eq!(ids(&got.rows), [3]);
    }

    #[test]
    fn search_matches_displayed_date() {
        let transactions = sample_transactions();
        let filters = Filters {
            search: "3/19/2024".to_owned(),
            ..Default::default()
        };

        let got = query_transactions(&transactions, &filters, Sort::default(), TODAY);

        assert_eq!(ids(&got.rows), [5]);
    }

    #[test]
    fn search_matches_category_of_expenses_only() {
        let transactions = sample_transactions();

        let expense_search = Filters {
            search: "rent".to_owned(),
            ..Default::default()
        };
        let income_search = Filters {
            search: "salary".to_owned(),
            ..Default::default()
        };

        let expenses = query_transactions(&transactions, &expense_search, Sort::default(), TODAY);
        let income = query_transactions(&transactions, &income_search, Sort::default(), TODAY);

        assert_eq!(ids(&expenses.rows), [5]);
        assert!(income.rows.is_empty());
    }

    #[test]
    fn category_filter_is_exact() {
        let transactions = sample_transactions();
        let filters = Filters {
            category: CategoryFilter::new(Some("Groceries")),
            ..Default::default()
        };

        let got = query_transactions(&transactions, &filters, Sort::default(), TODAY);

        assert_eq!(ids(&got.rows), [3]);
        assert_eq!(got.total, 12.5);
    }

    #[test]
    fn all_category_filter_matches_no_filter() {
        let transactions = sample_transactions();
        let all = Filters {
            category: CategoryFilter::new(Some("all")),
            ..Default::default()
        };

        let got = query_transactions(&transactions, &all, Sort::default(), TODAY);
        let want = query_transactions(&transactions, &Filters::default(), Sort::default(), TODAY);

        assert_eq!(got, want);
    }

    #[test]
    fn filters_are_combined() {
        let transactions = sample_transactions();
        let filters = Filters {
            search: "bread".to_owned(),
            category: CategoryFilter::new(Some("groceries")),
            timeframe: Timeframe::Week,
            kind: Some(TransactionType::Expense),
        };

        let got = query_transactions(&transactions, &filters, Sort::default(), TODAY);

        assert_eq!(ids(&got.rows), [4]);
    }

    #[test]
    fn week_excludes_earlier_dates() {
        let transactions = sample_transactions();
        let filters = Filters {
            timeframe: Timeframe::Week,
            ..Default::default()
        };

        let got = query_transactions(&transactions, &filters, Sort::default(), TODAY);

        assert_eq!(ids(&got.rows), [5, 4]);
    }

    #[test]
    fn kind_filter_keeps_one_type() {
        let transactions = sample_transactions();
        let filters = Filters {
            kind: Some(TransactionType::Income),
            ..Default::default()
        };

        let got = query_transactions(&transactions, &filters, Sort::default(), TODAY);

        assert_eq!(ids(&got.rows), [2, 1]);
        assert_eq!(got.total, 150.0);
    }

    #[test]
    fn total_is_sum_of_rows() {
        let transactions = sample_transactions();

        let got = query_transactions(&transactions, &Filters::default(), Sort::default(), TODAY);
        let sum: f64 = got.rows.iter().map(|transaction| transaction.amount).sum();

        assert_eq!(got.rows.len(), transactions.len());
        assert_eq!(got.total, sum);
        assert_eq!(got.total, 1375.0);
    }

    #[test]
    fn totals_do_not_depend_on_sort() {
        let transactions = sample_transactions();

        let by_date = query_transactions(&transactions, &Filters::default(), Sort::default(), TODAY);
        let by_amount = query_transactions(
            &transactions,
            &Filters::default(),
            Sort::new(SortKey::Amount, SortDirection::Ascending),
            TODAY,
        );

        assert_eq!(by_date.total, by_amount.total);
        assert_eq!(by_date.totals_by_category, by_amount.totals_by_category);
    }

    #[test]
    fn sort_by_amount_ascending_breaks_ties_by_id() {
        let transactions = sample_transactions();
        let sort = Sort::new(SortKey::Amount, SortDirection::Ascending);

        let got = query_transactions(&transactions, &Filters::default(), sort, TODAY);

        assert_eq!(ids(&got.rows), [3, 4, 2, 1, 5]);
    }

    #[test]
    fn sort_by_category_ignores_case_first() {
        let transactions = sample_transactions();
        let sort = Sort::new(SortKey::Category, SortDirection::Ascending);

        let got = query_transactions(&transactions, &Filters::default(), sort, TODAY);

        assert_eq!(ids(&got.rows), [2, 3, 4, 5, 1]);
    }

    #[test]
    fn sort_by_description_treats_missing_as_empty() {
        let transactions = sample_transactions();
        let sort = Sort::new(SortKey::Description, SortDirection::Ascending);

        let got = query_transactions(&transactions, &Filters::default(), sort, TODAY);

        assert_eq!(ids(&got.rows), [2, 4, 5, 1, 3]);
    }

    #[test]
    fn sorting_is_idempotent() {
        let transactions = sample_transactions();

        for key in [SortKey::Date, SortKey::Amount, SortKey::Category, SortKey::Description] {
            for direction in [SortDirection::Ascending, SortDirection::Descending] {
                let sort = Sort::new(key, direction);
                let once = query_transactions(&transactions, &Filters::default(), sort, TODAY);
                let twice = query_transactions(&once.rows, &Filters::default(), sort, TODAY);

                assert_eq!(once.rows, twice.rows, "sort by {key} {direction:?}");
            }
        }
    }

    #[test]
    fn descending_is_reverse_of_ascending() {
        let transactions = sample_transactions();

        for key in [SortKey::Date, SortKey::Amount, SortKey::Category, SortKey::Description] {
            let ascending = query_transactions(
                &transactions,
                &Filters::default(),
                Sort::new(key, SortDirection::Ascending),
                TODAY,
            );
            let descending = query_transactions(
                &transactions,
                &Filters::default(),
                Sort::new(key, SortDirection::Descending),
                TODAY,
            );

            let mut reversed = ascending.rows.clone();
            reversed.reverse();
            assert_eq!(descending.rows, reversed, "sort by {key}");
        }
    }
}
