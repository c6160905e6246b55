//! The add-transaction form and the validation that turns its raw fields into
//! records.

use serde::{Deserialize, Serialize};
use time::{Date, macros::format_description};

use crate::{
    Error,
    recurrence::{Frequency, NewRecurringRule, RecurringRule},
    stores::{RecurringRuleStore, TransactionStore, sqlite::SQLiteStores},
    transaction::{Transaction, TransactionBuilder, TransactionType, validate_amount},
    user::UserID,
};

/// The fields of the add-transaction form as the user entered them.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TransactionForm {
    /// Either "income" or "expense".
    #[serde(rename = "type")]
    pub kind: String,
    /// The amount as typed, e.g. "12.50".
    pub amount: String,
    /// The category name.
    pub category: String,
    /// The date in the format `YYYY-MM-DD`.
    pub date: String,
    /// An optional description, blank text counts as none.
    #[serde(default)]
    pub description: Option<String>,
    /// Whether the transaction repeats.
    #[serde(default)]
    pub recurring: bool,
    /// How often the transaction repeats, required when `recurring` is set.
    #[serde(default)]
    pub frequency: Option<String>,
}

/// The records created from a [TransactionForm].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreatedTransaction {
    /// The transaction for the form's date, absent for a recurring entry that
    /// starts in the future.
    pub transaction: Option<Transaction>,
    /// The recurring rule, present when the form was marked recurring.
    pub recurring_rule: Option<RecurringRule>,
}

/// A form that passed validation, ready to be written to the stores.
#[derive(Debug, Clone, PartialEq)]
enum ValidatedForm {
    /// A one-off transaction.
    Transaction(TransactionBuilder),
    /// A recurring entry starting today or earlier: the transaction covers the
    /// first occurrence.
    TransactionAndRule(TransactionBuilder, NewRecurringRule),
    /// A recurring entry starting after today.
    Rule(NewRecurringRule),
}

fn parse_date(text: &str) -> Result<Date, Error> {
    Date::parse(text.trim(), format_description!("[year]-[month]-[day]"))
        .map_err(|_| Error::InvalidDate(text.to_owned()))
}

fn parse_amount(text: &str) -> Result<f64, Error> {
    text.trim()
        .parse::<f64>()
        .map_err(|_| Error::InvalidAmount(text.to_owned()))
        .and_then(|amount| {
            validate_amount(amount).map_err(|_| Error::InvalidAmount(text.to_owned()))
        })
}

fn parse_frequency(form: &TransactionForm) -> Result<Option<Frequency>, Error> {
    if !form.recurring {
        return Ok(None);
    }

    match form.frequency.as_deref().map(str::trim) {
        None | Some("") => Err(Error::MissingFrequency),
        Some(frequency) => frequency.parse().map(Some),
    }
}

fn validate_form(
    form: &TransactionForm,
    owner_id: UserID,
    today: Date,
) -> Result<ValidatedForm, Error> {
    let kind: TransactionType = form.kind.parse()?;
    let amount = parse_amount(&form.amount)?;
    let date = parse_date(&form.date)?;
    let frequency = parse_frequency(form)?;
    let description = form.description.as_deref();

    let Some(frequency) = frequency else {
        if date > today {
            return Err(Error::FutureDate(date));
        }

        let builder = Transaction::build(owner_id, kind, amount, date, &form.category)?
            .description(description);
        return Ok(ValidatedForm::Transaction(builder));
    };

    let starts_in_future = date > today;
    let rule = NewRecurringRule::new(
        owner_id,
        kind,
        amount,
        &form.category,
        frequency,
        date,
        !starts_in_future,
    )?
    .description(description);

    if starts_in_future {
        return Ok(ValidatedForm::Rule(rule));
    }

    let builder =
        Transaction::build(owner_id, kind, amount, date, &form.category)?.description(description);

    Ok(ValidatedForm::TransactionAndRule(builder, rule))
}

/// Validate `form` and record it for `owner_id`.
///
/// A one-off transaction must not be dated after `today`. A recurring entry
/// dated today or earlier records the transaction and a rule that is next due
/// one period after the date, writing both in one SQL transaction. A
/// recurring entry dated after `today` records only the rule, due on that date.
///
/// # Errors
/// Validation errors, such as [Error::InvalidAmount], [Error::InvalidDate],
/// [Error::FutureDate] or [Error::MissingFrequency], are returned before
/// either store is called. Store errors are passed through unchanged, and a
/// failed rule insert leaves no transaction behind.
pub fn create_transaction_from_form(
    form: &TransactionForm,
    owner_id: UserID,
    today: Date,
    stores: &SQLiteStores,
) -> Result<CreatedTransaction, Error> {
    let created = match validate_form(form, owner_id, today)? {
        ValidatedForm::Transaction(builder) => CreatedTransaction {
            transaction: Some(stores.transactions.create(builder)?),
            recurring_rule: None,
        },
        ValidatedForm::TransactionAndRule(builder, rule) => {
            let (transaction, rule) = stores.create_transaction_with_rule(builder, rule)?;

            CreatedTransaction {
                transaction: Some(transaction),
                recurring_rule: Some(rule),
            }
        }
        ValidatedForm::Rule(rule) => CreatedTransaction {
            transaction: None,
            recurring_rule: Some(stores.recurring_rules.create(rule)?),
        },
    };

    tracing::info!(
        "user {} added transaction {:?} with recurring rule {:?}",
        owner_id,
        created.transaction.as_ref().map(|transaction| transaction.id),
        created.recurring_rule.as_ref().map(|rule| rule.id)
    );

    Ok(created)
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use time::{Date, macros::date};

    use crate::{
        Error,
        recurrence::Frequency,
        stores::{RecurringRuleStore, TransactionStore, sqlite::SQLiteStores},
        transaction::TransactionType,
        user::UserID,
    };

    use super::{CreatedTransaction, TransactionForm, create_transaction_from_form};

    const OWNER: UserID = UserID::new(1);
    const TODAY: Date = date!(2025 - 01 - 31);

    fn get_test_stores() -> SQLiteStores {
        SQLiteStores::new(Connection::open_in_memory().unwrap()).unwrap()
    }

    fn expense_form(date: &str) -> TransactionForm {
        TransactionForm {
            kind: "expense".to_owned(),
            amount: "15.99".to_owned(),
            category: "Subscriptions".to_owned(),
            date: date.to_owned(),
            description: Some("  Streaming ".to_owned()),
            recurring: false,
            frequency: None,
        }
    }

    fn recurring_form(date: &str, frequency: &str) -> TransactionForm {
        TransactionForm {
            recurring: true,
            frequency: Some(frequency.to_owned()),
            ..expense_form(date)
        }
    }

    fn submit(
        form: &TransactionForm,
        stores: &SQLiteStores,
    ) -> Result<CreatedTransaction, Error> {
        create_transaction_from_form(form, OWNER, TODAY, stores)
    }

    #[test]
    fn creates_one_off_transaction() {
        let stores = get_test_stores();

        let created = submit(&expense_form("2025-01-15"), &stores).unwrap();

        let transaction = created.transaction.unwrap();
        assert_eq!(transaction.kind, TransactionType::Expense);
        assert_eq!(transaction.amount, 15.99);
        assert_eq!(transaction.category, "Subscriptions");
        assert_eq!(transaction.date, date!(2025 - 01 - 15));
        assert_eq!(transaction.description, Some("Streaming".to_owned()));
        assert_eq!(created.recurring_rule, None);
        assert!(stores.recurring_rules.get_by_owner(OWNER).unwrap().is_empty());
    }

    #[test]
    fn recurring_entry_creates_transaction_and_rule_due_next_period() {
        let stores = get_test_stores();

        let created = submit(&recurring_form("2025-01-31", "monthly"), &stores).unwrap();

        let transaction = created.transaction.unwrap();
        let rule = created.recurring_rule.unwrap();
        assert_eq!(transaction.date, date!(2025 - 01 - 31));
        assert_eq!(rule.frequency, Frequency::Monthly);
        assert_eq!(rule.start_date, date!(2025 - 01 - 31));
        assert_eq!(rule.next_due_date, date!(2025 - 02 - 28));
        assert_eq!(rule.description, Some("Streaming".to_owned()));
        assert!(rule.active);
    }

    #[test]
    fn failed_rule_insert_leaves_no_transaction() {
        let stores = get_test_stores();
        stores
            .connection()
            .lock()
            .unwrap()
            .execute("DROP TABLE recurring_rule", ())
            .unwrap();

        let result = submit(&recurring_form("2025-01-15", "monthly"), &stores);

        assert!(
            matches!(result, Err(Error::SqlError(_))),
            "want SQL error, got {result:?}"
        );
        assert_eq!(stores.transactions.get_by_owner(OWNER), Ok(vec![]));
    }

    #[test]
    fn created_records_serialize_as_one_document() {
        let stores = get_test_stores();

        let created = submit(&recurring_form("2025-01-31", "monthly"), &stores).unwrap();
        let json = serde_json::to_value(&created).unwrap();

        assert_eq!(json["transaction"]["category"], "Subscriptions");
        assert_eq!(json["recurring_rule"]["category"], "Subscriptions");
        assert_eq!(json["recurring_rule"]["frequency"], "monthly");
    }

    #[test]
    fn future_recurring_entry_creates_only_rule_due_on_start() {
        let stores = get_test_stores();

        let created = submit(&recurring_form("2025-03-01", "weekly"), &stores).unwrap();

        let rule = created.recurring_rule.unwrap();
        assert_eq!(created.transaction, None);
        assert_eq!(rule.start_date, date!(2025 - 03 - 01));
        assert_eq!(rule.next_due_date, date!(2025 - 03 - 01));
        assert!(stores.transactions.get_by_owner(OWNER).unwrap().is_empty());
    }

    #[test]
    fn future_one_off_transaction_is_rejected() {
        let stores = get_test_stores();

        let result = submit(&expense_form("2025-02-01"), &stores);

        assert_eq!(result, Err(Error::FutureDate(date!(2025 - 02 - 01))));
    }

    #[test]
    fn invalid_frequency_is_rejected() {
        let stores = get_test_stores();

        let result = submit(&recurring_form("2025-01-01", "daily"), &stores);

        assert_eq!(result, Err(Error::InvalidFrequency("daily".to_owned())));
        assert!(stores.transactions.get_by_owner(OWNER).unwrap().is_empty());
    }

    #[test]
    fn missing_frequency_is_rejected() {
        let stores = get_test_stores();
        let form = TransactionForm {
            frequency: Some("  ".to_owned()),
            ..recurring_form("2025-01-01", "")
        };

        let result = submit(&form, &stores);

        assert_eq!(result, Err(Error::MissingFrequency));
    }

    #[test]
    fn frequency_is_ignored_when_not_recurring() {
        let stores = get_test_stores();
        let form = TransactionForm {
            frequency: Some("daily".to_owned()),
            ..expense_form("2025-01-01")
        };

        let created = submit(&form, &stores).unwrap();

        assert!(created.transaction.is_some());
        assert_eq!(created.recurring_rule, None);
    }

    #[test]
    fn invalid_fields_are_rejected_before_any_store_call() {
        let stores = get_test_stores();
        let cases = [
            (
                TransactionForm {
                    amount: "0".to_owned(),
                    ..expense_form("2025-01-01")
                },
                Error::InvalidAmount("0".to_owned()),
            ),
            (
                TransactionForm {
                    amount: "twelve".to_owned(),
                    ..expense_form("2025-01-01")
                },
                Error::InvalidAmount("twelve".to_owned()),
            ),
            (
                TransactionForm {
                    amount: "-3".to_owned(),
                    ..expense_form("2025-01-01")
                },
                Error::InvalidAmount("-3".to_owned()),
            ),
            (
                TransactionForm {
                    category: " ".to_owned(),
                    ..expense_form("2025-01-01")
                },
                Error::EmptyCategoryName,
            ),
            (
                TransactionForm {
                    kind: "transfer".to_owned(),
                    ..expense_form("2025-01-01")
                },
                Error::InvalidTransactionType("transfer".to_owned()),
            ),
            (expense_form("01/02/2025"), Error::InvalidDate("01/02/2025".to_owned())),
            (expense_form("2025-02-30"), Error::InvalidDate("2025-02-30".to_owned())),
        ];

        for (form, want) in cases {
            assert!(want.is_validation());

            let result = submit(&form, &stores);

            assert_eq!(result, Err(want), "form {form:?}");
        }

        assert!(stores.transactions.get_by_owner(OWNER).unwrap().is_empty());
        assert!(stores.recurring_rules.get_by_owner(OWNER).unwrap().is_empty());
    }

    #[test]
    fn form_deserializes_with_optional_fields_missing() {
        let form: TransactionForm = serde_json::from_str(
            r#"{"type": "income", "amount": "100", "category": "Salary", "date": "2024-03-01"}"#,
        )
        .unwrap();

        assert_eq!(form.kind, "income");
        assert!(!form.recurring);
        assert_eq!(form.frequency, None);
        assert_eq!(form.description, None);
    }
}
