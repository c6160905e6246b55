//! Implements a SQLite backed recurring rule store.

use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::{Connection, Row, types::Type};

use crate::{
    Error,
    database_id::RecurringRuleId,
    db::{CreateTable, MapRow, collect_valid_rows},
    recurrence::{NewRecurringRule, RecurringRule},
    stores::RecurringRuleStore,
    transaction::validate_amount,
    user::UserID,
};

const RULE_COLUMNS: &str = "id, owner_id, kind, amount, category, description, frequency, \
    start_date, next_due_date, active";

/// Stores recurring transaction rules in a SQLite database.
#[derive(Debug, Clone)]
pub struct SQLiteRecurringRuleStore {
    connection: Arc<Mutex<Connection>>,
}

impl SQLiteRecurringRuleStore {
    /// Create a new store for the SQLite `connection`.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, Error> {
        self.connection.lock().map_err(|_| Error::DatabaseLockError)
    }

    /// Insert a rule using `connection`, which may be inside an open SQL
    /// transaction.
    pub(super) fn insert(
        connection: &Connection,
        rule: NewRecurringRule,
    ) -> Result<RecurringRule, Error> {
        let rule = connection
            .prepare(&format!(
                "INSERT INTO recurring_rule
                    (owner_id, kind, amount, category, description, frequency, start_date, next_due_date, active)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 1)
                 RETURNING {RULE_COLUMNS}"
            ))?
            .query_row(
                (
                    rule.owner_id,
                    rule.kind,
                    rule.amount,
                    rule.category.as_ref(),
                    rule.description,
                    rule.frequency,
                    rule.start_date,
                    rule.next_due_date,
                ),
                Self::map_row,
            )?;

        tracing::debug!(
            "created {} recurring rule {} for user {}, next due {}",
            rule.frequency,
            rule.id,
            rule.owner_id,
            rule.next_due_date
        );

        Ok(rule)
    }
}

impl RecurringRuleStore for SQLiteRecurringRuleStore {
    /// Create a new, active rule in the database.
    ///
    /// # Errors
    /// This function will return an [Error::SqlError] if there is an SQL error.
    fn create(&self, rule: NewRecurringRule) -> Result<RecurringRule, Error> {
        Self::insert(&*self.lock()?, rule)
    }

    /// Retrieve the rule with `id`.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::NotFound] if `id` does not refer to a rule owned by `owner_id`,
    /// - or [Error::SqlError] if there is some other SQL error.
    fn get(&self, owner_id: UserID, id: RecurringRuleId) -> Result<RecurringRule, Error> {
        let rule = self
            .lock()?
            .prepare(&format!(
                "SELECT {RULE_COLUMNS} FROM recurring_rule WHERE id = ?1 AND owner_id = ?2"
            ))?
            .query_row((id, owner_id), Self::map_row)?;

        Ok(rule)
    }

    /// Retrieve the rules of `owner_id` ordered by next due date.
    ///
    /// Rows that cannot be read are skipped.
    ///
    /// # Errors
    /// This function will return an [Error::SqlError] if there is an SQL error.
    fn get_by_owner(&self, owner_id: UserID) -> Result<Vec<RecurringRule>, Error> {
        let connection = self.lock()?;
        let mut statement = connection.prepare(&format!(
            "SELECT {RULE_COLUMNS} FROM recurring_rule
             WHERE owner_id = ?1
             ORDER BY next_due_date, id"
        ))?;

        let rows = statement.query_map((owner_id,), Self::map_row)?;

        collect_valid_rows(rows, "recurring_rule")
    }
}

impl CreateTable for SQLiteRecurringRuleStore {
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error> {
        connection.execute(
            "CREATE TABLE IF NOT EXISTS recurring_rule (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                owner_id INTEGER NOT NULL,
                kind TEXT NOT NULL,
                amount REAL NOT NULL,
                category TEXT NOT NULL,
                description TEXT,
                frequency TEXT NOT NULL,
                start_date TEXT NOT NULL,
                next_due_date TEXT NOT NULL,
                active INTEGER NOT NULL DEFAULT 1,
                CHECK (next_due_date >= start_date)
                )",
            (),
        )?;

        Ok(())
    }
}

impl MapRow for SQLiteRecurringRuleStore {
    type ReturnType = RecurringRule;

    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self::ReturnType, rusqlite::Error> {
        let amount: f64 = row.get(offset + 3)?;

        if let Err(error) = validate_amount(amount) {
            return Err(rusqlite::Error::FromSqlConversionFailure(
                offset + 3,
                Type::Real,
                Box::new(error),
            ));
        }

        Ok(RecurringRule {
            id: row.get(offset)?,
            owner_id: row.get(offset + 1)?,
            kind: row.get(offset + 2)?,
            amount,
            category: row.get(offset + 4)?,
            description: row.get(offset + 5)?,
            frequency: row.get(offset + 6)?,
            start_date: row.get(offset + 7)?,
            next_due_date: row.get(offset + 8)?,
            active: row.get(offset + 9)?,
        })
    }
}
