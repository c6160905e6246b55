//! Implements a SQLite backed transaction store.
use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::{Connection, Row, types::Type};
use time::OffsetDateTime;

use crate::{
    Error,
    database_id::TransactionId,
    db::{CreateTable, MapRow, collect_valid_rows},
    stores::TransactionStore,
    transaction::{Transaction, TransactionBuilder, validate_amount},
    user::UserID,
};

const TRANSACTION_COLUMNS: &str =
    "id, owner_id, kind, amount, category, date, description, created_at";

/// Stores transactions in a SQLite database.
///
/// The category of a transaction is stored as plain text rather than a
/// reference to the category table, so categories can be renamed or deleted
/// without touching recorded transactions.
#[derive(Debug, Clone)]
pub struct SQLiteTransactionStore {
    connection: Arc<Mutex<Connection>>,
}

impl SQLiteTransactionStore {
    /// Create a new store for the SQLite `connection`.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, Error> {
        self.connection.lock().map_err(|_| Error::DatabaseLockError)
    }

    /// Insert a transaction using `connection`, which may be inside an open
    /// SQL transaction.
    pub(super) fn insert(
        connection: &Connection,
        builder: TransactionBuilder,
    ) -> Result<Transaction, Error> {
        let transaction = connection
            .prepare(&format!(
                "INSERT INTO \"transaction\" (owner_id, kind, amount, category, date, description, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 RETURNING {TRANSACTION_COLUMNS}"
            ))?
            .query_row(
                (
                    builder.owner_id,
                    builder.kind,
                    builder.amount,
                    builder.category.as_ref(),
                    builder.date,
                    builder.description,
                    OffsetDateTime::now_utc(),
                ),
                Self::map_row,
            )?;

        tracing::debug!(
            "created transaction {} for user {}",
            transaction.id,
            transaction.owner_id
        );

        Ok(transaction)
    }
}

impl TransactionStore for SQLiteTransactionStore {
    /// Create a new transaction in the database.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::DatabaseLockError] if the connection lock is poisoned,
    /// - or [Error::SqlError] if there is some other SQL error.
    fn create(&self, builder: TransactionBuilder) -> Result<Transaction, Error> {
        Self::insert(&*self.lock()?, builder)
    }

    /// Retrieve a transaction in the database by its `id`.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::NotFound] if `id` does not refer to a transaction owned by `owner_id`,
    /// - or [Error::SqlError] there is some other SQL error, including a malformed row.
    fn get(&self, owner_id: UserID, id: TransactionId) -> Result<Transaction, Error> {
        let transaction = self
            .lock()?
            .prepare(&format!(
                "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\" WHERE id = ?1 AND owner_id = ?2"
            ))?
            .query_row((id, owner_id), Self::map_row)?;

        Ok(transaction)
    }

    /// Overwrite the transaction `id` with the contents of `builder`.
    ///
    /// The creation timestamp is left unchanged.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::UpdateMissingTransaction] if `id` does not refer to a transaction of the builder's owner,
    /// - or [Error::SqlError] there is some other SQL error.
    fn update(&self, id: TransactionId, builder: TransactionBuilder) -> Result<Transaction, Error> {
        let result = self
            .lock()?
            .prepare(&format!(
                "UPDATE \"transaction\"
                 SET kind = ?1, amount = ?2, category = ?3, date = ?4, description = ?5
                 WHERE id = ?6 AND owner_id = ?7
                 RETURNING {TRANSACTION_COLUMNS}"
            ))?
            .query_row(
                (
                    builder.kind,
                    builder.amount,
                    builder.category.as_ref(),
                    builder.date,
                    builder.description,
                    id,
                    builder.owner_id,
                ),
                Self::map_row,
            );

        match result {
            Ok(transaction) => Ok(transaction),
            Err(rusqlite::Error::QueryReturnedNoRows) => Err(Error::UpdateMissingTransaction),
            Err(error) => Err(error.into()),
        }
    }

    /// Delete the transaction `id`.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::DeleteMissingTransaction] if `id` does not refer to a transaction owned by `owner_id`,
    /// - or [Error::SqlError] there is some other SQL error.
    fn delete(&self, owner_id: UserID, id: TransactionId) -> Result<(), Error> {
        let rows_affected = self.lock()?.execute(
            "DELETE FROM \"transaction\" WHERE id = ?1 AND owner_id = ?2",
            (id, owner_id),
        )?;

        if rows_affected == 0 {
            return Err(Error::DeleteMissingTransaction);
        }

        tracing::debug!("deleted transaction {id} for user {owner_id}");

        Ok(())
    }

    /// Retrieve the transactions of `owner_id`, newest first.
    ///
    /// Rows that cannot be read, e.g. because of a malformed date, are skipped.
    ///
    /// # Errors
    /// This function will return a [Error::SqlError] there is a SQL error.
    fn get_by_owner(&self, owner_id: UserID) -> Result<Vec<Transaction>, Error> {
        let connection = self.lock()?;
        let mut statement = connection.prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\"
             WHERE owner_id = ?1
             ORDER BY date DESC, id DESC"
        ))?;

        let rows = statement.query_map((owner_id,), Self::map_row)?;

        collect_valid_rows(rows, "transaction")
    }
}

impl CreateTable for SQLiteTransactionStore {
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error> {
        connection.execute(
            "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                owner_id INTEGER NOT NULL,
                kind TEXT NOT NULL,
                amount REAL NOT NULL,
                category TEXT NOT NULL,
                date TEXT NOT NULL,
                description TEXT,
                created_at TEXT NOT NULL
                )",
            (),
        )?;

        // Ensure the sequence starts at 1
        connection.execute(
            "INSERT OR IGNORE INTO sqlite_sequence (name, seq) VALUES ('transaction', 0)",
            (),
        )?;

        connection.execute(
            "CREATE INDEX IF NOT EXISTS idx_transaction_owner_date ON \"transaction\"(owner_id, date);",
            (),
        )?;

        Ok(())
    }
}

impl MapRow for SQLiteTransactionStore {
    type ReturnType = Transaction;

    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self::ReturnType, rusqlite::Error> {
        let amount: f64 = row.get(offset + 3)?;

        if let Err(error) = validate_amount(amount) {
            return Err(rusqlite::Error::FromSqlConversionFailure(
                offset + 3,
                Type::Real,
                Box::new(error),
            ));
        }

        Ok(Transaction {
            id: row.get(offset)?,
            owner_id: row.get(offset + 1)?,
            kind: row.get(offset + 2)?,
            amount,
            category: row.get(offset + 4)?,
            date: row.get(offset + 5)?,
            description: row.get(offset + 6)?,
            created_at: row.get(offset + 7)?,
        })
    }
}
