//! SQLite implementations of the store traits and a helper for opening a
//! database with all of them.

mod category;
mod recurring_rule;
mod transaction;

pub use category::SQLiteCategoryStore;
pub use recurring_rule::SQLiteRecurringRuleStore;
pub use transaction::SQLiteTransactionStore;

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::{
    Error,
    db::initialize,
    recurrence::{NewRecurringRule, RecurringRule},
    transaction::{Transaction, TransactionBuilder},
};

/// The SQLite backed stores, sharing one database connection.
#[derive(Debug, Clone)]
pub struct SQLiteStores {
    /// The store for transactions.
    pub transactions: SQLiteTransactionStore,
    /// The store for categories.
    pub categories: SQLiteCategoryStore,
    /// The store for recurring rules.
    pub recurring_rules: SQLiteRecurringRuleStore,
    connection: Arc<Mutex<Connection>>,
}

impl SQLiteStores {
    /// Create the stores for `db_connection`.
    ///
    /// This function will modify the database by adding the tables for the domain
    /// models to the database.
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn new(db_connection: Connection) -> Result<Self, Error> {
        initialize(&db_connection)?;

        let connection = Arc::new(Mutex::new(db_connection));

        Ok(Self {
            transactions: SQLiteTransactionStore::new(connection.clone()),
            categories: SQLiteCategoryStore::new(connection.clone()),
            recurring_rules: SQLiteRecurringRuleStore::new(connection.clone()),
            connection,
        })
    }

    /// Create a transaction and the recurring rule it starts.
    ///
    /// Either both records are written or neither is.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::DatabaseLockError] if the connection lock is poisoned,
    /// - or [Error::SqlError] if either insert fails, in which case nothing is saved.
    pub fn create_transaction_with_rule(
        &self,
        builder: TransactionBuilder,
        rule: NewRecurringRule,
    ) -> Result<(Transaction, RecurringRule), Error> {
        let connection = self
            .connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;
        // The guard only gives us &Connection.
        let tx = connection.unchecked_transaction()?;

        let transaction = SQLiteTransactionStore::insert(&tx, builder)?;
        let rule = SQLiteRecurringRuleStore::insert(&tx, rule)?;

        tx.commit()?;

        Ok((transaction, rule))
    }

    #[cfg(test)]
    pub(crate) fn connection(&self) -> &Arc<Mutex<Connection>> {
        &self.connection
    }
}
