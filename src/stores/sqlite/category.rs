//! Implements a SQLite backed category store.

use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::{Connection, Row};

use crate::{
    Error,
    category::{Category, CategoryName},
    database_id::CategoryId,
    db::{CreateTable, MapRow, collect_valid_rows},
    stores::CategoryStore,
    transaction::TransactionType,
    user::UserID,
};

/// Creates and retrieves transaction categories to/from a SQLite database.
#[derive(Debug, Clone)]
pub struct SQLiteCategoryStore {
    connection: Arc<Mutex<Connection>>,
}

impl SQLiteCategoryStore {
    /// Create a new category store with a SQLite database.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, Error> {
        self.connection.lock().map_err(|_| Error::DatabaseLockError)
    }
}

impl CategoryStore for SQLiteCategoryStore {
    /// Create a category in the database.
    ///
    /// # Errors
    /// This function will return an error if there is an SQL error.
    fn create(
        &self,
        owner_id: UserID,
        name: CategoryName,
        kind: TransactionType,
    ) -> Result<Category, Error> {
        let connection = self.lock()?;
        connection.execute(
            "INSERT INTO category (owner_id, name, kind) VALUES (?1, ?2, ?3);",
            (owner_id, name.as_ref(), kind),
        )?;

        let id = connection.last_insert_rowid();

        tracing::debug!("created {kind} category \"{name}\" for user {owner_id}");

        Ok(Category {
            id,
            owner_id,
            name,
            kind,
        })
    }

    /// Retrieve the category with `id`.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::NotFound] if `id` does not refer to a category owned by `owner_id`,
    /// - or [Error::SqlError] if there is some other SQL error.
    fn get(&self, owner_id: UserID, id: CategoryId) -> Result<Category, Error> {
        self.lock()?
            .prepare("SELECT id, owner_id, name, kind FROM category WHERE id = ?1 AND owner_id = ?2;")?
            .query_row((id, owner_id), Self::map_row)
            .map_err(|error| error.into())
    }

    /// Retrieve the categories of `owner_id` ordered by name.
    ///
    /// # Errors
    /// This function will return an error if there is an SQL error.
    fn get_by_owner(
        &self,
        owner_id: UserID,
        kind: Option<TransactionType>,
    ) -> Result<Vec<Category>, Error> {
        let connection = self.lock()?;
        let mut statement = connection.prepare(
            "SELECT id, owner_id, name, kind FROM category
             WHERE owner_id = ?1 AND (?2 IS NULL OR kind = ?2)
             ORDER BY name, id;",
        )?;

        let rows = statement.query_map((owner_id, kind), Self::map_row)?;

        collect_valid_rows(rows, "category")
    }

    /// Change the name of the category with `id`.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::UpdateMissingCategory] if `id` does not refer to a category owned by `owner_id`,
    /// - or [Error::SqlError] if there is some other SQL error.
    fn rename(
        &self,
        owner_id: UserID,
        id: CategoryId,
        name: CategoryName,
    ) -> Result<Category, Error> {
        let result = self
            .lock()?
            .prepare(
                "UPDATE category SET name = ?1 WHERE id = ?2 AND owner_id = ?3
                 RETURNING id, owner_id, name, kind;",
            )?
            .query_row((name.as_ref(), id, owner_id), Self::map_row);

        match result {
            Ok(category) => Ok(category),
            Err(rusqlite::Error::QueryReturnedNoRows) => Err(Error::UpdateMissingCategory),
            Err(error) => Err(error.into()),
        }
    }

    /// Delete the category with `id`.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::DeleteMissingCategory] if `id` does not refer to a category owned by `owner_id`,
    /// - or [Error::SqlError] if there is some other SQL error.
    fn delete(&self, owner_id: UserID, id: CategoryId) -> Result<(), Error> {
        let rows_affected = self.lock()?.execute(
            "DELETE FROM category WHERE id = ?1 AND owner_id = ?2;",
            (id, owner_id),
        )?;

        if rows_affected == 0 {
            return Err(Error::DeleteMissingCategory);
        }

        Ok(())
    }
}

impl CreateTable for SQLiteCategoryStore {
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error> {
        connection.execute(
            "CREATE TABLE IF NOT EXISTS category (
                id INTEGER PRIMARY KEY,
                owner_id INTEGER NOT NULL,
                name TEXT NOT NULL,
                kind TEXT NOT NULL
            );",
            (),
        )?;

        Ok(())
    }
}

impl MapRow for SQLiteCategoryStore {
    type ReturnType = Category;

    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self::ReturnType, rusqlite::Error> {
        let id = row.get(offset)?;
        let owner_id = row.get(offset + 1)?;

        let raw_name: String = row.get(offset + 2)?;
        let name = CategoryName::new_unchecked(&raw_name);

        let kind = row.get(offset + 3)?;

        Ok(Self::ReturnType {
            id,
            owner_id,
            name,
            kind,
        })
    }
}

#[cfg(test)]
mod category_tests {
    use std::collections::HashSet;
    use std::sync::{Arc, Mutex};

    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error,
        category::CategoryName,
        db::initialize,
        stores::{TransactionStore, sqlite::SQLiteTransactionStore},
        transaction::{Transaction, TransactionType},
        user::UserID,
    };

    use super::{CategoryStore, SQLiteCategoryStore};

    fn get_test_connection() -> Arc<Mutex<Connection>> {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        Arc::new(Mutex::new(connection))
    }

    fn get_test_store() -> SQLiteCategoryStore {
        SQLiteCategoryStore::new(get_test_connection())
    }

    const OWNER: UserID = UserID::new(1);

    #[test]
    fn create_category_succeeds() {
        let store = get_test_store();
        let name = CategoryName::new("Categorically a category").unwrap();

        let category = store
            .create(OWNER, name.clone(), TransactionType::Expense)
            .unwrap();

        assert!(category.id > 0);
        assert_eq!(category.name, name);
        assert_eq!(category.kind, TransactionType::Expense);
        assert_eq!(category.owner_id, OWNER);
    }

    #[test]
    fn get_category_succeeds() {
        let store = get_test_store();
        let inserted_category = store
            .create(
                OWNER,
                CategoryName::new_unchecked("Foo"),
                TransactionType::Income,
            )
            .unwrap();

        let selected_category = store.get(OWNER, inserted_category.id);

        assert_eq!(Ok(inserted_category), selected_category);
    }

    #[test]
    fn get_category_with_invalid_id_returns_not_found() {
        let store = get_test_store();
        let inserted_category = store
            .create(
                OWNER,
                CategoryName::new_unchecked("Foo"),
                TransactionType::Income,
            )
            .unwrap();

        let selected_category = store.get(OWNER, inserted_category.id + 123);

        assert_eq!(selected_category, Err(Error::NotFound));
    }

    #[test]
    fn duplicate_names_are_allowed() {
        let store = get_test_store();
        let name = CategoryName::new_unchecked("Gifts");

        store
            .create(OWNER, name.clone(), TransactionType::Expense)
            .unwrap();
        store
            .create(OWNER, name.clone(), TransactionType::Expense)
            .unwrap();
        store.create(OWNER, name, TransactionType::Income).unwrap();

        let got = store.get_by_owner(OWNER, None).unwrap();

        assert_eq!(got.len(), 3, "got {} categories, want 3", got.len());
    }

    #[test]
    fn get_by_owner_filters_by_type() {
        let store = get_test_store();
        let expenses = HashSet::from([
            store
                .create(
                    OWNER,
                    CategoryName::new_unchecked("Foo"),
                    TransactionType::Expense,
                )
                .unwrap(),
            store
                .create(
                    OWNER,
                    CategoryName::new_unchecked("Bar"),
                    TransactionType::Expense,
                )
                .unwrap(),
        ]);
        store
            .create(
                OWNER,
                CategoryName::new_unchecked("Wages"),
                TransactionType::Income,
            )
            .unwrap();
        store
            .create(
                UserID::new(2),
                CategoryName::new_unchecked("Baz"),
                TransactionType::Expense,
            )
            .unwrap();

        let selected = store
            .get_by_owner(OWNER, Some(TransactionType::Expense))
            .unwrap();

        assert_eq!(expenses, HashSet::from_iter(selected));
    }

    #[test]
    fn rename_changes_name() {
        let store = get_test_store();
        let category = store
            .create(
                OWNER,
                CategoryName::new_unchecked("Food"),
                TransactionType::Expense,
            )
            .unwrap();

        let renamed = store
            .rename(OWNER, category.id, CategoryName::new_unchecked("Groceries"))
            .unwrap();

        assert_eq!(renamed.name.as_ref(), "Groceries");
        assert_eq!(store.get(OWNER, category.id), Ok(renamed));
    }

    #[test]
    fn rename_missing_category_fails() {
        let store = get_test_store();

        let result = store.rename(OWNER, 7, CategoryName::new_unchecked("Groceries"));

        assert_eq!(result, Err(Error::UpdateMissingCategory));
    }

    #[test]
    fn delete_missing_category_fails() {
        let store = get_test_store();

        assert_eq!(store.delete(OWNER, 7), Err(Error::DeleteMissingCategory));
    }

    #[test]
    fn rename_and_delete_do_not_change_transactions() {
        let connection = get_test_connection();
        let categories = SQLiteCategoryStore::new(connection.clone());
        let transactions = SQLiteTransactionStore::new(connection);
        let category = categories
            .create(
                OWNER,
                CategoryName::new_unchecked("Food"),
                TransactionType::Expense,
            )
            .unwrap();
        let transaction = transactions
            .create(
                Transaction::build(
                    OWNER,
                    TransactionType::Expense,
                    10.0,
                    date!(2025 - 01 - 01),
                    category.name.as_ref(),
                )
                .unwrap(),
            )
            .unwrap();

        categories
            .rename(OWNER, category.id, CategoryName::new_unchecked("Groceries"))
            .unwrap();
        categories.delete(OWNER, category.id).unwrap();

        let got = transactions.get(OWNER, transaction.id).unwrap();
        assert_eq!(got.category, "Food");
    }
}
