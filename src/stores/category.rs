//! Defines the category store trait.

use crate::{
    Error,
    category::{Category, CategoryName},
    database_id::CategoryId,
    transaction::TransactionType,
    user::UserID,
};

/// Creates and retrieves the categories users classify transactions with.
pub trait CategoryStore {
    /// Create a new category and add it the store.
    fn create(
        &self,
        owner_id: UserID,
        name: CategoryName,
        kind: TransactionType,
    ) -> Result<Category, Error>;

    /// Get a category by its ID.
    fn get(&self, owner_id: UserID, id: CategoryId) -> Result<Category, Error>;

    /// Get the categories of `owner_id`, optionally only those of one type.
    fn get_by_owner(
        &self,
        owner_id: UserID,
        kind: Option<TransactionType>,
    ) -> Result<Vec<Category>, Error>;

    /// Change the name of a category.
    ///
    /// Transactions already recorded keep the name they were recorded with.
    fn rename(&self, owner_id: UserID, id: CategoryId, name: CategoryName)
    -> Result<Category, Error>;

    /// Delete a category.
    ///
    /// Transactions already recorded keep the name they were recorded with.
    fn delete(&self, owner_id: UserID, id: CategoryId) -> Result<(), Error>;
}
