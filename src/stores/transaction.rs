//! Defines the transaction store trait.

use crate::{
    Error,
    database_id::TransactionId,
    transaction::{Transaction, TransactionBuilder},
    user::UserID,
};

/// Handles the creation and retrieval of transactions.
pub trait TransactionStore {
    /// Create a new transaction in the store.
    fn create(&self, builder: TransactionBuilder) -> Result<Transaction, Error>;

    /// Retrieve a transaction owned by `owner_id` from the store.
    fn get(&self, owner_id: UserID, id: TransactionId) -> Result<Transaction, Error>;

    /// Replace the details of the transaction `id` with those in `builder`.
    ///
    /// The transaction must belong to the owner named in `builder`.
    fn update(&self, id: TransactionId, builder: TransactionBuilder)
    -> Result<Transaction, Error>;

    /// Delete a transaction owned by `owner_id` from the store.
    fn delete(&self, owner_id: UserID, id: TransactionId) -> Result<(), Error>;

    /// Retrieve all transactions owned by `owner_id`.
    fn get_by_owner(&self, owner_id: UserID) -> Result<Vec<Transaction>, Error>;
}
