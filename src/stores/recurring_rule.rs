//! Defines the recurring rule store trait.

use crate::{
    Error,
    database_id::RecurringRuleId,
    recurrence::{NewRecurringRule, RecurringRule},
    user::UserID,
};

/// Creates and retrieves recurring transaction rules.
///
/// Advancing a rule's next due date belongs to the scheduler that generates
/// the transactions and has no operation here.
pub trait RecurringRuleStore {
    /// Create a new, active rule in the store.
    fn create(&self, rule: NewRecurringRule) -> Result<RecurringRule, Error>;

    /// Get a rule by its ID.
    fn get(&self, owner_id: UserID, id: RecurringRuleId) -> Result<RecurringRule, Error>;

    /// Get all rules owned by `owner_id`.
    fn get_by_owner(&self, owner_id: UserID) -> Result<Vec<RecurringRule>, Error>;
}
