//! Defines the transaction store trait.

use crate::{
    Error,
    balance::BalanceUpdate,
    database_id::TransactionId,
    transaction::{Transaction, TransactionBuilder},
};

/// Handles the persistence of the ledger's transactions.
///
/// Implementations are cheap to clone handles onto shared storage: the
/// [Reconciler](crate::Reconciler) clones the store to run calls on the
/// blocking thread pool.
pub trait TransactionStore: Clone + Send + Sync + 'static {
    /// Retrieve every transaction in the ledger, in no particular order.
    fn list_all(&self) -> Result<Vec<Transaction>, Error>;

    /// Retrieve a transaction from the store.
    ///
    /// # Errors
    /// Returns [Error::NotFound] if `id` does not refer to a transaction.
    fn get(&self, id: TransactionId) -> Result<Transaction, Error>;

    /// Create a new transaction in the store.
    ///
    /// The store assigns an ID greater than any it has assigned before and
    /// stores `builder.running_balance` as the initial running balance.
    fn insert(&self, builder: TransactionBuilder) -> Result<Transaction, Error>;

    /// Replace the type, amount, description and date of an existing
    /// transaction.
    ///
    /// The stored running balance is left untouched.
    ///
    /// # Errors
    /// Returns [Error::UpdateMissingTransaction] if `id` does not refer to a
    /// transaction.
    fn update(&self, id: TransactionId, builder: TransactionBuilder) -> Result<Transaction, Error>;

    /// Remove a transaction from the store.
    ///
    /// # Errors
    /// Returns [Error::DeleteMissingTransaction] if `id` does not refer to a
    /// transaction.
    fn delete(&self, id: TransactionId) -> Result<(), Error>;

    /// Persist a recomputed running balance for one transaction.
    fn write_balance(&self, id: TransactionId, running_balance: f64) -> Result<(), Error>;

    /// Persist a batch of recomputed running balances.
    ///
    /// The default implementation calls [TransactionStore::write_balance]
    /// for each update and stops at the first failure. Implementations that
    /// can should override this so the batch is applied atomically.
    fn write_balances(&self, updates: &[BalanceUpdate]) -> Result<(), Error> {
        updates
            .iter()
            .try_for_each(|update| self.write_balance(update.id, update.running_balance))
    }
}
