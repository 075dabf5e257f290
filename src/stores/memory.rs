//! Implements a transaction store that keeps the ledger in memory.

use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex, MutexGuard},
};

use crate::{
    Error,
    balance::BalanceUpdate,
    database_id::TransactionId,
    stores::TransactionStore,
    transaction::{Transaction, TransactionBuilder},
};

#[derive(Debug, Default)]
struct MemoryLedger {
    last_id: TransactionId,
    transactions: BTreeMap<TransactionId, Transaction>,
}

/// Stores transactions in memory.
///
/// Clones share the same ledger. IDs start at 1 and are never reused, even
/// after the transaction holding one is deleted.
#[derive(Debug, Clone, Default)]
pub struct MemoryTransactionStore {
    ledger: Arc<Mutex<MemoryLedger>>,
}

impl MemoryTransactionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryLedger>, Error> {
        self.ledger.lock().map_err(|error| {
            tracing::error!("could not acquire the in-memory ledger lock: {error}");
            Error::DatabaseLockError
        })
    }
}

impl TransactionStore for MemoryTransactionStore {
    fn list_all(&self) -> Result<Vec<Transaction>, Error> {
        Ok(self.lock()?.transactions.values().cloned().collect())
    }

    fn get(&self, id: TransactionId) -> Result<Transaction, Error> {
        self.lock()?
            .transactions
            .get(&id)
            .cloned()
            .ok_or(Error::NotFound)
    }

    fn insert(&self, builder: TransactionBuilder) -> Result<Transaction, Error> {
        let mut ledger = self.lock()?;
        ledger.last_id += 1;

        let transaction = builder.finalise(ledger.last_id);
        ledger
            .transactions
            .insert(transaction.id, transaction.clone());

        Ok(transaction)
    }

    fn update(&self, id: TransactionId, builder: TransactionBuilder) -> Result<Transaction, Error> {
        let mut ledger = self.lock()?;
        let transaction = ledger
            .transactions
            .get_mut(&id)
            .ok_or(Error::UpdateMissingTransaction)?;

        transaction.transaction_type = builder.transaction_type;
        transaction.amount = builder.amount;
        transaction.description = builder.description;
        transaction.date = builder.date;

        Ok(transaction.clone())
    }

    fn delete(&self, id: TransactionId) -> Result<(), Error> {
        self.lock()?
            .transactions
            .remove(&id)
            .map(|_| ())
            .ok_or(Error::DeleteMissingTransaction)
    }

    fn write_balance(&self, id: TransactionId, running_balance: f64) -> Result<(), Error> {
        let mut ledger = self.lock()?;
        let transaction = ledger.transactions.get_mut(&id).ok_or(Error::NotFound)?;
        transaction.running_balance = running_balance;

        Ok(())
    }

    /// Applies every update under one lock, or none of them if any ID is
    /// missing.
    fn write_balances(&self, updates: &[BalanceUpdate]) -> Result<(), Error> {
        let mut ledger = self.lock()?;

        if updates
            .iter()
            .any(|update| !ledger.transactions.contains_key(&update.id))
        {
            return Err(Error::NotFound);
        }

        for update in updates {
            if let Some(transaction) = ledger.transactions.get_mut(&update.id) {
                transaction.running_balance = update.running_balance;
            }
        }

        Ok(())
    }
}
