//! Implements a struct that holds the state of the REST server.

use std::time::Duration;

use crate::{balance::Reconciler, stores::TransactionStore};

/// The state of the REST server.
#[derive(Debug, Clone)]
pub struct AppState<S>
where
    S: TransactionStore,
{
    /// The store for the ledger's [transactions](crate::Transaction).
    pub transaction_store: S,
    /// Keeps the stored running balances up to date after each mutation.
    pub reconciler: Reconciler<S>,
}

impl<S> AppState<S>
where
    S: TransactionStore,
{
    /// Create a new [AppState] for the ledger in `transaction_store`.
    ///
    /// `storage_timeout` bounds each storage call made while reconciling.
    pub fn new(transaction_store: S, storage_timeout: Duration) -> Self {
        let reconciler = Reconciler::new(transaction_store.clone(), storage_timeout);

        Self {
            transaction_store,
            reconciler,
        }
    }
}
