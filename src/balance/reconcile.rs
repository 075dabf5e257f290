//! Keeps the stored running balances consistent with the ledger.
//!
//! After every mutation the whole ledger is fetched, recomputed with
//! [compute_balances] and written back. Passes for the same ledger never
//! overlap: requests queue on a lock, and a queued request is dropped when a
//! pass that started after it was made has already finished.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    time::Duration,
};

use tokio::{
    sync::{Mutex, OwnedMutexGuard},
    task::JoinHandle,
    time::MissedTickBehavior,
};

use crate::{
    Error,
    balance::{BalanceUpdate, compute_balances},
    stores::TransactionStore,
};

/// How long a single storage call may take during reconciliation by default.
pub const DEFAULT_STORAGE_TIMEOUT: Duration = Duration::from_secs(5);

/// What a call to [Reconciler::reconcile] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// A pass ran and wrote the balances of `rows` transactions.
    Reconciled {
        /// The number of transactions whose balance was written.
        rows: usize,
    },
    /// A pass that started after the request already covered it.
    Coalesced,
}

#[derive(Debug, Default)]
struct LedgerState {
    /// Held for the duration of a pass.
    lock: Arc<Mutex<()>>,
    /// The number of reconciliation requests made so far.
    requested: AtomicU64,
    /// The highest request number covered by a successful pass.
    completed: AtomicU64,
    /// Set when the last pass failed.
    dirty: AtomicBool,
}

/// Recomputes and persists the running balances of one ledger.
///
/// Clones share the same ledger state, so every handler that mutates the
/// ledger should use a clone of the same `Reconciler`.
#[derive(Debug, Clone)]
pub struct Reconciler<S> {
    store: S,
    storage_timeout: Duration,
    state: Arc<LedgerState>,
}

impl<S> Reconciler<S>
where
    S: TransactionStore,
{
    /// Create a reconciler for the ledger in `store`.
    ///
    /// Each storage call made during a pass fails with
    /// [Error::StorageTimeout] if it takes longer than `storage_timeout`.
    pub fn new(store: S, storage_timeout: Duration) -> Self {
        Self {
            store,
            storage_timeout,
            state: Arc::default(),
        }
    }

    /// Whether the last reconciliation pass failed, leaving stored balances
    /// possibly stale.
    pub fn is_dirty(&self) -> bool {
        self.state.dirty.load(Ordering::SeqCst)
    }

    /// Recompute every running balance in the ledger and write them back.
    ///
    /// Call this after the mutation it should account for has been
    /// committed. If another pass is running, this waits for it to finish.
    ///
    /// # Errors
    /// Returns:
    /// - [Error::ComputationPrecondition] if a stored transaction is invalid,
    /// - [Error::StorageTimeout] if a storage call took too long,
    /// - or any error returned by the store.
    ///
    /// No balances are written when the computation fails. On any error the
    /// ledger is marked dirty until a later pass succeeds.
    pub async fn reconcile(&self) -> Result<ReconcileOutcome, Error> {
        let ticket = self.state.requested.fetch_add(1, Ordering::SeqCst) + 1;
        let guard = self.state.lock.clone().lock_owned().await;

        if self.state.completed.load(Ordering::SeqCst) >= ticket {
            tracing::debug!("reconciliation request {ticket} was covered by a later pass");
            return Ok(ReconcileOutcome::Coalesced);
        }

        // Every request up to here was made after its mutation committed, so
        // the snapshot fetched below includes all of them.
        let covered = self.state.requested.load(Ordering::SeqCst);
        let mut guard = Some(guard);

        match self.run_pass(&mut guard).await {
            Ok(rows) => {
                self.state.completed.fetch_max(covered, Ordering::SeqCst);
                self.state.dirty.store(false, Ordering::SeqCst);
                tracing::debug!("reconciled {rows} running balances (requests up to {covered})");

                Ok(ReconcileOutcome::Reconciled { rows })
            }
            Err(error) => {
                self.state.dirty.store(true, Ordering::SeqCst);

                Err(error)
            }
        }
    }

    /// Reconcile after a mutation that has already succeeded.
    ///
    /// Failures are logged rather than returned because the caller's
    /// mutation stands either way. The ledger is left marked dirty so that
    /// the next pass or the [repair sweep](Reconciler::spawn_repair_sweep)
    /// fixes the stored balances.
    pub async fn reconcile_after_mutation(&self) {
        if let Err(error) = self.reconcile().await {
            tracing::error!(
                "could not reconcile running balances, stored balances may be stale: {error}"
            );
        }
    }

    /// Start a background task that retries reconciliation every `period`
    /// while the ledger is dirty.
    pub fn spawn_repair_sweep(&self, period: Duration) -> JoinHandle<()> {
        let reconciler = self.clone();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            interval.tick().await;

            loop {
                interval.tick().await;

                if !reconciler.is_dirty() {
                    continue;
                }

                tracing::warn!("running balances are stale, retrying reconciliation");

                match reconciler.reconcile().await {
                    Ok(_) => tracing::info!("repaired running balances"),
                    Err(error) => {
                        tracing::error!("repair failed, retrying in {period:?}: {error}")
                    }
                }
            }
        })
    }

    async fn run_pass(&self, guard: &mut Option<OwnedMutexGuard<()>>) -> Result<usize, Error> {
        let store = self.store.clone();
        let transactions = self.call_store(guard, move || store.list_all()).await?;

        let updates: Vec<BalanceUpdate> = compute_balances(transactions)?
            .iter()
            .map(BalanceUpdate::from)
            .collect();
        let rows = updates.len();

        let store = self.store.clone();
        self.call_store(guard, move || store.write_balances(&updates))
            .await?;

        Ok(rows)
    }

    /// Run a blocking storage call with the reconciler's timeout.
    ///
    /// A call that times out cannot be cancelled, so the ledger lock is
    /// handed to a task that releases it once the call returns. The next pass
    /// therefore cannot start before a late write-back has landed.
    async fn call_store<T, F>(
        &self,
        guard: &mut Option<OwnedMutexGuard<()>>,
        call: F,
    ) -> Result<T, Error>
    where
        F: FnOnce() -> Result<T, Error> + Send + 'static,
        T: Send + 'static,
    {
        let mut handle = tokio::task::spawn_blocking(call);

        match tokio::time::timeout(self.storage_timeout, &mut handle).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => Err(Error::StorageTaskFailed(join_error.to_string())),
            Err(_) => {
                if let Some(guard) = guard.take() {
                    tokio::spawn(async move {
                        if let Err(join_error) = handle.await {
                            tracing::error!("abandoned storage call failed: {join_error}");
                        }
                        drop(guard);
                    });
                }

                Err(Error::StorageTimeout(self.storage_timeout))
            }
        }
    }
}
