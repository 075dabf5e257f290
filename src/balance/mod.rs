//! Running balance computation and reconciliation.
//!
//! This module contains:
//! - The pure computation of running balances over the ledger order
//! - The [Reconciler] that persists recomputed balances after each mutation

mod core;
mod reconcile;

pub use core::{
    BalanceUpdate, chronological_order, compute_balances, provisional_balance,
    sort_chronologically, sort_reverse_chronologically,
};
pub use reconcile::{DEFAULT_STORAGE_TIMEOUT, ReconcileOutcome, Reconciler};
