//! The running balance computation.
//!
//! Every function here is pure: it takes transactions by value or reference
//! and never touches storage.

use std::cmp::Ordering;

use crate::{
    Error,
    database_id::TransactionId,
    transaction::{Transaction, TransactionBuilder},
};

/// The recomputed balance for one transaction, ready to be written back to a
/// store.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BalanceUpdate {
    /// The transaction to update.
    pub id: TransactionId,
    /// The new running balance.
    pub running_balance: f64,
}

impl From<&Transaction> for BalanceUpdate {
    fn from(transaction: &Transaction) -> Self {
        Self {
            id: transaction.id,
            running_balance: transaction.running_balance,
        }
    }
}

/// The ledger order: date ascending, then ID ascending for transactions on
/// the same date.
///
/// Dates are compared as instants, see [TransactionDate::instant](crate::TransactionDate::instant).
pub fn chronological_order(a: &Transaction, b: &Transaction) -> Ordering {
    a.date
        .instant()
        .cmp(&b.date.instant())
        .then(a.id.cmp(&b.id))
}

/// Sort `transactions` into ledger order.
pub fn sort_chronologically(transactions: &mut [Transaction]) {
    transactions.sort_by(chronological_order);
}

/// Sort `transactions` so the most recent comes first.
///
/// This is the exact reverse of [sort_chronologically].
pub fn sort_reverse_chronologically(transactions: &mut [Transaction]) {
    transactions.sort_by(|a, b| chronological_order(b, a));
}

/// Compute the running balance of every transaction in the ledger.
///
/// The input may be in any order and its `running_balance` values are
/// ignored. The output is in ledger order (see [chronological_order]) with
/// each transaction's `running_balance` set to the sum of the signed amounts
/// of every transaction up to and including it.
///
/// # Errors
/// Returns [Error::ComputationPrecondition] if any transaction has a negative
/// or non-finite amount, or if the running balance overflows. No partial
/// result is returned.
pub fn compute_balances(mut transactions: Vec<Transaction>) -> Result<Vec<Transaction>, Error> {
    if let Some(invalid) = transactions
        .iter()
        .find(|transaction| !is_valid_amount(transaction.amount))
    {
        return Err(Error::ComputationPrecondition(format!(
            "transaction {} has the amount {}, amounts must be non-negative",
            invalid.id, invalid.amount
        )));
    }

    sort_chronologically(&mut transactions);

    let mut balance = 0.0;

    for transaction in &mut transactions {
        balance += transaction.signed_amount();

        if !balance.is_finite() {
            return Err(overflow(transaction.id));
        }

        transaction.running_balance = balance;
    }

    Ok(transactions)
}

/// The balance a new transaction should be inserted with.
///
/// Stores assign a new transaction an ID larger than every existing ID, so it
/// sorts after every `existing` transaction on the same date. Its balance is
/// therefore the signed sum of every existing transaction dated on or before
/// it plus its own signed amount, which is the value the next reconciliation
/// will assign it.
///
/// # Errors
/// Returns [Error::ComputationPrecondition] if `new_transaction` or any of
/// the counted transactions has a negative or non-finite amount, or if the
/// balance overflows.
pub fn provisional_balance(
    existing: &[Transaction],
    new_transaction: &TransactionBuilder,
) -> Result<f64, Error> {
    if !is_valid_amount(new_transaction.amount) {
        return Err(Error::ComputationPrecondition(format!(
            "the new transaction has the amount {}, amounts must be non-negative",
            new_transaction.amount
        )));
    }

    let earlier = compute_balances(
        existing
            .iter()
            .filter(|transaction| transaction.date.instant() <= new_transaction.date.instant())
            .cloned()
            .collect(),
    )?;

    let previous_balance = earlier
        .last()
        .map_or(0.0, |transaction| transaction.running_balance);

    let balance = previous_balance + new_transaction.signed_amount();

    if !balance.is_finite() {
        return Err(Error::ComputationPrecondition(
            "the running balance overflows at the new transaction".to_owned(),
        ));
    }

    Ok(balance)
}

fn overflow(id: TransactionId) -> Error {
    Error::ComputationPrecondition(format!(
        "the running balance overflows at transaction {id}"
    ))
}

fn is_valid_amount(amount: f64) -> bool {
    amount.is_finite() && amount >= 0.0
}
