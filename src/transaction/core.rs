//! Defines the core data models for transactions.

use std::{fmt::Display, str::FromStr};

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use crate::{database_id::TransactionId, transaction::TransactionDate};

// ============================================================================
// MODELS
// ============================================================================

/// Whether a transaction adds money to the ledger or takes it out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money coming in, increases the balance.
    Credit,
    /// Money going out, decreases the balance.
    Debit,
}

impl TransactionType {
    /// The string used for this type in requests and in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Credit => "credit",
            TransactionType::Debit => "debit",
        }
    }

    /// Apply the sign of this type to a non-negative `amount`.
    pub fn signed(&self, amount: f64) -> f64 {
        match self {
            TransactionType::Credit => amount,
            TransactionType::Debit => -amount,
        }
    }
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A string that is neither "credit" nor "debit".
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("\"{0}\" is not a valid transaction type, expected \"credit\" or \"debit\"")]
pub struct InvalidTransactionType(pub String);

impl FromStr for TransactionType {
    type Err = InvalidTransactionType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "credit" => Ok(TransactionType::Credit),
            "debit" => Ok(TransactionType::Debit),
            other => Err(InvalidTransactionType(other.to_owned())),
        }
    }
}

impl ToSql for TransactionType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error| FromSqlError::Other(Box::new(error)))
    }
}

/// A credit or debit recorded in the ledger.
///
/// To create a new `Transaction`, use [Transaction::build] and hand the
/// builder to a [TransactionStore](crate::TransactionStore).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// Whether the amount is added to or subtracted from the balance.
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// The magnitude of the transaction, never negative.
    pub amount: f64,
    /// A text description of what the transaction was for.
    pub description: Option<String>,
    /// When the transaction happened.
    pub date: TransactionDate,
    /// The ledger balance up to and including this transaction as of the
    /// last reconciliation.
    pub running_balance: f64,
}

impl Transaction {
    /// Create a new transaction.
    ///
    /// Shortcut for [TransactionBuilder] for discoverability.
    pub fn build(
        transaction_type: TransactionType,
        amount: f64,
        date: impl Into<TransactionDate>,
    ) -> TransactionBuilder {
        TransactionBuilder {
            transaction_type,
            amount,
            date: date.into(),
            description: None,
            running_balance: 0.0,
        }
    }

    /// The amount with the sign given by the transaction type.
    pub fn signed_amount(&self) -> f64 {
        self.transaction_type.signed(self.amount)
    }
}

/// The fields of a transaction that a client controls.
///
/// Used both for inserting new transactions and for replacing the fields of
/// an existing one.
///
/// # Examples
///
/// ```
/// use balance_keeper::{Transaction, TransactionType};
/// use time::macros::date;
///
/// let builder = Transaction::build(TransactionType::Debit, 45.99, date!(2025 - 01 - 15))
///     .description(Some("Coffee beans".to_owned()));
///
/// assert_eq!(builder.signed_amount(), -45.99);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionBuilder {
    /// Whether the transaction is a credit or a debit.
    pub transaction_type: TransactionType,
    /// The non-negative magnitude of the transaction.
    pub amount: f64,
    /// When the transaction happened.
    pub date: TransactionDate,
    /// Optional free text.
    pub description: Option<String>,
    /// The balance stored with a newly inserted row.
    ///
    /// Ignored on update: balances of existing rows are only changed by
    /// reconciliation.
    pub running_balance: f64,
}

impl TransactionBuilder {
    /// Set the description for the transaction.
    pub fn description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    /// Set the provisional running balance stored on insert.
    pub fn running_balance(mut self, running_balance: f64) -> Self {
        self.running_balance = running_balance;
        self
    }

    /// The amount with the sign given by the transaction type.
    pub fn signed_amount(&self) -> f64 {
        self.transaction_type.signed(self.amount)
    }

    /// Create the [Transaction] this builder describes with the given `id`.
    pub fn finalise(self, id: TransactionId) -> Transaction {
        Transaction {
            id,
            transaction_type: self.transaction_type,
            amount: self.amount,
            description: self.description,
            date: self.date,
            running_balance: self.running_balance,
        }
    }
}

#[cfg(test)]
mod transaction_type_tests {
    use super::{InvalidTransactionType, TransactionType};

    #[test]
    fn parses_known_types() {
        assert_eq!("credit".parse(), Ok(TransactionType::Credit));
        assert_eq!("debit".parse(), Ok(TransactionType::Debit));
    }

    #[test]
    fn rejects_unknown_type() {
        assert_eq!(
            "Credit".parse::<TransactionType>(),
            Err(InvalidTransactionType("Credit".to_owned()))
        );
    }

    #[test]
    fn debit_negates_amount() {
        assert_eq!(TransactionType::Credit.signed(12.5), 12.5);
        assert_eq!(TransactionType::Debit.signed(12.5), -12.5);
    }

    #[test]
    fn serializes_as_lowercase() {
        let json = serde_json::to_string(&TransactionType::Debit).unwrap();

        assert_eq!(json, "\"debit\"");
    }
}
