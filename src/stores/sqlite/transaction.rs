//! Implements a SQLite backed transaction store.
use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::{Connection, Row};

use crate::{
    Error,
    balance::BalanceUpdate,
    database_id::TransactionId,
    db::{CreateTable, MapRow},
    stores::TransactionStore,
    transaction::{Transaction, TransactionBuilder},
};

/// Stores transactions in a SQLite database.
///
/// The table layout matches the `transactions` table of earlier versions of
/// the service, so an existing database file can be opened as is. Dates are
/// stored as text and may be bare dates or date-times, see [TransactionDate](crate::TransactionDate).
#[derive(Debug, Clone)]
pub struct SQLiteTransactionStore {
    connection: Arc<Mutex<Connection>>,
}

impl SQLiteTransactionStore {
    /// Create a new store for the SQLite `connection`.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, Error> {
        self.connection.lock().map_err(|error| {
            tracing::error!("could not acquire database lock: {error}");
            Error::DatabaseLockError
        })
    }
}

impl TransactionStore for SQLiteTransactionStore {
    /// Retrieve every transaction in the database.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::ComputationPrecondition] if a row has an unknown transaction type or an unreadable date,
    /// - or [Error::SqlError] if there is some other SQL error.
    fn list_all(&self) -> Result<Vec<Transaction>, Error> {
        self.lock()?
            .prepare(
                "SELECT id, type, amount, description, date, running_balance FROM transactions",
            )?
            .query_map([], Self::map_row)?
            .map(|maybe_transaction| maybe_transaction.map_err(Error::from))
            .collect()
    }

    /// Retrieve a transaction in the database by its `id`.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::NotFound] if `id` does not refer to a valid transaction,
    /// - or [Error::SqlError] there is some other SQL error.
    fn get(&self, id: TransactionId) -> Result<Transaction, Error> {
        let transaction = self
            .lock()?
            .prepare(
                "SELECT id, type, amount, description, date, running_balance
                 FROM transactions WHERE id = :id",
            )?
            .query_row(&[(":id", &id)], Self::map_row)?;

        Ok(transaction)
    }

    /// Create a new transaction in the database.
    ///
    /// # Errors
    /// This function will return a [Error::SqlError] if there is an SQL
    /// error, e.g. the amount violates the table's `CHECK` constraint.
    fn insert(&self, builder: TransactionBuilder) -> Result<Transaction, Error> {
        let transaction = self
            .lock()?
            .prepare(
                "INSERT INTO transactions (type, amount, description, date, running_balance)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 RETURNING id, type, amount, description, date, running_balance",
            )?
            .query_row(
                (
                    builder.transaction_type,
                    builder.amount,
                    builder.description,
                    builder.date,
                    builder.running_balance,
                ),
                Self::map_row,
            )?;

        Ok(transaction)
    }

    /// Update the client controlled fields of a transaction.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::UpdateMissingTransaction] if `id` does not refer to a valid transaction,
    /// - or [Error::SqlError] if there is some other SQL error.
    fn update(&self, id: TransactionId, builder: TransactionBuilder) -> Result<Transaction, Error> {
        self.lock()?
            .prepare(
                "UPDATE transactions SET type = ?1, amount = ?2, description = ?3, date = ?4
                 WHERE id = ?5
                 RETURNING id, type, amount, description, date, running_balance",
            )?
            .query_row(
                (
                    builder.transaction_type,
                    builder.amount,
                    builder.description,
                    builder.date,
                    id,
                ),
                Self::map_row,
            )
            .map_err(|error| match error {
                rusqlite::Error::QueryReturnedNoRows => Error::UpdateMissingTransaction,
                error => error.into(),
            })
    }

    /// Delete a transaction from the database.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::DeleteMissingTransaction] if `id` does not refer to a valid transaction,
    /// - or [Error::SqlError] if there is some other SQL error.
    fn delete(&self, id: TransactionId) -> Result<(), Error> {
        let rows_affected = self
            .lock()?
            .execute("DELETE FROM transactions WHERE id = :id", &[(":id", &id)])?;

        match rows_affected {
            0 => Err(Error::DeleteMissingTransaction),
            _ => Ok(()),
        }
    }

    fn write_balance(&self, id: TransactionId, running_balance: f64) -> Result<(), Error> {
        let rows_affected = self.lock()?.execute(
            "UPDATE transactions SET running_balance = ?1 WHERE id = ?2",
            (running_balance, id),
        )?;

        match rows_affected {
            0 => Err(Error::NotFound),
            _ => Ok(()),
        }
    }

    /// Write all balances inside one SQL transaction.
    ///
    /// # Errors
    /// Returns [Error::NotFound] if any update refers to a missing
    /// transaction, or [Error::SqlError] on any other SQL error. In both cases
    /// none of the balances are changed.
    fn write_balances(&self, updates: &[BalanceUpdate]) -> Result<(), Error> {
        let connection = self.lock()?;
        let tx = connection.unchecked_transaction()?;

        {
            let mut stmt =
                tx.prepare("UPDATE transactions SET running_balance = ?1 WHERE id = ?2")?;

            for update in updates {
                if stmt.execute((update.running_balance, update.id))? == 0 {
                    tracing::error!(
                        "could not write balance for transaction {}: not found",
                        update.id
                    );
                    // Dropping `tx` without committing rolls back the batch.
                    return Err(Error::NotFound);
                }
            }
        }

        tx.commit()?;

        Ok(())
    }
}

impl CreateTable for SQLiteTransactionStore {
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error> {
        connection.execute(
            "CREATE TABLE IF NOT EXISTS transactions (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    type TEXT NOT NULL CHECK (type IN ('credit', 'debit')),
                    amount REAL NOT NULL CHECK (amount >= 0),
                    description TEXT,
                    date TEXT NOT NULL,
                    running_balance REAL NOT NULL
                    )",
            (),
        )?;

        // Covers the ledger order used by every reconciliation.
        connection.execute(
            "CREATE INDEX IF NOT EXISTS idx_transactions_date_id ON transactions(date, id)",
            (),
        )?;

        Ok(())
    }
}

impl MapRow for SQLiteTransactionStore {
    type ReturnType = Transaction;

    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self::ReturnType, rusqlite::Error> {
        Ok(Transaction {
            id: row.get(offset)?,
            transaction_type: row.get(offset + 1)?,
            amount: row.get(offset + 2)?,
            description: row.get(offset + 3)?,
            date: row.get(offset + 4)?,
            running_balance: row.get(offset + 5)?,
        })
    }
}
