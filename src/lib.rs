//! Balance Keeper is a ledger service that keeps a running balance for
//! every transaction.
//!
//! This library provides a JSON REST API for recording credits and debits.
//! After every mutation the ledger is reconciled: balances are recomputed in
//! chronological order and written back to storage.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use tokio::signal;

mod app_state;
mod balance;
mod database_id;
mod db;
mod endpoints;
mod logging;
mod routing;
pub mod stores;
mod transaction;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use balance::{
    BalanceUpdate, DEFAULT_STORAGE_TIMEOUT, ReconcileOutcome, Reconciler, chronological_order,
    compute_balances, provisional_balance, sort_chronologically, sort_reverse_chronologically,
};
pub use database_id::{DatabaseId, TransactionId};
pub use db::initialize as initialize_db;
pub use endpoints::format_endpoint;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use routing::build_router;
pub use stores::{MemoryTransactionStore, TransactionStore};
pub use transaction::{
    Changes, InvalidTransactionDate, InvalidTransactionType, Transaction, TransactionBuilder,
    TransactionCreated, TransactionDate, TransactionPayload, TransactionType,
};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {error}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::error!("failed to install terminate signal handler: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The client sent a request body that is missing fields or has invalid
    /// values.
    #[error("{0}")]
    Validation(String),

    /// The stored ledger cannot be folded into running balances, for example
    /// because a row has a negative amount, an unknown type or an unreadable
    /// date, or because the running balance overflows.
    ///
    /// Nothing is written back when this happens.
    #[error("cannot compute running balances: {0}")]
    ComputationPrecondition(String),

    /// The requested resource was not found.
    ///
    /// The client should check that the parameters (e.g., ID) are correct and
    /// that the resource has been created.
    #[error("the requested resource could not be found")]
    NotFound,

    /// The transaction to update does not exist.
    #[error("tried to update a transaction that does not exist")]
    UpdateMissingTransaction,

    /// The transaction to delete does not exist.
    #[error("tried to delete a transaction that does not exist")]
    DeleteMissingTransaction,

    /// An unhandled/unexpected SQL error.
    #[error("an error occurred while accessing the database: {0}")]
    SqlError(rusqlite::Error),

    /// The lock guarding the database connection was poisoned by a panic.
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// A storage call made during reconciliation did not finish in time.
    #[error("a storage call took longer than {0:?}")]
    StorageTimeout(Duration),

    /// A storage call made during reconciliation panicked or was cancelled.
    #[error("a storage task failed: {0}")]
    StorageTaskFailed(String),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            rusqlite::Error::FromSqlConversionFailure(_, _, ref error)
                if error.is::<InvalidTransactionType>() || error.is::<InvalidTransactionDate>() =>
            {
                Error::ComputationPrecondition(error.to_string())
            }
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Error::Validation(message) => (StatusCode::BAD_REQUEST, message.clone()),
            Error::NotFound | Error::UpdateMissingTransaction | Error::DeleteMissingTransaction => {
                (StatusCode::NOT_FOUND, self.to_string())
            }
            error => {
                tracing::error!("an unexpected error occurred: {error}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "an unexpected error occurred, check the server logs".to_owned(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
