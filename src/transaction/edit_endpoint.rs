//! Defines the endpoint for updating an existing transaction.

use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
};
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error, database_id::TransactionId, stores::TransactionStore,
    transaction::payload::{extract_payload, extract_transaction_id},
};

use super::TransactionPayload;

/// The response body for an update or delete.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Changes {
    /// The number of transactions changed by the request.
    pub changes: usize,
}

/// A route handler for replacing the fields of a transaction.
///
/// The ledger is reconciled after the update since changing the type,
/// amount or date of one transaction shifts the balance of every later one.
pub async fn edit_transaction_endpoint<S>(
    State(state): State<AppState<S>>,
    transaction_id: Result<Path<TransactionId>, PathRejection>,
    payload: Result<Json<TransactionPayload>, JsonRejection>,
) -> Result<Json<Changes>, Error>
where
    S: TransactionStore,
{
    let transaction_id = extract_transaction_id(transaction_id)?;
    let builder = extract_payload(payload)?;

    state
        .transaction_store
        .update(transaction_id, builder)
        .inspect_err(|error| {
            tracing::error!("could not update transaction {transaction_id}: {error}")
        })?;

    tracing::info!("updated transaction {transaction_id}");

    state.reconciler.reconcile_after_mutation().await;

    Ok(Json(Changes { changes: 1 }))
}
