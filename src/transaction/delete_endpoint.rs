use axum::{
    Json,
    extract::{Path, State, rejection::PathRejection},
};

use crate::{
    AppState, Error, database_id::TransactionId, stores::TransactionStore,
    transaction::payload::extract_transaction_id,
};

use super::edit_endpoint::Changes;

/// A route handler for deleting a transaction.
///
/// Responds with `404 Not Found` if the transaction does not exist.
pub async fn delete_transaction_endpoint<S>(
    State(state): State<AppState<S>>,
    transaction_id: Result<Path<TransactionId>, PathRejection>,
) -> Result<Json<Changes>, Error>
where
    S: TransactionStore,
{
    let transaction_id = extract_transaction_id(transaction_id)?;

    state
        .transaction_store
        .delete(transaction_id)
        .inspect_err(|error| {
            tracing::error!("could not delete transaction {transaction_id}: {error}")
        })?;

    tracing::info!("deleted transaction {transaction_id}");

    state.reconciler.reconcile_after_mutation().await;

    Ok(Json(Changes { changes: 1 }))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use crate::{
        Error,
        stores::TransactionStore,
        test_utils::{create_test_transaction, get_test_server, get_test_state},
    };

    #[tokio::test]
    async fn deleting_middle_transaction_recomputes_the_rest() {
        let state = get_test_state();
        let server = get_test_server(state.clone());
        let first = create_test_transaction(&server, "credit", 100.0, "2024-01-01").await;
        let second = create_test_transaction(&server, "debit", 30.0, "2024-01-02").await;
        let third = create_test_transaction(&server, "credit", 10.0, "2024-01-03").await;

        server
            .delete(&format!("/transactions/{second}"))
            .await
            .assert_status_ok();

        let store = &state.transaction_store;
        assert_eq!(store.get(second), Err(Error::NotFound));
        assert_eq!(store.get(first).unwrap().running_balance, 100.0);
        assert_eq!(store.get(third).unwrap().running_balance, 110.0);
    }

    #[tokio::test]
    async fn deleting_twice_is_not_found() {
        let server = get_test_server(get_test_state());
        let id = create_test_transaction(&server, "credit", 1.0, "2024-01-01").await;

        server
            .delete(&format!("/transactions/{id}"))
            .await
            .assert_status_ok();
        server
            .delete(&format!("/transactions/{id}"))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn non_numeric_id_is_a_json_client_error() {
        let server = get_test_server(get_test_state());

        let response = server.delete("/transactions/abc").await;

        response.assert_status_bad_request();
        let body: serde_json::Value = response.json();
        assert!(body["error"].is_string());
    }
}
