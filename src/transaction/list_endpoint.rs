//! Defines the endpoints for reading transactions.

use axum::{
    Json,
    extract::{Path, State, rejection::PathRejection},
};

use crate::{
    AppState, Error,
    balance::sort_reverse_chronologically,
    database_id::TransactionId,
    stores::TransactionStore,
    transaction::{Transaction, payload::extract_transaction_id},
};

/// A route handler for listing every transaction, most recent first.
///
/// The running balances are those stored by the last reconciliation. A read
/// that overlaps a reconciliation may see a mix of old and new balances.
pub async fn list_transactions_endpoint<S>(
    State(state): State<AppState<S>>,
) -> Result<Json<Vec<Transaction>>, Error>
where
    S: TransactionStore,
{
    let mut transactions = state.transaction_store.list_all()?;
    sort_reverse_chronologically(&mut transactions);

    Ok(Json(transactions))
}

/// A route handler for getting a transaction by its ID.
pub async fn get_transaction_endpoint<S>(
    State(state): State<AppState<S>>,
    transaction_id: Result<Path<TransactionId>, PathRejection>,
) -> Result<Json<Transaction>, Error>
where
    S: TransactionStore,
{
    let transaction_id = extract_transaction_id(transaction_id)?;

    state.transaction_store.get(transaction_id).map(Json)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::{Value, json};
    use time::macros::date;

    use crate::{
        test_utils::{create_test_transaction, get_test_server, get_test_state},
        transaction::{Transaction, TransactionDate, TransactionType},
    };

    #[tokio::test]
    async fn lists_most_recent_first_with_balances() {
        let server = get_test_server(get_test_state());
        create_test_transaction(&server, "credit", 100.0, "2024-01-01").await;
        create_test_transaction(&server, "credit", 10.0, "2024-01-03").await;
        create_test_transaction(&server, "debit", 30.0, "2024-01-02").await;

        let response = server.get("/transactions").await;

        response.assert_status_ok();
        let transactions: Vec<Transaction> = response.json();
        let got: Vec<_> = transactions
            .iter()
            .map(|transaction| (transaction.id, transaction.running_balance))
            .collect();
        assert_eq!(got, vec![(2, 80.0), (3, 70.0), (1, 100.0)]);
    }

    #[tokio::test]
    async fn same_day_transactions_list_highest_id_first() {
        let server = get_test_server(get_test_state());
        create_test_transaction(&server, "credit", 5.0, "2024-01-01").await;
        create_test_transaction(&server, "credit", 7.0, "2024-01-01").await;

        let transactions: Vec<Transaction> = server.get("/transactions").await.json();

        let ids: Vec<_> = transactions.iter().map(|transaction| transaction.id).collect();
        assert_eq!(ids, vec![2, 1]);
        assert_eq!(transactions[0].running_balance, 12.0);
    }

    #[tokio::test]
    async fn empty_ledger_lists_nothing() {
        let server = get_test_server(get_test_state());

        let response = server.get("/transactions").await;

        response.assert_status_ok();
        response.assert_json(&json!([]));
    }

    #[tokio::test]
    async fn serializes_type_and_date_as_strings() {
        let server = get_test_server(get_test_state());
        let id = create_test_transaction(&server, "debit", 4.5, "2024-02-29").await;

        let response = server.get(&format!("/transactions/{id}")).await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["type"], "debit");
        assert_eq!(body["date"], "2024-02-29");
        assert_eq!(body["description"], Value::Null);
        assert_eq!(body["running_balance"], -4.5);

        let transaction: Transaction = response.json();
        assert_eq!(transaction.transaction_type, TransactionType::Debit);
        assert_eq!(transaction.date, TransactionDate::from(date!(2024 - 02 - 29)));
    }

    #[tokio::test]
    async fn unknown_transaction_is_not_found() {
        let server = get_test_server(get_test_state());

        let response = server.get("/transactions/42").await;

        response.assert_status(StatusCode::NOT_FOUND);
        let body: Value = response.json();
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn same_day_transactions_are_ordered_by_time() {
        let state = get_test_state();
        let server = get_test_server(state.clone());
        let evening = create_test_transaction(&server, "debit", 30.0, "2024-01-02T18:00:00Z").await;
        let morning = create_test_transaction(&server, "credit", 100.0, "2024-01-02T09:30:00Z").await;

        let transactions: Vec<Transaction> = server.get("/transactions").await.json();

        let got: Vec<_> = transactions
            .iter()
            .map(|transaction| (transaction.id, transaction.running_balance))
            .collect();
        assert_eq!(got, vec![(evening, 70.0), (morning, 100.0)]);
    }

    #[tokio::test]
    async fn date_time_is_returned_as_rfc3339() {
        let server = get_test_server(get_test_state());
        let id = create_test_transaction(&server, "credit", 1.0, "2024-01-02T09:30:00Z").await;

        let body: Value = server.get(&format!("/transactions/{id}")).await.json();

        assert_eq!(body["date"], "2024-01-02T09:30:00Z");
    }

    #[tokio::test]
    async fn non_numeric_id_is_a_json_client_error() {
        let server = get_test_server(get_test_state());

        let response = server.get("/transactions/abc").await;

        response.assert_status_bad_request();
        let body: Value = response.json();
        assert!(body["error"].is_string());
    }
}
