//! Defines the endpoint for creating a new transaction.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{StatusCode, header::LOCATION},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    balance::provisional_balance,
    database_id::TransactionId,
    endpoints::{self, format_endpoint},
    stores::TransactionStore,
    transaction::{TransactionBuilder, payload::extract_payload},
};

use super::TransactionPayload;

/// The response body for a created transaction.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionCreated {
    /// The ID assigned to the new transaction.
    pub transaction_id: TransactionId,
}

/// A route handler for creating a new transaction.
///
/// The transaction is inserted with a provisional running balance and the
/// ledger is then reconciled. Responds with `201 Created`, the new ID in the
/// body, and the transaction's URI in the `Location` header.
pub async fn create_transaction_endpoint<S>(
    State(state): State<AppState<S>>,
    payload: Result<Json<TransactionPayload>, JsonRejection>,
) -> Result<Response, Error>
where
    S: TransactionStore,
{
    let builder = extract_payload(payload)?;
    let builder = with_provisional_balance(&state.transaction_store, builder);

    let transaction = state
        .transaction_store
        .insert(builder)
        .inspect_err(|error| tracing::error!("could not create transaction: {error}"))?;

    tracing::info!(
        "created transaction {} with provisional balance {}",
        transaction.id,
        transaction.running_balance
    );

    state.reconciler.reconcile_after_mutation().await;

    Ok((
        StatusCode::CREATED,
        [(LOCATION, format_endpoint(endpoints::TRANSACTION, transaction.id))],
        Json(TransactionCreated {
            transaction_id: transaction.id,
        }),
    )
        .into_response())
}

fn with_provisional_balance<S>(store: &S, builder: TransactionBuilder) -> TransactionBuilder
where
    S: TransactionStore,
{
    let running_balance = store
        .list_all()
        .and_then(|existing| provisional_balance(&existing, &builder));

    match running_balance {
        Ok(running_balance) => builder.running_balance(running_balance),
        // Reconciliation reports the offending row, the insert can go ahead.
        Err(error) => {
            tracing::warn!("could not compute provisional balance: {error}");
            builder
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;
    use time::macros::{date, datetime};

    use crate::{
        stores::TransactionStore,
        test_utils::{get_test_server, get_test_state},
        transaction::{TransactionDate, TransactionType, create_endpoint::TransactionCreated},
    };

    #[tokio::test]
    async fn can_create_transaction() {
        let state = get_test_state();
        let server = get_test_server(state.clone());

        let response = server
            .post("/transactions")
            .json(&json!({
                "type": "credit",
                "amount": 12.3,
                "description": "test transaction",
                "date": "2025-10-05"
            }))
            .await;

        response.assert_status(StatusCode::CREATED);
        assert_eq!(response.header("location"), "/transactions/1");
        let created: TransactionCreated = response.json();
        assert_eq!(created.transaction_id, 1);

        let transaction = state.transaction_store.get(1).unwrap();
        assert_eq!(transaction.transaction_type, TransactionType::Credit);
        assert_eq!(transaction.amount, 12.3);
        assert_eq!(transaction.description.as_deref(), Some("test transaction"));
        assert_eq!(transaction.date, TransactionDate::from(date!(2025 - 10 - 05)));
        assert_eq!(transaction.running_balance, 12.3);
    }

    #[tokio::test]
    async fn backdated_insert_updates_later_balances() {
        let state = get_test_state();
        let server = get_test_server(state.clone());
        for body in [
            json!({"type": "credit", "amount": 100, "date": "2024-01-01"}),
            json!({"type": "debit", "amount": 30, "date": "2024-01-03"}),
        ] {
            server
                .post("/transactions")
                .json(&body)
                .await
                .assert_status(StatusCode::CREATED);
        }

        server
            .post("/transactions")
            .json(&json!({"type": "debit", "amount": 50, "date": "2024-01-02"}))
            .await
            .assert_status(StatusCode::CREATED);

        let store = &state.transaction_store;
        assert_eq!(store.get(1).unwrap().running_balance, 100.0);
        assert_eq!(store.get(3).unwrap().running_balance, 50.0);
        assert_eq!(store.get(2).unwrap().running_balance, 20.0);
    }

    #[tokio::test]
    async fn missing_fields_are_a_client_error() {
        let state = get_test_state();
        let server = get_test_server(state.clone());

        let response = server
            .post("/transactions")
            .json(&json!({"type": "credit", "date": "2024-01-01"}))
            .await;

        response.assert_status_bad_request();
        assert!(response.text().contains("required"));
        assert_eq!(state.transaction_store.list_all().unwrap(), Vec::new());
    }

    #[tokio::test]
    async fn negative_amount_is_a_client_error() {
        let server = get_test_server(get_test_state());

        server
            .post("/transactions")
            .json(&json!({"type": "debit", "amount": -5, "date": "2024-01-01"}))
            .await
            .assert_status_bad_request();
    }

    #[tokio::test]
    async fn body_that_is_not_json_is_a_client_error() {
        let server = get_test_server(get_test_state());

        server
            .post("/transactions")
            .text("type=credit&amount=1")
            .await
            .assert_status_bad_request();
    }

    #[tokio::test]
    async fn overflowing_balance_is_never_stored() {
        let state = get_test_state();
        let server = get_test_server(state.clone());
        for date in ["2024-01-01", "2024-01-02"] {
            server
                .post("/transactions")
                .json(&json!({"type": "credit", "amount": 1e308, "date": date}))
                .await
                .assert_status(StatusCode::CREATED);
        }

        let response = server.get("/transactions").await;

        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        let balances: Vec<_> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|transaction| transaction["running_balance"].as_f64())
            .collect();
        assert_eq!(balances, vec![Some(0.0), Some(1e308)]);
        assert!(state.reconciler.is_dirty());
    }

    #[tokio::test]
    async fn accepts_date_time() {
        let state = get_test_state();
        let server = get_test_server(state.clone());

        server
            .post("/transactions")
            .json(&json!({"type": "credit", "amount": 5, "date": "2024-01-02T09:30:00Z"}))
            .await
            .assert_status(StatusCode::CREATED);

        assert_eq!(
            state.transaction_store.get(1).unwrap().date,
            TransactionDate::DateTime(datetime!(2024-01-02 09:30 UTC))
        );
    }
}
