#![allow(missing_docs)]

use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::json;

use crate::{
    AppState, DEFAULT_STORAGE_TIMEOUT, build_router, database_id::TransactionId,
    stores::MemoryTransactionStore, transaction::TransactionCreated,
};

pub(crate) fn get_test_state() -> AppState<MemoryTransactionStore> {
    AppState::new(MemoryTransactionStore::new(), DEFAULT_STORAGE_TIMEOUT)
}

#[track_caller]
pub(crate) fn get_test_server(state: AppState<MemoryTransactionStore>) -> TestServer {
    TestServer::new(build_router(state)).expect("Could not create test server.")
}

/// Create a transaction through the API and return its ID.
pub(crate) async fn create_test_transaction(
    server: &TestServer,
    transaction_type: &str,
    amount: f64,
    date: &str,
) -> TransactionId {
    let response = server
        .post("/transactions")
        .json(&json!({
            "type": transaction_type,
            "amount": amount,
            "date": date,
        }))
        .await;

    response.assert_status(StatusCode::CREATED);

    response.json::<TransactionCreated>().transaction_id
}
