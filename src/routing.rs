//! Application router configuration.

use axum::{
    Json, Router,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::json;
use tower_http::cors::CorsLayer;

use crate::{
    AppState, endpoints,
    logging::logging_middleware,
    stores::TransactionStore,
    transaction::{
        create_transaction_endpoint, delete_transaction_endpoint, edit_transaction_endpoint,
        get_transaction_endpoint, list_transactions_endpoint,
    },
};

/// Return a router with all the app's routes.
///
/// Every route accepts cross-origin requests from any origin.
pub fn build_router<S>(state: AppState<S>) -> Router
where
    S: TransactionStore,
{
    Router::new()
        .route(
            endpoints::TRANSACTIONS,
            get(list_transactions_endpoint::<S>).post(create_transaction_endpoint::<S>),
        )
        .route(
            endpoints::TRANSACTION,
            get(get_transaction_endpoint::<S>)
                .put(edit_transaction_endpoint::<S>)
                .delete(delete_transaction_endpoint::<S>),
        )
        .fallback(get_404_not_found)
        .layer(middleware::from_fn(logging_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn get_404_not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "resource not found" })),
    )
        .into_response()
}
