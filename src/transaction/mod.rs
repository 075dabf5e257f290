//! Transactions recorded in the ledger.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model and `TransactionBuilder` for creating transactions
//! - Validation of the JSON request bodies clients send
//! - The route handlers for creating, reading, updating and deleting transactions

mod core;
mod create_endpoint;
mod date;
mod delete_endpoint;
mod edit_endpoint;
mod list_endpoint;
mod payload;

pub use core::{InvalidTransactionType, Transaction, TransactionBuilder, TransactionType};
pub use create_endpoint::{TransactionCreated, create_transaction_endpoint};
pub use date::{InvalidTransactionDate, TransactionDate};
pub use delete_endpoint::delete_transaction_endpoint;
pub use edit_endpoint::{Changes, edit_transaction_endpoint};
pub use list_endpoint::{get_transaction_endpoint, list_transactions_endpoint};
pub use payload::TransactionPayload;
