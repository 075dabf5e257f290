//! Contains the storage trait for the ledger and its implementations.

mod memory;
mod transaction;

pub mod sqlite;

pub use memory::MemoryTransactionStore;
pub use transaction::TransactionStore;
