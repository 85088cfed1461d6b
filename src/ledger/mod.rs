//! The customer balance ledger.
//!
//! Each customer has an append-only sequence of credit/debit transactions.
//! Every transaction stores the running balance immediately after it was
//! applied, so the current balance of a customer is the `balance_after` of
//! their most recent transaction. Appends serialize per database connection
//! and run inside an IMMEDIATE SQLite transaction, so two concurrent appends
//! can never compute their balances from the same stale predecessor.
//!
//! Ledger rows are never updated or deleted; corrections are made by
//! appending a compensating transaction.

mod append_endpoint;
mod core;
mod query_endpoints;

pub(crate) use core::decimal_from_column;

pub use append_endpoint::{AppendTransactionForm, append_transaction_endpoint};
pub use core::{
    NewTransaction, Transaction, TransactionRecord, TransactionType, append_transaction,
    count_transactions, create_transaction_table, current_balance, latest_balances,
    list_all_transactions, list_customer_transactions,
};
pub use query_endpoints::{
    get_customer_balance_endpoint, get_customer_transactions_endpoint, get_transactions_endpoint,
};
