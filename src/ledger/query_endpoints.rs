//! The read-only ledger endpoints: the admin transaction listing, a
//! customer's ledger, and a customer's current balance.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, State},
    response::IntoResponse,
};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::{AppState, Error, customer::customer_exists, database_id::CustomerId};

use super::core::{current_balance, list_all_transactions, list_customer_transactions};

/// The state needed to query the ledger.
#[derive(Debug, Clone)]
pub struct LedgerQueryState {
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for LedgerQueryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// List every transaction in the system, joined with customer and user names,
/// newest first.
pub async fn get_transactions_endpoint(
    State(state): State<LedgerQueryState>,
) -> Result<impl IntoResponse, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let records = list_all_transactions(&connection)?;

    Ok(Json(records))
}

/// List a customer's transactions, newest first.
///
/// # Errors
/// Returns a 404 response if the customer does not exist.
pub async fn get_customer_transactions_endpoint(
    State(state): State<LedgerQueryState>,
    Path(customer_id): Path<CustomerId>,
) -> Result<impl IntoResponse, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    if !customer_exists(customer_id, &connection)? {
        return Err(Error::NotFound);
    }

    let transactions = list_customer_transactions(customer_id, &connection)?;

    Ok(Json(transactions))
}

/// A customer's current balance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BalanceResponse {
    /// The customer the balance belongs to.
    pub customer_id: CustomerId,
    /// The `balance_after` of the customer's most recent transaction, or zero
    /// if they have none.
    pub balance: Decimal,
}

/// Get a customer's current balance.
///
/// # Errors
/// Returns a 404 response if the customer does not exist.
pub async fn get_customer_balance_endpoint(
    State(state): State<LedgerQueryState>,
    Path(customer_id): Path<CustomerId>,
) -> Result<impl IntoResponse, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    if !customer_exists(customer_id, &connection)? {
        return Err(Error::NotFound);
    }

    let balance = current_balance(customer_id, &connection)?;

    Ok(Json(BalanceResponse {
        customer_id,
        balance,
    }))
}
